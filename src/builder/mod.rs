//! Fluent construction of [`TransactionSpec`]s.
//!
//! Every setter validates its argument immediately and returns the builder
//! for chaining. [`TransactionBuilder::finalize`] checks the cross-field
//! rules and freezes the builder: from then on every setter fails with
//! [`PaymentError::ImmutableStateError`].
//!
//! ```
//! use rust_decimal_macros::dec;
//! use txcompose::builder::TransactionBuilder;
//! use txcompose::domain::operation::PaymentMethodRef;
//!
//! # fn main() -> txcompose::error::Result<()> {
//! let mut builder = TransactionBuilder::authorize(PaymentMethodRef::card("card-1"), dec!(14))?;
//! builder.with_currency("USD")?.with_system_trace_audit_number(1234)?;
//! let spec = builder.finalize()?;
//! assert_eq!(spec.tracking().system_trace_audit_number, Some(1234));
//! # Ok(())
//! # }
//! ```

pub mod linking;

use crate::domain::money::{Amount, Currency};
use crate::domain::operation::{
    Address, PaymentMethodRef, TransactionModifier, TransactionType,
};
use crate::domain::ports::SequenceGenerator;
use crate::domain::simulation::HostErrorSimulation;
use crate::domain::spec::{Linkage, NetworkFields, Operation, RefundTarget, TransactionSpec};
use crate::domain::tags::{FleetData, IssuerTag, ProductData};
use crate::domain::tracking::PriorMessageInformation;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use tracing::debug;

/// Largest value a six-digit STAN can hold.
pub const MAX_STAN: u32 = 999_999;

/// Accumulates the attributes of one payment operation.
///
/// Not thread-safe and meant for a single spec: create a new builder for
/// every request.
#[derive(Debug)]
pub struct TransactionBuilder {
    kind: TransactionType,
    finalized: bool,
    amount: Option<Amount>,
    currency: Option<Currency>,
    payment_method: Option<PaymentMethodRef>,
    linkage: Option<Linkage>,
    idempotency_key: Option<String>,
    gratuity: Option<Amount>,
    allow_duplicates: bool,
    request_multi_use_token: bool,
    multi_capture: bool,
    address: Option<Address>,
    payment_link_id: Option<String>,
    network: NetworkFields,
    simulated_host_errors: Option<HostErrorSimulation>,
}

impl TransactionBuilder {
    fn new(kind: TransactionType) -> Self {
        Self {
            kind,
            finalized: false,
            amount: None,
            currency: None,
            payment_method: None,
            linkage: None,
            idempotency_key: None,
            gratuity: None,
            allow_duplicates: false,
            request_multi_use_token: false,
            multi_capture: false,
            address: None,
            payment_link_id: None,
            network: NetworkFields::default(),
            simulated_host_errors: None,
        }
    }

    fn with_method(
        kind: TransactionType,
        payment_method: PaymentMethodRef,
        amount: Option<Decimal>,
    ) -> Result<Self> {
        let mut builder = Self::new(kind);
        builder.payment_method = Some(payment_method);
        if let Some(amount) = amount {
            builder.amount = Some(Amount::new(amount)?);
        }
        Ok(builder)
    }

    pub fn authorize(payment_method: PaymentMethodRef, amount: Decimal) -> Result<Self> {
        Self::with_method(TransactionType::Authorize, payment_method, Some(amount))
    }

    /// Authorization and capture in one message.
    pub fn sale(payment_method: PaymentMethodRef, amount: Decimal) -> Result<Self> {
        Self::with_method(TransactionType::Sale, payment_method, Some(amount))
    }

    /// Refund straight to a payment method, with no originating transaction.
    pub fn refund(payment_method: PaymentMethodRef, amount: Decimal) -> Result<Self> {
        Self::with_method(TransactionType::Refund, payment_method, Some(amount))
    }

    pub fn verify(payment_method: PaymentMethodRef) -> Result<Self> {
        Self::with_method(TransactionType::Verify, payment_method, None)
    }

    /// Builder for a follow-on operation; see [`linking`].
    pub(crate) fn linked(kind: TransactionType, linkage: Linkage) -> Self {
        let mut builder = Self::new(kind);
        builder.linkage = Some(linkage);
        builder
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn ensure_draft(&self) -> Result<()> {
        if self.finalized {
            Err(PaymentError::ImmutableStateError)
        } else {
            Ok(())
        }
    }

    fn ensure_kind(&self, field: &'static str, allowed: &[TransactionType]) -> Result<()> {
        if allowed.contains(&self.kind) {
            Ok(())
        } else {
            Err(PaymentError::validation(
                field,
                format!("not applicable to {} operations", self.kind),
            ))
        }
    }

    /// Whether tracking numbers were copied from the originating transaction.
    fn has_inherited_tracking(&self) -> bool {
        self.linkage
            .as_ref()
            .is_some_and(|linkage| linkage.matching.is_some())
    }

    fn ensure_tracking_writable(&self, field: &'static str) -> Result<()> {
        if self.has_inherited_tracking() {
            Err(PaymentError::validation(
                field,
                "fixed by the originating transaction; use follow_on_stan",
            ))
        } else {
            Ok(())
        }
    }

    pub fn with_amount(&mut self, amount: Decimal) -> Result<&mut Self> {
        self.ensure_draft()?;
        if self.kind == TransactionType::Verify {
            return Err(PaymentError::validation(
                "amount",
                "verifications do not carry an amount",
            ));
        }
        self.amount = Some(Amount::new(amount)?);
        Ok(self)
    }

    pub fn with_currency(&mut self, currency: &str) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.currency = Some(currency.parse()?);
        Ok(self)
    }

    pub fn with_payment_method(&mut self, payment_method: PaymentMethodRef) -> Result<&mut Self> {
        self.ensure_draft()?;
        if self.linkage.is_some() {
            return Err(PaymentError::validation(
                "payment_method",
                "follow-on operations use the originating transaction's payment method",
            ));
        }
        if payment_method.handle().is_empty() {
            return Err(PaymentError::validation("payment_method", "must not be empty"));
        }
        self.payment_method = Some(payment_method);
        Ok(self)
    }

    pub fn with_idempotency_key(&mut self, key: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        let key = key.into();
        if key.trim().is_empty() {
            return Err(PaymentError::validation(
                "idempotency_key",
                "must not be empty",
            ));
        }
        self.idempotency_key = Some(key);
        Ok(self)
    }

    pub fn with_gratuity(&mut self, gratuity: Decimal) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_kind(
            "gratuity",
            &[TransactionType::Capture, TransactionType::Sale],
        )?;
        self.gratuity = Some(Amount::new(gratuity).map_err(|_| {
            PaymentError::validation("gratuity", format!("must be non-negative, got {gratuity}"))
        })?);
        Ok(self)
    }

    pub fn with_allow_duplicates(&mut self, allow: bool) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.allow_duplicates = allow;
        Ok(self)
    }

    pub fn with_request_multi_use_token(&mut self, request: bool) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_kind(
            "request_multi_use_token",
            &[
                TransactionType::Authorize,
                TransactionType::Sale,
                TransactionType::Verify,
            ],
        )?;
        self.request_multi_use_token = request;
        Ok(self)
    }

    pub fn with_multi_capture(&mut self, multi_capture: bool) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_kind("multi_capture", &[TransactionType::Authorize])?;
        self.multi_capture = multi_capture;
        Ok(self)
    }

    pub fn with_address(&mut self, address: Address) -> Result<&mut Self> {
        self.ensure_draft()?;
        if self.linkage.is_some() {
            return Err(PaymentError::validation(
                "address",
                "not applicable to follow-on operations",
            ));
        }
        self.address = (!address.is_empty()).then_some(address);
        Ok(self)
    }

    pub fn with_payment_link_id(&mut self, link_id: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_kind(
            "payment_link_id",
            &[TransactionType::Authorize, TransactionType::Sale],
        )?;
        let link_id = link_id.into();
        if link_id.is_empty() {
            return Err(PaymentError::validation("payment_link_id", "must not be empty"));
        }
        self.payment_link_id = Some(link_id);
        Ok(self)
    }

    pub fn with_batch_number(&mut self, batch_number: u32) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_tracking_writable("batch_number")?;
        self.network.tracking.batch_number = Some(batch_number);
        Ok(self)
    }

    pub fn with_system_trace_audit_number(&mut self, stan: u32) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_tracking_writable("system_trace_audit_number")?;
        self.network.tracking.system_trace_audit_number =
            Some(validate_stan("system_trace_audit_number", stan)?);
        Ok(self)
    }

    pub fn with_sequence_number(&mut self, sequence_number: u32) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_tracking_writable("sequence_number")?;
        self.network.tracking.sequence_number = Some(sequence_number);
        Ok(self)
    }

    /// Fresh STAN for networks that trace follow-ons independently of the
    /// originating message.
    pub fn with_follow_on_stan(&mut self, stan: u32) -> Result<&mut Self> {
        self.ensure_draft()?;
        if self.linkage.is_none() {
            return Err(PaymentError::validation(
                "follow_on_stan",
                "only follow-on operations carry a follow-on STAN",
            ));
        }
        self.network.tracking.follow_on_stan = Some(validate_stan("follow_on_stan", stan)?);
        Ok(self)
    }

    /// Pulls tracing numbers from an external generator.
    ///
    /// Follow-ons that inherited their tracking numbers only take a fresh
    /// follow-on STAN.
    pub fn with_tracking_from(&mut self, generator: &dyn SequenceGenerator) -> Result<&mut Self> {
        self.ensure_draft()?;
        if self.has_inherited_tracking() {
            let stan = validate_stan("follow_on_stan", generator.next_stan())?;
            self.network.tracking.follow_on_stan = Some(stan);
        } else {
            let stan = validate_stan("system_trace_audit_number", generator.next_stan())?;
            let tracking = &mut self.network.tracking;
            tracking.system_trace_audit_number = Some(stan);
            tracking.sequence_number = Some(generator.next_sequence());
            tracking.batch_number = Some(generator.batch_number());
        }
        Ok(self)
    }

    pub fn with_unique_device_id(&mut self, device_id: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        let device_id = device_id.into();
        if device_id.is_empty() {
            return Err(PaymentError::validation("unique_device_id", "must not be empty"));
        }
        self.network.tracking.unique_device_id = Some(device_id);
        Ok(self)
    }

    pub fn with_company_id(&mut self, company_id: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        let company_id = company_id.into();
        if company_id.is_empty() {
            return Err(PaymentError::validation("company_id", "must not be empty"));
        }
        self.network.tracking.company_id = Some(company_id);
        Ok(self)
    }

    pub fn with_issuer_data(&mut self, tag: IssuerTag, value: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.network.issuer_data.insert(tag, value);
        Ok(self)
    }

    pub fn with_product_data(&mut self, product_data: ProductData) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.network.product_data = Some(product_data);
        Ok(self)
    }

    pub fn with_fleet_data(&mut self, fleet_data: FleetData) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.network.fleet_data = Some(fleet_data);
        Ok(self)
    }

    /// Marks the message as a retransmission of `prior`.
    pub fn with_prior_message(&mut self, prior: PriorMessageInformation) -> Result<&mut Self> {
        self.ensure_draft()?;
        if prior.message_type.len() != 4 || !is_digits(&prior.message_type) {
            return Err(PaymentError::validation(
                "prior_message_information",
                format!("message type must be 4 digits, got {:?}", prior.message_type),
            ));
        }
        if prior.transaction_code.is_empty() {
            return Err(PaymentError::validation(
                "prior_message_information",
                "transaction code must not be empty",
            ));
        }
        self.network.prior_message = Some(prior);
        Ok(self)
    }

    pub fn with_service_code(&mut self, service_code: &str) -> Result<&mut Self> {
        self.ensure_draft()?;
        if service_code.len() != 3 || !is_digits(service_code) {
            return Err(PaymentError::validation(
                "service_code",
                format!("expected 3 digits, got {service_code:?}"),
            ));
        }
        self.network.service_code = Some(service_code.to_string());
        Ok(self)
    }

    pub fn with_invoice_number(&mut self, invoice_number: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        let invoice_number = invoice_number.into();
        if invoice_number.is_empty() {
            return Err(PaymentError::validation("invoice_number", "must not be empty"));
        }
        self.network.invoice_number = Some(invoice_number);
        Ok(self)
    }

    pub fn with_card_sequence_number(&mut self, sequence: &str) -> Result<&mut Self> {
        self.ensure_draft()?;
        if sequence.is_empty() || sequence.len() > 3 || !is_digits(sequence) {
            return Err(PaymentError::validation(
                "card_sequence_number",
                format!("expected up to 3 digits, got {sequence:?}"),
            ));
        }
        self.network.card_sequence_number = Some(sequence.to_string());
        Ok(self)
    }

    pub fn with_ecommerce_auth_indicator(&mut self, indicator: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.network.ecommerce.auth_indicator = Some(indicator.into());
        Ok(self)
    }

    pub fn with_ecommerce_data1(&mut self, data: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.network.ecommerce.data1 = Some(data.into());
        Ok(self)
    }

    pub fn with_ecommerce_data2(&mut self, data: impl Into<String>) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.network.ecommerce.data2 = Some(data.into());
        Ok(self)
    }

    /// Flags a reversal sent because the terminal could not process the
    /// host's response.
    pub fn with_terminal_error(&mut self, terminal_error: bool) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.ensure_kind("terminal_error", &[TransactionType::Reverse])?;
        self.network.terminal_error = terminal_error;
        Ok(self)
    }

    pub fn with_simulated_host_errors(&mut self, simulation: HostErrorSimulation) -> Result<&mut Self> {
        self.ensure_draft()?;
        self.simulated_host_errors = Some(simulation);
        Ok(self)
    }

    /// Validates the accumulated state and freezes the builder.
    ///
    /// A failed validation leaves the builder editable.
    pub fn finalize(&mut self) -> Result<TransactionSpec> {
        self.ensure_draft()?;
        let operation = self.operation()?;
        let spec = TransactionSpec {
            operation,
            modifier: self.modifier(),
            idempotency_key: self.idempotency_key.clone(),
            gratuity: self.gratuity,
            allow_duplicates: self.allow_duplicates,
            request_multi_use_token: self.request_multi_use_token,
            address: self.address.clone(),
            payment_link_id: self.payment_link_id.clone(),
            network: self.network.clone(),
            simulated_host_errors: self.simulated_host_errors.clone(),
        };
        self.finalized = true;
        debug!(
            kind = %self.kind,
            modifier = ?spec.modifier,
            stan = ?spec.tracking().system_trace_audit_number,
            linked = spec.linkage().is_some(),
            "transaction spec finalized"
        );
        Ok(spec)
    }

    /// Retransmission takes precedence over multi-capture.
    fn modifier(&self) -> TransactionModifier {
        if self.network.prior_message.is_some() {
            TransactionModifier::Retransmission
        } else if self.multi_capture {
            TransactionModifier::MultiCapture
        } else {
            TransactionModifier::None
        }
    }

    fn operation(&self) -> Result<Operation> {
        let required_amount = || {
            self.amount
                .ok_or_else(|| PaymentError::validation("amount", "required"))
        };
        let required_currency = || {
            self.currency
                .ok_or_else(|| PaymentError::validation("currency", "required"))
        };
        let required_method = || {
            self.payment_method
                .clone()
                .ok_or_else(|| PaymentError::validation("payment_method", "required"))
        };
        let required_linkage = || {
            self.linkage.clone().ok_or_else(|| {
                PaymentError::validation(
                    "transaction_id",
                    format!("{} requires an originating transaction", self.kind),
                )
            })
        };

        let operation = match self.kind {
            TransactionType::Authorize => Operation::Authorize {
                amount: required_amount()?,
                currency: required_currency()?,
                payment_method: required_method()?,
                multi_capture: self.multi_capture,
            },
            TransactionType::Sale => Operation::Sale {
                amount: required_amount()?,
                currency: required_currency()?,
                payment_method: required_method()?,
            },
            TransactionType::Verify => Operation::Verify {
                currency: self.currency,
                payment_method: required_method()?,
            },
            TransactionType::Refund => match &self.linkage {
                Some(linkage) => Operation::Refund {
                    amount: self.amount,
                    currency: self.currency,
                    target: RefundTarget::Transaction(linkage.clone()),
                },
                None => Operation::Refund {
                    amount: Some(required_amount()?),
                    currency: Some(required_currency()?),
                    target: RefundTarget::PaymentMethod(required_method()?),
                },
            },
            TransactionType::Capture => Operation::Capture {
                amount: self.amount,
                currency: self.currency,
                linkage: required_linkage()?,
            },
            TransactionType::Reverse => Operation::Reverse {
                amount: self.amount,
                currency: self.currency,
                linkage: required_linkage()?,
            },
        };
        Ok(operation)
    }
}

fn validate_stan(field: &'static str, stan: u32) -> Result<u32> {
    if (1..=MAX_STAN).contains(&stan) {
        Ok(stan)
    } else {
        Err(PaymentError::validation(
            field,
            format!("must be between 1 and {MAX_STAN}, got {stan}"),
        ))
    }
}

fn is_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::PaymentMethodKind;
    use crate::domain::tags::TagKey;
    use rust_decimal_macros::dec;

    fn card() -> PaymentMethodRef {
        PaymentMethodRef::card("card-4263")
    }

    #[test]
    fn test_authorize_finalize() {
        let mut builder = TransactionBuilder::authorize(card(), dec!(14.00)).unwrap();
        builder
            .with_currency("usd")
            .unwrap()
            .with_idempotency_key("key-1")
            .unwrap()
            .with_multi_capture(true)
            .unwrap();
        let spec = builder.finalize().unwrap();

        assert_eq!(spec.kind(), TransactionType::Authorize);
        assert_eq!(spec.amount().unwrap().value(), dec!(14.00));
        assert_eq!(spec.currency().unwrap().as_str(), "USD");
        assert_eq!(spec.idempotency_key(), Some("key-1"));
        assert!(spec.is_multi_capture());
        assert_eq!(spec.modifier(), TransactionModifier::MultiCapture);
        assert_eq!(spec.payment_method().unwrap().kind(), PaymentMethodKind::Card);
        assert!(builder.is_finalized());
    }

    #[test]
    fn test_setters_fail_fast_naming_the_field() {
        assert!(matches!(
            TransactionBuilder::sale(card(), dec!(-1)),
            Err(PaymentError::ValidationError { field: "amount", .. })
        ));

        let mut builder = TransactionBuilder::sale(card(), dec!(1)).unwrap();
        assert!(matches!(
            builder.with_currency("DOLLARS"),
            Err(PaymentError::ValidationError { field: "currency", .. })
        ));
        assert!(matches!(
            builder.with_idempotency_key(""),
            Err(PaymentError::ValidationError { field: "idempotency_key", .. })
        ));
        assert!(matches!(
            builder.with_gratuity(dec!(-2)),
            Err(PaymentError::ValidationError { field: "gratuity", .. })
        ));
        assert!(matches!(
            builder.with_system_trace_audit_number(1_000_000),
            Err(PaymentError::ValidationError { field: "system_trace_audit_number", .. })
        ));
        assert!(matches!(
            builder.with_service_code("12a"),
            Err(PaymentError::ValidationError { field: "service_code", .. })
        ));
        assert!(matches!(
            builder.with_multi_capture(true),
            Err(PaymentError::ValidationError { field: "multi_capture", .. })
        ));
        assert!(matches!(
            builder.with_follow_on_stan(5),
            Err(PaymentError::ValidationError { field: "follow_on_stan", .. })
        ));
    }

    #[test]
    fn test_finalize_requires_currency() {
        let mut builder = TransactionBuilder::authorize(card(), dec!(5)).unwrap();
        assert!(matches!(
            builder.finalize(),
            Err(PaymentError::ValidationError { field: "currency", .. })
        ));
        // Still editable after a failed finalize.
        builder.with_currency("EUR").unwrap();
        assert!(builder.finalize().is_ok());
    }

    #[test]
    fn test_mutation_after_finalize_is_rejected() {
        let mut builder = TransactionBuilder::sale(card(), dec!(2.02)).unwrap();
        builder.with_currency("USD").unwrap();
        let spec = builder.finalize().unwrap();

        assert!(matches!(
            builder.with_amount(dec!(99)),
            Err(PaymentError::ImmutableStateError)
        ));
        assert!(matches!(
            builder.with_currency("EUR"),
            Err(PaymentError::ImmutableStateError)
        ));
        assert!(matches!(
            builder.with_issuer_data(IssuerTag::SwipeIndicator, "1"),
            Err(PaymentError::ImmutableStateError)
        ));
        assert!(matches!(
            builder.finalize(),
            Err(PaymentError::ImmutableStateError)
        ));
        // Invalid input after finalize still reports the frozen state first.
        assert!(matches!(
            builder.with_amount(dec!(-1)),
            Err(PaymentError::ImmutableStateError)
        ));
        assert_eq!(spec.amount().unwrap().value(), dec!(2.02));
        assert_eq!(spec.currency().unwrap().as_str(), "USD");
    }

    #[test]
    fn test_verify_has_no_amount() {
        let mut builder = TransactionBuilder::verify(card()).unwrap();
        assert!(matches!(
            builder.with_amount(dec!(1)),
            Err(PaymentError::ValidationError { field: "amount", .. })
        ));
        let spec = builder.finalize().unwrap();
        assert_eq!(spec.kind(), TransactionType::Verify);
        assert!(spec.amount().is_none());
        assert!(spec.currency().is_none());
    }

    #[test]
    fn test_standalone_refund_targets_payment_method() {
        let mut builder = TransactionBuilder::refund(card(), dec!(2.02)).unwrap();
        builder.with_currency("USD").unwrap();
        let spec = builder.finalize().unwrap();
        assert!(spec.linkage().is_none());
        assert!(spec.payment_method().is_some());
        assert!(matches!(
            spec.operation(),
            Operation::Refund {
                target: RefundTarget::PaymentMethod(_),
                ..
            }
        ));
    }

    #[test]
    fn test_issuer_data_keeps_insertion_order() {
        let mut builder = TransactionBuilder::sale(card(), dec!(1)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_issuer_data(IssuerTag::Other("A".into()), "1")
            .unwrap()
            .with_issuer_data(IssuerTag::Other("C".into()), "3")
            .unwrap()
            .with_issuer_data(IssuerTag::Other("B".into()), "2")
            .unwrap()
            .with_issuer_data(IssuerTag::Other("A".into()), "9")
            .unwrap();
        let spec = builder.finalize().unwrap();
        let issuer = &spec.network_fields().issuer_data;
        let order: Vec<&str> = issuer.keys().map(|k| k.code()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
        assert_eq!(issuer.get(&IssuerTag::Other("A".into())), Some("9"));
    }

    #[test]
    fn test_prior_message_marks_retransmission() {
        let mut builder = TransactionBuilder::sale(card(), dec!(1)).unwrap();
        builder.with_currency("USD").unwrap();
        assert!(builder
            .with_prior_message(PriorMessageInformation {
                message_type: "02".into(),
                transaction_code: "00".into(),
                ..Default::default()
            })
            .is_err());
        builder
            .with_prior_message(PriorMessageInformation {
                message_type: "0200".into(),
                transaction_code: "00".into(),
                system_trace_number: Some(77),
                ..Default::default()
            })
            .unwrap();
        let spec = builder.finalize().unwrap();
        assert_eq!(spec.modifier(), TransactionModifier::Retransmission);
        assert_eq!(
            spec.network_fields()
                .prior_message
                .as_ref()
                .unwrap()
                .system_trace_number,
            Some(77)
        );
    }

    #[test]
    fn test_modifier_ignores_setter_order() {
        let prior = || PriorMessageInformation {
            message_type: "0100".into(),
            transaction_code: "00".into(),
            ..Default::default()
        };

        let mut builder = TransactionBuilder::authorize(card(), dec!(1)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_prior_message(prior())
            .unwrap()
            .with_multi_capture(false)
            .unwrap();
        assert_eq!(builder.finalize().unwrap().modifier(), TransactionModifier::Retransmission);

        let mut builder = TransactionBuilder::authorize(card(), dec!(1)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_multi_capture(true)
            .unwrap()
            .with_prior_message(prior())
            .unwrap();
        let spec = builder.finalize().unwrap();
        assert_eq!(spec.modifier(), TransactionModifier::Retransmission);
        assert!(spec.is_multi_capture());
    }

    struct FixedGenerator;

    impl SequenceGenerator for FixedGenerator {
        fn next_stan(&self) -> u32 {
            4321
        }
        fn next_sequence(&self) -> u32 {
            12
        }
        fn batch_number(&self) -> u32 {
            3
        }
    }

    #[test]
    fn test_tracking_from_generator() {
        let mut builder = TransactionBuilder::authorize(card(), dec!(1)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_tracking_from(&FixedGenerator)
            .unwrap();
        let spec = builder.finalize().unwrap();
        let tracking = spec.tracking();
        assert_eq!(tracking.system_trace_audit_number, Some(4321));
        assert_eq!(tracking.sequence_number, Some(12));
        assert_eq!(tracking.batch_number, Some(3));
        assert_eq!(tracking.follow_on_stan, None);
    }
}
