//! Linking follow-on operations to their originating transaction.
//!
//! A capture, refund or reverse built from a [`TransactionReference`] replays
//! the originating matching data verbatim: STAN, batch and sequence number
//! are copied into the follow-on's tracking numbers and become read-only,
//! and the host reference travels with the linkage. Nothing is recomputed
//! or defaulted. Business limits (over-capture, refund percentages, repeated
//! captures) are left to the host.

use super::TransactionBuilder;
use crate::domain::operation::TransactionType;
use crate::domain::reference::TransactionReference;
use crate::domain::spec::{Linkage, TransactionSpec};
use crate::domain::tracking::TransactionMatchingData;
use crate::error::{PaymentError, Result};
use crate::network::Network;
use tracing::debug;

/// A piece of matching data a network may insist on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingField {
    HostReference,
    SystemTraceAuditNumber,
    BatchNumber,
    SequenceNumber,
    MessageType,
}

impl MatchingField {
    pub fn name(&self) -> &'static str {
        match self {
            MatchingField::HostReference => "host_reference",
            MatchingField::SystemTraceAuditNumber => "system_trace_audit_number",
            MatchingField::BatchNumber => "batch_number",
            MatchingField::SequenceNumber => "sequence_number",
            MatchingField::MessageType => "message_type",
        }
    }

    fn is_present(&self, matching: &TransactionMatchingData) -> bool {
        match self {
            MatchingField::HostReference => !matching.host_reference().is_empty(),
            MatchingField::SystemTraceAuditNumber => matching.system_trace_audit_number().is_some(),
            MatchingField::BatchNumber => matching.batch_number().is_some(),
            MatchingField::SequenceNumber => matching.sequence_number().is_some(),
            MatchingField::MessageType => matching.message_type().is_some(),
        }
    }
}

/// Identifiers end up as a REST path segment, so only unreserved
/// characters are accepted.
fn validate_transaction_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(PaymentError::validation("transaction_id", "must not be empty"));
    }
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '~');
    if !id.chars().all(unreserved) || id.chars().all(|c| c == '.') {
        return Err(PaymentError::validation(
            "transaction_id",
            format!("{id:?} is not a valid transaction identifier"),
        ));
    }
    Ok(())
}

/// Starts a follow-on builder against `origin`.
///
/// The amount and currency default to the originating ones and may be
/// overridden with [`TransactionBuilder::with_amount`].
pub fn follow_on(origin: &TransactionReference, kind: TransactionType) -> Result<TransactionBuilder> {
    if !kind.is_follow_on() {
        return Err(PaymentError::validation(
            "transaction_type",
            format!("{kind} cannot follow on from another transaction"),
        ));
    }
    validate_transaction_id(origin.transaction_id())?;

    let linkage = Linkage {
        transaction_id: origin.transaction_id().to_string(),
        matching: origin.matching_data().cloned(),
    };
    let mut builder = TransactionBuilder::linked(kind, linkage);
    builder.amount = origin.amount();
    builder.currency = origin.currency();

    if let Some(matching) = origin.matching_data() {
        let tracking = &mut builder.network.tracking;
        tracking.system_trace_audit_number = matching.system_trace_audit_number();
        tracking.batch_number = matching.batch_number();
        tracking.sequence_number = matching.sequence_number();
    }

    debug!(
        %kind,
        transaction_id = origin.transaction_id(),
        has_matching_data = origin.matching_data().is_some(),
        "linked follow-on operation"
    );
    Ok(builder)
}

impl TransactionReference {
    pub fn capture(&self) -> Result<TransactionBuilder> {
        follow_on(self, TransactionType::Capture)
    }

    pub fn refund(&self) -> Result<TransactionBuilder> {
        follow_on(self, TransactionType::Refund)
    }

    pub fn reverse(&self) -> Result<TransactionBuilder> {
        follow_on(self, TransactionType::Reverse)
    }
}

/// Checks that a follow-on carries the matching data `network` requires.
///
/// Networks addressing transactions purely by identifier require nothing
/// and always pass.
pub fn ensure_matching_data(spec: &TransactionSpec, network: Network) -> Result<()> {
    let Some(linkage) = spec.linkage() else {
        return Ok(());
    };
    let required = network.required_matching_fields();
    if required.is_empty() {
        return Ok(());
    }

    let missing = |field: &'static str| PaymentError::MissingMatchingData {
        network: network.name(),
        field,
    };
    let matching = linkage
        .matching()
        .ok_or_else(|| missing("transaction_matching_data"))?;
    match required.iter().find(|field| !field.is_present(matching)) {
        Some(field) => Err(missing(field.name())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::domain::operation::PaymentMethodRef;
    use crate::domain::reference::TransactionStatus;
    use crate::domain::tracking::TrackingNumbers;
    use rust_decimal_macros::dec;

    fn authorized() -> TransactionReference {
        let tracking = TrackingNumbers {
            system_trace_audit_number: Some(123456),
            batch_number: Some(7),
            sequence_number: Some(42),
            ..Default::default()
        };
        let matching =
            TransactionMatchingData::new("HOST000001", &tracking).with_original_message("0100", None);
        TransactionReference::issued("TRN_1", TransactionStatus::Preauthorized, Some(matching))
            .with_amount(Some(crate::domain::money::Amount::new(dec!(14)).unwrap()), Some("USD".parse().unwrap()))
    }

    #[test]
    fn test_capture_copies_matching_data() {
        let mut builder = authorized().capture().unwrap();
        let spec = builder.finalize().unwrap();

        assert_eq!(spec.kind(), TransactionType::Capture);
        assert_eq!(spec.tracking().system_trace_audit_number, Some(123456));
        assert_eq!(spec.tracking().batch_number, Some(7));
        assert_eq!(spec.tracking().sequence_number, Some(42));
        assert_eq!(
            spec.linkage().unwrap().matching().unwrap().host_reference(),
            "HOST000001"
        );
        // Defaults to the authorized amount.
        assert_eq!(spec.amount().unwrap().value(), dec!(14));
        assert_eq!(spec.currency().unwrap().as_str(), "USD");
    }

    #[test]
    fn test_amount_override_is_not_limited_locally() {
        let mut builder = authorized().capture().unwrap();
        builder.with_amount(dec!(16)).unwrap().with_gratuity(dec!(2)).unwrap();
        let spec = builder.finalize().unwrap();
        assert_eq!(spec.amount().unwrap().value(), dec!(16));
        assert_eq!(spec.gratuity().unwrap().value(), dec!(2));
    }

    #[test]
    fn test_inherited_tracking_is_read_only() {
        let mut builder = authorized().reverse().unwrap();
        assert!(matches!(
            builder.with_system_trace_audit_number(1),
            Err(PaymentError::ValidationError { field: "system_trace_audit_number", .. })
        ));
        assert!(matches!(
            builder.with_batch_number(1),
            Err(PaymentError::ValidationError { field: "batch_number", .. })
        ));
        builder.with_follow_on_stan(555).unwrap();
        let spec = builder.finalize().unwrap();
        assert_eq!(spec.tracking().system_trace_audit_number, Some(123456));
        assert_eq!(spec.tracking().follow_on_stan, Some(555));
    }

    #[test]
    fn test_bare_reference_links_by_id_only() {
        let origin = TransactionReference::from_id("TRN_external");
        let mut builder = origin.refund().unwrap();
        builder.with_amount(dec!(2.02)).unwrap().with_currency("USD").unwrap();
        let spec = builder.finalize().unwrap();

        assert_eq!(spec.linkage().unwrap().transaction_id(), "TRN_external");
        assert!(spec.linkage().unwrap().matching().is_none());
        assert_eq!(spec.tracking().system_trace_audit_number, None);

        assert!(ensure_matching_data(&spec, Network::GpApi).is_ok());
        assert!(matches!(
            ensure_matching_data(&spec, Network::Nts),
            Err(PaymentError::MissingMatchingData {
                network: "NTS",
                field: "transaction_matching_data"
            })
        ));
    }

    #[test]
    fn test_partial_matching_data_names_missing_field() {
        let matching = TransactionMatchingData::new("HOST2", &TrackingNumbers::default());
        let origin =
            TransactionReference::issued("TRN_2", TransactionStatus::Captured, Some(matching));
        let spec = origin.reverse().unwrap().finalize().unwrap();
        assert!(matches!(
            ensure_matching_data(&spec, Network::Nts),
            Err(PaymentError::MissingMatchingData {
                field: "system_trace_audit_number",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_follow_on_kinds() {
        assert!(follow_on(&authorized(), TransactionType::Sale).is_err());
        assert!(TransactionReference::from_id(" ").capture().is_err());
    }

    #[test]
    fn test_rejects_identifiers_that_escape_the_path() {
        for id in ["TRN_1/../../admin?x=", "TRN_1#frag", "TRN%2F1", "TRN 1", "..", "TRN_1\n"] {
            assert!(
                matches!(
                    TransactionReference::from_id(id).capture(),
                    Err(PaymentError::ValidationError { field: "transaction_id", .. })
                ),
                "{id:?}"
            );
        }
        assert!(TransactionReference::from_id("TRN_a-b.c~1").refund().is_ok());
    }

    #[test]
    fn test_originating_specs_need_no_matching_data() {
        let mut builder =
            TransactionBuilder::authorize(PaymentMethodRef::card("c"), dec!(1)).unwrap();
        builder.with_currency("USD").unwrap();
        let spec = builder.finalize().unwrap();
        assert!(ensure_matching_data(&spec, Network::Vaps).is_ok());
    }
}
