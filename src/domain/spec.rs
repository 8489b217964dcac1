use super::money::{Amount, Currency};
use super::operation::{
    Address, EcommerceData, PaymentMethodRef, TransactionModifier, TransactionType,
};
use super::simulation::HostErrorSimulation;
use super::tags::{FleetData, IssuerData, ProductData};
use super::tracking::{PriorMessageInformation, TrackingNumbers, TransactionMatchingData};

/// Reference from a follow-on operation to its originating transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linkage {
    pub(crate) transaction_id: String,
    pub(crate) matching: Option<TransactionMatchingData>,
}

impl Linkage {
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn matching(&self) -> Option<&TransactionMatchingData> {
        self.matching.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundTarget {
    PaymentMethod(PaymentMethodRef),
    Transaction(Linkage),
}

/// Operation-specific part of a finalized spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Authorize {
        amount: Amount,
        currency: Currency,
        payment_method: PaymentMethodRef,
        multi_capture: bool,
    },
    Sale {
        amount: Amount,
        currency: Currency,
        payment_method: PaymentMethodRef,
    },
    Verify {
        currency: Option<Currency>,
        payment_method: PaymentMethodRef,
    },
    Refund {
        amount: Option<Amount>,
        currency: Option<Currency>,
        target: RefundTarget,
    },
    Capture {
        amount: Option<Amount>,
        currency: Option<Currency>,
        linkage: Linkage,
    },
    Reverse {
        amount: Option<Amount>,
        currency: Option<Currency>,
        linkage: Linkage,
    },
}

/// Network-level fields shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkFields {
    pub tracking: TrackingNumbers,
    pub issuer_data: IssuerData,
    pub product_data: Option<ProductData>,
    pub fleet_data: Option<FleetData>,
    pub prior_message: Option<PriorMessageInformation>,
    pub service_code: Option<String>,
    pub invoice_number: Option<String>,
    pub card_sequence_number: Option<String>,
    pub ecommerce: EcommerceData,
    pub terminal_error: bool,
}

/// Immutable snapshot produced by
/// [`TransactionBuilder::finalize`](crate::builder::TransactionBuilder::finalize).
///
/// All fields are private; the snapshot can only be read.
#[derive(Debug, Clone)]
pub struct TransactionSpec {
    pub(crate) operation: Operation,
    pub(crate) modifier: TransactionModifier,
    pub(crate) idempotency_key: Option<String>,
    pub(crate) gratuity: Option<Amount>,
    pub(crate) allow_duplicates: bool,
    pub(crate) request_multi_use_token: bool,
    pub(crate) address: Option<Address>,
    pub(crate) payment_link_id: Option<String>,
    pub(crate) network: NetworkFields,
    pub(crate) simulated_host_errors: Option<HostErrorSimulation>,
}

impl TransactionSpec {
    pub fn kind(&self) -> TransactionType {
        match &self.operation {
            Operation::Authorize { .. } => TransactionType::Authorize,
            Operation::Sale { .. } => TransactionType::Sale,
            Operation::Verify { .. } => TransactionType::Verify,
            Operation::Refund { .. } => TransactionType::Refund,
            Operation::Capture { .. } => TransactionType::Capture,
            Operation::Reverse { .. } => TransactionType::Reverse,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn modifier(&self) -> TransactionModifier {
        self.modifier
    }

    pub fn amount(&self) -> Option<Amount> {
        match &self.operation {
            Operation::Authorize { amount, .. } | Operation::Sale { amount, .. } => Some(*amount),
            Operation::Verify { .. } => None,
            Operation::Refund { amount, .. }
            | Operation::Capture { amount, .. }
            | Operation::Reverse { amount, .. } => *amount,
        }
    }

    pub fn currency(&self) -> Option<Currency> {
        match &self.operation {
            Operation::Authorize { currency, .. } | Operation::Sale { currency, .. } => {
                Some(*currency)
            }
            Operation::Verify { currency, .. }
            | Operation::Refund { currency, .. }
            | Operation::Capture { currency, .. }
            | Operation::Reverse { currency, .. } => *currency,
        }
    }

    pub fn payment_method(&self) -> Option<&PaymentMethodRef> {
        match &self.operation {
            Operation::Authorize { payment_method, .. }
            | Operation::Sale { payment_method, .. }
            | Operation::Verify { payment_method, .. } => Some(payment_method),
            Operation::Refund {
                target: RefundTarget::PaymentMethod(payment_method),
                ..
            } => Some(payment_method),
            _ => None,
        }
    }

    /// The originating transaction, for follow-on operations.
    pub fn linkage(&self) -> Option<&Linkage> {
        match &self.operation {
            Operation::Capture { linkage, .. } | Operation::Reverse { linkage, .. } => {
                Some(linkage)
            }
            Operation::Refund {
                target: RefundTarget::Transaction(linkage),
                ..
            } => Some(linkage),
            _ => None,
        }
    }

    pub fn is_multi_capture(&self) -> bool {
        matches!(
            self.operation,
            Operation::Authorize {
                multi_capture: true,
                ..
            }
        )
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    pub fn gratuity(&self) -> Option<Amount> {
        self.gratuity
    }

    pub fn allow_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    pub fn request_multi_use_token(&self) -> bool {
        self.request_multi_use_token
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn payment_link_id(&self) -> Option<&str> {
        self.payment_link_id.as_deref()
    }

    pub fn network_fields(&self) -> &NetworkFields {
        &self.network
    }

    pub fn tracking(&self) -> &TrackingNumbers {
        &self.network.tracking
    }

    pub fn simulated_host_errors(&self) -> Option<&HostErrorSimulation> {
        self.simulated_host_errors.as_ref()
    }
}
