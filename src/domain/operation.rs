use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Authorize,
    Capture,
    #[serde(alias = "charge")]
    Sale,
    Refund,
    Reverse,
    Verify,
}

impl TransactionType {
    /// Operations that must reference an earlier transaction.
    ///
    /// Refund is listed here only when linked; a standalone refund against a
    /// payment method is decided by the builder.
    pub fn is_follow_on(&self) -> bool {
        matches!(
            self,
            TransactionType::Capture | TransactionType::Refund | TransactionType::Reverse
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Authorize => "authorize",
            TransactionType::Capture => "capture",
            TransactionType::Sale => "sale",
            TransactionType::Refund => "refund",
            TransactionType::Reverse => "reverse",
            TransactionType::Verify => "verify",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum TransactionModifier {
    #[default]
    None,
    /// Authorization that may be captured several times.
    MultiCapture,
    /// Resend of a message the host may already have seen.
    Retransmission,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PaymentMethodKind {
    Card,
    Token,
}

/// Opaque handle to caller-owned payment data.
///
/// The engine never inspects the handle; it only forwards it to the
/// network renderer.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentMethodRef {
    kind: PaymentMethodKind,
    handle: String,
}

impl PaymentMethodRef {
    pub fn card(handle: impl Into<String>) -> Self {
        Self {
            kind: PaymentMethodKind::Card,
            handle: handle.into(),
        }
    }

    pub fn token(handle: impl Into<String>) -> Self {
        Self {
            kind: PaymentMethodKind::Token,
            handle: handle.into(),
        }
    }

    pub fn kind(&self) -> PaymentMethodKind {
        self.kind
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }
}

// Handles may be card references; keep them out of logs and panics.
impl fmt::Debug for PaymentMethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentMethodRef")
            .field("kind", &self.kind)
            .field("handle", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "line_1", skip_serializing_if = "Option::is_none")]
    pub street_address1: Option<String>,
    #[serde(rename = "line_2", skip_serializing_if = "Option::is_none")]
    pub street_address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street_address1.is_none()
            && self.street_address2.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }
}

/// Ecommerce indicators carried by fixed-field networks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EcommerceData {
    pub auth_indicator: Option<String>,
    pub data1: Option<String>,
    pub data2: Option<String>,
}
