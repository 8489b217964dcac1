use super::money::{Amount, Currency};
use super::tracking::TransactionMatchingData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Preauthorized,
    Captured,
    Reversed,
    Verified,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Preauthorized => "PREAUTHORIZED",
            TransactionStatus::Captured => "CAPTURED",
            TransactionStatus::Reversed => "REVERSED",
            TransactionStatus::Verified => "VERIFIED",
        }
    }
}

/// A transaction known to a host, and the origin of any follow-on.
///
/// Matching data is fixed when the reference is created and cannot be
/// replaced afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReference {
    transaction_id: String,
    status: Option<TransactionStatus>,
    amount: Option<Amount>,
    currency: Option<Currency>,
    multi_capture: bool,
    token: Option<String>,
    matching: Option<TransactionMatchingData>,
}

impl TransactionReference {
    /// A transaction known only by its identifier, e.g. one created outside
    /// this engine.
    pub fn from_id(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            status: None,
            amount: None,
            currency: None,
            multi_capture: false,
            token: None,
            matching: None,
        }
    }

    /// A transaction reported by a host, with its matching data.
    pub fn issued(
        transaction_id: impl Into<String>,
        status: TransactionStatus,
        matching: Option<TransactionMatchingData>,
    ) -> Self {
        Self {
            status: Some(status),
            matching,
            ..Self::from_id(transaction_id)
        }
    }

    pub fn with_amount(mut self, amount: Option<Amount>, currency: Option<Currency>) -> Self {
        self.amount = amount;
        self.currency = currency;
        self
    }

    pub fn with_multi_capture(mut self, multi_capture: bool) -> Self {
        self.multi_capture = multi_capture;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        self.status
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn currency(&self) -> Option<Currency> {
        self.currency
    }

    pub fn is_multi_capture(&self) -> bool {
        self.multi_capture
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn matching_data(&self) -> Option<&TransactionMatchingData> {
        self.matching.as_ref()
    }
}
