use crate::domain::simulation::Host;
use std::fmt;
use thiserror::Error;

/// The host's own description of why it refused a request.
///
/// Every field is carried verbatim from the host response and never
/// reinterpreted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFault {
    /// Protocol status (HTTP status for REST hosts, response code for
    /// fixed-field hosts).
    pub status: u16,
    /// Symbolic error code, e.g. `INVALID_REQUEST_DATA`.
    pub code: String,
    /// Detailed numeric code, e.g. `40087`.
    pub detail: String,
    pub message: String,
}

impl HostFault {
    pub fn new(
        status: u16,
        code: impl Into<String>,
        detail: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            detail: detail.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status Code: {} - {} ({}/{})",
            self.status, self.message, self.code, self.detail
        )
    }
}

/// Failures raised below the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    Timeout,
    ConnectionReset,
    MalformedResponse,
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransportFault::Timeout => "timed out waiting for host response",
            TransportFault::ConnectionReset => "connection reset by host",
            TransportFault::MalformedResponse => "host response could not be parsed",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid value for `{field}`: {reason}")]
    ValidationError { field: &'static str, reason: String },
    #[error("Transaction spec is finalized and can no longer be modified")]
    ImmutableStateError,
    #[error("{network} requires `{field}` from the originating transaction")]
    MissingMatchingData {
        network: &'static str,
        field: &'static str,
    },
    #[error("Cannot encode `{field}` for {network}: {reason}")]
    EncodingError {
        network: &'static str,
        field: String,
        reason: String,
    },
    #[error("Gateway rejected request: {0}")]
    GatewayRejected(HostFault),
    #[error("Resource not found: {0}")]
    ResourceNotFound(HostFault),
    #[error("Transport failure on {host} host: {fault}")]
    TransportFailure { host: Host, fault: TransportFault },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PaymentError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        PaymentError::ValidationError {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(
        network: &'static str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PaymentError::EncodingError {
            network,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was detected locally, before any host contact.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PaymentError::ValidationError { .. }
                | PaymentError::ImmutableStateError
                | PaymentError::MissingMatchingData { .. }
                | PaymentError::EncodingError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
