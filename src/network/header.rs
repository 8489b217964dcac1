use crate::error::{PaymentError, Result};

/// Envelope header identifying the message to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkMessageHeader {
    /// Message code (NTS) or message type indicator (VAPS).
    pub message_type: String,
    pub processing_code: Option<String>,
    pub company_id: Option<String>,
    pub unit_number: Option<String>,
    pub terminal_id: Option<String>,
}

/// Tracing part of the envelope, as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMessageHeader {
    pub system_trace_audit_number: u32,
    pub sequence_number: Option<u32>,
    pub batch_number: Option<u32>,
    /// STAN of the originating message, for follow-ons.
    pub original_stan: Option<u32>,
    pub host_reference: Option<String>,
    pub terminal_error: bool,
}

/// Appends fixed-width ASCII fields, refusing values that do not fit.
pub(crate) struct FieldWriter {
    network: &'static str,
    buf: Vec<u8>,
}

impl FieldWriter {
    pub(crate) fn new(network: &'static str) -> Self {
        Self {
            network,
            buf: Vec::new(),
        }
    }

    fn overflow(&self, field: &str, value: &str, width: usize) -> PaymentError {
        PaymentError::encoding(
            self.network,
            field,
            format!("{} characters exceed the {width}-character field", value.len()),
        )
    }

    /// Zero-padded numeric field.
    pub(crate) fn numeric(&mut self, field: &str, value: u64, width: usize) -> Result<&mut Self> {
        let digits = value.to_string();
        if digits.len() > width {
            return Err(self.overflow(field, &digits, width));
        }
        self.buf
            .extend_from_slice(format!("{digits:0>width$}").as_bytes());
        Ok(self)
    }

    /// Zero-padded numeric field given as text.
    pub(crate) fn numeric_str(&mut self, field: &str, value: &str, width: usize) -> Result<&mut Self> {
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::encoding(
                self.network,
                field,
                format!("{value:?} is not numeric"),
            ));
        }
        if value.len() > width {
            return Err(self.overflow(field, value, width));
        }
        self.buf
            .extend_from_slice(format!("{value:0>width$}").as_bytes());
        Ok(self)
    }

    /// Space-padded alphanumeric field.
    pub(crate) fn alpha(&mut self, field: &str, value: &str, width: usize) -> Result<&mut Self> {
        self.ensure_printable(field, value)?;
        if value.len() > width {
            return Err(self.overflow(field, value, width));
        }
        self.buf
            .extend_from_slice(format!("{value:<width$}").as_bytes());
        Ok(self)
    }

    /// Two-digit length prefix followed by the value.
    pub(crate) fn variable(&mut self, field: &str, value: &str, max: usize) -> Result<&mut Self> {
        self.ensure_printable(field, value)?;
        if value.len() > max.min(99) {
            return Err(self.overflow(field, value, max.min(99)));
        }
        self.numeric(field, value.len() as u64, 2)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(self)
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn ensure_printable(&self, field: &str, value: &str) -> Result<()> {
        if value.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            Ok(())
        } else {
            Err(PaymentError::encoding(
                self.network,
                field,
                "only printable ASCII can be encoded",
            ))
        }
    }
}
