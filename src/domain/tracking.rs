/// Network tracing numbers carried by a single message.
///
/// The engine never allocates these values; they come from the caller, a
/// [`SequenceGenerator`](crate::domain::ports::SequenceGenerator) or the
/// linking step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackingNumbers {
    pub batch_number: Option<u32>,
    pub system_trace_audit_number: Option<u32>,
    pub sequence_number: Option<u32>,
    /// Fresh STAN for networks that trace follow-ons independently.
    pub follow_on_stan: Option<u32>,
    pub unique_device_id: Option<String>,
    pub company_id: Option<String>,
}

/// Identifiers captured from an originating transaction.
///
/// Built once when the originating result is created and read-only from then
/// on: there are no setters, only accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMatchingData {
    host_reference: String,
    batch_number: Option<u32>,
    system_trace_audit_number: Option<u32>,
    sequence_number: Option<u32>,
    message_type: Option<String>,
    approval_code: Option<String>,
}

impl TransactionMatchingData {
    pub fn new(host_reference: impl Into<String>, tracking: &TrackingNumbers) -> Self {
        Self {
            host_reference: host_reference.into(),
            batch_number: tracking.batch_number,
            system_trace_audit_number: tracking.system_trace_audit_number,
            sequence_number: tracking.sequence_number,
            message_type: None,
            approval_code: None,
        }
    }

    /// Records the message type and approval code of the originating message.
    pub fn with_original_message(
        mut self,
        message_type: impl Into<String>,
        approval_code: Option<String>,
    ) -> Self {
        self.message_type = Some(message_type.into());
        self.approval_code = approval_code;
        self
    }

    pub fn host_reference(&self) -> &str {
        &self.host_reference
    }

    pub fn batch_number(&self) -> Option<u32> {
        self.batch_number
    }

    pub fn system_trace_audit_number(&self) -> Option<u32> {
        self.system_trace_audit_number
    }

    pub fn sequence_number(&self) -> Option<u32> {
        self.sequence_number
    }

    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    pub fn approval_code(&self) -> Option<&str> {
        self.approval_code.as_deref()
    }
}

/// Identifying fields of a previously sent message, for retransmissions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriorMessageInformation {
    pub message_type: String,
    pub transaction_code: String,
    pub banknet_reference: Option<String>,
    pub authorization_code: Option<String>,
    /// `YYMMDD`
    pub central_processing_date: Option<String>,
    /// `hhmmss`
    pub central_processing_time: Option<String>,
    pub system_trace_number: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_data_snapshots_tracking() {
        let mut tracking = TrackingNumbers {
            batch_number: Some(7),
            system_trace_audit_number: Some(123456),
            sequence_number: Some(42),
            ..Default::default()
        };
        let matching = TransactionMatchingData::new("REF0001", &tracking)
            .with_original_message("0100", Some("A1B2C3".to_string()));

        // Later changes to the caller's tracking must not leak in.
        tracking.system_trace_audit_number = Some(1);

        assert_eq!(matching.system_trace_audit_number(), Some(123456));
        assert_eq!(matching.batch_number(), Some(7));
        assert_eq!(matching.sequence_number(), Some(42));
        assert_eq!(matching.host_reference(), "REF0001");
        assert_eq!(matching.message_type(), Some("0100"));
        assert_eq!(matching.approval_code(), Some("A1B2C3"));
    }
}
