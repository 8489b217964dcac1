//! Turns raw host responses into domain results.
//!
//! Matching data is created for originating operations from the tracking
//! numbers that were actually rendered, and carried over unchanged for
//! follow-ons so a chain of captures keeps pointing at the authorization.

use crate::domain::operation::TransactionType;
use crate::domain::ports::RawResponse;
use crate::domain::reference::{TransactionReference, TransactionStatus};
use crate::domain::simulation::Host;
use crate::domain::spec::TransactionSpec;
use crate::domain::tracking::{TrackingNumbers, TransactionMatchingData};
use crate::error::{HostFault, PaymentError, Result, TransportFault};
use crate::network::{Envelope, FramedMessage};
use serde_json::Value;

/// Framed reply: response code, host reference, approval code.
const FRAMED_REPLY_LEN: usize = 2 + 12 + 6;

pub fn interpret(
    spec: &TransactionSpec,
    envelope: &Envelope,
    host: Host,
    response: RawResponse,
) -> Result<TransactionReference> {
    let malformed = PaymentError::TransportFailure {
        host,
        fault: TransportFault::MalformedResponse,
    };
    match (envelope, response) {
        (Envelope::Rest(_), RawResponse::Json { status, body }) => {
            interpret_json(spec, host, status, &body)
        }
        (Envelope::Framed(message), RawResponse::Bytes(bytes)) => {
            interpret_framed(spec, message, host, &bytes)
        }
        _ => Err(malformed),
    }
}

fn default_status(kind: TransactionType) -> TransactionStatus {
    match kind {
        TransactionType::Authorize => TransactionStatus::Preauthorized,
        TransactionType::Reverse => TransactionStatus::Reversed,
        TransactionType::Verify => TransactionStatus::Verified,
        TransactionType::Sale | TransactionType::Capture | TransactionType::Refund => {
            TransactionStatus::Captured
        }
    }
}

fn parse_status(status: &str) -> Option<TransactionStatus> {
    match status {
        "PREAUTHORIZED" => Some(TransactionStatus::Preauthorized),
        "CAPTURED" => Some(TransactionStatus::Captured),
        "REVERSED" => Some(TransactionStatus::Reversed),
        "VERIFIED" => Some(TransactionStatus::Verified),
        _ => None,
    }
}

fn text<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn interpret_json(
    spec: &TransactionSpec,
    host: Host,
    status: u16,
    body: &Value,
) -> Result<TransactionReference> {
    if status >= 400 {
        let fault = HostFault::new(
            status,
            text(body, "error_code"),
            text(body, "detailed_error_code"),
            text(body, "detailed_error_description"),
        );
        return Err(if status == 404 || fault.code == "RESOURCE_NOT_FOUND" {
            PaymentError::ResourceNotFound(fault)
        } else {
            PaymentError::GatewayRejected(fault)
        });
    }

    let id = body
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(PaymentError::TransportFailure {
            host,
            fault: TransportFault::MalformedResponse,
        })?;
    let status = parse_status(text(body, "status")).unwrap_or_else(|| default_status(spec.kind()));
    let token = body
        .pointer("/payment_method/id")
        .and_then(Value::as_str)
        .filter(|token| token.starts_with("PMT_"))
        .map(str::to_string);
    let multi_capture = spec.is_multi_capture() || text(body, "capture_mode") == "MULTIPLE";
    let matching = match spec.linkage() {
        Some(linkage) => linkage.matching().cloned(),
        None => Some(TransactionMatchingData::new(id, spec.tracking())),
    };

    Ok(TransactionReference::issued(id, status, matching)
        .with_amount(spec.amount(), spec.currency())
        .with_multi_capture(multi_capture)
        .with_token(token))
}

fn interpret_framed(
    spec: &TransactionSpec,
    message: &FramedMessage,
    host: Host,
    bytes: &[u8],
) -> Result<TransactionReference> {
    let reply = bytes
        .get(..FRAMED_REPLY_LEN)
        .and_then(|reply| std::str::from_utf8(reply).ok())
        .filter(|reply| reply.is_ascii())
        .ok_or(PaymentError::TransportFailure {
            host,
            fault: TransportFault::MalformedResponse,
        })?;
    let (code, rest) = reply.split_at(2);
    let (host_reference, approval) = rest.split_at(12);
    let host_reference = host_reference.trim();
    let approval = approval.trim();

    match code {
        "00" => {}
        "25" => {
            return Err(PaymentError::ResourceNotFound(HostFault::new(
                25,
                "RESOURCE_NOT_FOUND",
                code,
                "Original transaction not found",
            )));
        }
        _ => {
            return Err(PaymentError::GatewayRejected(HostFault::new(
                code.parse().unwrap_or_default(),
                "DECLINED",
                code,
                format!("Host response code {code}"),
            )));
        }
    }

    let matching = match spec.linkage() {
        Some(linkage) => linkage.matching().cloned(),
        None => {
            let header = &message.request_header;
            let rendered = TrackingNumbers {
                batch_number: header.batch_number,
                system_trace_audit_number: Some(header.system_trace_audit_number),
                sequence_number: header.sequence_number,
                ..TrackingNumbers::default()
            };
            let approval = (!approval.is_empty()).then(|| approval.to_string());
            Some(
                TransactionMatchingData::new(host_reference, &rendered)
                    .with_original_message(message.network_header.message_type.clone(), approval),
            )
        }
    };

    Ok(
        TransactionReference::issued(host_reference, default_status(spec.kind()), matching)
            .with_amount(spec.amount(), spec.currency())
            .with_multi_capture(spec.is_multi_capture()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::config::NetworkConfig;
    use crate::domain::operation::PaymentMethodRef;
    use crate::network::{Network, assemble};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn nts_authorize() -> (TransactionSpec, Envelope) {
        let mut builder = TransactionBuilder::authorize(PaymentMethodRef::card("c"), dec!(14)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_system_trace_audit_number(77)
            .unwrap()
            .with_batch_number(3)
            .unwrap()
            .with_sequence_number(1)
            .unwrap();
        let spec = builder.finalize().unwrap();
        let config = NetworkConfig {
            company_id: Some("1".into()),
            ..NetworkConfig::new(Network::Nts)
        };
        let envelope = assemble(&spec, &config).unwrap();
        (spec, envelope)
    }

    fn rest_sale() -> (TransactionSpec, Envelope) {
        let mut builder = TransactionBuilder::sale(PaymentMethodRef::card("c"), dec!(5)).unwrap();
        builder.with_currency("EUR").unwrap();
        let spec = builder.finalize().unwrap();
        let envelope = assemble(&spec, &NetworkConfig::default()).unwrap();
        (spec, envelope)
    }

    #[test]
    fn test_framed_approval_creates_matching_data() {
        let (spec, envelope) = nts_authorize();
        let reply = RawResponse::Bytes(b"00HOSTREF0001 APP123".to_vec());
        let reference = interpret(&spec, &envelope, Host::Primary, reply).unwrap();

        assert_eq!(reference.transaction_id(), "HOSTREF0001");
        assert_eq!(reference.status(), Some(TransactionStatus::Preauthorized));
        let matching = reference.matching_data().unwrap();
        assert_eq!(matching.host_reference(), "HOSTREF0001");
        assert_eq!(matching.system_trace_audit_number(), Some(77));
        assert_eq!(matching.batch_number(), Some(3));
        assert_eq!(matching.sequence_number(), Some(1));
        assert_eq!(matching.message_type(), Some("01"));
        assert_eq!(matching.approval_code(), Some("APP123"));
    }

    #[test]
    fn test_framed_decline_and_not_found() {
        let (spec, envelope) = nts_authorize();
        let declined = interpret(
            &spec,
            &envelope,
            Host::Primary,
            RawResponse::Bytes(b"05HOSTREF0001       ".to_vec()),
        );
        assert!(matches!(declined, Err(PaymentError::GatewayRejected(ref f)) if f.detail == "05"));

        let missing = interpret(
            &spec,
            &envelope,
            Host::Primary,
            RawResponse::Bytes(b"25HOSTREF0001       ".to_vec()),
        );
        assert!(matches!(missing, Err(PaymentError::ResourceNotFound(_))));
    }

    #[test]
    fn test_short_reply_is_malformed() {
        let (spec, envelope) = nts_authorize();
        assert!(matches!(
            interpret(&spec, &envelope, Host::Secondary, RawResponse::Bytes(b"00".to_vec())),
            Err(PaymentError::TransportFailure {
                host: Host::Secondary,
                fault: TransportFault::MalformedResponse
            })
        ));
    }

    #[test]
    fn test_json_success_with_token() {
        let (spec, envelope) = rest_sale();
        let body = json!({
            "id": "TRN_1",
            "status": "CAPTURED",
            "payment_method": {"id": "PMT_abc"}
        });
        let reference =
            interpret(&spec, &envelope, Host::Primary, RawResponse::Json { status: 200, body }).unwrap();
        assert_eq!(reference.transaction_id(), "TRN_1");
        assert_eq!(reference.status(), Some(TransactionStatus::Captured));
        assert_eq!(reference.token(), Some("PMT_abc"));
        assert_eq!(reference.amount().unwrap().value(), dec!(5));
    }

    #[test]
    fn test_json_errors_keep_host_text() {
        let (spec, envelope) = rest_sale();
        let body = json!({
            "error_code": "INVALID_REQUEST_DATA",
            "detailed_error_code": "40087",
            "detailed_error_description": "You cannot capture more than the original amount"
        });
        match interpret(&spec, &envelope, Host::Primary, RawResponse::Json { status: 400, body }) {
            Err(PaymentError::GatewayRejected(fault)) => {
                assert_eq!(fault.status, 400);
                assert_eq!(fault.code, "INVALID_REQUEST_DATA");
                assert_eq!(fault.detail, "40087");
                assert_eq!(fault.message, "You cannot capture more than the original amount");
            }
            other => panic!("expected GatewayRejected, got {other:?}"),
        }

        let body = json!({"error_code": "RESOURCE_NOT_FOUND"});
        assert!(matches!(
            interpret(&spec, &envelope, Host::Primary, RawResponse::Json { status: 404, body }),
            Err(PaymentError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_json_without_id_is_malformed() {
        let (spec, envelope) = rest_sale();
        let response = RawResponse::Json {
            status: 200,
            body: json!({"status": "CAPTURED"}),
        };
        assert!(matches!(
            interpret(&spec, &envelope, Host::Primary, response),
            Err(PaymentError::TransportFailure { .. })
        ));
    }
}
