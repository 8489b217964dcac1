//! GP-API rendering: a structural mapping of a transaction into a JSON request.
//!
//! Optional fields the caller never set are omitted from the payload rather
//! than sent empty.

use crate::domain::money::Amount;
use crate::domain::operation::{Address, PaymentMethodKind, PaymentMethodRef};
use crate::domain::spec::{Operation, RefundTarget, TransactionSpec};
use crate::error::{PaymentError, Result};
use serde::Serialize;
use serde_json::{Value, json};

const NETWORK: &str = "GP-API";
pub const IDEMPOTENCY_HEADER: &str = "x-gp-idempotency";

#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: &'static str,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RestRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn to_json(&self) -> Value {
        let headers: serde_json::Map<String, Value> = self
            .headers
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        json!({
            "method": self.method,
            "path": self.path,
            "headers": headers,
            "body": self.body,
        })
    }
}

#[derive(Serialize)]
struct CardBody<'a> {
    reference: &'a str,
}

#[derive(Serialize)]
struct PaymentMethodBody<'a> {
    entry_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card: Option<CardBody<'a>>,
}

impl<'a> PaymentMethodBody<'a> {
    fn from_ref(method: &'a PaymentMethodRef) -> Self {
        match method.kind() {
            PaymentMethodKind::Token => Self {
                entry_mode: "ECOM",
                id: Some(method.handle()),
                card: None,
            },
            PaymentMethodKind::Card => Self {
                entry_mode: "ECOM",
                id: None,
                card: Some(CardBody {
                    reference: method.handle(),
                }),
            },
        }
    }
}

#[derive(Serialize)]
struct TransactionBody<'a> {
    channel: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture_mode: Option<&'static str>,
    amount: String,
    currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gratuity_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_link_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_duplicates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a Address>,
    payment_method: PaymentMethodBody<'a>,
}

#[derive(Serialize)]
struct VerificationBody<'a> {
    channel: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a Address>,
    payment_method: PaymentMethodBody<'a>,
}

#[derive(Serialize)]
struct FollowOnBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gratuity_amount: Option<String>,
}

fn minor_units(field: &str, amount: Amount) -> Result<String> {
    amount.minor_units().map(|units| units.to_string()).ok_or_else(|| {
        PaymentError::encoding(
            NETWORK,
            field,
            format!("{amount} does not fit whole minor units"),
        )
    })
}

fn optional_minor_units(field: &str, amount: Option<Amount>) -> Result<Option<String>> {
    amount.map(|amount| minor_units(field, amount)).transpose()
}

pub fn render(spec: &TransactionSpec) -> Result<RestRequest> {
    let storage_mode = spec.request_multi_use_token().then_some("ON_SUCCESS");
    let allow_duplicates = spec.allow_duplicates().then_some(true);

    let transaction_body = |kind: &'static str,
                            capture_mode: Option<&'static str>,
                            amount: Amount,
                            currency: String,
                            method: &PaymentMethodRef|
     -> Result<Value> {
        let body = TransactionBody {
            channel: "CNP",
            kind,
            capture_mode,
            amount: minor_units("amount", amount)?,
            currency,
            gratuity_amount: optional_minor_units("gratuity_amount", spec.gratuity())?,
            storage_mode,
            payment_link_id: spec.payment_link_id(),
            allow_duplicates,
            address: spec.address(),
            payment_method: PaymentMethodBody::from_ref(method),
        };
        Ok(serde_json::to_value(body)?)
    };
    let follow_on_body = |amount: Option<Amount>, currency: Option<String>| -> Result<Value> {
        let body = FollowOnBody {
            amount: optional_minor_units("amount", amount)?,
            currency,
            gratuity_amount: optional_minor_units("gratuity_amount", spec.gratuity())?,
        };
        Ok(serde_json::to_value(body)?)
    };

    let (path, body) = match spec.operation() {
        Operation::Authorize {
            amount,
            currency,
            payment_method,
            multi_capture,
        } => {
            let capture_mode = if *multi_capture { "MULTIPLE" } else { "LATER" };
            let body = transaction_body(
                "SALE",
                Some(capture_mode),
                *amount,
                currency.to_string(),
                payment_method,
            )?;
            ("/transactions".to_string(), body)
        }
        Operation::Sale {
            amount,
            currency,
            payment_method,
        } => {
            let body =
                transaction_body("SALE", Some("AUTO"), *amount, currency.to_string(), payment_method)?;
            ("/transactions".to_string(), body)
        }
        Operation::Refund {
            amount,
            currency,
            target: RefundTarget::PaymentMethod(payment_method),
        } => {
            let amount = amount.ok_or_else(|| {
                PaymentError::encoding(NETWORK, "amount", "required by the network but absent")
            })?;
            let currency = currency.map(|c| c.to_string()).unwrap_or_default();
            let body = transaction_body("REFUND", None, amount, currency, payment_method)?;
            ("/transactions".to_string(), body)
        }
        Operation::Refund {
            amount,
            currency,
            target: RefundTarget::Transaction(linkage),
        } => (
            format!("/transactions/{}/refund", linkage.transaction_id()),
            follow_on_body(*amount, currency.map(|c| c.to_string()))?,
        ),
        Operation::Capture {
            amount,
            currency,
            linkage,
        } => (
            format!("/transactions/{}/capture", linkage.transaction_id()),
            follow_on_body(*amount, currency.map(|c| c.to_string()))?,
        ),
        Operation::Reverse {
            amount, linkage, ..
        } => (
            format!("/transactions/{}/reversal", linkage.transaction_id()),
            follow_on_body(*amount, None)?,
        ),
        Operation::Verify {
            currency,
            payment_method,
        } => {
            let body = VerificationBody {
                channel: "CNP",
                currency: currency.map(|c| c.to_string()),
                storage_mode,
                address: spec.address(),
                payment_method: PaymentMethodBody::from_ref(payment_method),
            };
            ("/verifications".to_string(), serde_json::to_value(body)?)
        }
    };

    let mut headers = Vec::new();
    if let Some(key) = spec.idempotency_key() {
        headers.push((IDEMPOTENCY_HEADER.to_string(), key.to_string()));
    }

    Ok(RestRequest {
        method: "POST",
        path,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::domain::reference::TransactionReference;
    use rust_decimal_macros::dec;

    fn card() -> PaymentMethodRef {
        PaymentMethodRef::card("card-1")
    }

    #[test]
    fn test_authorize_payload() {
        let mut builder = TransactionBuilder::authorize(card(), dec!(2.02)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_idempotency_key("idem-1")
            .unwrap();
        let request = render(&builder.finalize().unwrap()).unwrap();

        assert_eq!(request.path, "/transactions");
        assert_eq!(request.header(IDEMPOTENCY_HEADER), Some("idem-1"));
        assert_eq!(
            request.body,
            json!({
                "channel": "CNP",
                "type": "SALE",
                "capture_mode": "LATER",
                "amount": "202",
                "currency": "USD",
                "payment_method": {"entry_mode": "ECOM", "card": {"reference": "card-1"}}
            })
        );
    }

    #[test]
    fn test_sale_with_token_request_and_address() {
        let mut builder = TransactionBuilder::sale(card(), dec!(19.99)).unwrap();
        builder
            .with_currency("USD")
            .unwrap()
            .with_request_multi_use_token(true)
            .unwrap()
            .with_address(Address {
                street_address1: Some("123 Main St.".into()),
                city: Some("Downtown".into()),
                ..Default::default()
            })
            .unwrap();
        let request = render(&builder.finalize().unwrap()).unwrap();
        assert_eq!(request.body["capture_mode"], "AUTO");
        assert_eq!(request.body["storage_mode"], "ON_SUCCESS");
        assert_eq!(request.body["address"]["line_1"], "123 Main St.");
        assert!(request.body["address"].get("postal_code").is_none());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_multi_capture_authorization() {
        let mut builder = TransactionBuilder::authorize(PaymentMethodRef::token("PMT_1"), dec!(14)).unwrap();
        builder.with_currency("USD").unwrap().with_multi_capture(true).unwrap();
        let request = render(&builder.finalize().unwrap()).unwrap();
        assert_eq!(request.body["capture_mode"], "MULTIPLE");
        assert_eq!(request.body["payment_method"]["id"], "PMT_1");
        assert!(request.body["payment_method"].get("card").is_none());
    }

    #[test]
    fn test_follow_on_paths() {
        let origin = TransactionReference::from_id("TRN_9");

        let mut capture = origin.capture().unwrap();
        capture.with_amount(dec!(3)).unwrap().with_gratuity(dec!(2)).unwrap();
        let request = render(&capture.finalize().unwrap()).unwrap();
        assert_eq!(request.path, "/transactions/TRN_9/capture");
        assert_eq!(request.body, json!({"amount": "300", "gratuity_amount": "200"}));

        let request = render(&origin.reverse().unwrap().finalize().unwrap()).unwrap();
        assert_eq!(request.path, "/transactions/TRN_9/reversal");
        assert_eq!(request.body, json!({}));

        let mut refund = origin.refund().unwrap();
        refund.with_amount(dec!(1.5)).unwrap().with_currency("EUR").unwrap();
        let request = render(&refund.finalize().unwrap()).unwrap();
        assert_eq!(request.path, "/transactions/TRN_9/refund");
        assert_eq!(request.body, json!({"amount": "150", "currency": "EUR"}));
    }

    #[test]
    fn test_verify_without_currency_is_left_to_host() {
        let request = render(&TransactionBuilder::verify(card()).unwrap().finalize().unwrap()).unwrap();
        assert_eq!(request.path, "/verifications");
        assert!(request.body.get("currency").is_none());
        assert!(request.body.get("amount").is_none());
    }

    #[test]
    fn test_sub_minor_precision_is_an_encoding_error() {
        let mut builder = TransactionBuilder::sale(card(), dec!(1.005)).unwrap();
        builder.with_currency("USD").unwrap();
        assert!(matches!(
            render(&builder.finalize().unwrap()),
            Err(PaymentError::EncodingError { network: "GP-API", .. })
        ));
    }
}
