//! VAPS rendering: a message type indicator followed by tag-length-value
//! elements.
//!
//! Each element is a big-endian `u16` element number, a big-endian `u16`
//! length and the ASCII value, in ascending element order. Issuer, product
//! and fleet data are nested inside their element as
//! `code length (1 byte) | code | value length (1 byte) | value`, in
//! insertion order.
//!
//! Follow-ons travel under their own follow-on STAN (element 11) and point at
//! the originating message through element 90.

use super::header::{FieldWriter, NetworkMessageHeader, RequestMessageHeader};
use super::{FramedMessage, Network, message_stans};
use crate::config::NetworkConfig;
use crate::domain::operation::{TransactionModifier, TransactionType};
use crate::domain::spec::TransactionSpec;
use crate::domain::tags::{TagData, TagKey};
use crate::domain::tracking::PriorMessageInformation;
use crate::error::{PaymentError, Result};

const NETWORK: &str = "VAPS";

pub const PROCESSING_CODE: u16 = 3;
pub const AMOUNT: u16 = 4;
pub const STAN: u16 = 11;
pub const SEQUENCE_NUMBER: u16 = 13;
pub const BATCH_NUMBER: u16 = 15;
pub const RETRIEVAL_REFERENCE: u16 = 37;
pub const TERMINAL_ID: u16 = 41;
pub const COMPANY_ID: u16 = 42;
pub const CURRENCY: u16 = 49;
pub const PRIOR_MESSAGE: u16 = 56;
pub const FLEET_DATA: u16 = 60;
pub const ISSUER_DATA: u16 = 62;
pub const PRODUCT_DATA: u16 = 63;
pub const ORIGINAL_DATA: u16 = 90;

pub fn message_type(kind: TransactionType, modifier: TransactionModifier) -> &'static str {
    let repeat = modifier == TransactionModifier::Retransmission;
    match (kind, repeat) {
        (TransactionType::Authorize | TransactionType::Verify, false) => "0100",
        (TransactionType::Authorize | TransactionType::Verify, true) => "0101",
        (TransactionType::Sale | TransactionType::Refund, false) => "0200",
        (TransactionType::Sale | TransactionType::Refund, true) => "0201",
        (TransactionType::Capture, false) => "0220",
        (TransactionType::Capture, true) => "0221",
        (TransactionType::Reverse, false) => "0400",
        (TransactionType::Reverse, true) => "0401",
    }
}

fn processing_code(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Refund => "200000",
        _ => "000000",
    }
}

/// Accumulates TLV elements.
struct TlvWriter {
    bytes: Vec<u8>,
}

impl TlvWriter {
    fn element(&mut self, tag: u16, value: &[u8]) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| {
            PaymentError::encoding(
                NETWORK,
                format!("element {tag}"),
                format!("{} bytes exceed the element maximum", value.len()),
            )
        })?;
        self.bytes.extend_from_slice(&tag.to_be_bytes());
        self.bytes.extend_from_slice(&len.to_be_bytes());
        self.bytes.extend_from_slice(value);
        Ok(())
    }
}

fn numeric(field: &str, value: u64, width: usize) -> Result<Vec<u8>> {
    let mut writer = FieldWriter::new(NETWORK);
    writer.numeric(field, value, width)?;
    Ok(writer.finish())
}

fn alpha(field: &str, value: &str, width: usize) -> Result<Vec<u8>> {
    let mut writer = FieldWriter::new(NETWORK);
    writer.alpha(field, value, width)?;
    Ok(writer.finish())
}

fn nested_tags<K: TagKey>(section: &str, tags: &TagData<K>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for (tag, value) in tags.iter() {
        let field = format!("{section}.{}", tag.code());
        if value.len() > tag.max_len() {
            return Err(PaymentError::encoding(
                NETWORK,
                field,
                format!("{} characters exceed the tag maximum of {}", value.len(), tag.max_len()),
            ));
        }
        let code_len = u8::try_from(tag.code().len())
            .map_err(|_| PaymentError::encoding(NETWORK, field.clone(), "tag code too long"))?;
        let value_len = u8::try_from(value.len())
            .map_err(|_| PaymentError::encoding(NETWORK, field.clone(), "tag value too long"))?;
        if !value.is_ascii() || !tag.code().is_ascii() {
            return Err(PaymentError::encoding(NETWORK, field, "only ASCII can be encoded"));
        }
        bytes.push(code_len);
        bytes.extend_from_slice(tag.code().as_bytes());
        bytes.push(value_len);
        bytes.extend_from_slice(value.as_bytes());
    }
    Ok(bytes)
}

fn prior_message(prior: &PriorMessageInformation) -> Result<Vec<u8>> {
    let mut writer = FieldWriter::new(NETWORK);
    writer
        .numeric_str("prior_message.message_type", &prior.message_type, 4)?
        .alpha("prior_message.transaction_code", &prior.transaction_code, 2)?
        .alpha(
            "prior_message.banknet_reference",
            prior.banknet_reference.as_deref().unwrap_or_default(),
            9,
        )?
        .alpha(
            "prior_message.authorization_code",
            prior.authorization_code.as_deref().unwrap_or_default(),
            6,
        )?
        .numeric_str(
            "prior_message.central_processing_date",
            prior.central_processing_date.as_deref().unwrap_or_default(),
            6,
        )?
        .numeric_str(
            "prior_message.central_processing_time",
            prior.central_processing_time.as_deref().unwrap_or_default(),
            6,
        )?
        .numeric(
            "prior_message.system_trace_number",
            u64::from(prior.system_trace_number.unwrap_or_default()),
            6,
        )?;
    Ok(writer.finish())
}

pub fn render(spec: &TransactionSpec, config: &NetworkConfig) -> Result<FramedMessage> {
    let kind = spec.kind();
    let fields = spec.network_fields();
    let tracking = spec.tracking();
    let (stan, original_stan) = message_stans(spec, Network::Vaps)?;
    let matching = spec.linkage().and_then(|linkage| linkage.matching());
    let mti = message_type(kind, spec.modifier());

    let network_header = NetworkMessageHeader {
        message_type: mti.to_string(),
        processing_code: Some(processing_code(kind).to_string()),
        company_id: tracking.company_id.clone().or_else(|| config.company_id.clone()),
        unit_number: config.unit_number.clone(),
        terminal_id: tracking
            .unique_device_id
            .clone()
            .or_else(|| config.terminal_id.clone()),
    };
    let request_header = RequestMessageHeader {
        system_trace_audit_number: stan,
        sequence_number: tracking.sequence_number,
        batch_number: tracking.batch_number,
        original_stan,
        host_reference: matching.map(|m| m.host_reference().to_string()),
        terminal_error: fields.terminal_error,
    };

    let mut tlv = TlvWriter {
        bytes: alpha("message_type", mti, 4)?,
    };
    tlv.element(PROCESSING_CODE, processing_code(kind).as_bytes())?;

    let minor_units = match (kind, spec.amount()) {
        (TransactionType::Verify, _) => 0,
        (_, Some(amount)) => amount.minor_units().ok_or_else(|| {
            PaymentError::encoding(NETWORK, "amount", format!("{amount} does not fit whole minor units"))
        })?,
        (_, None) => {
            return Err(PaymentError::encoding(
                NETWORK,
                "amount",
                "required by the network but absent",
            ));
        }
    };
    tlv.element(AMOUNT, &numeric("amount", minor_units.unsigned_abs(), 12)?)?;
    tlv.element(STAN, &numeric("system_trace_audit_number", u64::from(stan), 6)?)?;
    if let Some(sequence) = tracking.sequence_number {
        tlv.element(SEQUENCE_NUMBER, &numeric("sequence_number", u64::from(sequence), 4)?)?;
    }
    if let Some(batch) = tracking.batch_number {
        tlv.element(BATCH_NUMBER, &numeric("batch_number", u64::from(batch), 6)?)?;
    }
    if let Some(matching) = matching {
        tlv.element(
            RETRIEVAL_REFERENCE,
            &alpha("host_reference", matching.host_reference(), 12)?,
        )?;
    }
    if let Some(terminal_id) = &network_header.terminal_id {
        tlv.element(TERMINAL_ID, &alpha("terminal_id", terminal_id, 8)?)?;
    }
    if let Some(company_id) = &network_header.company_id {
        tlv.element(COMPANY_ID, &alpha("company_id", company_id, 15)?)?;
    }
    if let Some(currency) = spec.currency() {
        tlv.element(CURRENCY, &alpha("currency", currency.as_str(), 3)?)?;
    }
    if let Some(prior) = &fields.prior_message {
        tlv.element(PRIOR_MESSAGE, &prior_message(prior)?)?;
    }
    if let Some(fleet) = fields.fleet_data.as_ref().filter(|data| !data.is_empty()) {
        tlv.element(FLEET_DATA, &nested_tags("fleet_data", fleet)?)?;
    }
    if !fields.issuer_data.is_empty() {
        tlv.element(ISSUER_DATA, &nested_tags("issuer_data", &fields.issuer_data)?)?;
    }
    if let Some(product) = fields.product_data.as_ref().filter(|data| !data.is_empty()) {
        tlv.element(PRODUCT_DATA, &nested_tags("product_data", product)?)?;
    }
    if let Some(matching) = matching {
        let missing = |field: &str| {
            PaymentError::encoding(NETWORK, field, "required by the network but absent")
        };
        let mut writer = FieldWriter::new(NETWORK);
        writer
            .numeric_str(
                "original_data.message_type",
                matching.message_type().ok_or_else(|| missing("original_data.message_type"))?,
                4,
            )?
            .numeric(
                "original_data.system_trace_audit_number",
                u64::from(original_stan.ok_or_else(|| missing("original_data.system_trace_audit_number"))?),
                6,
            )?
            .numeric(
                "original_data.batch_number",
                u64::from(matching.batch_number().ok_or_else(|| missing("original_data.batch_number"))?),
                6,
            )?;
        tlv.element(ORIGINAL_DATA, &writer.finish())?;
    }

    Ok(FramedMessage {
        network: Network::Vaps,
        network_header,
        request_header,
        bytes: tlv.bytes,
    })
}

/// Splits a rendered message into its type indicator and elements.
pub fn parse_elements(bytes: &[u8]) -> Option<(String, Vec<(u16, Vec<u8>)>)> {
    let mti = std::str::from_utf8(bytes.get(..4)?).ok()?.to_string();
    let mut rest = &bytes[4..];
    let mut elements = Vec::new();
    while !rest.is_empty() {
        let tag = u16::from_be_bytes([*rest.first()?, *rest.get(1)?]);
        let len = usize::from(u16::from_be_bytes([*rest.get(2)?, *rest.get(3)?]));
        let value = rest.get(4..4 + len)?.to_vec();
        elements.push((tag, value));
        rest = &rest[4 + len..];
    }
    Some((mti, elements))
}
