//! NTS rendering: fixed-position ASCII fields.
//!
//! Layout:
//!
//! | part            | fields                                                     |
//! |-----------------|------------------------------------------------------------|
//! | network header  | message code 2N, response code 2N, company 3N, terminal type 1AN, unit 11N, terminal id 2N |
//! | request header  | STAN 6N, sequence 4N, batch 3N, terminal error 1AN         |
//! | body            | amount 10N, currency 3A, follow-on: host reference 12AN + original STAN 6N |
//! | optional fields | one-letter marker followed by the fixed-width value        |
//! | tag sections    | issuer, product, fleet: count 2N then tag 3AN + length 2N + value |

use super::header::{FieldWriter, NetworkMessageHeader, RequestMessageHeader};
use super::{FramedMessage, Network, message_stans};
use crate::config::NetworkConfig;
use crate::domain::operation::TransactionType;
use crate::domain::spec::TransactionSpec;
use crate::domain::tags::{TagData, TagKey};
use crate::error::{PaymentError, Result};

const NETWORK: &str = "NTS";

pub fn message_code(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Authorize => "01",
        TransactionType::Sale => "02",
        TransactionType::Capture => "03",
        TransactionType::Refund => "04",
        TransactionType::Reverse => "05",
        TransactionType::Verify => "06",
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| PaymentError::encoding(NETWORK, field, "required by the network but absent"))
}

pub fn render(spec: &TransactionSpec, config: &NetworkConfig) -> Result<FramedMessage> {
    let fields = spec.network_fields();
    let tracking = spec.tracking();
    let (stan, original_stan) = message_stans(spec, Network::Nts)?;
    let host_reference = spec
        .linkage()
        .and_then(|linkage| linkage.matching())
        .map(|matching| matching.host_reference().to_string());

    let network_header = NetworkMessageHeader {
        message_type: message_code(spec.kind()).to_string(),
        processing_code: None,
        company_id: Some(required(
            tracking.company_id.clone().or_else(|| config.company_id.clone()),
            "company_id",
        )?),
        unit_number: tracking
            .unique_device_id
            .clone()
            .or_else(|| config.unit_number.clone()),
        terminal_id: config.terminal_id.clone(),
    };
    let request_header = RequestMessageHeader {
        system_trace_audit_number: stan,
        sequence_number: tracking.sequence_number,
        batch_number: tracking.batch_number,
        original_stan,
        host_reference: host_reference.clone(),
        terminal_error: fields.terminal_error,
    };

    let mut writer = FieldWriter::new(NETWORK);
    writer
        .numeric_str("message_code", &network_header.message_type, 2)?
        .numeric_str("response_code", "00", 2)?
        .numeric_str(
            "company_id",
            network_header.company_id.as_deref().unwrap_or_default(),
            3,
        )?
        .alpha("terminal_type", "0", 1)?
        .numeric_str(
            "unit_number",
            network_header.unit_number.as_deref().unwrap_or_default(),
            11,
        )?
        .numeric_str(
            "terminal_id",
            network_header.terminal_id.as_deref().unwrap_or_default(),
            2,
        )?;

    writer
        .numeric("system_trace_audit_number", u64::from(stan), 6)?
        .numeric(
            "sequence_number",
            u64::from(tracking.sequence_number.unwrap_or_default()),
            4,
        )?
        .numeric(
            "batch_number",
            u64::from(tracking.batch_number.unwrap_or_default()),
            3,
        )?
        .alpha(
            "terminal_error",
            if fields.terminal_error { "Y" } else { "N" },
            1,
        )?;

    let minor_units = match spec.kind() {
        TransactionType::Verify => 0,
        _ => {
            let amount = required(spec.amount(), "amount")?;
            amount.minor_units().ok_or_else(|| {
                PaymentError::encoding(NETWORK, "amount", format!("{amount} does not fit whole minor units"))
            })?
        }
    };
    let currency = match spec.kind() {
        TransactionType::Verify => spec.currency().map(|c| c.to_string()).unwrap_or_default(),
        _ => required(spec.currency(), "currency")?.to_string(),
    };
    writer
        .numeric("amount", minor_units.unsigned_abs(), 10)?
        .alpha("currency", &currency, 3)?;

    if spec.linkage().is_some() {
        writer
            .alpha("host_reference", &required(host_reference, "host_reference")?, 12)?
            .numeric(
                "original_stan",
                u64::from(required(original_stan, "original_stan")?),
                6,
            )?;
    }

    if let Some(service_code) = &fields.service_code {
        writer.raw(b"S").numeric_str("service_code", service_code, 3)?;
    }
    if let Some(invoice) = &fields.invoice_number {
        writer.raw(b"I").alpha("invoice_number", invoice, 10)?;
    }
    if let Some(sequence) = &fields.card_sequence_number {
        writer.raw(b"Q").numeric_str("card_sequence_number", sequence, 3)?;
    }
    if let Some(indicator) = &fields.ecommerce.auth_indicator {
        writer.raw(b"E").alpha("ecommerce_auth_indicator", indicator, 2)?;
    }
    if let Some(data) = &fields.ecommerce.data1 {
        writer.raw(b"1").alpha("ecommerce_data1", data, 40)?;
    }
    if let Some(data) = &fields.ecommerce.data2 {
        writer.raw(b"2").alpha("ecommerce_data2", data, 40)?;
    }

    write_tags(&mut writer, "issuer_data", Some(&fields.issuer_data))?;
    write_tags(&mut writer, "product_data", fields.product_data.as_ref())?;
    write_tags(&mut writer, "fleet_data", fields.fleet_data.as_ref())?;

    Ok(FramedMessage {
        network: Network::Nts,
        network_header,
        request_header,
        bytes: writer.finish(),
    })
}

/// Writes a tag section in insertion order; an absent section has count 0.
fn write_tags<K: TagKey>(
    writer: &mut FieldWriter,
    section: &str,
    tags: Option<&TagData<K>>,
) -> Result<()> {
    let Some(tags) = tags else {
        writer.numeric(&format!("{section}.count"), 0, 2)?;
        return Ok(());
    };
    writer.numeric(&format!("{section}.count"), tags.len() as u64, 2)?;
    for (tag, value) in tags.iter() {
        let field = format!("{section}.{}", tag.code());
        if tag.code().len() != 3 {
            return Err(PaymentError::encoding(
                NETWORK,
                field,
                "tag codes are 3 characters on this network",
            ));
        }
        if value.len() > tag.max_len() {
            return Err(PaymentError::encoding(
                NETWORK,
                field,
                format!("{} characters exceed the tag maximum of {}", value.len(), tag.max_len()),
            ));
        }
        writer.alpha(&field, tag.code(), 3)?.variable(&field, value, tag.max_len())?;
    }
    Ok(())
}
