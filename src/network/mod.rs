//! Rendering finalized specs into network envelopes.
//!
//! Assembly is a pure function of the transaction spec and the network configuration:
//! it never allocates tracing numbers and never touches the network, so the
//! same inputs always produce the same envelope.

pub mod header;
pub mod nts;
pub mod rest;
pub mod vaps;

use crate::builder::linking::{MatchingField, ensure_matching_data};
use crate::config::NetworkConfig;
use crate::domain::spec::TransactionSpec;
use crate::error::{PaymentError, Result};
use header::{NetworkMessageHeader, RequestMessageHeader};
use rest::RestRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// JSON/REST gateway addressing transactions by identifier.
    #[default]
    GpApi,
    /// Fixed-field network.
    Nts,
    /// Tag-length-value network.
    Vaps,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::GpApi => "GP-API",
            Network::Nts => "NTS",
            Network::Vaps => "VAPS",
        }
    }

    /// Matching data a follow-on must replay on this network.
    pub fn required_matching_fields(&self) -> &'static [MatchingField] {
        match self {
            Network::GpApi => &[],
            Network::Nts => &[
                MatchingField::HostReference,
                MatchingField::SystemTraceAuditNumber,
                MatchingField::BatchNumber,
                MatchingField::SequenceNumber,
            ],
            Network::Vaps => &[
                MatchingField::HostReference,
                MatchingField::SystemTraceAuditNumber,
                MatchingField::BatchNumber,
                MatchingField::MessageType,
            ],
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpapi" | "gp-api" => Ok(Network::GpApi),
            "nts" => Ok(Network::Nts),
            "vaps" => Ok(Network::Vaps),
            other => Err(PaymentError::validation(
                "network",
                format!("unknown network {other:?}"),
            )),
        }
    }
}

/// A fixed-field or TLV message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage {
    pub network: Network,
    pub network_header: NetworkMessageHeader,
    pub request_header: RequestMessageHeader,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Rest(RestRequest),
    Framed(FramedMessage),
}

impl Envelope {
    pub fn network(&self) -> Network {
        match self {
            Envelope::Rest(_) => Network::GpApi,
            Envelope::Framed(message) => message.network,
        }
    }

    /// The rendered tracing header, for framed networks.
    pub fn request_header(&self) -> Option<&RequestMessageHeader> {
        match self {
            Envelope::Rest(_) => None,
            Envelope::Framed(message) => Some(&message.request_header),
        }
    }

    pub fn network_header(&self) -> Option<&NetworkMessageHeader> {
        match self {
            Envelope::Rest(_) => None,
            Envelope::Framed(message) => Some(&message.network_header),
        }
    }

    /// Printable form: compact JSON for REST, hex for framed messages.
    pub fn render(&self) -> String {
        match self {
            Envelope::Rest(request) => request.to_json().to_string(),
            Envelope::Framed(message) => hex::encode(&message.bytes),
        }
    }
}

/// Renders `spec` for the network selected in `config`.
///
/// Follow-ons missing matching data the network requires fail here, before
/// anything could be sent.
pub fn assemble(spec: &TransactionSpec, config: &NetworkConfig) -> Result<Envelope> {
    let network = config.network;
    ensure_matching_data(spec, network)?;
    let envelope = match network {
        Network::GpApi => Envelope::Rest(rest::render(spec)?),
        Network::Nts => Envelope::Framed(nts::render(spec, config)?),
        Network::Vaps => Envelope::Framed(vaps::render(spec, config)?),
    };
    debug!(
        %network,
        kind = %spec.kind(),
        stan = ?envelope.request_header().map(|h| h.system_trace_audit_number),
        "envelope assembled"
    );
    Ok(envelope)
}

/// The STAN a message travels under and the original STAN for follow-ons.
pub(crate) fn message_stans(spec: &TransactionSpec, network: Network) -> Result<(u32, Option<u32>)> {
    let tracking = spec.tracking();
    let original = spec
        .linkage()
        .and_then(|linkage| linkage.matching())
        .and_then(|matching| matching.system_trace_audit_number());
    let missing = |field: &str| {
        PaymentError::encoding(network.name(), field, "required by the network but absent")
    };

    if spec.linkage().is_some() && network == Network::Vaps {
        let stan = tracking
            .follow_on_stan
            .ok_or_else(|| missing("follow_on_stan"))?;
        return Ok((stan, original));
    }
    let stan = tracking
        .system_trace_audit_number
        .ok_or_else(|| missing("system_trace_audit_number"))?;
    Ok((stan, original))
}
