use super::simulation::Host;
use crate::error::Result;
use crate::network::Envelope;
use async_trait::async_trait;

/// What a host sent back, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Json {
        status: u16,
        body: serde_json::Value,
    },
    Bytes(Vec<u8>),
}

/// Delivers rendered envelopes to a host.
///
/// Implementations own connection handling, timeouts and any retry policy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, host: Host, envelope: &Envelope) -> Result<RawResponse>;
}

/// Supplies network tracing numbers.
///
/// Implementations must be safe to share between threads; the engine only
/// reads the values it is handed.
pub trait SequenceGenerator: Send + Sync {
    fn next_stan(&self) -> u32;
    fn next_sequence(&self) -> u32;
    fn batch_number(&self) -> u32;
}

pub type TransportBox = Box<dyn Transport>;
