use crate::builder::MAX_STAN;
use crate::domain::ports::{RawResponse, SequenceGenerator, Transport};
use crate::domain::simulation::Host;
use crate::error::Result;
use crate::network::rest::RestRequest;
use crate::network::{Envelope, FramedMessage};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Largest four-digit sequence number.
const MAX_SEQUENCE: u32 = 9_999;

/// Process-wide tracing numbers backed by atomic counters.
///
/// STANs run from 1 to 999999 and wrap back to 1; sequence numbers wrap
/// after 9999. Safe to share between tasks.
#[derive(Debug)]
pub struct AtomicSequenceGenerator {
    stan: AtomicU32,
    sequence: AtomicU32,
    batch: u32,
}

impl AtomicSequenceGenerator {
    pub fn new(batch: u32) -> Self {
        Self::starting_at(batch, 0)
    }

    /// A generator whose next STAN is `last_stan + 1`.
    pub fn starting_at(batch: u32, last_stan: u32) -> Self {
        Self {
            stan: AtomicU32::new(last_stan),
            sequence: AtomicU32::new(0),
            batch,
        }
    }
}

fn advance(counter: &AtomicU32, max: u32) -> u32 {
    let step = |value: u32| if value >= max { 1 } else { value + 1 };
    match counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| Some(step(value))) {
        Ok(previous) | Err(previous) => step(previous),
    }
}

impl SequenceGenerator for AtomicSequenceGenerator {
    fn next_stan(&self) -> u32 {
        advance(&self.stan, MAX_STAN)
    }

    fn next_sequence(&self) -> u32 {
        advance(&self.sequence, MAX_SEQUENCE)
    }

    fn batch_number(&self) -> u32 {
        self.batch
    }
}

#[derive(Debug, Default)]
struct LoopbackState {
    calls: AtomicUsize,
    sent: Mutex<Vec<(Host, Envelope)>>,
    scripted: Mutex<VecDeque<RawResponse>>,
}

/// A host that approves everything it is sent, unless a reply was scripted.
///
/// Clones share the same call log, so a test can hand one clone to a
/// dispatcher and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    state: Arc<LoopbackState>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply returned, in order, instead of an approval.
    pub async fn script(&self, response: RawResponse) {
        self.state.scripted.lock().await.push_back(response);
    }

    /// Number of envelopes that reached this transport.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub async fn sent(&self) -> Vec<(Host, Envelope)> {
        self.state.sent.lock().await.clone()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, host: Host, envelope: &Envelope) -> Result<RawResponse> {
        let call = self.state.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.sent.lock().await.push((host, envelope.clone()));
        if let Some(response) = self.state.scripted.lock().await.pop_front() {
            return Ok(response);
        }
        Ok(match envelope {
            Envelope::Rest(request) => approve_rest(request, call),
            Envelope::Framed(message) => approve_framed(message, call),
        })
    }
}

fn approve_rest(request: &RestRequest, call: usize) -> RawResponse {
    let body = &request.body;
    let mut segments = request.path.trim_start_matches('/').split('/');
    let (resource, target, action) = (segments.next(), segments.next(), segments.next());

    let (id, status) = match (resource, target, action) {
        (Some("verifications"), _, _) => (format!("TRN_{call:012}"), "VERIFIED"),
        (_, Some(id), Some("capture")) => (id.to_string(), "CAPTURED"),
        (_, Some(id), Some("reversal")) => (id.to_string(), "REVERSED"),
        (_, Some(_), Some("refund")) => (format!("TRN_{call:012}"), "CAPTURED"),
        _ => {
            let status = match body.get("capture_mode").and_then(Value::as_str) {
                Some("LATER" | "MULTIPLE") => "PREAUTHORIZED",
                _ => "CAPTURED",
            };
            (format!("TRN_{call:012}"), status)
        }
    };

    let mut reply = json!({
        "id": id,
        "status": status,
        "action": {"result_code": "SUCCESS"},
    });
    if let Some(mode) = body.get("capture_mode") {
        reply["capture_mode"] = mode.clone();
    }
    if body.get("storage_mode").and_then(Value::as_str) == Some("ON_SUCCESS") {
        reply["payment_method"] = json!({"id": format!("PMT_{call:012}")});
    }
    RawResponse::Json {
        status: 200,
        body: reply,
    }
}

fn approve_framed(message: &FramedMessage, call: usize) -> RawResponse {
    let host_reference = message
        .request_header
        .host_reference
        .clone()
        .unwrap_or_else(|| format!("LB{:010}", call as u64 % 10_000_000_000));
    let approval = format!("A{:05}", call % 100_000);
    RawResponse::Bytes(format!("00{host_reference:<12}{approval}").into_bytes())
}
