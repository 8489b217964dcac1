//! Deterministic host fault injection for integration tests.
//!
//! A [`HostErrorSimulation`] is attached to a builder and consulted by the
//! dispatcher right before the transport call. Entries are consumed in order
//! and each fires once; an exhausted queue lets the call through to the real
//! transport.

use crate::error::{HostFault, PaymentError, Result, TransportFault};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    #[default]
    Primary,
    Secondary,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Primary => f.write_str("primary"),
            Host::Secondary => f.write_str("secondary"),
        }
    }
}

impl FromStr for Host {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Host::Primary),
            "secondary" => Ok(Host::Secondary),
            other => Err(PaymentError::validation(
                "host",
                format!("unknown host {other:?}"),
            )),
        }
    }
}

/// A failure to inject in place of a real host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Timeout,
    ConnectionReset,
    MalformedResponse,
    Decline(HostFault),
    NotFound(HostFault),
}

impl HostError {
    /// A generic issuer decline.
    pub fn decline() -> Self {
        HostError::Decline(HostFault::new(402, "DECLINED", "05", "Do not honor"))
    }

    /// Converts into the error a real host failure of the same kind produces.
    pub fn into_error(self, host: Host) -> PaymentError {
        match self {
            HostError::Timeout => PaymentError::TransportFailure {
                host,
                fault: TransportFault::Timeout,
            },
            HostError::ConnectionReset => PaymentError::TransportFailure {
                host,
                fault: TransportFault::ConnectionReset,
            },
            HostError::MalformedResponse => PaymentError::TransportFailure {
                host,
                fault: TransportFault::MalformedResponse,
            },
            HostError::Decline(fault) => PaymentError::GatewayRejected(fault),
            HostError::NotFound(fault) => PaymentError::ResourceNotFound(fault),
        }
    }
}

impl FromStr for HostError {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timeout" => Ok(HostError::Timeout),
            "reset" | "connection_reset" => Ok(HostError::ConnectionReset),
            "malformed" | "malformed_response" => Ok(HostError::MalformedResponse),
            "decline" => Ok(HostError::decline()),
            "not_found" | "notfound" => Ok(HostError::NotFound(HostFault::new(
                404,
                "RESOURCE_NOT_FOUND",
                "40008",
                "Transaction not found at this location.",
            ))),
            other => Err(PaymentError::validation(
                "simulated_host_error",
                format!("unknown host error {other:?}"),
            )),
        }
    }
}

/// Host → queue of injected errors.
///
/// Clones share the same queues, so one table can be attached to several
/// specs and drained across several dispatches.
#[derive(Debug, Clone, Default)]
pub struct HostErrorSimulation {
    queues: Arc<Mutex<HashMap<Host, VecDeque<HostError>>>>,
}

impl HostErrorSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends errors to the queue of `host`.
    pub fn with_errors(self, host: Host, errors: impl IntoIterator<Item = HostError>) -> Self {
        {
            let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
            queues.entry(host).or_default().extend(errors);
        }
        self
    }

    /// Parses `host:error` pairs separated by commas, e.g.
    /// `primary:timeout,primary:decline`.
    pub fn parse(spec: &str) -> Result<Self> {
        let simulation = Self::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (host, error) = pair.split_once(':').ok_or_else(|| {
                PaymentError::validation(
                    "simulated_host_error",
                    format!("expected host:error, got {pair:?}"),
                )
            })?;
            let host: Host = host.parse()?;
            let error: HostError = error.parse()?;
            simulation.queues_mut(|queues| queues.entry(host).or_default().push_back(error));
        }
        Ok(simulation)
    }

    /// Removes and returns the next error configured for `host`.
    pub fn next(&self, host: Host) -> Option<HostError> {
        let popped = self.queues_mut(|queues| queues.get_mut(&host).and_then(VecDeque::pop_front));
        if let Some(error) = &popped {
            debug!(%host, ?error, "injecting simulated host error");
        }
        popped
    }

    pub fn remaining(&self, host: Host) -> usize {
        self.queues_mut(|queues| queues.get(&host).map_or(0, VecDeque::len))
    }

    fn queues_mut<T>(&self, f: impl FnOnce(&mut HashMap<Host, VecDeque<HostError>>) -> T) -> T {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut queues)
    }
}
