//! Network configuration: which network to render for, which host to address
//! and the terminal identity framed networks put in their headers.
//!
//! Loaded from a JSON file; every field has a default so a partial file is
//! fine.

use crate::domain::simulation::Host;
use crate::error::Result;
use crate::network::Network;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network: Network,
    pub host: Host,
    /// Company number, used when the transaction carries none.
    pub company_id: Option<String>,
    pub unit_number: Option<String>,
    pub terminal_id: Option<String>,
}

impl NetworkConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
