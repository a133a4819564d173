//! Address-to-role classification.
//!
//! Roles come from an explicitly passed [`Registry`], usually loaded from a
//! JSON file:
//!
//! ```json
//! {
//!   "distributors": ["0xb2a1a91eA058D7Cd180234E3046E7CB467eF5D26"],
//!   "miners": [],
//!   "default_kind": "validator"
//! }
//! ```

mod kind;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::crypto::Address;
use crate::error::{Error, Result};

pub use kind::NodeKind;

/// Known distributor and miner addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    distributors: HashSet<Address>,
    miners: HashSet<Address>,
    default_kind: NodeKind,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    distributors: Vec<String>,
    #[serde(default)]
    miners: Vec<String>,
    #[serde(default = "default_kind")]
    default_kind: NodeKind,
}

fn default_kind() -> NodeKind {
    NodeKind::Validator
}

impl Registry {
    /// Creates a registry; well-formed addresses on neither list get `default_kind`.
    pub fn new(
        distributors: impl IntoIterator<Item = Address>,
        miners: impl IntoIterator<Item = Address>,
        default_kind: NodeKind,
    ) -> Self {
        Self {
            distributors: distributors.into_iter().collect(),
            miners: miners.into_iter().collect(),
            default_kind,
        }
    }

    /// Parses a registry from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RegistryFile =
            serde_json::from_str(json).map_err(|e| Error::Registry(e.to_string()))?;

        let parse_all = |entries: Vec<String>| -> Result<Vec<Address>> {
            entries
                .iter()
                .map(|entry| {
                    entry
                        .parse::<Address>()
                        .map_err(|e| Error::Registry(format!("{}: {}", entry, e)))
                })
                .collect()
        };

        Ok(Self::new(
            parse_all(raw.distributors)?,
            parse_all(raw.miners)?,
            raw.default_kind,
        ))
    }

    /// Loads a registry JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn default_kind(&self) -> NodeKind {
        self.default_kind
    }

    /// Classifies an already parsed address.
    pub fn kind_of(&self, address: &Address) -> NodeKind {
        if self.distributors.contains(address) {
            NodeKind::Distributor
        } else if self.miners.contains(address) {
            NodeKind::Miner
        } else {
            self.default_kind
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            distributors: HashSet::new(),
            miners: HashSet::new(),
            default_kind: default_kind(),
        }
    }
}

/// Classifies `address` against `registry`.
///
/// Addresses that do not parse are `Unknown`; the comparison ignores case.
pub fn classify(address: &str, registry: &Registry) -> NodeKind {
    match address.parse::<Address>() {
        Ok(address) => registry.kind_of(&address),
        Err(_) => NodeKind::Unknown,
    }
}
