//! Node kinds.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role a wallet address plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Unknown,
    Distributor,
    Miner,
    Validator,
}

impl NodeKind {
    /// Numeric code: 0 unknown, 1 distributor, 2 miner, 3 validator.
    pub fn code(self) -> u8 {
        match self {
            NodeKind::Unknown => 0,
            NodeKind::Distributor => 1,
            NodeKind::Miner => 2,
            NodeKind::Validator => 3,
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" | "0" => Ok(NodeKind::Unknown),
            "distributor" | "1" => Ok(NodeKind::Distributor),
            "miner" | "2" => Ok(NodeKind::Miner),
            "validator" | "3" => Ok(NodeKind::Validator),
            _ => Err(format!("Unknown node kind: {}", s)),
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Unknown => write!(f, "unknown"),
            NodeKind::Distributor => write!(f, "distributor"),
            NodeKind::Miner => write!(f, "miner"),
            NodeKind::Validator => write!(f, "validator"),
        }
    }
}
