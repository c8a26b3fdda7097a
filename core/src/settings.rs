//! Simulation settings
//!
//! Controls how route replies account for hops and how much of the adjacency
//! computation is traced.

use serde::{Deserialize, Serialize};

/// How route replies fill in `hop_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopCountMode {
    /// True path length from the installing node to the destination
    PathLength,
    /// Every installed entry reports a single hop, whatever the real distance.
    /// Reproduces the behavior of early simulator builds.
    Legacy,
}

impl std::fmt::Display for HopCountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathLength => write!(f, "path_length"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

impl std::str::FromStr for HopCountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path_length" => Ok(Self::PathLength),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!(
                "unknown hop count mode '{}' (expected path_length or legacy)",
                other
            )),
        }
    }
}

impl Default for HopCountMode {
    fn default() -> Self {
        Self::PathLength
    }
}

/// Route discovery and topology tracing settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub hop_count_mode: HopCountMode,
    /// Record a `ReachabilityChecked` event for every pair evaluated while
    /// recomputing adjacency. Noisy on large topologies.
    pub record_reachability: bool,
}

impl DiscoverySettings {
    /// Settings reproducing the fixed single-hop replies of early builds
    pub fn legacy() -> Self {
        Self {
            hop_count_mode: HopCountMode::Legacy,
            ..Self::default()
        }
    }
}
