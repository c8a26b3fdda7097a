// AODV Sim Core: on-demand route discovery over a simulated ad-hoc network
//
// Nodes sit in the plane with a radio range; neighbors are whoever falls inside
// that range. A route request floods outward from a source, the destination
// answers with a route reply, and every node on the way back learns its next hop.

pub mod events;
pub mod mobility;
pub mod network;
pub mod routing;
pub mod scenario;
pub mod settings;
pub mod topology;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use events::{EventJournal, ProtocolEvent};
pub use mobility::Movement;
pub use network::{Network, NetworkSummary};
pub use routing::{
    DiscoveryOutcome, DiscoveryReport, RouteDiscovery, RouteEntry, RouteLookup, RoutingTable,
};
pub use scenario::{Scenario, ScenarioOutcome, ScenarioStep, StepRecord, StepResult};
pub use settings::{DiscoverySettings, HopCountMode};
pub use topology::{Node, NodeId, NodeSpec, Position, Topology};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors surfaced by topology construction, discovery, and queries.
///
/// An unreachable destination is not an error: discovery reports it as
/// `DiscoveryOutcome::NoRouteFound`.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetworkError {
    #[error("Duplicate device ID: {0}")]
    DuplicateId(NodeId),

    #[error("Invalid source or destination device IDs: {0}")]
    UnknownNode(NodeId),

    #[error("Invalid device count: must be > 0, got {0}")]
    InvalidCount(i64),

    #[error("Invalid device {id}: {reason}")]
    InvalidNode { id: NodeId, reason: String },

    #[error("Malformed network input: {0}")]
    MalformedInput(String),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            NetworkError::UnknownNode("Z".into()).to_string(),
            "Invalid source or destination device IDs: Z"
        );
        assert_eq!(
            NetworkError::InvalidCount(-1).to_string(),
            "Invalid device count: must be > 0, got -1"
        );
        assert_eq!(
            NetworkError::InvalidNode {
                id: "A".into(),
                reason: "range must not be negative".into()
            }
            .to_string(),
            "Invalid device A: range must not be negative"
        );
    }
}
