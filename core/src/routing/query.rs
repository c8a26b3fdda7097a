//! Route queries: "does A know how to reach B?"
//!
//! Pure reads of the source node's routing table. Both endpoints must exist, so an
//! unknown ID is reported as `UnknownNode` rather than as a missing route.

use super::table::RouteEntry;
use crate::topology::{NodeId, Topology};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer to a route query, carrying the matched entry for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLookup {
    pub source: NodeId,
    pub destination: NodeId,
    pub entry: Option<RouteEntry>,
}

impl RouteLookup {
    pub fn has_route(&self) -> bool {
        self.entry.is_some()
    }
}

impl fmt::Display for RouteLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            Some(entry) => write!(
                f,
                "Route found: {} -> {} (Hops: {})",
                self.source, entry.next_hop, entry.hop_count
            ),
            None => write!(f, "No route found to device {}", self.destination),
        }
    }
}

/// Look up the route `source` holds for `destination`
pub fn query_route(topology: &Topology, source: &NodeId, destination: &NodeId) -> Result<RouteLookup> {
    let node = topology.node_or_err(source)?;
    topology.node_or_err(destination)?;

    let entry = node.routing_table().lookup(destination).cloned();
    match &entry {
        Some(e) => tracing::debug!("Route found: {} -> {} (Hops: {})", source, e.next_hop, e.hop_count),
        None => tracing::debug!("No route found from {} to device {}", source, destination),
    }

    Ok(RouteLookup {
        source: source.clone(),
        destination: destination.clone(),
        entry,
    })
}

/// Whether `source` holds a route to `destination`
pub fn has_route(topology: &Topology, source: &NodeId, destination: &NodeId) -> Result<bool> {
    Ok(query_route(topology, source, destination)?.has_route())
}
