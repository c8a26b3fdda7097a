//! Per-node routing table
//!
//! One entry per destination. A later discovery for the same destination replaces
//! the existing entry instead of appending a second one.

use crate::topology::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A learned route: "to reach `destination`, forward to `next_hop`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub destination: NodeId,
    /// Neighbor one step closer to the destination
    pub next_hop: NodeId,
    /// Hops from the owning node to the destination (>= 1)
    pub hop_count: u32,
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} (Hops: {})",
            self.destination, self.next_hop, self.hop_count
        )
    }
}

/// Routing table owned by a single node
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a route, replacing any existing entry for the same destination.
    ///
    /// Returns true if an entry was replaced.
    pub fn update(&mut self, destination: NodeId, next_hop: NodeId, hop_count: u32) -> bool {
        let entry = RouteEntry {
            destination,
            next_hop,
            hop_count,
        };

        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.destination == entry.destination)
        {
            self.entries[pos] = entry;
            true
        } else {
            self.entries.push(entry);
            false
        }
    }

    /// Find the route to a destination. O(table size).
    pub fn lookup(&self, destination: &NodeId) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| &e.destination == destination)
    }

    /// Remove the route to a destination, returning it if present
    pub fn remove(&mut self, destination: &NodeId) -> Option<RouteEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| &e.destination == destination)?;
        Some(self.entries.remove(pos))
    }

    /// Entries in installation order
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
