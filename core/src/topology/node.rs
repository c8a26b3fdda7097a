//! Simulated wireless nodes
//!
//! A node is a point in the plane with a radio range. It owns its routing table;
//! neighbor knowledge lives in the topology and is always derived from positions.

use crate::routing::RoutingTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, human-readable node identifier (e.g. "A", "relay-3")
///
/// Ordered lexicographically, which is the order neighbors are flooded in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Planar position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance; symmetric by construction
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Construction input for one node: `(id, x, y, range)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    /// Communication range in meters (must be finite and >= 0)
    pub range: f64,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, x: f64, y: f64, range: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            range,
        }
    }

    /// Reason this spec is malformed, if it is
    pub(crate) fn defect(&self) -> Option<&'static str> {
        if self.id.as_str().trim().is_empty() {
            Some("node id must not be empty")
        } else if !self.x.is_finite() || !self.y.is_finite() {
            Some("coordinates must be finite")
        } else if !self.range.is_finite() {
            Some("range must be finite")
        } else if self.range < 0.0 {
            Some("range must not be negative")
        } else {
            None
        }
    }
}

/// A simulated device
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    position: Position,
    range: f64,
    routing_table: RoutingTable,
}

impl Node {
    pub(crate) fn from_spec(spec: NodeSpec) -> Self {
        Self {
            id: spec.id,
            position: Position::new(spec.x, spec.y),
            range: spec.range,
            routing_table: RoutingTable::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub(crate) fn routing_table_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing_table
    }

    /// Where this node would sit after a displacement; does not move it
    pub fn displaced(&self, dx: f64, dy: f64) -> Position {
        Position::new(self.position.x + dx, self.position.y + dy)
    }

    pub(crate) fn place(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_range(&mut self, range: f64) {
        self.range = range;
    }

    /// Distance from this node to another
    pub fn distance_to(&self, other: &Node) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Whether `other` lies inside this node's range.
    ///
    /// Uses only our range, so the relation is asymmetric when ranges differ.
    pub fn can_reach(&self, other: &Node) -> bool {
        self.distance_to(other) <= self.range
    }
}
