//! Topology: node positions, ranges, and the derived neighbor relation
//!
//! Adjacency is never maintained by hand. Node B is a neighbor of node A iff
//! `distance(A, B) <= A.range`; the predicate uses only the sender's range, so the
//! relation is asymmetric whenever ranges differ.
//!
//! Any position or range change refreshes adjacency for the affected node before
//! the mutating call returns:
//! - the node's own outgoing row is recomputed (who it can reach), and
//! - its membership in every other node's row is re-evaluated (who can reach it).
//!
//! Both passes are O(N), so a move keeps the whole relation consistent without a
//! full O(N²) rebuild.

pub mod node;

pub use node::{Node, NodeId, NodeSpec, Position};

use crate::events::ProtocolEvent;
use crate::{NetworkError, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// All nodes plus the range-induced adjacency relation
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Authoritative node store, ordered by ID
    nodes: BTreeMap<NodeId, Node>,
    /// node → neighbors it can reach, ordered by ID
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Emit a `ReachabilityChecked` event for every evaluated pair
    trace_reachability: bool,
    /// Events produced by mutations, waiting to be collected
    pending_events: Vec<ProtocolEvent>,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a topology from a batch of node specs.
    ///
    /// The whole batch is validated before any node is created: `count` must be
    /// positive and match the number of specs, every spec must be well formed, and
    /// IDs must be unique.
    pub fn from_specs(count: i64, specs: Vec<NodeSpec>) -> Result<Self> {
        validate_batch(count, &specs)?;

        let mut topology = Self::new();
        for spec in specs {
            topology.nodes.insert(spec.id.clone(), Node::from_spec(spec));
        }
        topology.recompute_all()?;

        tracing::info!(nodes = topology.len(), "Topology built");
        Ok(topology)
    }

    /// Record reachability decisions as events during adjacency recomputation
    pub fn set_reachability_trace(&mut self, enabled: bool) {
        self.trace_reachability = enabled;
    }

    /// Add a single node and wire it into the adjacency relation
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node> {
        if let Some(reason) = spec.defect() {
            tracing::warn!(id = %spec.id, reason, "Rejected node");
            return Err(NetworkError::InvalidNode {
                id: spec.id,
                reason: reason.to_string(),
            });
        }
        if self.nodes.contains_key(&spec.id) {
            tracing::warn!(id = %spec.id, "Rejected duplicate node id");
            return Err(NetworkError::DuplicateId(spec.id));
        }

        let id = spec.id.clone();
        self.nodes.insert(id.clone(), Node::from_spec(spec));
        self.refresh_node(&id)?;
        self.node_or_err(&id)
    }

    /// Recalculate the neighbors reachable from `id`. O(N).
    pub fn recompute_adjacency(&mut self, id: &NodeId) -> Result<()> {
        let source = self.node_or_err(id)?;

        let mut row = BTreeSet::new();
        let mut checks = Vec::new();
        for (other_id, other) in &self.nodes {
            if other_id == id {
                continue;
            }
            let reachable = source.can_reach(other);
            if self.trace_reachability {
                checks.push(reachability_event(source, other, reachable));
            }
            if reachable {
                row.insert(other_id.clone());
            }
        }

        self.pending_events.extend(checks);
        self.adjacency.insert(id.clone(), row);
        Ok(())
    }

    /// Rebuild adjacency for every node. O(N²).
    pub fn recompute_all(&mut self) -> Result<()> {
        let ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        for id in &ids {
            self.recompute_adjacency(id)?;
        }
        Ok(())
    }

    /// Neighbors reachable from `id`, ascending by ID
    pub fn neighbors_of(&self, id: &NodeId) -> Result<Vec<&Node>> {
        Ok(self
            .neighbor_ids(id)?
            .filter_map(|n| self.nodes.get(n))
            .collect())
    }

    /// Neighbor IDs reachable from `id`, ascending by ID
    pub fn neighbor_ids(&self, id: &NodeId) -> Result<impl Iterator<Item = &NodeId> + '_> {
        self.node_or_err(id)?;
        Ok(self.adjacency.get(id).into_iter().flatten())
    }

    /// Whether `to` is inside `from`'s range (per the cached relation)
    pub fn is_adjacent(&self, from: &NodeId, to: &NodeId) -> bool {
        self.adjacency
            .get(from)
            .map_or(false, |row| row.contains(to))
    }

    /// Translate a node and refresh its adjacency. Returns the new position.
    pub fn move_node(&mut self, id: &NodeId, dx: f64, dy: f64) -> Result<Position> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(NetworkError::InvalidNode {
                id: id.clone(),
                reason: "displacement must be finite".to_string(),
            });
        }

        let node = self.node_mut_or_err(id)?;
        let position = node.displaced(dx, dy);
        if !position.is_finite() {
            return Err(NetworkError::InvalidNode {
                id: id.clone(),
                reason: "coordinates must be finite".to_string(),
            });
        }
        node.place(position);

        self.refresh_node(id)?;
        Ok(position)
    }

    /// Change a node's communication range and refresh its adjacency
    pub fn set_range(&mut self, id: &NodeId, range: f64) -> Result<()> {
        if !range.is_finite() || range < 0.0 {
            return Err(NetworkError::InvalidNode {
                id: id.clone(),
                reason: "range must be finite and not negative".to_string(),
            });
        }

        self.node_mut_or_err(id)?.set_range(range);
        self.refresh_node(id)
    }

    /// Euclidean distance between two nodes
    pub fn distance(&self, a: &NodeId, b: &NodeId) -> Result<f64> {
        Ok(self.node_or_err(a)?.distance_to(self.node_or_err(b)?))
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, ascending by ID
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of directed neighbor links
    pub fn link_count(&self) -> usize {
        self.adjacency.values().map(|row| row.len()).sum()
    }

    pub(crate) fn node_or_err(&self, id: &NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| NetworkError::UnknownNode(id.clone()))
    }

    pub(crate) fn node_mut_or_err(&mut self, id: &NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| NetworkError::UnknownNode(id.clone()))
    }

    /// Collect events produced by mutations since the last call
    pub(crate) fn take_events(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Recompute `id`'s outgoing row, then re-evaluate `id` in every other row
    fn refresh_node(&mut self, id: &NodeId) -> Result<()> {
        self.recompute_adjacency(id)?;

        let target = self.node_or_err(id)?;
        let mut checks = Vec::new();
        let mut reached_by = Vec::new();
        for (other_id, other) in &self.nodes {
            if other_id == id {
                continue;
            }
            let reachable = other.can_reach(target);
            if self.trace_reachability {
                checks.push(reachability_event(other, target, reachable));
            }
            reached_by.push((other_id.clone(), reachable));
        }

        self.pending_events.extend(checks);
        for (other_id, reachable) in reached_by {
            let row = self.adjacency.entry(other_id).or_default();
            if reachable {
                row.insert(id.clone());
            } else {
                row.remove(id);
            }
        }
        Ok(())
    }
}

fn reachability_event(from: &Node, to: &Node, reachable: bool) -> ProtocolEvent {
    ProtocolEvent::ReachabilityChecked {
        from: from.id().clone(),
        to: to.id().clone(),
        distance: from.distance_to(to),
        range: from.range(),
        reachable,
    }
}

fn validate_batch(count: i64, specs: &[NodeSpec]) -> Result<()> {
    if count <= 0 {
        return Err(NetworkError::InvalidCount(count));
    }
    if usize::try_from(count).ok() != Some(specs.len()) {
        return Err(NetworkError::MalformedInput(format!(
            "expected {} nodes, got {}",
            count,
            specs.len()
        )));
    }

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if let Some(reason) = spec.defect() {
            return Err(NetworkError::InvalidNode {
                id: spec.id.clone(),
                reason: reason.to_string(),
            });
        }
        if !seen.insert(&spec.id) {
            return Err(NetworkError::DuplicateId(spec.id.clone()));
        }
    }
    Ok(())
}
