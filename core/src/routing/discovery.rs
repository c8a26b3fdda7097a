//! Route discovery: RREQ flood and RREP unwind
//!
//! The flood is a depth-first traversal driven by an explicit work-list, so flood
//! depth is bounded by heap memory rather than the call stack. Visit order is the
//! same as the recursive formulation:
//!
//! ```text
//! propagate(current, predecessor):
//!     if current already visited: drop
//!     mark current visited
//!     if current == destination: reply along the path, stop
//!     for n in neighbors(current), ascending by ID, n != predecessor:
//!         propagate(n, current)
//! ```
//!
//! The first arrival at a node records its parent, which is the recursion stack at
//! that moment. The destination's parent chain is therefore the discovered path.
//! The flood stops at the first arrival at the destination; with the visited set
//! every node is processed at most once, so a run is O(N + E).

use super::table::RouteEntry;
use crate::events::{EventJournal, ProtocolEvent};
use crate::settings::{DiscoverySettings, HopCountMode};
use crate::topology::{NodeId, Topology};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How a discovery run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    /// The flood reached the destination; `path` runs source → destination
    RouteFound { path: Vec<NodeId>, hop_count: u32 },
    /// Every reachable node was explored without meeting the destination
    NoRouteFound,
}

/// Result of one discovery invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub source: NodeId,
    pub destination: NodeId,
    pub outcome: DiscoveryOutcome,
    /// Nodes that processed the RREQ, in processing order
    pub explored: Vec<NodeId>,
    /// Routes written by the reply, source side first
    pub installed: Vec<(NodeId, RouteEntry)>,
}

impl DiscoveryReport {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, DiscoveryOutcome::RouteFound { .. })
    }

    pub fn path(&self) -> Option<&[NodeId]> {
        match &self.outcome {
            DiscoveryOutcome::RouteFound { path, .. } => Some(path),
            DiscoveryOutcome::NoRouteFound => None,
        }
    }

    pub fn hop_count(&self) -> Option<u32> {
        match &self.outcome {
            DiscoveryOutcome::RouteFound { hop_count, .. } => Some(*hop_count),
            DiscoveryOutcome::NoRouteFound => None,
        }
    }
}

/// Ephemeral per-run state, dropped when the run completes
struct DiscoveryContext {
    source: NodeId,
    destination: NodeId,
    visited: HashSet<NodeId>,
    /// First-arrival predecessor of each visited node
    parents: HashMap<NodeId, NodeId>,
    explored: Vec<NodeId>,
}

impl DiscoveryContext {
    fn new(source: NodeId, destination: NodeId) -> Self {
        Self {
            source,
            destination,
            visited: HashSet::new(),
            parents: HashMap::new(),
            explored: Vec::new(),
        }
    }

    /// Mark `node` visited. Returns false if it already was.
    fn visit(&mut self, node: &NodeId, from: Option<&NodeId>) -> bool {
        if !self.visited.insert(node.clone()) {
            return false;
        }
        if let Some(from) = from {
            self.parents.insert(node.clone(), from.clone());
        }
        self.explored.push(node.clone());
        true
    }

    /// Walk parents back from the destination; path runs source → destination
    fn path_to_destination(&self) -> Vec<NodeId> {
        let mut path = vec![self.destination.clone()];
        let mut cursor = &self.destination;
        while cursor != &self.source {
            match self.parents.get(cursor) {
                Some(parent) => {
                    path.push(parent.clone());
                    cursor = parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}

/// A pending RREQ delivery on the work-list
struct RreqDelivery {
    to: NodeId,
    from: NodeId,
}

/// One discovery run over a topology
///
/// Reads adjacency during the flood and writes routing tables only during the
/// reply, through each node's own table.
pub struct RouteDiscovery<'a> {
    topology: &'a mut Topology,
    settings: &'a DiscoverySettings,
    journal: &'a mut EventJournal,
}

impl<'a> RouteDiscovery<'a> {
    pub fn new(
        topology: &'a mut Topology,
        settings: &'a DiscoverySettings,
        journal: &'a mut EventJournal,
    ) -> Self {
        Self {
            topology,
            settings,
            journal,
        }
    }

    /// Flood a route request from `source` and install the reply path.
    ///
    /// Fails with `UnknownNode` before any message is sent if either endpoint is
    /// missing. An unreachable destination is a normal `NoRouteFound` outcome.
    pub fn run(mut self, source: &NodeId, destination: &NodeId) -> Result<DiscoveryReport> {
        self.topology.node_or_err(source)?;
        self.topology.node_or_err(destination)?;

        tracing::debug!("Device {} sending RREQ to {}...", source, destination);

        let mut ctx = DiscoveryContext::new(source.clone(), destination.clone());
        let found = flood(self.topology, &mut ctx, self.journal)?;

        let (outcome, installed) = if found {
            let path = ctx.path_to_destination();
            let installed = self.unwind_reply(&path)?;
            let hop_count = hops(&path);
            (DiscoveryOutcome::RouteFound { path, hop_count }, installed)
        } else {
            (DiscoveryOutcome::NoRouteFound, Vec::new())
        };

        match &outcome {
            DiscoveryOutcome::RouteFound { path, hop_count } => tracing::info!(
                source = %source,
                destination = %destination,
                hop_count,
                explored = ctx.explored.len(),
                "Route found: {}",
                join_path(path)
            ),
            DiscoveryOutcome::NoRouteFound => tracing::info!(
                source = %source,
                destination = %destination,
                explored = ctx.explored.len(),
                "No route found"
            ),
        }

        Ok(DiscoveryReport {
            source: ctx.source,
            destination: ctx.destination,
            outcome,
            explored: ctx.explored,
            installed,
        })
    }

    /// Send the RREP from the destination back to the source, one hop at a time.
    ///
    /// Each node on the path learns `destination via <its successor on the path>`.
    fn unwind_reply(&mut self, path: &[NodeId]) -> Result<Vec<(NodeId, RouteEntry)>> {
        let Some(destination) = path.last() else {
            return Ok(Vec::new());
        };

        let mut installed = Vec::with_capacity(path.len().saturating_sub(1));
        let last = path.len() - 1;
        for i in (0..last).rev() {
            let node_id = &path[i];
            let next_hop = &path[i + 1];
            let hop_count = match self.settings.hop_count_mode {
                HopCountMode::PathLength => u32::try_from(last - i).unwrap_or(u32::MAX),
                HopCountMode::Legacy => 1,
            };

            self.journal.record(ProtocolEvent::RrepSent {
                from: next_hop.clone(),
                to: node_id.clone(),
            });

            self.topology
                .node_mut_or_err(node_id)?
                .routing_table_mut()
                .update(destination.clone(), next_hop.clone(), hop_count);

            self.journal.record(ProtocolEvent::RouteInstalled {
                at: node_id.clone(),
                destination: destination.clone(),
                next_hop: next_hop.clone(),
                hop_count,
            });

            installed.push((
                node_id.clone(),
                RouteEntry {
                    destination: destination.clone(),
                    next_hop: next_hop.clone(),
                    hop_count,
                },
            ));
        }

        installed.reverse();
        Ok(installed)
    }
}

/// Run the RREQ flood. Returns true once the destination is reached.
fn flood(topology: &Topology, ctx: &mut DiscoveryContext, journal: &mut EventJournal) -> Result<bool> {
    let source = ctx.source.clone();
    ctx.visit(&source, None);
    if source == ctx.destination {
        journal.record(ProtocolEvent::DestinationReached { at: source });
        return Ok(true);
    }

    let mut work_list = Vec::new();
    push_neighbors(topology, &source, &source, &mut work_list)?;

    while let Some(RreqDelivery { to, from }) = work_list.pop() {
        journal.record(ProtocolEvent::RreqSent {
            from: from.clone(),
            to: to.clone(),
        });

        if !ctx.visit(&to, Some(&from)) {
            journal.record(ProtocolEvent::RreqSuppressed { at: to, from });
            continue;
        }
        journal.record(ProtocolEvent::RreqReceived {
            at: to.clone(),
            from: from.clone(),
        });

        if to == ctx.destination {
            journal.record(ProtocolEvent::DestinationReached { at: to });
            return Ok(true);
        }

        push_neighbors(topology, &to, &from, &mut work_list)?;
    }

    Ok(false)
}

/// Queue RREQ deliveries from `current` to every neighbor except `predecessor`.
///
/// Pushed in descending ID order so the lowest ID is popped first.
fn push_neighbors(
    topology: &Topology,
    current: &NodeId,
    predecessor: &NodeId,
    work_list: &mut Vec<RreqDelivery>,
) -> Result<()> {
    let neighbors: Vec<&NodeId> = topology
        .neighbor_ids(current)?
        .filter(|n| *n != predecessor)
        .collect();

    for neighbor in neighbors.into_iter().rev() {
        work_list.push(RreqDelivery {
            to: neighbor.clone(),
            from: current.clone(),
        });
    }
    Ok(())
}

fn hops(path: &[NodeId]) -> u32 {
    u32::try_from(path.len().saturating_sub(1)).unwrap_or(u32::MAX)
}

fn join_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::NodeSpec;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| id(n)).collect()
    }

    /// A–B–C–D where each node only reaches its chain neighbors
    fn chain() -> Topology {
        Topology::from_specs(
            4,
            vec![
                NodeSpec::new("A", 0.0, 0.0, 10.0),
                NodeSpec::new("B", 10.0, 0.0, 10.0),
                NodeSpec::new("C", 20.0, 0.0, 10.0),
                NodeSpec::new("D", 30.0, 0.0, 10.0),
            ],
        )
        .unwrap()
    }

    fn discover(
        topology: &mut Topology,
        settings: &DiscoverySettings,
        source: &str,
        destination: &str,
    ) -> (DiscoveryReport, EventJournal) {
        let mut journal = EventJournal::new();
        let report = RouteDiscovery::new(topology, settings, &mut journal)
            .run(&id(source), &id(destination))
            .unwrap();
        (report, journal)
    }

    fn hop_at(topology: &Topology, at: &str, destination: &str) -> Option<u32> {
        topology
            .node(&id(at))?
            .routing_table()
            .lookup(&id(destination))
            .map(|e| e.hop_count)
    }

    #[test]
    fn test_chain_hop_counts() {
        let mut topology = chain();
        let (report, _) = discover(&mut topology, &DiscoverySettings::default(), "A", "D");

        assert_eq!(report.path(), Some(ids(&["A", "B", "C", "D"]).as_slice()));
        assert_eq!(report.hop_count(), Some(3));
        assert_eq!(hop_at(&topology, "A", "D"), Some(3));
        assert_eq!(hop_at(&topology, "B", "D"), Some(2));
        assert_eq!(hop_at(&topology, "C", "D"), Some(1));
        assert_eq!(hop_at(&topology, "D", "D"), None);

        let a = topology.node(&id("A")).unwrap();
        assert_eq!(a.routing_table().lookup(&id("D")).unwrap().next_hop, id("B"));
    }

    #[test]
    fn test_legacy_mode_installs_single_hop() {
        let mut topology = chain();
        let (report, _) = discover(&mut topology, &DiscoverySettings::legacy(), "A", "D");

        assert_eq!(report.hop_count(), Some(3));
        for node in ["A", "B", "C"] {
            assert_eq!(hop_at(&topology, node, "D"), Some(1));
        }
    }

    #[test]
    fn test_event_sequence_on_chain() {
        let mut topology = chain();
        let (_, journal) = discover(&mut topology, &DiscoverySettings::default(), "A", "C");

        let expected = vec![
            ProtocolEvent::RreqSent { from: id("A"), to: id("B") },
            ProtocolEvent::RreqReceived { at: id("B"), from: id("A") },
            ProtocolEvent::RreqSent { from: id("B"), to: id("C") },
            ProtocolEvent::RreqReceived { at: id("C"), from: id("B") },
            ProtocolEvent::DestinationReached { at: id("C") },
            ProtocolEvent::RrepSent { from: id("C"), to: id("B") },
            ProtocolEvent::RouteInstalled {
                at: id("B"),
                destination: id("C"),
                next_hop: id("C"),
                hop_count: 1,
            },
            ProtocolEvent::RrepSent { from: id("B"), to: id("A") },
            ProtocolEvent::RouteInstalled {
                at: id("A"),
                destination: id("C"),
                next_hop: id("B"),
                hop_count: 2,
            },
        ];
        assert_eq!(journal.events(), expected.as_slice());
    }

    #[test]
    fn test_cycle_terminates_without_route() {
        // A, B, C all hear each other; D is far away
        let mut topology = Topology::from_specs(
            4,
            vec![
                NodeSpec::new("A", 0.0, 0.0, 10.0),
                NodeSpec::new("B", 5.0, 0.0, 10.0),
                NodeSpec::new("C", 2.5, 4.0, 10.0),
                NodeSpec::new("D", 500.0, 500.0, 10.0),
            ],
        )
        .unwrap();

        let (report, journal) = discover(&mut topology, &DiscoverySettings::default(), "A", "D");
        assert_eq!(report.outcome, DiscoveryOutcome::NoRouteFound);
        assert_eq!(report.explored, ids(&["A", "B", "C"]));
        assert!(report.installed.is_empty());

        // A's direct copy reaches C after C heard it through B; C's copy back to A is dropped too
        let suppressed: Vec<_> = journal
            .events()
            .iter()
            .filter(|e| matches!(e, ProtocolEvent::RreqSuppressed { .. }))
            .collect();
        assert_eq!(suppressed.len(), 2);
        assert!(topology.nodes().all(|n| n.routing_table().is_empty()));
    }

    #[test]
    fn test_depth_first_order_picks_lowest_id_branch() {
        //   S -> B -> M -> T
        //   S -> C -> T
        let mut topology = Topology::new();
        topology.add_node(NodeSpec::new("S", 0.0, 0.0, 12.0)).unwrap();
        topology.add_node(NodeSpec::new("B", 10.0, 0.0, 12.0)).unwrap();
        topology.add_node(NodeSpec::new("C", 0.0, 10.0, 12.0)).unwrap();
        topology.add_node(NodeSpec::new("M", 16.0, 8.0, 12.0)).unwrap();
        topology.add_node(NodeSpec::new("T", 10.0, 15.0, 0.0)).unwrap();

        let (report, _) = discover(&mut topology, &DiscoverySettings::default(), "S", "T");
        // First arrival wins even though S -> C -> T is shorter
        assert_eq!(report.path(), Some(ids(&["S", "B", "M", "T"]).as_slice()));
        assert_eq!(report.explored, ids(&["S", "B", "M", "T"]));
        assert_eq!(hop_at(&topology, "S", "T"), Some(3));
        assert_eq!(hop_at(&topology, "C", "T"), None);
    }

    #[test]
    fn test_self_discovery_installs_nothing() {
        let mut topology = chain();
        let (report, journal) = discover(&mut topology, &DiscoverySettings::default(), "B", "B");

        assert_eq!(report.path(), Some(ids(&["B"]).as_slice()));
        assert_eq!(report.hop_count(), Some(0));
        assert!(report.installed.is_empty());
        assert_eq!(
            journal.events(),
            &[ProtocolEvent::DestinationReached { at: id("B") }]
        );
    }

    #[test]
    fn test_unknown_endpoints_rejected_before_flood() {
        let mut topology = chain();
        let mut journal = EventJournal::new();
        let settings = DiscoverySettings::default();

        let err = RouteDiscovery::new(&mut topology, &settings, &mut journal)
            .run(&id("A"), &id("Z"))
            .unwrap_err();
        assert!(matches!(err, crate::NetworkError::UnknownNode(ref z) if z.as_str() == "Z"));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_installed_lists_source_first() {
        let mut topology = chain();
        let (report, _) = discover(&mut topology, &DiscoverySettings::default(), "A", "D");

        let at: Vec<_> = report.installed.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(at, ids(&["A", "B", "C"]));
        assert_eq!(report.installed[0].1.hop_count, 3);
    }

    #[test]
    fn test_hops_counts_links() {
        assert_eq!(hops(&[]), 0);
        assert_eq!(hops(&ids(&["A"])), 0);
        assert_eq!(hops(&ids(&["A", "B", "C"])), 2);
    }
}
