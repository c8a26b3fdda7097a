//! Network: the simulation facade
//!
//! Owns the topology, the discovery settings, and the event journal, and exposes
//! one call per simulation operation. Every topology mutation and protocol step
//! lands in the journal in the order it happened.

use crate::events::{EventJournal, ProtocolEvent};
use crate::mobility::{self, Movement};
use crate::routing::{self, DiscoveryReport, RouteDiscovery, RouteLookup, RoutingTable};
use crate::settings::DiscoverySettings;
use crate::topology::{Node, NodeId, NodeSpec, Position, Topology};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Snapshot of network size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    /// Directed neighbor links
    pub links: usize,
    /// Routing table entries across all nodes
    pub routes: usize,
}

/// A simulated ad-hoc network
#[derive(Debug, Clone, Default)]
pub struct Network {
    topology: Topology,
    settings: DiscoverySettings,
    journal: EventJournal,
}

impl Network {
    /// Create an empty network with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty network with custom settings
    pub fn with_settings(settings: DiscoverySettings) -> Self {
        let mut network = Self::default();
        network.set_settings(settings);
        network
    }

    /// Build a network from a validated batch of node specs
    pub fn from_specs(count: i64, specs: Vec<NodeSpec>) -> Result<Self> {
        Self::from_specs_with_settings(count, specs, DiscoverySettings::default())
    }

    pub fn from_specs_with_settings(
        count: i64,
        specs: Vec<NodeSpec>,
        settings: DiscoverySettings,
    ) -> Result<Self> {
        let topology = Topology::from_specs(count, specs)?;
        let mut network = Self {
            topology,
            settings: DiscoverySettings::default(),
            journal: EventJournal::new(),
        };
        network.set_settings(settings);
        if network.settings.record_reachability {
            // Replay the initial build so its decisions are journaled
            network.topology.recompute_all()?;
            network.collect_topology_events();
        }
        Ok(network)
    }

    /// Add one node
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node> {
        let id = spec.id.clone();
        let result = self.topology.add_node(spec).map(|_| ());
        self.collect_topology_events();
        result?;
        self.topology.node_or_err(&id)
    }

    /// Run route discovery from `source` toward `destination`
    pub fn discover(&mut self, source: &NodeId, destination: &NodeId) -> Result<DiscoveryReport> {
        RouteDiscovery::new(&mut self.topology, &self.settings, &mut self.journal)
            .run(source, destination)
    }

    /// Whether `source` holds a route to `destination`
    pub fn has_route(&self, source: &NodeId, destination: &NodeId) -> Result<bool> {
        routing::has_route(&self.topology, source, destination)
    }

    /// The route `source` holds for `destination`, if any
    pub fn query_route(&self, source: &NodeId, destination: &NodeId) -> Result<RouteLookup> {
        routing::query_route(&self.topology, source, destination)
    }

    /// Translate a node; returns its new position
    pub fn move_node(&mut self, id: &NodeId, dx: f64, dy: f64) -> Result<Position> {
        self.apply_movement(&Movement::new(id.clone(), dx, dy))
    }

    pub fn apply_movement(&mut self, movement: &Movement) -> Result<Position> {
        let result = mobility::apply(&mut self.topology, movement);
        self.collect_topology_events();

        let event = result?;
        self.journal.record(event);
        self.topology
            .node_or_err(&movement.id)
            .map(|node| node.position())
    }

    /// Change a node's communication range
    pub fn set_range(&mut self, id: &NodeId, range: f64) -> Result<()> {
        let result = self.topology.set_range(id, range);
        self.collect_topology_events();
        result?;

        tracing::info!("Device {} range set to {:.2}", id, range);
        self.journal.record(ProtocolEvent::RangeChanged {
            id: id.clone(),
            range,
        });
        Ok(())
    }

    /// Neighbors reachable from `id`, ascending by ID
    pub fn neighbors_of(&self, id: &NodeId) -> Result<Vec<&Node>> {
        self.topology.neighbors_of(id)
    }

    pub fn routing_table(&self, id: &NodeId) -> Result<&RoutingTable> {
        Ok(self.topology.node_or_err(id)?.routing_table())
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.topology.node(id)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: DiscoverySettings) {
        self.topology
            .set_reachability_trace(settings.record_reachability);
        self.settings = settings;
    }

    /// Every event recorded since the last drain
    pub fn events(&self) -> &[ProtocolEvent] {
        self.journal.events()
    }

    pub fn drain_events(&mut self) -> Vec<ProtocolEvent> {
        self.journal.drain()
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            nodes: self.topology.len(),
            links: self.topology.link_count(),
            routes: self
                .topology
                .nodes()
                .map(|n| n.routing_table().len())
                .sum(),
        }
    }

    fn collect_topology_events(&mut self) {
        let events = self.topology.take_events();
        self.journal.extend(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::HopCountMode;
    use crate::NetworkError;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn chain() -> Network {
        Network::from_specs(
            3,
            vec![
                NodeSpec::new("A", 0.0, 0.0, 10.0),
                NodeSpec::new("B", 10.0, 0.0, 10.0),
                NodeSpec::new("C", 20.0, 0.0, 10.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_discover_then_query() {
        let mut network = chain();
        assert!(!network.has_route(&id("A"), &id("C")).unwrap());

        let report = network.discover(&id("A"), &id("C")).unwrap();
        assert!(report.is_found());
        assert!(network.has_route(&id("A"), &id("C")).unwrap());

        let lookup = network.query_route(&id("A"), &id("C")).unwrap();
        assert_eq!(lookup.entry.unwrap().hop_count, 2);
    }

    #[test]
    fn test_move_is_journaled() {
        let mut network = chain();
        let position = network.move_node(&id("C"), 0.0, 3.0).unwrap();
        assert_eq!(position, Position::new(20.0, 3.0));
        assert_eq!(
            network.events(),
            &[ProtocolEvent::NodeMoved {
                id: id("C"),
                x: 20.0,
                y: 3.0
            }]
        );
    }

    #[test]
    fn test_failed_move_records_nothing() {
        let mut network = chain();
        assert!(matches!(
            network.move_node(&id("Z"), 1.0, 1.0),
            Err(NetworkError::UnknownNode(_))
        ));
        assert!(network.events().is_empty());
    }

    #[test]
    fn test_overflowing_move_keeps_journal_serializable() {
        let mut network =
            Network::from_specs(1, vec![NodeSpec::new("A", 1e308, 0.0, 10.0)]).unwrap();
        assert!(matches!(
            network.move_node(&id("A"), 1e308, 0.0),
            Err(NetworkError::InvalidNode { .. })
        ));
        assert!(network.events().is_empty());

        network.move_node(&id("A"), -1e308, 2.0).unwrap();
        let json = serde_json::to_string(network.events()).unwrap();
        let back: Vec<ProtocolEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, network.events());
    }

    #[test]
    fn test_set_range_is_journaled() {
        let mut network = chain();
        network.set_range(&id("A"), 25.0).unwrap();
        assert_eq!(network.neighbors_of(&id("A")).unwrap().len(), 2);
        assert_eq!(
            network.drain_events(),
            vec![ProtocolEvent::RangeChanged {
                id: id("A"),
                range: 25.0
            }]
        );
        assert!(network.events().is_empty());
    }

    #[test]
    fn test_reachability_recording() {
        let settings = DiscoverySettings {
            record_reachability: true,
            ..DiscoverySettings::default()
        };
        let network = Network::from_specs_with_settings(
            3,
            vec![
                NodeSpec::new("A", 0.0, 0.0, 10.0),
                NodeSpec::new("B", 10.0, 0.0, 10.0),
                NodeSpec::new("C", 20.0, 0.0, 10.0),
            ],
            settings,
        )
        .unwrap();

        // Every ordered pair is checked once on build
        let checks = network
            .events()
            .iter()
            .filter(|e| matches!(e, ProtocolEvent::ReachabilityChecked { .. }))
            .count();
        assert_eq!(checks, 6);
    }

    #[test]
    fn test_add_node_and_summary() {
        let mut network = Network::with_settings(DiscoverySettings::legacy());
        assert_eq!(network.settings().hop_count_mode, HopCountMode::Legacy);

        network.add_node(NodeSpec::new("A", 0.0, 0.0, 10.0)).unwrap();
        network.add_node(NodeSpec::new("B", 5.0, 0.0, 10.0)).unwrap();
        assert!(matches!(
            network.add_node(NodeSpec::new("B", 0.0, 0.0, 1.0)),
            Err(NetworkError::DuplicateId(_))
        ));

        network.discover(&id("A"), &id("B")).unwrap();
        assert_eq!(
            network.summary(),
            NetworkSummary {
                nodes: 2,
                links: 2,
                routes: 1
            }
        );
    }

    #[test]
    fn test_routing_table_access() {
        let mut network = chain();
        network.discover(&id("C"), &id("A")).unwrap();
        assert_eq!(network.routing_table(&id("B")).unwrap().len(), 1);
        assert!(matches!(
            network.routing_table(&id("Z")),
            Err(NetworkError::UnknownNode(_))
        ));
    }
}
