//! Scenarios: construction input plus a script of simulation steps
//!
//! A scenario is the JSON form of what an operator would otherwise type in: a
//! device count, one record per device, and the discoveries, moves, and queries to
//! run against the resulting network.
//!
//! ```json
//! {
//!   "count": 2,
//!   "nodes": [
//!     { "id": "A", "x": 0.0, "y": 0.0, "range": 10.0 },
//!     { "id": "B", "x": 5.0, "y": 0.0, "range": 10.0 }
//!   ],
//!   "steps": [
//!     { "action": "discover", "source": "A", "destination": "B" },
//!     { "action": "query", "source": "A", "destination": "B" }
//!   ]
//! }
//! ```

use crate::events::ProtocolEvent;
use crate::network::{Network, NetworkSummary};
use crate::routing::{DiscoveryReport, RouteLookup};
use crate::settings::DiscoverySettings;
use crate::topology::{NodeId, NodeSpec};
use crate::{NetworkError, Result};
use serde::{Deserialize, Serialize};

/// One scripted operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    Discover { source: NodeId, destination: NodeId },
    Move { id: NodeId, dx: f64, dy: f64 },
    SetRange { id: NodeId, range: f64 },
    Query { source: NodeId, destination: NodeId },
}

/// What a successful step produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepResult {
    Discovered { report: DiscoveryReport },
    Moved { id: NodeId, x: f64, y: f64 },
    RangeSet { id: NodeId, range: f64 },
    Queried { lookup: RouteLookup },
}

/// A step paired with its result or error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: ScenarioStep,
    pub result: std::result::Result<StepResult, NetworkError>,
}

/// Everything a scenario run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub records: Vec<StepRecord>,
    pub summary: NetworkSummary,
    pub events: Vec<ProtocolEvent>,
}

impl ScenarioOutcome {
    /// Number of steps that failed
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_err()).count()
    }
}

/// A network description plus the steps to run on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Declared device count; defaults to the number of node records
    #[serde(default)]
    pub count: Option<i64>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
    /// Discovery settings; the caller's defaults apply when absent
    #[serde(default)]
    pub settings: Option<DiscoverySettings>,
}

impl Scenario {
    pub fn new(nodes: Vec<NodeSpec>) -> Self {
        Self {
            count: None,
            nodes,
            steps: Vec::new(),
            settings: None,
        }
    }

    pub fn with_step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_settings(mut self, settings: DiscoverySettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn declared_count(&self) -> i64 {
        self.count
            .unwrap_or_else(|| i64::try_from(self.nodes.len()).unwrap_or(i64::MAX))
    }

    /// Build the network. Fails without creating anything on malformed input.
    pub fn build(&self) -> Result<Network> {
        Network::from_specs_with_settings(
            self.declared_count(),
            self.nodes.clone(),
            self.settings.clone().unwrap_or_default(),
        )
    }

    /// Build the network and run every step in order.
    ///
    /// A failing step is recorded and the run continues with the next step.
    pub fn run(&self) -> Result<ScenarioOutcome> {
        let mut network = self.build()?;
        let records = self.run_steps(&mut network);

        Ok(ScenarioOutcome {
            records,
            summary: network.summary(),
            events: network.drain_events(),
        })
    }

    /// Run every step against an existing network
    pub fn run_steps(&self, network: &mut Network) -> Vec<StepRecord> {
        self.steps
            .iter()
            .map(|step| StepRecord {
                step: step.clone(),
                result: run_step(network, step),
            })
            .collect()
    }
}

fn run_step(network: &mut Network, step: &ScenarioStep) -> Result<StepResult> {
    match step {
        ScenarioStep::Discover {
            source,
            destination,
        } => Ok(StepResult::Discovered {
            report: network.discover(source, destination)?,
        }),
        ScenarioStep::Move { id, dx, dy } => {
            let position = network.move_node(id, *dx, *dy)?;
            Ok(StepResult::Moved {
                id: id.clone(),
                x: position.x,
                y: position.y,
            })
        }
        ScenarioStep::SetRange { id, range } => {
            network.set_range(id, *range)?;
            Ok(StepResult::RangeSet {
                id: id.clone(),
                range: *range,
            })
        }
        ScenarioStep::Query {
            source,
            destination,
        } => Ok(StepResult::Queried {
            lookup: network.query_route(source, destination)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_NODES: &str = r#"{
        "nodes": [
            { "id": "A", "x": 0.0, "y": 0.0, "range": 10.0 },
            { "id": "B", "x": 5.0, "y": 0.0, "range": 10.0 }
        ],
        "steps": [
            { "action": "query", "source": "A", "destination": "B" },
            { "action": "discover", "source": "A", "destination": "B" },
            { "action": "query", "source": "A", "destination": "B" },
            { "action": "query", "source": "A", "destination": "Z" }
        ]
    }"#;

    #[test]
    fn test_parse_and_run() {
        let scenario = Scenario::from_json_str(TWO_NODES).unwrap();
        assert_eq!(scenario.count, None);
        assert_eq!(scenario.steps.len(), 4);

        let outcome = scenario.run().unwrap();
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.failures(), 1);

        match &outcome.records[0].result {
            Ok(StepResult::Queried { lookup }) => assert!(!lookup.has_route()),
            other => panic!("unexpected {:?}", other),
        }
        match &outcome.records[2].result {
            Ok(StepResult::Queried { lookup }) => assert!(lookup.has_route()),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            outcome.records[3].result,
            Err(NetworkError::UnknownNode(_))
        ));
        assert_eq!(outcome.summary.routes, 1);
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let mut scenario = Scenario::from_json_str(TWO_NODES).unwrap();
        scenario.count = Some(3);
        assert!(matches!(
            scenario.build(),
            Err(NetworkError::MalformedInput(_))
        ));

        scenario.count = Some(0);
        assert!(matches!(
            scenario.build(),
            Err(NetworkError::InvalidCount(0))
        ));
    }

    #[test]
    fn test_builder_steps() {
        let scenario = Scenario::new(vec![
            NodeSpec::new("A", 0.0, 0.0, 10.0),
            NodeSpec::new("B", 20.0, 0.0, 10.0),
        ])
        .with_step(ScenarioStep::Discover {
            source: "A".into(),
            destination: "B".into(),
        })
        .with_step(ScenarioStep::Move {
            id: "B".into(),
            dx: -10.0,
            dy: 0.0,
        })
        .with_step(ScenarioStep::Discover {
            source: "A".into(),
            destination: "B".into(),
        });

        let outcome = scenario.run().unwrap();
        let found: Vec<bool> = outcome
            .records
            .iter()
            .filter_map(|r| match &r.result {
                Ok(StepResult::Discovered { report }) => Some(report.is_found()),
                _ => None,
            })
            .collect();
        assert_eq!(found, vec![false, true]);
    }

    #[test]
    fn test_settings_apply_to_build() {
        let scenario = Scenario::new(vec![
            NodeSpec::new("A", 0.0, 0.0, 10.0),
            NodeSpec::new("B", 10.0, 0.0, 10.0),
            NodeSpec::new("C", 20.0, 0.0, 10.0),
        ])
        .with_settings(DiscoverySettings::legacy());

        let mut network = scenario.build().unwrap();
        network.discover(&"A".into(), &"C".into()).unwrap();
        let entry = network.query_route(&"A".into(), &"C".into()).unwrap().entry.unwrap();
        assert_eq!(entry.hop_count, 1);
    }

    #[test]
    fn test_step_json_shape() {
        let step: ScenarioStep =
            serde_json::from_str(r#"{"action":"set_range","id":"A","range":4.5}"#).unwrap();
        assert_eq!(
            step,
            ScenarioStep::SetRange {
                id: "A".into(),
                range: 4.5
            }
        );
    }
}
