// Mobility: repositioning nodes between discoveries
//
// A move only changes the topology. Routing tables are left untouched, so entries
// learned before the move may now point at neighbors that are out of range. There
// is no route maintenance or repair; run discovery again to refresh a route.

use crate::events::ProtocolEvent;
use crate::topology::{NodeId, Topology};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A displacement to apply to one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: NodeId,
    pub dx: f64,
    pub dy: f64,
}

impl Movement {
    pub fn new(id: impl Into<NodeId>, dx: f64, dy: f64) -> Self {
        Self {
            id: id.into(),
            dx,
            dy,
        }
    }
}

/// Move a node and refresh its adjacency. Returns the `NodeMoved` observation.
pub fn apply(topology: &mut Topology, movement: &Movement) -> Result<ProtocolEvent> {
    let position = topology.move_node(&movement.id, movement.dx, movement.dy)?;
    tracing::info!("Device {} moved to {}", movement.id, position);

    Ok(ProtocolEvent::NodeMoved {
        id: movement.id.clone(),
        x: position.x,
        y: position.y,
    })
}

/// Apply a batch of movements in order, stopping at the first failure
pub fn apply_all(topology: &mut Topology, movements: &[Movement]) -> Result<Vec<ProtocolEvent>> {
    movements.iter().map(|m| apply(topology, m)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::NodeSpec;
    use crate::NetworkError;

    fn topology() -> Topology {
        Topology::from_specs(
            2,
            vec![
                NodeSpec::new("A", 0.0, 0.0, 10.0),
                NodeSpec::new("B", 50.0, 0.0, 10.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_apply_reports_new_position() {
        let mut topology = topology();
        let event = apply(&mut topology, &Movement::new("B", -45.0, 2.5)).unwrap();

        assert_eq!(
            event,
            ProtocolEvent::NodeMoved {
                id: "B".into(),
                x: 5.0,
                y: 2.5
            }
        );
        assert!(topology.is_adjacent(&"A".into(), &"B".into()));
    }

    #[test]
    fn test_apply_all_stops_on_unknown_node() {
        let mut topology = topology();
        let result = apply_all(
            &mut topology,
            &[Movement::new("A", 1.0, 0.0), Movement::new("Z", 1.0, 0.0)],
        );
        assert!(matches!(result, Err(NetworkError::UnknownNode(_))));
        // The first move already happened
        assert_eq!(topology.node(&"A".into()).unwrap().position().x, 1.0);
    }

    #[test]
    fn test_move_keeps_stale_routes() {
        let mut topology = topology();
        topology
            .node_mut_or_err(&"A".into())
            .unwrap()
            .routing_table_mut()
            .update("B".into(), "B".into(), 1);

        apply(&mut topology, &Movement::new("B", 500.0, 0.0)).unwrap();
        let table = topology.node(&"A".into()).unwrap().routing_table();
        assert!(table.lookup(&"B".into()).is_some());
    }
}
