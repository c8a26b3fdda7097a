//! On-demand routing (AODV-style)
//!
//! - Table: per-node destination → (next hop, hop count), one entry per destination
//! - Discovery: RREQ flood from a source, RREP unwind from the destination
//! - Query: read-only reachability checks against a node's table
//!
//! Tables are written only by the route reply. Topology changes leave existing
//! entries in place: there is no route maintenance or repair.

pub mod discovery;
pub mod query;
pub mod table;

pub use discovery::{DiscoveryOutcome, DiscoveryReport, RouteDiscovery};
pub use query::{has_route, query_route, RouteLookup};
pub use table::{RouteEntry, RoutingTable};
