//! Resource graph module.
//!
//! Provides the graph data model, the petgraph-backed engine and
//! export/import of graph snapshots.

pub mod engine;
pub mod persistence;
pub mod types;

pub use engine::ResourceGraph;
pub use types::{node_id, EdgeKind, GraphData, GraphEdge, GraphNode, GraphStatistics};
