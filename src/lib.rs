//! # resgraph
//!
//! Resource graph for repositories: which files exist, what they are, and
//! which of them depend on which.
//!
//! The pipeline runs in fixed stages:
//!
//! - **Scanner**: walks the tree, classifies files, records governance markers
//! - **Indexer**: extracts metadata and regex-detected dependencies
//! - **Graph**: one node per file, one edge per dependency between known files
//! - **Resolver**: path lookup, missing deps, orphans, cycles, compliance
//! - **Pipeline**: runs the stages and persists a timestamped artifact
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resgraph::{analyze_repository, GraphConfig};
//! use std::path::Path;
//!
//! let analysis = analyze_repository(Path::new("."), &GraphConfig::default()).unwrap();
//! for cycle in analysis.resolver.resolve_cyclic_dependencies() {
//!     println!("{}", cycle.join(" -> "));
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
pub mod store;

// Re-exports for convenience
pub use config::GraphConfig;
pub use error::{GraphError, Result};

pub use graph::{node_id, EdgeKind, GraphData, GraphEdge, GraphNode, GraphStatistics, ResourceGraph};
pub use indexer::{IndexEntry, Indexer};
pub use pipeline::{
    analyze_repository, build_global_resource_graph, check_graph_freshness, latest_artifact_id,
    load_global_resource_graph, Analysis, BuildOutcome, GlobalResourceGraph, LoadedGraph,
};
pub use resolver::{PathResolution, Resolution, Resolutions, Resolver};
pub use scanner::{Language, ResourceFormat, ResourceType, ScanResult, Scanner};

// Persistence
pub use store::{
    Artifact, ArtifactStore, EventStream, FileArtifactStore, GovernanceEvent, JsonlEventStream,
    MemoryArtifactStore, MemoryEventStream, TracingEventStream,
};
