//! Build orchestration: scan -> index -> graph -> resolve -> persist.
//!
//! Every call builds fresh state from its arguments; nothing is cached
//! between calls, so independent builds can run concurrently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{GraphData, GraphEdge, GraphNode, GraphStatistics, ResourceGraph};
use crate::indexer::Indexer;
use crate::resolver::{Resolutions, Resolver};
use crate::scanner::{ScanResult, Scanner};
use crate::store::{Artifact, ArtifactStore, EventStream, GovernanceEvent};

/// Format version written into every graph artifact.
pub const GRAPH_VERSION: &str = "6.0.0";

/// Artifact type tag for persisted resource graphs.
pub const ARTIFACT_TYPE: &str = "global_resource_graph";

const ARTIFACT_NAME: &str = "Global Resource Graph";
const EVENT_LAYER: &str = "GL30-49";
const EVENT_ANCHOR: &str = "resource-graph";

/// The persisted build artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalResourceGraph {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub statistics: GraphStatistics,
    pub resolutions: Resolutions,
}

impl GlobalResourceGraph {
    /// Assemble an artifact from a resolver snapshot.
    pub fn from_resolver(resolver: &Resolver) -> Self {
        let GraphData { nodes, edges } = resolver.graph().export_graph();
        Self {
            version: GRAPH_VERSION.to_string(),
            timestamp: Utc::now(),
            nodes,
            edges,
            statistics: resolver.graph().get_statistics(),
            resolutions: resolver.export_resolutions(),
        }
    }
}

/// Scan, index and resolver for one repository, kept in memory.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scan_results: Vec<ScanResult>,
    pub resolver: Resolver,
}

impl Analysis {
    pub fn graph(&self) -> &ResourceGraph {
        self.resolver.graph()
    }
}

/// Result of a persisted build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub artifact_id: String,
    pub graph: GlobalResourceGraph,
}

/// A graph restored from the artifact store.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub artifact_id: String,
    pub graph: GlobalResourceGraph,
    /// Resolver over the restored graph with an empty index.
    pub resolver: Resolver,
}

/// Run the in-memory stages for `root`.
///
/// The state directory is always excluded so stored artifacts never become
/// part of the graph they describe.
pub fn analyze_repository(root: &Path, config: &GraphConfig) -> Result<Analysis> {
    let start = Instant::now();
    let config = config.excluding_state_dir();

    let mut scanner = Scanner::new(&config);
    let scan_results = scanner.scan_repository(root)?;
    debug!(files = scan_results.len(), "scan stage done");

    let mut indexer = Indexer::new(root, &config);
    indexer.build_index(&scan_results);
    debug!(entries = indexer.get_index_size(), "index stage done");

    let entries = indexer.into_entries();
    let graph = ResourceGraph::from_entries(entries.values());
    let resolver = Resolver::new(graph, entries);

    info!(
        root = %root.display(),
        files = scan_results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "repository analysed"
    );
    Ok(Analysis {
        scan_results,
        resolver,
    })
}

/// Build the resource graph for `root` and persist it as an artifact.
///
/// Stage failures abort the build. Event stream failures are logged and
/// otherwise ignored.
pub fn build_global_resource_graph(
    root: &Path,
    config: &GraphConfig,
    store: &dyn ArtifactStore,
    events: &dyn EventStream,
) -> Result<BuildOutcome> {
    emit(
        events,
        "build_started",
        json!({ "root": root.display().to_string() }),
    );

    let analysis = analyze_repository(root, config)?;
    let graph = GlobalResourceGraph::from_resolver(&analysis.resolver);

    let artifact_id = Uuid::new_v4().to_string();
    let artifact = Artifact {
        id: artifact_id.clone(),
        artifact_type: ARTIFACT_TYPE.to_string(),
        name: ARTIFACT_NAME.to_string(),
        content: serde_json::to_value(&graph)?,
        timestamp: graph.timestamp,
        metadata: json!({
            "root": root.display().to_string(),
            "version": GRAPH_VERSION,
            "nodeCount": graph.statistics.node_count,
            "edgeCount": graph.statistics.edge_count,
        }),
    };
    store.store_artifact(&artifact)?;

    let summary = &graph.resolutions.summary;
    emit(
        events,
        "build_completed",
        json!({
            "artifactId": artifact_id,
            "nodeCount": summary.node_count,
            "edgeCount": summary.edge_count,
            "missingDependencies": summary.missing_dependency_count,
            "orphans": summary.orphan_count,
            "cycles": summary.cycle_count,
            "nonCompliant": summary.non_compliant_count,
        }),
    );

    info!(
        artifact = %artifact_id,
        nodes = summary.node_count,
        edges = summary.edge_count,
        "global resource graph built"
    );
    Ok(BuildOutcome { artifact_id, graph })
}

/// Whether a stored graph is still current for `root`.
///
/// No staleness tracking exists yet, so this always reports `false` and
/// callers rebuild.
pub fn check_graph_freshness(root: &Path) -> bool {
    debug!(root = %root.display(), "freshness check not implemented; reporting stale");
    false
}

/// Restore a graph artifact by id.
///
/// The resolver gets an empty index, so missing-dependency checks report
/// nothing on a loaded graph. The stored resolutions are returned as-is.
pub fn load_global_resource_graph(store: &dyn ArtifactStore, id: &str) -> Result<LoadedGraph> {
    let artifact = store
        .load_artifact(id)?
        .ok_or_else(|| GraphError::ArtifactNotFound(id.to_string()))?;

    if artifact.artifact_type != ARTIFACT_TYPE {
        return Err(GraphError::InvalidArtifact {
            id: id.to_string(),
            reason: format!("unexpected artifact type '{}'", artifact.artifact_type),
        });
    }

    let graph: GlobalResourceGraph =
        serde_json::from_value(artifact.content).map_err(|e| GraphError::InvalidArtifact {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    let data = GraphData {
        nodes: graph.nodes.clone(),
        edges: graph.edges.clone(),
    };
    let resolver =
        Resolver::from_data(data, BTreeMap::new()).map_err(|e| GraphError::InvalidArtifact {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    info!(artifact = %id, version = %graph.version, "global resource graph loaded");
    Ok(LoadedGraph {
        artifact_id: id.to_string(),
        graph,
        resolver,
    })
}

/// Id of the most recently stored graph artifact, if any.
pub fn latest_artifact_id(store: &dyn ArtifactStore) -> Result<Option<String>> {
    Ok(store
        .list_artifacts()?
        .into_iter()
        .rev()
        .find(|s| s.artifact_type == ARTIFACT_TYPE)
        .map(|s| s.id))
}

fn emit(events: &dyn EventStream, event_type: &str, metadata: serde_json::Value) {
    let event = GovernanceEvent {
        event_type: event_type.to_string(),
        layer: EVENT_LAYER.to_string(),
        semantic_anchor: EVENT_ANCHOR.to_string(),
        timestamp: Utc::now(),
        metadata,
    };
    if let Err(e) = events.log_event(&event) {
        warn!(event_type, error = %e, "failed to log governance event");
    }
}
