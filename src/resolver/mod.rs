//! Resource resolver: structural queries over a frozen graph + index view.
//!
//! Path lookups and dependency existence are answered from the graph.
//! Missing-dependency detection deliberately walks the raw index entries
//! instead, so a dependency dropped at the graph layer still shows up as
//! missing there while `resolve_dependency` reports `false` for it.

pub mod cycles;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::graph::{GraphData, GraphNode, ResourceGraph};
use crate::indexer::IndexEntry;

/// Outcome of a check that collects missing items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// True when nothing is missing.
    pub found: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl Resolution {
    fn from_missing(missing: Vec<String>) -> Self {
        Self {
            found: missing.is_empty(),
            missing,
        }
    }
}

/// Nodes whose path matches a pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathResolution {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<GraphNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

/// Counts over one resolution snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub missing_dependency_count: usize,
    pub orphan_count: usize,
    pub cycle_count: usize,
    pub non_compliant_count: usize,
}

/// All checks bundled together; embedded in the persisted graph artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolutions {
    pub missing_dependencies: Resolution,
    pub orphan_nodes: Vec<GraphNode>,
    pub cyclic_dependencies: Vec<Vec<String>>,
    pub governance_compliance: Resolution,
    pub summary: ResolutionSummary,
}

/// Answers queries over a snapshot of a graph and the index it came from.
#[derive(Debug, Clone)]
pub struct Resolver {
    graph: ResourceGraph,
    index_entries: BTreeMap<String, IndexEntry>,
}

impl Resolver {
    pub fn new(graph: ResourceGraph, index_entries: BTreeMap<String, IndexEntry>) -> Self {
        Self {
            graph,
            index_entries,
        }
    }

    /// Construct from an exported graph payload.
    pub fn from_data(data: GraphData, index_entries: BTreeMap<String, IndexEntry>) -> Result<Self> {
        Ok(Self::new(ResourceGraph::from_data(data)?, index_entries))
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn index_entries(&self) -> &BTreeMap<String, IndexEntry> {
        &self.index_entries
    }

    /// Exact path lookup. A miss is logged, not an error.
    pub fn resolve_file(&self, path: &str) -> Option<&GraphNode> {
        let node = self.graph.get_node_by_path(path);
        if node.is_none() {
            warn!(path, "file not found in resource graph");
        }
        node
    }

    /// Glob-like lookup: `*` matches any run of characters, everything else
    /// is literal, and the whole path must match.
    pub fn resolve_path(&self, pattern: &str) -> Result<PathResolution> {
        let re = pattern_regex(pattern)?;
        let nodes: Vec<GraphNode> = self
            .graph
            .get_nodes()
            .into_iter()
            .filter(|n| re.is_match(&n.path))
            .cloned()
            .collect();
        let paths = nodes.iter().map(|n| n.path.clone()).collect();
        Ok(PathResolution {
            found: !nodes.is_empty(),
            nodes,
            paths,
        })
    }

    /// True only if both paths are nodes and an edge runs between them.
    pub fn resolve_dependency(&self, from_path: &str, to_path: &str) -> bool {
        match (self.resolve_file(from_path), self.resolve_file(to_path)) {
            (Some(from), Some(to)) => self.graph.has_edge(&from.id, &to.id),
            _ => false,
        }
    }

    /// Declared dependencies (from the index) that name no graph node,
    /// formatted as `"<path> -> <dependency>"`.
    pub fn resolve_missing_dependencies(&self) -> Resolution {
        let missing: Vec<String> = self
            .index_entries
            .values()
            .flat_map(|entry| {
                entry
                    .dependencies
                    .iter()
                    .filter(|dep| self.graph.get_node_by_path(&dep.path).is_none())
                    .map(move |dep| format!("{} -> {}", entry.path, dep.path))
            })
            .collect();
        debug!(missing = missing.len(), "missing dependency check");
        Resolution::from_missing(missing)
    }

    /// Nodes with no incoming or outgoing edges.
    pub fn resolve_orphan_nodes(&self) -> Vec<&GraphNode> {
        self.graph
            .get_nodes()
            .into_iter()
            .filter(|n| self.graph.degree(&n.id) == 0)
            .collect()
    }

    /// Dependency cycles as closed node-id lists.
    pub fn resolve_cyclic_dependencies(&self) -> Vec<Vec<String>> {
        cycles::find_cycles(&self.graph)
    }

    /// Nodes without a semantic anchor, by path.
    pub fn resolve_governance_compliance(&self) -> Resolution {
        let missing = self
            .graph
            .get_nodes()
            .into_iter()
            .filter(|n| n.semantic_anchor.is_none())
            .map(|n| n.path.clone())
            .collect();
        Resolution::from_missing(missing)
    }

    /// Run every check and bundle the results.
    pub fn export_resolutions(&self) -> Resolutions {
        let missing_dependencies = self.resolve_missing_dependencies();
        let orphan_nodes: Vec<GraphNode> =
            self.resolve_orphan_nodes().into_iter().cloned().collect();
        let cyclic_dependencies = self.resolve_cyclic_dependencies();
        let governance_compliance = self.resolve_governance_compliance();
        let stats = self.graph.get_statistics();

        let summary = ResolutionSummary {
            node_count: stats.node_count,
            edge_count: stats.edge_count,
            missing_dependency_count: missing_dependencies.missing.len(),
            orphan_count: orphan_nodes.len(),
            cycle_count: cyclic_dependencies.len(),
            non_compliant_count: governance_compliance.missing.len(),
        };

        Resolutions {
            missing_dependencies,
            orphan_nodes,
            cyclic_dependencies,
            governance_compliance,
            summary,
        }
    }
}

/// Translate a `*` glob into an anchored regex with everything else escaped.
fn pattern_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|source| GraphError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
