//! Core types for the resource graph.
//!
//! Defines edge kinds, the node and edge records, and the serialisable
//! graph payload used for export/import.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indexer::IndexEntry;
use crate::scanner::{Language, ResourceType};

/// The kind of an edge (relationship) in the resource graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// CommonJS `require(...)`.
    Dependency,
    /// Documentation link to another resource.
    Reference,
    /// C/C++ `#include "..."`.
    Include,
    /// ES module or Python import.
    Import,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Dependency => write!(f, "dependency"),
            EdgeKind::Reference => write!(f, "reference"),
            EdgeKind::Include => write!(f, "include"),
            EdgeKind::Import => write!(f, "import"),
        }
    }
}

/// Deterministic node id for a resource path.
pub fn node_id(path: &str) -> String {
    format!("node:{path}")
}

/// A resource in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charter_version: Option<String>,
}

impl GraphNode {
    pub fn from_entry(entry: &IndexEntry) -> Self {
        Self {
            id: node_id(&entry.path),
            path: entry.path.clone(),
            resource_type: entry.resource_type,
            language: entry.language,
            semantic_anchor: entry.semantic_anchor.clone(),
            layer: entry.layer.clone(),
            charter_version: entry.charter_version.clone(),
        }
    }
}

/// A directed relationship between two nodes, by node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// Serialisable snapshot of a graph: nodes and edges in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Statistics about the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    /// `2 * edges / nodes`, or 0 for an empty graph.
    pub avg_degree: f64,
}
