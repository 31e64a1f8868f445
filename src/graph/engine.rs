//! The resource graph engine.
//!
//! Uses petgraph to store dependency relationships between indexed
//! resources and provides lookup and traversal queries.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use tracing::{debug, info};

use super::types::*;
use crate::indexer::IndexEntry;
use crate::scanner::{Language, ResourceType};

/// The resource graph: nodes, edges, and lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    /// The directed graph storing dependency relationships.
    pub(super) graph: DiGraph<GraphNode, GraphEdge>,
    /// Index: node id -> node index.
    pub(super) id_index: HashMap<String, NodeIndex>,
    /// Index: resource path -> node index.
    pub(super) path_index: HashMap<String, NodeIndex>,
}

impl ResourceGraph {
    /// Create a new empty resource graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from index entries, replacing any previous content.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a IndexEntry>,
    {
        let mut graph = Self::new();
        graph.build_graph(entries);
        graph
    }

    /// Rebuild the graph from index entries.
    ///
    /// One node per entry. One edge per dependency whose target path is
    /// itself an entry; dependencies on anything else are dropped.
    pub fn build_graph<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a IndexEntry>,
    {
        *self = Self::new();
        let entries: Vec<&IndexEntry> = entries.into_iter().collect();

        // Phase 1: nodes
        for entry in &entries {
            self.add_node(GraphNode::from_entry(entry));
        }

        // Phase 2: edges between known nodes
        let mut dropped = 0usize;
        for entry in &entries {
            let Some(&from) = self.path_index.get(&entry.path) else {
                continue;
            };
            for dep in &entry.dependencies {
                match self.path_index.get(&dep.path) {
                    Some(&to) => self.add_edge(from, to, dep.kind),
                    None => dropped += 1,
                }
            }
        }

        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            dropped_dependencies = dropped,
            "graph built"
        );
    }

    // ─── Node / Edge Operations ─────────────────────────────────

    pub(super) fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let id = node.id.clone();
        let path = node.path.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.path_index.insert(path, idx);
        idx
    }

    pub(super) fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) {
        let edge = GraphEdge {
            source: self.graph[from].id.clone(),
            target: self.graph[to].id.clone(),
            kind,
        };
        debug!(source = %edge.source, target = %edge.target, kind = %kind, "edge");
        self.graph.add_edge(from, to, edge);
    }

    // ─── Query Operations ───────────────────────────────────────

    /// All nodes in insertion order.
    pub fn get_nodes(&self) -> Vec<&GraphNode> {
        self.graph.node_weights().collect()
    }

    /// All edges in insertion order.
    pub fn get_edges(&self) -> Vec<&GraphEdge> {
        self.graph.edge_weights().collect()
    }

    pub fn get_node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.id_index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn get_node_by_path(&self, path: &str) -> Option<&GraphNode> {
        self.path_index.get(path).map(|&idx| &self.graph[idx])
    }

    /// Nodes this node has an edge to, ordered by path.
    pub fn get_dependencies(&self, id: &str) -> Vec<&GraphNode> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Nodes with an edge to this node, ordered by path.
    pub fn get_dependents(&self, id: &str) -> Vec<&GraphNode> {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn get_nodes_by_type(&self, resource_type: ResourceType) -> Vec<&GraphNode> {
        self.graph
            .node_weights()
            .filter(|n| n.resource_type == resource_type)
            .collect()
    }

    pub fn get_nodes_by_language(&self, language: Language) -> Vec<&GraphNode> {
        self.graph
            .node_weights()
            .filter(|n| n.language == language)
            .collect()
    }

    pub fn get_nodes_by_semantic_anchor(&self, anchor: &str) -> Vec<&GraphNode> {
        self.graph
            .node_weights()
            .filter(|n| n.semantic_anchor.as_deref() == Some(anchor))
            .collect()
    }

    /// True if an edge runs from `from` to `to` (node ids).
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.id_index.get(from), self.id_index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Number of edges touching a node in either direction.
    pub fn degree(&self, id: &str) -> usize {
        self.id_index
            .get(id)
            .map(|&idx| {
                self.graph.edges_directed(idx, Direction::Outgoing).count()
                    + self.graph.edges_directed(idx, Direction::Incoming).count()
            })
            .unwrap_or(0)
    }

    /// Outgoing neighbour ids of a node, in edge insertion order.
    pub fn successor_ids(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| self.graph[e.target()].id.as_str())
            .collect()
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn get_statistics(&self) -> GraphStatistics {
        let node_count = self.graph.node_count();
        let edge_count = self.graph.edge_count();
        let avg_degree = if node_count == 0 {
            0.0
        } else {
            (2 * edge_count) as f64 / node_count as f64
        };
        GraphStatistics {
            node_count,
            edge_count,
            avg_degree,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    // ─── Internal Helpers ───────────────────────────────────────

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&GraphNode> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut nodes: Vec<&GraphNode> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| &self.graph[n])
            .collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        nodes.dedup_by(|a, b| a.id == b.id);
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::Dependency;

    fn entry(path: &str, deps: &[&str], anchor: Option<&str>) -> IndexEntry {
        let p = std::path::Path::new(path);
        IndexEntry {
            path: path.to_string(),
            resource_type: ResourceType::from_path(p),
            language: Language::from_path(p),
            semantic_anchor: anchor.map(|a| a.to_string()),
            layer: None,
            charter_version: None,
            dependencies: deps
                .iter()
                .map(|d| Dependency {
                    path: d.to_string(),
                    kind: EdgeKind::Import,
                })
                .collect(),
            dependents: Vec::new(),
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = ResourceGraph::new();
        let stats = graph.get_statistics();
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.avg_degree, 0.0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_one_node_per_entry() {
        let entries = [
            entry("src/a.ts", &["src/b.ts"], Some("alpha")),
            entry("src/b.ts", &[], None),
            entry("README.md", &[], None),
        ];
        let graph = ResourceGraph::from_entries(&entries);
        assert_eq!(graph.get_nodes().len(), 3);
        assert_eq!(graph.get_edges().len(), 1);

        let a = graph.get_node_by_path("src/a.ts").unwrap();
        assert_eq!(a.id, node_id("src/a.ts"));
        assert_eq!(graph.get_node_by_id(&a.id).unwrap().path, "src/a.ts");
        assert_eq!(graph.get_nodes_by_semantic_anchor("alpha").len(), 1);
        assert_eq!(graph.get_nodes_by_type(ResourceType::Code).len(), 2);
        assert_eq!(graph.get_nodes_by_language(Language::TypeScript).len(), 2);
    }

    #[test]
    fn test_unknown_dependencies_are_dropped() {
        let entries = [
            entry("src/a.ts", &["src/b.ts", "react", "./missing"], None),
            entry("src/b.ts", &[], None),
        ];
        let graph = ResourceGraph::from_entries(&entries);
        assert_eq!(graph.get_edges().len(), 1);

        let deps = graph.get_dependencies(&node_id("src/a.ts"));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].path, "src/b.ts");

        let dependents = graph.get_dependents(&node_id("src/b.ts"));
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].path, "src/a.ts");
    }

    #[test]
    fn test_statistics_avg_degree() {
        let entries = [
            entry("a.py", &["b.py", "c.py"], None),
            entry("b.py", &["c.py"], None),
            entry("c.py", &[], None),
            entry("d.py", &[], None),
        ];
        let stats = ResourceGraph::from_entries(&entries).get_statistics();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(stats.avg_degree, 1.5);
    }

    #[test]
    fn test_self_reference_is_reflected() {
        let entries = [entry("loop.js", &["loop.js"], None)];
        let graph = ResourceGraph::from_entries(&entries);
        let id = node_id("loop.js");
        assert!(graph.has_edge(&id, &id));
        assert_eq!(graph.degree(&id), 2);
    }

    #[test]
    fn test_rebuild_replaces_state() {
        let mut graph = ResourceGraph::from_entries(&[entry("old.ts", &[], None)]);
        graph.build_graph(&[entry("new.ts", &[], None)]);
        assert!(graph.get_node_by_path("old.ts").is_none());
        assert_eq!(graph.get_nodes().len(), 1);
    }

    #[test]
    fn test_unknown_node_queries() {
        let graph = ResourceGraph::new();
        assert!(graph.get_node_by_id("node:x").is_none());
        assert!(graph.get_dependencies("node:x").is_empty());
        assert!(graph.get_dependents("node:x").is_empty());
        assert!(!graph.has_edge("node:x", "node:y"));
        assert!(graph.successor_ids("node:x").is_empty());
    }

    #[test]
    fn test_successor_order_follows_insertion() {
        let entries = [
            entry("a.py", &["c.py", "b.py"], None),
            entry("b.py", &[], None),
            entry("c.py", &[], None),
        ];
        let graph = ResourceGraph::from_entries(&entries);
        assert_eq!(
            graph.successor_ids(&node_id("a.py")),
            vec!["node:c.py", "node:b.py"]
        );
    }
}
