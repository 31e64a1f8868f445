//! Graph export/import for serialization round-trips.

use std::collections::HashSet;
use tracing::debug;

use super::engine::ResourceGraph;
use super::types::GraphData;
use crate::error::{GraphError, Result};

impl ResourceGraph {
    /// Snapshot nodes and edges in insertion order.
    pub fn export_graph(&self) -> GraphData {
        GraphData {
            nodes: self.graph.node_weights().cloned().collect(),
            edges: self.graph.edge_weights().cloned().collect(),
        }
    }

    /// Replace the whole graph with `data`.
    ///
    /// Node and edge order are preserved. Duplicate node ids or paths and
    /// edges with unknown endpoints are rejected; on error the current graph
    /// is left untouched.
    pub fn import_graph(&mut self, data: GraphData) -> Result<()> {
        let mut ids = HashSet::new();
        let mut paths = HashSet::new();
        for node in &data.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::InvalidGraph(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
            if !paths.insert(node.path.as_str()) {
                return Err(GraphError::InvalidGraph(format!(
                    "duplicate node path {}",
                    node.path
                )));
            }
        }
        for edge in &data.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(GraphError::InvalidGraph(format!(
                        "edge {} -> {} references unknown node {}",
                        edge.source, edge.target, endpoint
                    )));
                }
            }
        }

        let mut fresh = ResourceGraph::new();
        for node in data.nodes {
            fresh.add_node(node);
        }
        for edge in data.edges {
            let from = fresh.id_index[&edge.source];
            let to = fresh.id_index[&edge.target];
            fresh.graph.add_edge(from, to, edge);
        }
        debug!(
            nodes = fresh.graph.node_count(),
            edges = fresh.graph.edge_count(),
            "graph imported"
        );
        *self = fresh;
        Ok(())
    }

    /// Build a graph directly from an exported payload.
    pub fn from_data(data: GraphData) -> Result<Self> {
        let mut graph = Self::new();
        graph.import_graph(data)?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{node_id, EdgeKind, GraphEdge, GraphNode};
    use crate::scanner::{Language, ResourceType};

    fn node(path: &str, anchor: Option<&str>) -> GraphNode {
        GraphNode {
            id: node_id(path),
            path: path.to_string(),
            resource_type: ResourceType::Code,
            language: Language::Python,
            semantic_anchor: anchor.map(|a| a.to_string()),
            layer: Some("GL00".to_string()),
            charter_version: None,
        }
    }

    fn edge(from: &str, to: &str, kind: EdgeKind) -> GraphEdge {
        GraphEdge {
            source: node_id(from),
            target: node_id(to),
            kind,
        }
    }

    fn sample() -> GraphData {
        GraphData {
            nodes: vec![node("b.py", None), node("a.py", Some("core")), node("c.py", None)],
            edges: vec![
                edge("a.py", "b.py", EdgeKind::Import),
                edge("b.py", "c.py", EdgeKind::Dependency),
                edge("a.py", "c.py", EdgeKind::Reference),
            ],
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        let graph = ResourceGraph::from_data(sample()).unwrap();
        let exported = graph.export_graph();
        assert_eq!(exported, sample());

        let mut restored = ResourceGraph::new();
        restored.import_graph(exported.clone()).unwrap();
        assert_eq!(restored.get_nodes(), graph.get_nodes());
        assert_eq!(restored.get_edges(), graph.get_edges());
        assert_eq!(restored.export_graph(), exported);
    }

    #[test]
    fn test_round_trip_through_json() {
        let graph = ResourceGraph::from_data(sample()).unwrap();
        let json = serde_json::to_string(&graph.export_graph()).unwrap();
        let data: GraphData = serde_json::from_str(&json).unwrap();
        assert_eq!(data, graph.export_graph());
        assert!(json.contains("\"semanticAnchor\":\"core\""));
        assert!(json.contains("\"type\":\"import\""));
    }

    #[test]
    fn test_import_replaces_existing_state() {
        let mut graph = ResourceGraph::from_data(sample()).unwrap();
        graph
            .import_graph(GraphData {
                nodes: vec![node("only.py", None)],
                edges: vec![],
            })
            .unwrap();
        assert_eq!(graph.get_nodes().len(), 1);
        assert!(graph.get_edges().is_empty());
        assert!(graph.get_node_by_path("a.py").is_none());
    }

    #[test]
    fn test_dangling_edge_rejected_and_state_kept() {
        let mut graph = ResourceGraph::from_data(sample()).unwrap();
        let bad = GraphData {
            nodes: vec![node("x.py", None)],
            edges: vec![edge("x.py", "ghost.py", EdgeKind::Import)],
        };
        let err = graph.import_graph(bad).unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph(_)));
        assert_eq!(graph.get_nodes().len(), 3);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let bad = GraphData {
            nodes: vec![node("x.py", None), node("x.py", None)],
            edges: vec![],
        };
        assert!(ResourceGraph::from_data(bad).is_err());
    }
}
