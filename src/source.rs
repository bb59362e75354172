//! Graph acquisition from JSON documents.
//!
//! The geodata provider is external; this module reads the graph it exported:
//!
//! ```json
//! {
//!   "nodes": [{"id": 1, "x": 42.05, "y": 55.57}, {"id": 2, "x": 42.06, "y": 55.58}],
//!   "edges": [{"source": 1, "target": 2}]
//! }
//! ```
//!
//! `x`/`y` are optional, and so is an edge `weight`. Directed exports are folded into an
//! undirected graph; self-loops are dropped.

use std::fmt::Debug;
use std::hash::Hash;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::graph::RoadGraph;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord<N> {
    pub id: N,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord<N> {
    pub source: N,
    pub target: N,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument<N> {
    pub nodes: Vec<NodeRecord<N>>,
    pub edges: Vec<EdgeRecord<N>>,
}

impl<N> GraphDocument<N>
where
    N: Clone + Eq + Hash + Debug,
{
    /// Fails if an edge names a node that is not listed.
    pub fn into_graph(self) -> Result<RoadGraph<N>> {
        let mut graph = RoadGraph::new();
        for node in self.nodes {
            match (node.x, node.y) {
                (Some(x), Some(y)) => graph.add_node_at(node.id, x, y),
                _ => graph.add_node(node.id),
            };
        }
        let mut self_loops = 0usize;
        for edge in self.edges {
            if edge.source == edge.target {
                graph.index_of(&edge.source).ok_or_else(|| {
                    Error::UnknownNode(format!("{:?}", edge.source))
                })?;
                self_loops += 1;
                continue;
            }
            match edge.weight {
                Some(w) => graph.add_weighted_edge(&edge.source, &edge.target, w)?,
                None => graph.add_edge(&edge.source, &edge.target)?,
            }
        }
        if self_loops > 0 {
            tracing::debug!(self_loops, "dropped self-loop edges");
        }
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded graph"
        );
        Ok(graph)
    }
}

pub fn from_json_str<N>(s: &str) -> Result<RoadGraph<N>>
where
    N: DeserializeOwned + Clone + Eq + Hash + Debug,
{
    let doc: GraphDocument<N> =
        serde_json::from_str(s).map_err(|e| Error::Source(e.to_string()))?;
    doc.into_graph()
}

pub fn from_json_reader<N, R: Read>(reader: R) -> Result<RoadGraph<N>>
where
    N: DeserializeOwned + Clone + Eq + Hash + Debug,
{
    let doc: GraphDocument<N> =
        serde_json::from_reader(reader).map_err(|e| Error::Source(e.to_string()))?;
    doc.into_graph()
}

pub fn from_path<N>(path: impl AsRef<Path>) -> Result<RoadGraph<N>>
where
    N: DeserializeOwned + Clone + Eq + Hash + Debug,
{
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Source(format!("{}: {e}", path.display())))?;
    from_json_reader(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_nodes_edges_and_positions() {
        let g: RoadGraph<u64> = from_json_str(
            r#"{
                "nodes": [{"id": 7, "x": 1.0, "y": 2.0}, {"id": 9}, {"id": 4, "x": 0.5, "y": 0.5}],
                "edges": [{"source": 7, "target": 9}, {"source": 9, "target": 7}, {"source": 4, "target": 4}]
            }"#,
        )
        .unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 1);
        assert!(g.position(0).is_some());
        assert!(g.position(1).is_none());
        assert_eq!(g.degree(2), 0);
    }

    #[test]
    fn dangling_edge_is_an_error() {
        let err = from_json_str::<u64>(
            r#"{"nodes": [{"id": 1}], "edges": [{"source": 1, "target": 2}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownNode(_)), "{err}");
    }

    #[test]
    fn malformed_document_is_a_source_error() {
        let err = from_json_str::<u64>(r#"{"nodes": 3}"#).unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[test]
    fn string_ids_are_supported() {
        let g: RoadGraph<String> = from_json_str(
            r#"{"nodes": [{"id": "a"}, {"id": "b"}], "edges": [{"source": "a", "target": "b", "weight": 2.0}]}"#,
        )
        .unwrap();
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1, 2.0)]);
    }
}
