//! Graph model and minimal adapter traits.
//!
//! [`RoadGraph`] is the concrete model the diffusion engine consumes: an undirected graph
//! over opaque node ids, with an id-to-index bijection fixed at insertion time and optional
//! planar coordinates per node. The adapter traits let other graph representations (a dense
//! matrix, a `petgraph` graph) feed the operator builder.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::{Error, Result};

pub trait Graph {
    fn node_count(&self) -> usize;
    fn neighbors(&self, node: usize) -> Vec<usize>;
}

pub trait WeightedGraph: Graph {
    fn edge_weight(&self, source: usize, target: usize) -> f64;
}

/// Borrowing adapter: neighbor lists are exposed without allocating.
pub trait GraphRef {
    fn node_count(&self) -> usize;
    fn neighbors_ref(&self, node: usize) -> &[usize];
}

pub struct AdjacencyMatrix<'a>(pub &'a [Vec<f64>]);

impl<'a> Graph for AdjacencyMatrix<'a> {
    fn node_count(&self) -> usize {
        self.0.len()
    }
    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.0[node].iter().enumerate().filter(|(_, &w)| w > 0.0).map(|(i, _)| i).collect()
    }
}

impl<'a> WeightedGraph for AdjacencyMatrix<'a> {
    fn edge_weight(&self, source: usize, target: usize) -> f64 {
        self.0[source][target]
    }
}

#[cfg(feature = "petgraph")]
impl<N, E, Ty, Ix> Graph for petgraph::Graph<N, E, Ty, Ix>
where
    Ty: petgraph::EdgeType,
    Ix: petgraph::graph::IndexType,
{
    fn node_count(&self) -> usize {
        self.node_count()
    }
    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.neighbors(petgraph::graph::NodeIndex::new(node)).map(|idx| idx.index()).collect()
    }
}

/// Weight of the `source -> target` edge; `0.0` when there is none. Parallel edges sum.
#[cfg(feature = "petgraph")]
impl<N, Ty, Ix> WeightedGraph for petgraph::Graph<N, f64, Ty, Ix>
where
    Ty: petgraph::EdgeType,
    Ix: petgraph::graph::IndexType,
{
    fn edge_weight(&self, source: usize, target: usize) -> f64 {
        use petgraph::graph::NodeIndex;
        use petgraph::visit::EdgeRef;
        let (a, b) = (NodeIndex::<Ix>::new(source), NodeIndex::<Ix>::new(target));
        self.edges_connecting(a, b).map(|e| *e.weight()).sum()
    }
}

/// Planar coordinates of a node (longitude/latitude or projected x/y).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, x: f64, y: f64) -> f64 {
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

/// Undirected road-network graph.
///
/// Invariants:
/// - node `i` always refers to the `i`-th inserted id; indices never change;
/// - every edge endpoint is a member of the node set (checked on insertion);
/// - no self-loops; parallel edges collapse into one;
/// - neighbor lists are sorted by index, and weights are stored symmetrically.
#[derive(Debug, Clone)]
pub struct RoadGraph<N> {
    ids: Vec<N>,
    index: HashMap<N, usize>,
    positions: Vec<Option<Point>>,
    adjacency: Vec<Vec<usize>>,
    weights: Vec<Vec<f64>>,
    edge_count: usize,
}

impl<N> Default for RoadGraph<N> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            index: HashMap::new(),
            positions: Vec::new(),
            adjacency: Vec::new(),
            weights: Vec::new(),
            edge_count: 0,
        }
    }
}

impl<N> RoadGraph<N>
where
    N: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a node list and an unweighted edge list.
    ///
    /// Fails on the first edge whose endpoint is not in `nodes`.
    pub fn from_edges<I, E>(nodes: I, edges: E) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        E: IntoIterator<Item = (N, N)>,
    {
        let mut graph = Self::new();
        for id in nodes {
            graph.add_node(id);
        }
        for (a, b) in edges {
            graph.add_edge(&a, &b)?;
        }
        Ok(graph)
    }

    /// Insert a node without coordinates. Returns its index; re-inserting an existing id
    /// returns the existing index.
    pub fn add_node(&mut self, id: N) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.ids.len();
        self.index.insert(id.clone(), idx);
        self.ids.push(id);
        self.positions.push(None);
        self.adjacency.push(Vec::new());
        self.weights.push(Vec::new());
        idx
    }

    /// Insert a node with planar coordinates (or update the coordinates of an existing one).
    pub fn add_node_at(&mut self, id: N, x: f64, y: f64) -> usize {
        let idx = self.add_node(id);
        self.positions[idx] = Some(Point::new(x, y));
        idx
    }

    pub fn add_edge(&mut self, a: &N, b: &N) -> Result<()> {
        self.add_weighted_edge(a, b, 1.0)
    }

    /// Insert an undirected edge. Re-inserting an edge overwrites its weight.
    ///
    /// Weights are validated when a weighted operator is built, not here.
    pub fn add_weighted_edge(&mut self, a: &N, b: &N, weight: f64) -> Result<()> {
        let u = self.require(a)?;
        let v = self.require(b)?;
        if u == v {
            return Err(Error::InvalidParameter(format!(
                "self-loops are not supported (node {a:?})"
            )));
        }
        let inserted = self.link(u, v, weight);
        self.link(v, u, weight);
        if inserted {
            self.edge_count += 1;
        }
        Ok(())
    }

    fn require(&self, id: &N) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownNode(format!("{id:?}")))
    }

    fn link(&mut self, u: usize, v: usize, weight: f64) -> bool {
        match self.adjacency[u].binary_search(&v) {
            Ok(pos) => {
                self.weights[u][pos] = weight;
                false
            }
            Err(pos) => {
                self.adjacency[u].insert(pos, v);
                self.weights[u].insert(pos, weight);
                true
            }
        }
    }

    pub fn index_of(&self, id: &N) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &N) -> bool {
        self.index.contains_key(id)
    }
}

impl<N> RoadGraph<N> {
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn node_id(&self, index: usize) -> Option<&N> {
        self.ids.get(index)
    }

    /// Node ids in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.ids.iter()
    }

    pub fn position(&self, index: usize) -> Option<Point> {
        self.positions.get(index).copied().flatten()
    }

    pub fn positions(&self) -> &[Option<Point>] {
        &self.positions
    }

    /// Each undirected edge once, as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(move |(u, neigh)| {
            neigh
                .iter()
                .zip(self.weights[u].iter())
                .filter(move |(&v, _)| u < v)
                .map(move |(&v, &w)| (u, v, w))
        })
    }

    /// Neighbors of `index` with edge weights, sorted by neighbor index.
    pub fn weighted_neighbors(&self, index: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency[index]
            .iter()
            .copied()
            .zip(self.weights[index].iter().copied())
    }

    /// Number of incident edges; `0` for an isolated node.
    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.adjacency.iter().map(Vec::len).collect()
    }
}

impl<N> GraphRef for RoadGraph<N> {
    fn node_count(&self) -> usize {
        self.ids.len()
    }
    fn neighbors_ref(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }
}

impl<N> Graph for RoadGraph<N> {
    fn node_count(&self) -> usize {
        self.ids.len()
    }
    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.adjacency[node].clone()
    }
}

impl<N> WeightedGraph for RoadGraph<N> {
    fn edge_weight(&self, source: usize, target: usize) -> f64 {
        match self.adjacency[source].binary_search(&target) {
            Ok(pos) => self.weights[source][pos],
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_insertion_order() {
        let mut g: RoadGraph<u64> = RoadGraph::new();
        assert_eq!(g.add_node(700), 0);
        assert_eq!(g.add_node(12), 1);
        assert_eq!(g.add_node(700), 0);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.node_id(1), Some(&12));
        assert_eq!(g.index_of(&700), Some(0));
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let err = RoadGraph::from_edges([1u32, 2], [(1, 3)]).unwrap_err();
        assert!(matches!(err, Error::UnknownNode(_)), "{err}");
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut g = RoadGraph::new();
        g.add_node("a");
        let err = g.add_edge(&"a", &"a").unwrap_err();
        assert!(format!("{err}").contains("self-loop"));
    }

    #[test]
    fn parallel_edges_collapse() {
        let g = RoadGraph::from_edges([0u8, 1, 2], [(0, 1), (1, 0), (0, 1), (1, 2)]).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.degrees(), vec![1, 2, 1]);
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges, vec![(0, 1, 1.0), (1, 2, 1.0)]);
    }

    #[test]
    fn isolated_node_has_zero_degree() {
        let g = RoadGraph::from_edges(["a", "b", "lonely"], [("a", "b")]).unwrap();
        let lonely = g.index_of(&"lonely").unwrap();
        assert_eq!(g.degree(lonely), 0);
        assert!(g.neighbors_ref(lonely).is_empty());
    }

    #[test]
    fn weights_are_symmetric() {
        let mut g = RoadGraph::new();
        g.add_node(0u32);
        g.add_node(1u32);
        g.add_weighted_edge(&0, &1, 2.5).unwrap();
        assert_eq!(g.edge_weight(0, 1), 2.5);
        assert_eq!(g.edge_weight(1, 0), 2.5);
        g.add_weighted_edge(&1, &0, 4.0).unwrap();
        assert_eq!(g.edge_weight(0, 1), 4.0);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn coordinates_are_optional() {
        let mut g = RoadGraph::new();
        g.add_node_at("x", 41.3, 55.6);
        g.add_node("y");
        assert_eq!(g.position(0), Some(Point::new(41.3, 55.6)));
        assert_eq!(g.position(1), None);
        assert_eq!(g.position(7), None);
    }
}
