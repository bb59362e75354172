//! `labelspread`: two-class label spreading over road-network graphs.
//!
//! Two seed nodes (one per class) diffuse label mass over the symmetric-normalized adjacency
//! operator \(S = D^{-1/2} A D^{-1/2}\) with the update
//! \(Y_{t+1} = \alpha S Y_t + (1 - \alpha) Y_0\), and every intermediate state is kept so a
//! renderer can animate the spread.
//!
//! ```
//! use labelspread::{label_spreading, normalize_row, RoadGraph, SpreadingConfig};
//!
//! let g = RoadGraph::from_edges(0..4u32, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
//! let history = label_spreading(&g, &0, &2, SpreadingConfig::default()).unwrap();
//! assert_eq!(history.len(), 11);
//! let [p0, p1] = normalize_row(history.last()[1]);
//! assert!((p0 + p1 - 1.0).abs() < 1e-12);
//! ```
//!
//! Public invariants (must not drift):
//! - **Node order**: row `i` of every matrix is the node with index `i` in the input graph
//!   (insertion order for [`RoadGraph`], `NodeIndex::index()` for `petgraph`).
//! - **Zero-degree nodes** are excluded from diffusion explicitly; they never produce NaN.
//! - **No silent normalization**: label rows are only normalized by [`normalize_row`].
//! - **Determinism**: identical inputs and configs give bit-identical histories, with or
//!   without the `parallel` feature.
//!
//! Swappable (allowed to change without breaking the contract):
//! - operator storage (currently CSR)
//! - iteration strategy (serial vs parallel rows)

pub mod components;
pub mod config;
pub mod display;
pub mod graph;
pub mod labels;
pub mod operator;
pub mod seeds;
#[cfg(feature = "serde")]
pub mod source;
pub mod spreading;

pub use components::{reachable_from, unreachable_from};
pub use config::{parse_positive_or_default, ConfigFallback, RunMode, RunSettings};
pub use display::{frame_colors, normalize_row, row_color, Animation};
pub use graph::{AdjacencyMatrix, Graph, GraphRef, Point, RoadGraph, WeightedGraph};
pub use labels::{initialize, initialize_from, seed_matrix, LabelMatrix};
pub use operator::{
    build_operator, build_operator_from_adjacency, build_operator_from_weighted,
    build_operator_weighted, SimilarityOperator,
};
pub use seeds::{nearest_node, select_seeds, NearestNodeSelector};
pub use spreading::{label_spreading, run, run_checked, step, History, SpreadingConfig, SpreadingEngine};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    #[error("unknown node: {0}")]
    UnknownNode(String),
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("graph source: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, Error>;
