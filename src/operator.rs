//! Symmetric-normalized similarity operator \(S = D^{-1/2} A D^{-1/2}\).
//!
//! `S` is stored in compressed sparse row form: row `i` spans
//! `col_idx[row_ptr[i]..row_ptr[i + 1]]`, columns sorted within each row.
//!
//! Zero-degree nodes get a zero entry in \(D^{-1/2}\) instead of `1/sqrt(0)`. Their row and
//! column of `S` are therefore empty: they neither receive nor propagate label mass.

use crate::graph::{Graph, RoadGraph, WeightedGraph};
use crate::labels::LabelMatrix;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityOperator {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
    inv_sqrt_degree: Vec<f64>,
    isolated: Vec<usize>,
}

/// Build `S` from the binary adjacency of `graph` (edge weights are ignored).
pub fn build_operator<N>(graph: &RoadGraph<N>) -> SimilarityOperator {
    let rows: Vec<Vec<(usize, f64)>> = (0..graph.node_count())
        .map(|u| graph.weighted_neighbors(u).map(|(v, _)| (v, 1.0)).collect())
        .collect();
    SimilarityOperator::from_rows(rows)
}

/// Build `S` from the weighted adjacency of `graph`; `d[i]` is the sum of incident weights.
///
/// Rejects NaN/infinite/negative weights. Zero-weight edges contribute nothing.
pub fn build_operator_weighted<N>(graph: &RoadGraph<N>) -> Result<SimilarityOperator> {
    for (u, v, w) in graph.edges() {
        if !w.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "edge weights must be finite (edge {u}-{v})"
            )));
        }
        if w < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "edge weights must be non-negative (edge {u}-{v})"
            )));
        }
    }
    let rows: Vec<Vec<(usize, f64)>> = (0..graph.node_count())
        .map(|u| graph.weighted_neighbors(u).filter(|&(_, w)| w > 0.0).collect())
        .collect();
    Ok(SimilarityOperator::from_rows(rows))
}

/// Build `S` from the binary adjacency of any adapter.
///
/// The adapter must describe an undirected graph: neighbor indices in range, no self-loops,
/// and `v ∈ N(u)` iff `u ∈ N(v)`. Parallel entries are collapsed.
pub fn build_operator_from_adjacency<G: Graph>(graph: &G) -> Result<SimilarityOperator> {
    let rows: Vec<Vec<(usize, f64)>> = undirected_rows(graph)?
        .into_iter()
        .map(|neigh| neigh.into_iter().map(|v| (v, 1.0)).collect())
        .collect();
    Ok(SimilarityOperator::from_rows(rows))
}

/// Build `S` from the weighted adjacency of any adapter; `d[i]` is the sum of incident weights.
///
/// Same structural requirements as [`build_operator_from_adjacency`]; in addition, weights
/// must be finite, non-negative, and equal in both directions.
pub fn build_operator_from_weighted<G: WeightedGraph>(graph: &G) -> Result<SimilarityOperator> {
    let structure = undirected_rows(graph)?;
    let mut rows: Vec<Vec<(usize, f64)>> = Vec::with_capacity(structure.len());
    for (u, neigh) in structure.iter().enumerate() {
        let mut row = Vec::with_capacity(neigh.len());
        for &v in neigh {
            let w = graph.edge_weight(u, v);
            if !w.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "edge weights must be finite (edge {u}-{v})"
                )));
            }
            if w < 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "edge weights must be non-negative (edge {u}-{v})"
                )));
            }
            if w != graph.edge_weight(v, u) {
                return Err(Error::InvalidParameter(format!(
                    "edge weights must be symmetric (edge {u}-{v})"
                )));
            }
            if w > 0.0 {
                row.push((v, w));
            }
        }
        rows.push(row);
    }
    Ok(SimilarityOperator::from_rows(rows))
}

/// Sorted, deduplicated neighbor lists, checked for range, self-loops and symmetry.
fn undirected_rows<G: Graph>(graph: &G) -> Result<Vec<Vec<usize>>> {
    let n = graph.node_count();
    let mut rows: Vec<Vec<usize>> = Vec::with_capacity(n);
    for u in 0..n {
        let mut neigh = graph.neighbors(u);
        for &v in &neigh {
            if v >= n {
                return Err(Error::IndexOutOfBounds(v));
            }
            if v == u {
                return Err(Error::InvalidParameter(format!(
                    "self-loops are not supported (node {u})"
                )));
            }
        }
        neigh.sort_unstable();
        neigh.dedup();
        rows.push(neigh);
    }
    for (u, neigh) in rows.iter().enumerate() {
        for &v in neigh {
            if rows[v].binary_search(&u).is_err() {
                return Err(Error::InvalidParameter(format!(
                    "adjacency must be symmetric (edge {u}->{v} has no reverse)"
                )));
            }
        }
    }
    Ok(rows)
}

impl SimilarityOperator {
    /// Assemble from sorted, symmetric per-row `(column, weight)` lists.
    fn from_rows(rows: Vec<Vec<(usize, f64)>>) -> Self {
        let n = rows.len();
        let mut inv_sqrt_degree = Vec::with_capacity(n);
        let mut isolated = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let d: f64 = row.iter().map(|&(_, w)| w).sum();
            if d > 0.0 {
                inv_sqrt_degree.push(1.0 / d.sqrt());
            } else {
                inv_sqrt_degree.push(0.0);
                isolated.push(i);
            }
        }

        let nnz: usize = rows.iter().map(Vec::len).sum();
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptr.push(0);
        for (i, row) in rows.iter().enumerate() {
            for &(j, w) in row {
                // The product of the two scale factors is formed first so that S[i][j] and
                // S[j][i] round identically.
                col_idx.push(j);
                values.push(w * (inv_sqrt_degree[i] * inv_sqrt_degree[j]));
            }
            row_ptr.push(col_idx.len());
        }

        if !isolated.is_empty() {
            tracing::debug!(
                isolated = isolated.len(),
                nodes = n,
                "zero-degree nodes excluded from diffusion"
            );
        }
        tracing::debug!(nodes = n, nnz = values.len(), "built similarity operator");

        Self {
            n,
            row_ptr,
            col_idx,
            values,
            inv_sqrt_degree,
            isolated,
        }
    }

    pub fn node_count(&self) -> usize {
        self.n
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Diagonal of \(D^{-1/2}\), with `0.0` for zero-degree nodes.
    pub fn inv_sqrt_degree(&self) -> &[f64] {
        &self.inv_sqrt_degree
    }

    /// Indices of zero-degree nodes, ascending.
    pub fn isolated_nodes(&self) -> &[usize] {
        &self.isolated
    }

    /// Entry `S[i][j]`; `0.0` when absent or out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i >= self.n {
            return 0.0;
        }
        let (cols, vals) = self.row_slices(i);
        match cols.binary_search(&j) {
            Ok(pos) => vals[pos],
            Err(_) => 0.0,
        }
    }

    /// Stored entries of row `i` as `(column, value)`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (cols, vals) = self.row_slices(i);
        cols.iter().copied().zip(vals.iter().copied())
    }

    fn row_slices(&self, i: usize) -> (&[usize], &[f64]) {
        let span = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.n]; self.n];
        for (i, row) in dense.iter_mut().enumerate() {
            for (j, v) in self.row(i) {
                row[j] = v;
            }
        }
        dense
    }

    fn row_product(&self, i: usize, y: &LabelMatrix) -> [f64; 2] {
        let mut acc = [0.0; 2];
        for (j, s) in self.row(i) {
            let yj = y[j];
            acc[0] += s * yj[0];
            acc[1] += s * yj[1];
        }
        acc
    }

    /// Sparse-times-dense product `S @ Y`.
    ///
    /// Panics if `y` does not have one row per node.
    pub fn apply(&self, y: &LabelMatrix) -> LabelMatrix {
        assert_eq!(
            y.node_count(),
            self.n,
            "label matrix rows must match operator size"
        );
        #[cfg(feature = "parallel")]
        let rows: Vec<[f64; 2]> = {
            use rayon::prelude::*;
            (0..self.n)
                .into_par_iter()
                .map(|i| self.row_product(i, y))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<[f64; 2]> = (0..self.n).map(|i| self.row_product(i, y)).collect();
        LabelMatrix::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyMatrix;
    use proptest::prelude::*;

    fn cycle4() -> RoadGraph<u32> {
        RoadGraph::from_edges(0..4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
    }

    #[test]
    fn cycle_entries_are_one_half() {
        let s = build_operator(&cycle4());
        assert_eq!(s.nnz(), 8);
        assert!((s.get(0, 1) - 0.5).abs() < 1e-15);
        assert!((s.get(0, 3) - 0.5).abs() < 1e-15);
        assert_eq!(s.get(0, 2), 0.0);
        assert_eq!(s.get(0, 0), 0.0);
        assert!(s.isolated_nodes().is_empty());
    }

    #[test]
    fn path_matches_closed_form() {
        // 0 - 1 - 2: d = [1, 2, 1], S[0][1] = 1/sqrt(2).
        let g = RoadGraph::from_edges(0..3u8, [(0, 1), (1, 2)]).unwrap();
        let s = build_operator(&g);
        let expected = 1.0 / 2f64.sqrt();
        assert!((s.get(0, 1) - expected).abs() < 1e-15);
        assert!((s.get(2, 1) - expected).abs() < 1e-15);
    }

    #[test]
    fn zero_degree_row_and_column_are_empty() {
        let g = RoadGraph::from_edges(["a", "b", "c", "alone"], [("a", "b"), ("b", "c")]).unwrap();
        let s = build_operator(&g);
        let alone = g.index_of(&"alone").unwrap();
        assert_eq!(s.isolated_nodes(), &[alone]);
        assert_eq!(s.inv_sqrt_degree()[alone], 0.0);
        assert_eq!(s.row(alone).count(), 0);
        let dense = s.to_dense();
        assert!(dense.iter().all(|row| row[alone] == 0.0));
        assert!(dense.iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn weighted_operator_uses_weight_sums() {
        let mut g = RoadGraph::new();
        for id in 0..3u32 {
            g.add_node(id);
        }
        g.add_weighted_edge(&0, &1, 3.0).unwrap();
        g.add_weighted_edge(&1, &2, 1.0).unwrap();
        let s = build_operator_weighted(&g).unwrap();
        // d = [3, 4, 1]
        assert!((s.get(0, 1) - 3.0 / (3.0f64 * 4.0).sqrt()).abs() < 1e-12);
        assert!((s.get(1, 2) - 1.0 / 4.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn weighted_operator_rejects_negative_weight() {
        let mut g = RoadGraph::new();
        g.add_node(0u32);
        g.add_node(1u32);
        g.add_weighted_edge(&0, &1, -1.0).unwrap();
        let err = build_operator_weighted(&g).unwrap_err();
        assert!(format!("{err}").contains("non-negative"));
    }

    #[test]
    fn adjacency_adapter_matches_road_graph() {
        let adj = vec![
            vec![0.0, 1.0, 0.0, 1.0],
            vec![1.0, 0.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 1.0],
            vec![1.0, 0.0, 1.0, 0.0],
        ];
        let from_adj = build_operator_from_adjacency(&AdjacencyMatrix(&adj)).unwrap();
        assert_eq!(from_adj, build_operator(&cycle4()));
    }

    #[test]
    fn weighted_adapter_matches_weighted_road_graph() {
        let adj = vec![
            vec![0.0, 3.0, 0.0],
            vec![3.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ];
        let from_adj = build_operator_from_weighted(&AdjacencyMatrix(&adj)).unwrap();
        let mut g = RoadGraph::new();
        for id in 0..3u32 {
            g.add_node(id);
        }
        g.add_weighted_edge(&0, &1, 3.0).unwrap();
        g.add_weighted_edge(&1, &2, 1.0).unwrap();
        assert_eq!(from_adj, build_operator_weighted(&g).unwrap());
        assert!((from_adj.get(0, 1) - 3.0 / 12.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn weighted_adapter_rejects_mismatched_directions() {
        let adj = vec![vec![0.0, 2.0], vec![1.0, 0.0]];
        let err = build_operator_from_weighted(&AdjacencyMatrix(&adj)).unwrap_err();
        assert!(format!("{err}").contains("symmetric"), "{err}");
    }

    #[test]
    fn weighted_adapter_rejects_non_finite_weight() {
        let adj = vec![vec![0.0, f64::INFINITY], vec![f64::INFINITY, 0.0]];
        let err = build_operator_from_weighted(&AdjacencyMatrix(&adj)).unwrap_err();
        assert!(format!("{err}").contains("finite"), "{err}");
    }

    #[test]
    fn adjacency_adapter_rejects_asymmetric_input() {
        let adj = vec![vec![0.0, 1.0], vec![0.0, 0.0]];
        let err = build_operator_from_adjacency(&AdjacencyMatrix(&adj)).unwrap_err();
        assert!(format!("{err}").contains("symmetric"));
    }

    #[test]
    fn adjacency_adapter_rejects_dangling_neighbor() {
        struct Dangling;
        impl Graph for Dangling {
            fn node_count(&self) -> usize {
                2
            }
            fn neighbors(&self, node: usize) -> Vec<usize> {
                if node == 0 {
                    vec![5]
                } else {
                    vec![]
                }
            }
        }
        let err = build_operator_from_adjacency(&Dangling).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds(5)));
    }

    #[test]
    fn apply_matches_dense_product() {
        let g = RoadGraph::from_edges(0..5u32, [(0, 1), (1, 2), (2, 0), (2, 3)]).unwrap();
        let s = build_operator(&g);
        let y = LabelMatrix::from_rows(vec![[1.0, 0.0], [0.2, 0.3], [0.0, 1.0], [0.5, 0.5], [0.0, 0.0]]);
        let sparse = s.apply(&y);
        let dense = s.to_dense();
        for i in 0..5 {
            for c in 0..2 {
                let expected: f64 = (0..5).map(|j| dense[i][j] * y[j][c]).sum();
                assert!((sparse[i][c] - expected).abs() < 1e-12);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_operator_is_symmetric_and_bounded(n in 1usize..12, edges in proptest::collection::vec((0usize..12, 0usize..12), 0..40)) {
            let mut g = RoadGraph::new();
            for id in 0..n {
                g.add_node(id);
            }
            for (u, v) in edges {
                if u < n && v < n && u != v {
                    g.add_edge(&u, &v).unwrap();
                }
            }
            let s = build_operator(&g);
            for i in 0..n {
                for j in 0..n {
                    prop_assert_eq!(s.get(i, j), s.get(j, i));
                    let x = s.get(i, j);
                    prop_assert!(x.is_finite());
                    prop_assert!((0.0..=1.0).contains(&x), "S[{}][{}]={}", i, j, x);
                }
            }
            let isolated: Vec<usize> = (0..n).filter(|&i| g.degree(i) == 0).collect();
            prop_assert_eq!(s.isolated_nodes(), isolated.as_slice());
        }
    }
}
