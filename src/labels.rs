//! Two-class label matrices and seed initialization.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Index;

use crate::graph::RoadGraph;
use crate::{Error, Result};

/// `n × 2` label matrix: row `i` holds the (unnormalized) affinity of node `i` to class 0
/// and class 1.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelMatrix {
    rows: Vec<[f64; 2]>,
}

impl LabelMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            rows: vec![[0.0; 2]; n],
        }
    }

    pub fn from_rows(rows: Vec<[f64; 2]>) -> Self {
        Self { rows }
    }

    pub fn node_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[[f64; 2]] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<[f64; 2]> {
        self.rows.get(i).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 2]> {
        self.rows.iter()
    }

    /// Sum of absolute entry-wise differences.
    pub fn l1_distance(&self, other: &LabelMatrix) -> f64 {
        self.rows
            .iter()
            .zip(other.rows.iter())
            .map(|(a, b)| (a[0] - b[0]).abs() + (a[1] - b[1]).abs())
            .sum()
    }

    /// Hard class per node: the larger column, or `None` for rows with no mass or an exact tie.
    pub fn assignments(&self) -> Vec<Option<usize>> {
        self.rows
            .iter()
            .map(|&[a, b]| {
                if a > b {
                    Some(0)
                } else if b > a {
                    Some(1)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn into_rows(self) -> Vec<[f64; 2]> {
        self.rows
    }
}

impl Index<usize> for LabelMatrix {
    type Output = [f64; 2];

    fn index(&self, i: usize) -> &[f64; 2] {
        &self.rows[i]
    }
}

impl<'a> IntoIterator for &'a LabelMatrix {
    type Item = &'a [f64; 2];
    type IntoIter = std::slice::Iter<'a, [f64; 2]>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// One-hot seed matrix over `n` nodes from node indices.
///
/// Fails if either index is out of range or the two coincide.
pub fn seed_matrix(n: usize, seed0: usize, seed1: usize) -> Result<LabelMatrix> {
    for seed in [seed0, seed1] {
        if seed >= n {
            return Err(Error::InvalidSeed(format!(
                "seed index {seed} out of range for {n} nodes"
            )));
        }
    }
    if seed0 == seed1 {
        return Err(Error::InvalidSeed(format!(
            "seeds must be distinct (both are node {seed0})"
        )));
    }
    let mut y0 = LabelMatrix::zeros(n);
    y0.rows[seed0][0] = 1.0;
    y0.rows[seed1][1] = 1.0;
    Ok(y0)
}

/// Build `Y0` for a graph: class 0 seeded at `seed0`, class 1 at `seed1`.
pub fn initialize<N>(graph: &RoadGraph<N>, seed0: &N, seed1: &N) -> Result<LabelMatrix>
where
    N: Clone + Eq + Hash + Debug,
{
    let i0 = graph
        .index_of(seed0)
        .ok_or_else(|| Error::InvalidSeed(format!("seed {seed0:?} is not in the graph")))?;
    let i1 = graph
        .index_of(seed1)
        .ok_or_else(|| Error::InvalidSeed(format!("seed {seed1:?} is not in the graph")))?;
    if i0 == i1 {
        return Err(Error::InvalidSeed(format!(
            "seeds must be distinct (both are {seed0:?})"
        )));
    }
    seed_matrix(graph.node_count(), i0, i1)
}

/// Like [`initialize`], for a seed list that must hold exactly two nodes.
pub fn initialize_from<N>(graph: &RoadGraph<N>, seeds: &[N]) -> Result<LabelMatrix>
where
    N: Clone + Eq + Hash + Debug,
{
    match seeds {
        [seed0, seed1] => initialize(graph, seed0, seed1),
        _ => Err(Error::InvalidSeed(format!(
            "exactly two seeds are required, got {}",
            seeds.len()
        ))),
    }
}
