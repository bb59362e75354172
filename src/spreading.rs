//! Label spreading (Zhou et al., 2004) with two classes.
//!
//! Update rule, applied a fixed number of times:
//! \[
//!   Y_{t+1} = \alpha S Y_t + (1 - \alpha) Y_0
//! \]
//!
//! There is no convergence-based early exit, and rows are never renormalized during the
//! iteration; see [`crate::display::normalize_row`] for the consumption-time scale.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Index;

use crate::graph::RoadGraph;
use crate::labels::{initialize, LabelMatrix};
use crate::operator::{build_operator, SimilarityOperator};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpreadingConfig {
    /// Propagation weight; `1 - alpha` of the seed matrix is re-injected every step.
    pub alpha: f64,
    pub iterations: usize,
}

impl Default for SpreadingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.99,
            iterations: 10,
        }
    }
}

impl SpreadingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() {
            return Err(Error::InvalidParameter("alpha must be finite".to_string()));
        }
        if self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(Error::InvalidParameter(
                "alpha must be in (0,1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordered label-matrix snapshots: `history[0]` is the seed matrix, `history[t]` the state
/// after `t` updates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<LabelMatrix>", into = "Vec<LabelMatrix>")
)]
pub struct History {
    snapshots: Vec<LabelMatrix>,
}

/// Rebuild a history from stored snapshots.
///
/// Rejects an empty list and snapshots of differing node counts.
impl TryFrom<Vec<LabelMatrix>> for History {
    type Error = Error;

    fn try_from(snapshots: Vec<LabelMatrix>) -> Result<Self> {
        let Some(first) = snapshots.first() else {
            return Err(Error::InvalidParameter(
                "history must hold at least the seed snapshot".to_string(),
            ));
        };
        let n = first.node_count();
        if let Some(t) = snapshots.iter().position(|s| s.node_count() != n) {
            return Err(Error::InvalidParameter(format!(
                "snapshot {t} has {} rows, expected {n}",
                snapshots[t].node_count()
            )));
        }
        Ok(Self { snapshots })
    }
}

impl From<History> for Vec<LabelMatrix> {
    fn from(history: History) -> Self {
        history.snapshots
    }
}

impl History {
    fn new(y0: LabelMatrix) -> Self {
        Self {
            snapshots: vec![y0],
        }
    }

    /// Number of snapshots (iterations performed + 1). Never zero.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iterations(&self) -> usize {
        self.snapshots.len() - 1
    }

    pub fn get(&self, t: usize) -> Option<&LabelMatrix> {
        self.snapshots.get(t)
    }

    pub fn initial(&self) -> &LabelMatrix {
        &self.snapshots[0]
    }

    pub fn last(&self) -> &LabelMatrix {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelMatrix> {
        self.snapshots.iter()
    }

    /// \(L_1\) change between consecutive snapshots; `deltas()[t] = |Y_{t+1} - Y_t|_1`.
    pub fn deltas(&self) -> Vec<f64> {
        self.snapshots
            .windows(2)
            .map(|w| w[1].l1_distance(&w[0]))
            .collect()
    }

    fn last_delta(&self) -> Option<f64> {
        match &self.snapshots[..] {
            [.., prev, last] => Some(last.l1_distance(prev)),
            _ => None,
        }
    }

    /// Hard class assignment per node at snapshot `t`.
    pub fn assignments(&self, t: usize) -> Option<Vec<Option<usize>>> {
        self.get(t).map(LabelMatrix::assignments)
    }

    pub fn into_snapshots(self) -> Vec<LabelMatrix> {
        self.snapshots
    }
}

impl Index<usize> for History {
    type Output = LabelMatrix;

    fn index(&self, t: usize) -> &LabelMatrix {
        &self.snapshots[t]
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a LabelMatrix;
    type IntoIter = std::slice::Iter<'a, LabelMatrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

/// One update: `alpha * S @ y_prev + (1 - alpha) * y0`.
///
/// Panics if `y0` or `y_prev` does not have one row per operator node.
pub fn step(
    operator: &SimilarityOperator,
    y0: &LabelMatrix,
    y_prev: &LabelMatrix,
    alpha: f64,
) -> LabelMatrix {
    assert_eq!(
        y0.node_count(),
        operator.node_count(),
        "seed matrix rows must match operator size"
    );
    let propagated = operator.apply(y_prev);
    let keep = 1.0 - alpha;
    let rows = propagated
        .iter()
        .zip(y0.iter())
        .map(|(p, s)| [alpha * p[0] + keep * s[0], alpha * p[1] + keep * s[1]])
        .collect();
    LabelMatrix::from_rows(rows)
}

/// Run `iterations` updates from `y0`; the result holds `iterations + 1` snapshots.
///
/// Panics if `y0` does not have one row per operator node. Use [`run_checked`] to get an
/// error instead (and to validate `alpha`).
pub fn run(
    operator: &SimilarityOperator,
    y0: &LabelMatrix,
    alpha: f64,
    iterations: usize,
) -> History {
    let mut history = History::new(y0.clone());
    history.snapshots.reserve(iterations);
    for _ in 0..iterations {
        let next = step(operator, y0, history.last(), alpha);
        history.snapshots.push(next);
    }
    if let Some(delta) = history.last_delta() {
        tracing::debug!(iterations, alpha, last_delta_l1 = delta, "label spreading finished");
    }
    history
}

pub fn run_checked(
    operator: &SimilarityOperator,
    y0: &LabelMatrix,
    config: SpreadingConfig,
) -> Result<History> {
    config.validate()?;
    check_dimensions(operator, y0)?;
    Ok(run(operator, y0, config.alpha, config.iterations))
}

fn check_dimensions(operator: &SimilarityOperator, y0: &LabelMatrix) -> Result<()> {
    if y0.node_count() != operator.node_count() {
        return Err(Error::InvalidParameter(format!(
            "seed matrix rows must equal node_count (rows={} node_count={})",
            y0.node_count(),
            operator.node_count()
        )));
    }
    Ok(())
}

/// Seed, build, and run in one call.
///
/// Config and seeds are validated before the operator is built.
pub fn label_spreading<N>(
    graph: &RoadGraph<N>,
    seed0: &N,
    seed1: &N,
    config: SpreadingConfig,
) -> Result<History>
where
    N: Clone + Eq + Hash + Debug,
{
    let mut engine = SpreadingEngine::new(graph, seed0, seed1, config)?;
    engine.run_to_completion();
    Ok(engine.into_history())
}

/// Step-at-a-time driver owning one run's operator, seed matrix and history.
///
/// The run is complete once `config.iterations` steps have been taken; after that
/// [`SpreadingEngine::step`] returns `None` and the history no longer changes.
#[derive(Debug, Clone)]
pub struct SpreadingEngine {
    operator: SimilarityOperator,
    y0: LabelMatrix,
    config: SpreadingConfig,
    history: History,
}

impl SpreadingEngine {
    pub fn new<N>(graph: &RoadGraph<N>, seed0: &N, seed1: &N, config: SpreadingConfig) -> Result<Self>
    where
        N: Clone + Eq + Hash + Debug,
    {
        config.validate()?;
        let y0 = initialize(graph, seed0, seed1)?;
        let operator = build_operator(graph);
        Ok(Self::assemble(operator, y0, config))
    }

    /// Use a prebuilt operator (e.g. a weighted one, or one built from an adapter).
    pub fn from_parts(
        operator: SimilarityOperator,
        y0: LabelMatrix,
        config: SpreadingConfig,
    ) -> Result<Self> {
        config.validate()?;
        check_dimensions(&operator, &y0)?;
        Ok(Self::assemble(operator, y0, config))
    }

    fn assemble(operator: SimilarityOperator, y0: LabelMatrix, config: SpreadingConfig) -> Self {
        let history = History::new(y0.clone());
        Self {
            operator,
            y0,
            config,
            history,
        }
    }

    pub fn operator(&self) -> &SimilarityOperator {
        &self.operator
    }

    pub fn seed_matrix(&self) -> &LabelMatrix {
        &self.y0
    }

    pub fn config(&self) -> SpreadingConfig {
        self.config
    }

    pub fn iterations_done(&self) -> usize {
        self.history.iterations()
    }

    pub fn is_complete(&self) -> bool {
        self.iterations_done() >= self.config.iterations
    }

    pub fn current(&self) -> &LabelMatrix {
        self.history.last()
    }

    /// Advance one iteration and return the new snapshot, or `None` if the run is complete.
    pub fn step(&mut self) -> Option<&LabelMatrix> {
        if self.is_complete() {
            return None;
        }
        let next = step(&self.operator, &self.y0, self.history.last(), self.config.alpha);
        self.history.snapshots.push(next);
        tracing::trace!(iteration = self.iterations_done(), "label spreading step");
        Some(self.history.last())
    }

    pub fn run_to_completion(&mut self) -> &History {
        while self.step().is_some() {}
        if let Some(delta) = self.history.last_delta() {
            tracing::debug!(
                iterations = self.config.iterations,
                alpha = self.config.alpha,
                last_delta_l1 = delta,
                "label spreading finished"
            );
        }
        &self.history
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_history(self) -> History {
        self.history
    }
}
