//! Seed selection from pointer positions.
//!
//! The pointing device itself lives outside this crate; what arrives here is a finite stream
//! of `(x, y)` positions in graph coordinates. Each position selects the nearest positioned
//! node. Repeated selections of the same node are ignored, and selection stops at two nodes.

use crate::graph::RoadGraph;
use crate::{Error, Result};

/// Index of the positioned node closest to `(x, y)`; ties go to the lowest index.
///
/// Nodes with non-finite coordinates are never chosen. Returns `None` when the position is
/// not finite or no node has usable coordinates.
pub fn nearest_node<N>(graph: &RoadGraph<N>, x: f64, y: f64) -> Option<usize> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (idx, pos) in graph.positions().iter().enumerate() {
        let Some(p) = pos else { continue };
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        let dist = p.distance_sq(x, y);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((idx, dist));
        }
    }
    best.map(|(idx, _)| idx)
}

#[derive(Debug)]
pub struct NearestNodeSelector<'g, N> {
    graph: &'g RoadGraph<N>,
    selected: Vec<usize>,
}

impl<'g, N> NearestNodeSelector<'g, N> {
    pub fn new(graph: &'g RoadGraph<N>) -> Self {
        Self {
            graph,
            selected: Vec::with_capacity(2),
        }
    }

    /// Feed one pointer position. Returns the newly selected node index, if any.
    pub fn click(&mut self, x: f64, y: f64) -> Option<usize> {
        if self.is_complete() {
            return None;
        }
        let idx = nearest_node(self.graph, x, y)?;
        if self.selected.contains(&idx) {
            return None;
        }
        self.selected.push(idx);
        tracing::debug!(node = idx, selected = self.selected.len(), "seed selected");
        Some(idx)
    }

    pub fn is_complete(&self) -> bool {
        self.selected.len() == 2
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// The two selected indices, class 0 first.
    pub fn finish(&self) -> Result<(usize, usize)> {
        match self.selected[..] {
            [a, b] => Ok((a, b)),
            _ => Err(Error::InvalidSeed(format!(
                "two distinct nodes must be selected, got {}",
                self.selected.len()
            ))),
        }
    }
}

/// Consume positions until two distinct nodes are selected; later positions are not read.
pub fn select_seeds<N, I>(graph: &RoadGraph<N>, clicks: I) -> Result<(usize, usize)>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut selector = NearestNodeSelector::new(graph);
    for (x, y) in clicks {
        selector.click(x, y);
        if selector.is_complete() {
            break;
        }
    }
    selector.finish()
}
