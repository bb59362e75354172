//! Label-to-display normalization.
//!
//! These are pure per-row functions; the renderer decides what to do with the result.

use crate::graph::Point;
use crate::labels::LabelMatrix;

/// Scale a label row to proportions.
///
/// Returns `[0.0, 0.0]` when the row carries no mass, otherwise two components summing to 1.
pub fn normalize_row(y: [f64; 2]) -> [f64; 2] {
    let total = y[0] + y[1];
    if total == 0.0 {
        return [0.0, 0.0];
    }
    [y[0] / total, y[1] / total]
}

/// RGB color for a label row: class 0 on the red channel, class 1 on the blue channel.
pub fn row_color(y: [f64; 2]) -> [f64; 3] {
    let [p0, p1] = normalize_row(y);
    [p0, 0.0, p1]
}

pub fn frame_colors(y: &LabelMatrix) -> Vec<[f64; 3]> {
    y.iter().map(|&row| row_color(row)).collect()
}

/// Renderer-facing bundle: node positions plus one color vector and one title per frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Animation {
    pub interval_ms: u64,
    pub positions: Vec<Option<Point>>,
    pub edges: Vec<(usize, usize)>,
    pub frames: Vec<Vec<[f64; 3]>>,
    pub titles: Vec<String>,
}

impl Animation {
    /// One frame per snapshot, titled by 1-based iteration number.
    pub fn new<'a, I>(
        interval_ms: u64,
        positions: Vec<Option<Point>>,
        edges: Vec<(usize, usize)>,
        snapshots: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a LabelMatrix>,
    {
        let frames: Vec<Vec<[f64; 3]>> = snapshots.into_iter().map(frame_colors).collect();
        let titles = (1..=frames.len())
            .map(|i| format!("Label Spreading. Iteration: {i}"))
            .collect();
        Self {
            interval_ms,
            positions,
            edges,
            frames,
            titles,
        }
    }

    /// A single still frame of the final labels.
    pub fn final_result(
        interval_ms: u64,
        positions: Vec<Option<Point>>,
        edges: Vec<(usize, usize)>,
        last: &LabelMatrix,
    ) -> Self {
        Self {
            interval_ms,
            positions,
            edges,
            frames: vec![frame_colors(last)],
            titles: vec!["Final Label Spreading Result".to_string()],
        }
    }

    pub fn title(&self, frame: usize) -> Option<&str> {
        self.titles.get(frame).map(String::as_str)
    }
}
