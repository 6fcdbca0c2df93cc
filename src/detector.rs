//! Bar detector: finds the inked column range of a strip and the vertical
//! separator strokes inside it.
//!
//! Detection is a pure pixel-column heuristic: a column belongs to a bar when
//! it holds an unbroken vertical run of ink longer than half the image height.
//! Staff lines, note stems and beams are shorter than that; the separator
//! strokes of a staff (or a grand staff) span most of it.

use serde::{Deserialize, Serialize};

use crate::model::{AnalysisResult, Bar, ContentExtent};
use crate::sampler::PixelGrid;

/// Tunables for bar detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Fraction of the image height a vertical ink run must exceed.
    pub min_bar_fraction: f64,
    /// Largest column gap between bar columns that still joins them into one bar.
    pub merge_gap: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_bar_fraction: 0.5,
            merge_gap: 20,
        }
    }
}

impl DetectorConfig {
    /// Minimum run length, in rows, that a bar column must exceed.
    pub fn min_bar_height(&self, height: u32) -> u32 {
        (height as f64 * self.min_bar_fraction).floor() as u32
    }
}

/// Analyze a strip with the default configuration.
pub fn analyze(grid: &PixelGrid) -> AnalysisResult {
    analyze_with(grid, &DetectorConfig::default())
}

pub fn analyze_with(grid: &PixelGrid, config: &DetectorConfig) -> AnalysisResult {
    let extent = content_extent(grid);
    let min_bar_height = config.min_bar_height(grid.height());
    let bars = if extent.is_empty() {
        Vec::new()
    } else {
        let columns = (extent.left_edge..extent.right_edge)
            .map(|x| (x, is_bar_column(grid, x, min_bar_height)));
        group_bar_columns(columns, config.merge_gap)
    };

    log::debug!(
        "analyzed strip {}x{}: content {}..{}, min bar height {}, {} bars",
        grid.width(),
        grid.height(),
        extent.left_edge,
        extent.right_edge,
        min_bar_height,
        bars.len()
    );

    AnalysisResult {
        width: grid.width(),
        height: grid.height(),
        left_edge: extent.left_edge,
        right_edge: extent.right_edge,
        bars,
        strip: None,
    }
}

/// First and last non-empty columns, scanning inward from both ends.
pub fn content_extent(grid: &PixelGrid) -> ContentExtent {
    let width = grid.width();
    let mut left_edge = 0;
    while left_edge < width && !grid.column_has_ink(left_edge) {
        left_edge += 1;
    }
    let mut right_edge = width.saturating_sub(1);
    while right_edge > 0 && !grid.column_has_ink(right_edge) {
        right_edge -= 1;
    }
    if left_edge == width {
        right_edge = 0;
    }
    ContentExtent { left_edge, right_edge }
}

/// True when column `x` holds a vertical ink run longer than `min_bar_height`.
pub fn is_bar_column(grid: &PixelGrid, x: u32, min_bar_height: u32) -> bool {
    let height = grid.height();
    let mut streak = 0;
    for y in 0..height {
        if grid.is_ink(x, y) {
            streak += 1;
            if streak > min_bar_height {
                return true;
            }
        } else {
            streak = 0;
            // Not enough rows left for a qualifying run.
            if y > height.saturating_sub(min_bar_height) {
                return false;
            }
        }
    }
    false
}

/// Group `(column, is_bar)` pairs, in increasing column order, into bars.
///
/// A bar column joins the open bar when it lies at most `merge_gap` columns
/// past the open bar's right edge; otherwise the open bar is closed.
pub fn group_bar_columns<I>(columns: I, merge_gap: u32) -> Vec<Bar>
where
    I: IntoIterator<Item = (u32, bool)>,
{
    let mut bars = Vec::new();
    let mut current: Option<Bar> = None;

    for (x, is_bar) in columns {
        match current.as_mut() {
            Some(bar) if x - bar.right_edge <= merge_gap => {
                if is_bar {
                    bar.right_edge = x;
                }
            }
            Some(_) => {
                bars.extend(current.take());
                if is_bar {
                    current = Some(Bar { left_edge: x, right_edge: x });
                }
            }
            None if is_bar => current = Some(Bar { left_edge: x, right_edge: x }),
            None => {}
        }
    }
    bars.extend(current);
    bars
}
