//! Page compositor: re-flows the analyzed strip into fixed-size pages.
//!
//! Layout is computed from the cached [`AnalysisResult`] alone, so a zoom or
//! viewport change only re-runs [`Compositor::paginate`]. The resulting
//! [`PageLayout`]s can be drawn as standalone SVG (strip slices referenced by
//! href, with annotation overlays aligned per row) or blitted into a bitmap.

pub mod constants;
mod layout;
mod raster;
mod svg_builder;

use serde::{Deserialize, Serialize};

use crate::model::{AnalysisResult, ScoreMetrics, Viewport, ZoomScale};
use constants::*;

pub use layout::{page_for_bar, Compositor, PageLayout, StaffRow};
pub use raster::render_page_bitmap;
pub use svg_builder::{render_page_svg, PageHeader};

// ═══════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════

/// Fixed page geometry, passed explicitly into every pagination pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Margin on every side of the viewport
    pub margin: f64,
    /// Gap between staff rows before zoom
    pub staff_gap: f64,
    /// Height reserved for the title/artist header on the first page
    pub header_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: PAGE_MARGIN,
            staff_gap: STAFF_GAP,
            header_height: HEADER_HEIGHT,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Lay out one page starting at `start_bar`; `bar_end` of the result is the
/// index the next page resumes from.
pub fn paint_page(
    analysis: &AnalysisResult,
    metrics: &ScoreMetrics,
    config: &LayoutConfig,
    scale: ZoomScale,
    viewport: Viewport,
    start_bar: usize,
    header_reserved: f64,
) -> PageLayout {
    Compositor::new(analysis, metrics, config, scale, viewport).paint_page(0, start_bar, header_reserved)
}

/// Lay out the full page sequence for one viewport and zoom scale.
pub fn paginate(
    analysis: &AnalysisResult,
    metrics: &ScoreMetrics,
    config: &LayoutConfig,
    scale: ZoomScale,
    viewport: Viewport,
) -> Vec<PageLayout> {
    Compositor::new(analysis, metrics, config, scale, viewport).paginate()
}

/// Serialize a page list to JSON for the bindings.
pub fn pages_to_json(pages: &[PageLayout]) -> String {
    serde_json::to_string(pages).unwrap_or_else(|_| "[]".to_string())
}
