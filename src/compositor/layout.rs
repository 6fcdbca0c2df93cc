//! Layout computation: greedily packs bars into staff rows and staff rows
//! into pages.

use serde::{Deserialize, Serialize};

use crate::model::{AnalysisResult, ScoreMetrics, Viewport, ZoomScale};
use super::LayoutConfig;

// ═══════════════════════════════════════════════════════════════════════
// Layout structures
// ═══════════════════════════════════════════════════════════════════════

/// One staff slice placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRow {
    /// First bar index included in this row
    pub first_bar: usize,
    /// Last bar index included in this row (inclusive)
    pub last_bar: usize,
    /// Source columns `[left, right)` in strip pixels; `right` is one past
    /// the closing bar
    pub left: u32,
    pub right: u32,
    /// Vertical placement relative to the page content origin (display px)
    pub top: f64,
    /// Displayed size of the slice (display px)
    pub width: f64,
    pub height: f64,
}

impl StaffRow {
    pub fn bar_count(&self) -> usize {
        self.last_bar - self.first_bar + 1
    }

    pub fn source_width(&self) -> u32 {
        self.right - self.left
    }
}

/// A renderable page: placed staff rows plus the bar range they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub index: usize,
    /// First bar on the page
    pub bar_start: usize,
    /// One past the last bar on the page; where the next page resumes
    pub bar_end: usize,
    /// Drawable area (viewport minus margins)
    pub width: f64,
    pub height: f64,
    /// Height reserved above the rows for the title/artist header
    pub header_height: f64,
    pub rows: Vec<StaffRow>,
}

impl PageLayout {
    pub fn has_header(&self) -> bool {
        self.header_height > 0.0
    }

    pub fn contains_bar(&self, bar: usize) -> bool {
        (self.bar_start..self.bar_end).contains(&bar)
    }

    pub fn bar_count(&self) -> usize {
        self.bar_end - self.bar_start
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Compositor
// ═══════════════════════════════════════════════════════════════════════

/// Everything one pagination pass depends on.
///
/// Bars and extents come from the cached analysis; only the viewport and
/// the zoom scale change between passes.
#[derive(Debug, Clone, Copy)]
pub struct Compositor<'a> {
    pub analysis: &'a AnalysisResult,
    pub metrics: &'a ScoreMetrics,
    pub config: &'a LayoutConfig,
    pub scale: ZoomScale,
    pub viewport: Viewport,
}

impl<'a> Compositor<'a> {
    pub fn new(
        analysis: &'a AnalysisResult,
        metrics: &'a ScoreMetrics,
        config: &'a LayoutConfig,
        scale: ZoomScale,
        viewport: Viewport,
    ) -> Self {
        Self { analysis, metrics, config, scale, viewport }
    }

    pub fn available_width(&self) -> f64 {
        self.viewport.width - 2.0 * self.config.margin
    }

    pub fn available_height(&self, header_reserved: f64) -> f64 {
        self.viewport.height - 2.0 * self.config.margin - header_reserved
    }

    /// Vertical distance between the tops of consecutive rows.
    pub fn row_step(&self) -> f64 {
        (self.metrics.staff_height() + self.config.staff_gap) * self.scale.get()
    }

    /// Rows that fit in `available_height`, never fewer than one.
    pub fn rows_per_page(&self, header_reserved: f64) -> usize {
        let rows = (self.available_height(header_reserved) / self.row_step()).floor();
        if rows.is_finite() && rows >= 1.0 {
            rows as usize
        } else {
            1
        }
    }

    /// Display width of strip columns `left..right` at the current scale.
    fn display_width(&self, left: u32, right: u32) -> f64 {
        right.saturating_sub(left) as f64 * self.metrics.image_ratio() * self.scale.get()
    }

    /// Lay out one page starting at `start_bar`.
    ///
    /// Every row includes at least the bar it starts with, so for a
    /// non-empty bar list `bar_end > start_bar` always holds.
    pub fn paint_page(&self, index: usize, start_bar: usize, header_reserved: f64) -> PageLayout {
        let bars = &self.analysis.bars;
        let available_width = self.available_width();
        let rows_per_page = self.rows_per_page(header_reserved);
        let row_height = self.metrics.staff_height() * self.scale.get();

        let mut rows = Vec::with_capacity(rows_per_page);
        let mut bar = start_bar;
        let mut top = 0.0;

        for _ in 0..rows_per_page {
            if bar >= bars.len() {
                break;
            }
            let first_bar = bar;
            // Resume where the previous row's last bar started.
            let left = if first_bar == 0 {
                self.analysis.left_edge
            } else {
                bars[first_bar - 1].left_edge
            };

            let mut last_bar = first_bar;
            while last_bar + 1 < bars.len()
                && self.display_width(left, bars[last_bar + 1].right_edge) < available_width
            {
                last_bar += 1;
            }

            // Include the closing bar's last column.
            let right = (bars[last_bar].right_edge + 1).min(self.analysis.width).max(left);
            rows.push(StaffRow {
                first_bar,
                last_bar,
                left,
                right,
                top,
                width: self.display_width(left, right),
                height: row_height,
            });

            top += self.row_step();
            bar = last_bar + 1;
        }

        PageLayout {
            index,
            bar_start: start_bar,
            bar_end: bar.max(start_bar),
            width: available_width,
            height: self.viewport.height - 2.0 * self.config.margin,
            header_height: header_reserved,
            rows,
        }
    }

    /// Lay out the whole score. The first page reserves the header.
    ///
    /// A bar-less analysis yields one header-only page.
    pub fn paginate(&self) -> Vec<PageLayout> {
        let bars = &self.analysis.bars;
        let header = self.config.header_height;

        if bars.is_empty() {
            return vec![self.paint_page(0, 0, header)];
        }

        let mut pages = Vec::new();
        let mut start = 0;
        while start < bars.len() {
            let reserved = if start == 0 { header } else { 0.0 };
            let page = self.paint_page(pages.len(), start, reserved);
            start = page.bar_end;
            pages.push(page);
        }

        log::debug!(
            "paginated {} bars into {} pages at {} for {}x{}",
            bars.len(),
            pages.len(),
            self.scale.percent_label(),
            self.viewport.width,
            self.viewport.height
        );
        pages
    }
}

/// Index of the page containing `bar`, or the last page when past the end.
pub fn page_for_bar(pages: &[PageLayout], bar: usize) -> usize {
    pages
        .iter()
        .position(|page| page.contains_bar(bar))
        .unwrap_or_else(|| pages.len().saturating_sub(1))
}
