//! Data model shared by the detector, the compositor and the pager.
//!
//! All coordinates in [`Bar`], [`ContentExtent`] and [`AnalysisResult`] are
//! pixel columns of the composite strip (natural image pixels). Display
//! coordinates are obtained through [`ScoreMetrics::image_ratio`] and the
//! current [`ZoomScale`].

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A contiguous column interval judged to contain a vertical bar separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// First column of the stroke (inclusive)
    pub left_edge: u32,
    /// Last column of the stroke (inclusive)
    pub right_edge: u32,
}

/// First and last columns holding any ink.
///
/// An empty grid saturates to `left_edge == total_width`, `right_edge == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentExtent {
    pub left_edge: u32,
    pub right_edge: u32,
}

impl ContentExtent {
    pub fn is_empty(&self) -> bool {
        self.left_edge > self.right_edge
    }
}

/// Immutable output of one analysis pass over a score's images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Total strip width (sum of the source image widths)
    pub width: u32,
    /// Shared source image height
    pub height: u32,
    pub left_edge: u32,
    pub right_edge: u32,
    /// Detected separators, left to right
    pub bars: Vec<Bar>,
    /// Composite strip, present only when the worker synthesized one
    #[serde(skip)]
    pub strip: Option<RgbaImage>,
}

impl AnalysisResult {
    pub fn extent(&self) -> ContentExtent {
        ContentExtent {
            left_edge: self.left_edge,
            right_edge: self.right_edge,
        }
    }

    /// True when no ink or no separator was found.
    pub fn is_degenerate(&self) -> bool {
        self.extent().is_empty() || self.bars.is_empty()
    }
}

/// User-controlled magnification applied during repagination.
///
/// Always at least [`ZoomScale::MIN`]; construction and deserialization clamp.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct ZoomScale(f64);

impl ZoomScale {
    pub const MIN: f64 = 0.1;
    /// Increment applied per zoom button press.
    pub const STEP: f64 = 0.01;

    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.max(Self::MIN))
        } else {
            Self(1.0)
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Move by `steps` increments (negative zooms out), clamped at the minimum.
    pub fn stepped(self, steps: i32) -> Self {
        // Round to the step grid so repeated presses do not accumulate drift.
        let value = ((self.0 + steps as f64 * Self::STEP) / Self::STEP).round() * Self::STEP;
        Self::new(value)
    }

    /// Gauge text shown next to the zoom buttons, e.g. `"105%"`.
    pub fn percent_label(self) -> String {
        format!("{}%", (self.0 * 100.0).round() as i64)
    }
}

impl Default for ZoomScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f64> for ZoomScale {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<ZoomScale> for f64 {
    fn from(value: ZoomScale) -> Self {
        value.0
    }
}

/// Size of the full-score view in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Calibration measured once when a score is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    /// Natural width of one source image
    pub natural_width: u32,
    /// Natural height of the source images
    pub natural_height: u32,
    /// Height at which the host page displays one staff image
    pub display_height: f64,
    /// Distance from the top of the annotation sheet to the top of the image
    #[serde(default)]
    pub staff_offset: f64,
    /// Height of the annotation sheet's coordinate space
    #[serde(default = "default_sheet_height")]
    pub sheet_height: f64,
}

pub const DEFAULT_SHEET_HEIGHT: f64 = 299.0;

fn default_sheet_height() -> f64 {
    DEFAULT_SHEET_HEIGHT
}

impl ScoreMetrics {
    /// Metrics for images displayed at their natural size.
    pub fn natural(width: u32, height: u32) -> Self {
        Self {
            natural_width: width,
            natural_height: height,
            display_height: height as f64,
            staff_offset: 0.0,
            sheet_height: DEFAULT_SHEET_HEIGHT,
        }
    }

    /// Display pixels per natural image pixel.
    pub fn image_ratio(&self) -> f64 {
        if self.natural_height == 0 {
            1.0
        } else {
            self.display_height / self.natural_height as f64
        }
    }

    /// Display height of one staff row at scale 1.
    pub fn staff_height(&self) -> f64 {
        self.display_height
    }
}
