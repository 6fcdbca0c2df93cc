//! flowscore: bar-line detection and paginated full-score compositing for
//! sheet music published as horizontal staff strips.
//!
//! The source images are scanned once for their inked column range and the
//! vertical bar separators. The cached analysis is then re-flowed into
//! fixed-size pages for any viewport and zoom, with the score's annotation
//! overlay re-aligned onto every generated staff row.
//!
//! # Example
//! ```no_run
//! use flowscore::{analyze_files, paginate, LayoutConfig, ScoreMetrics, Viewport, ZoomScale};
//!
//! let analysis = analyze_files(&["staff-1.png", "staff-2.png"]).unwrap();
//! let metrics = ScoreMetrics::natural(analysis.width / 2, analysis.height);
//! let pages = paginate(
//!     &analysis,
//!     &metrics,
//!     &LayoutConfig::default(),
//!     ZoomScale::default(),
//!     Viewport::new(1024.0, 768.0),
//! );
//! println!("Bars: {}", analysis.bars.len());
//! println!("Pages: {}", pages.len());
//! ```

pub mod compositor;
pub mod detector;
pub mod error;
pub mod model;
pub mod options;
pub mod overlay;
pub mod pager;
pub mod sampler;
pub mod scribbles;
pub mod session;
pub mod source;
pub mod store;
pub mod worker;

#[cfg(target_os = "android")]
pub mod android;

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};

pub use compositor::{paginate, pages_to_json, LayoutConfig, PageLayout, StaffRow};
pub use detector::{analyze, analyze_with, DetectorConfig};
pub use error::{FlowscoreError, Result};
pub use model::*;
pub use sampler::{InkRule, PixelGrid};

/// Decode and analyze a set of encoded staff images, left to right.
pub fn analyze_bytes<B: AsRef<[u8]>>(encoded: &[B], rule: InkRule) -> Result<AnalysisResult> {
    let grid = PixelGrid::decode(encoded, rule)?;
    Ok(analyze(&grid))
}

/// Read and analyze staff image files, left to right.
pub fn analyze_files<P: AsRef<Path>>(paths: &[P]) -> Result<AnalysisResult> {
    let encoded = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            std::fs::read(path).map_err(|e| FlowscoreError::Fetch {
                url: path.display().to_string(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    analyze_bytes(&encoded, InkRule::default())
}

/// Convert an analysis to a JSON string.
/// Useful for passing data across FFI boundaries.
pub fn analysis_to_json(analysis: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string(analysis)?)
}

/// Encode a strip or page bitmap as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| FlowscoreError::Codec(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

/// Paginate from the JSON forms used by the bindings.
pub fn paginate_json(
    analysis_json: &str,
    metrics_json: &str,
    viewport: Viewport,
    scale: f64,
) -> Result<String> {
    let analysis: AnalysisResult = serde_json::from_str(analysis_json)?;
    let metrics: ScoreMetrics = serde_json::from_str(metrics_json)?;
    let pages = paginate(
        &analysis,
        &metrics,
        &LayoutConfig::default(),
        ZoomScale::new(scale),
        viewport,
    );
    Ok(pages_to_json(&pages))
}

/// Analyze the files named by a JSON array of paths.
pub fn analyze_files_json(paths_json: &str) -> Result<String> {
    let paths: Vec<String> = serde_json::from_str(paths_json)?;
    if paths.is_empty() {
        return Err(FlowscoreError::InvalidInput("no image paths".into()));
    }
    analysis_to_json(&analyze_files(&paths)?)
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI: for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn into_c_string(result: Result<String>) -> *mut c_char {
    match result {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(e) => {
            log::warn!("flowscore call failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Analyze staff images and return the analysis as JSON.
/// The caller must free the returned string with `flowscore_free_string`.
///
/// `paths_json` is a JSON array of file paths, in strip order.
///
/// # Safety
/// `paths_json` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn flowscore_analyze_files(paths_json: *const c_char) -> *mut c_char {
    let Some(paths_json) = (unsafe { str_arg(paths_json) }) else {
        return std::ptr::null_mut();
    };
    into_c_string(analyze_files_json(paths_json))
}

/// Paginate a previous analysis and return the page list as JSON.
/// The caller must free the returned string with `flowscore_free_string`.
///
/// # Safety
/// `analysis_json` and `metrics_json` must be valid null-terminated UTF-8 C strings.
#[no_mangle]
pub unsafe extern "C" fn flowscore_paginate(
    analysis_json: *const c_char,
    metrics_json: *const c_char,
    viewport_width: f64,
    viewport_height: f64,
    scale: f64,
) -> *mut c_char {
    let (Some(analysis_json), Some(metrics_json)) =
        (unsafe { str_arg(analysis_json) }, unsafe { str_arg(metrics_json) })
    else {
        return std::ptr::null_mut();
    };
    into_c_string(paginate_json(
        analysis_json,
        metrics_json,
        Viewport::new(viewport_width, viewport_height),
        scale,
    ))
}

/// Free a string previously returned by flowscore functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a flowscore function, or null.
#[no_mangle]
pub unsafe extern "C" fn flowscore_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
