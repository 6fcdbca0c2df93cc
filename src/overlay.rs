//! Annotation overlay and the per-row aligner.
//!
//! Scribbles are SVG path strings in whole-score sheet coordinates: the
//! coordinate space of the host page's annotation sheet, where one natural
//! image pixel spans `image_ratio` units horizontally and the sheet is
//! `sheet_height` units tall. The overlay is rendered once into an
//! [`OverlayFragment`]; each placed staff row gets its own clone with a
//! viewBox that windows the same absolute coordinates onto the slice.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::compositor::StaffRow;
use crate::error::{FlowscoreError, Result};
use crate::model::{ScoreMetrics, ZoomScale};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const OVERLAY_CLASS: &str = "flowscore-annotations";
pub const SCRIBBLE_CLASS: &str = "flowscore-scribble";

/// Opaque, creation-ordered scribble key.
pub type ScribbleId = String;

// ═══════════════════════════════════════════════════════════════════════
// AnnotationOverlay
// ═══════════════════════════════════════════════════════════════════════

/// All scribbles of one score, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationOverlay {
    scribbles: BTreeMap<ScribbleId, String>,
}

impl AnnotationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scribbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scribbles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.scribbles.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scribbles.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scribbles.iter().map(|(id, d)| (id.as_str(), d.as_str()))
    }

    pub fn insert(&mut self, id: ScribbleId, path: String) -> Option<String> {
        self.scribbles.insert(id, path)
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.scribbles.remove(id)
    }

    /// Import scribbles from an SVG document holding id-bearing
    /// `flowscore-scribble` paths.
    pub fn from_svg(svg: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(svg)
            .map_err(|e| FlowscoreError::Codec(format!("annotation SVG: {e}")))?;
        let mut overlay = Self::new();
        for node in doc.descendants() {
            if node.tag_name().name() != "path" || node.attribute("class") != Some(SCRIBBLE_CLASS) {
                continue;
            }
            if let (Some(id), Some(d)) = (node.attribute("id"), node.attribute("d")) {
                overlay.insert(id.to_string(), d.to_string());
            }
        }
        Ok(overlay)
    }

    /// Render every scribble as a path inside an overlay `<svg>`.
    pub fn render(&self, with_ids: bool) -> String {
        let mut svg = format!(r#"<svg xmlns="{SVG_NAMESPACE}" class="{OVERLAY_CLASS}">"#);
        for (id, d) in self.iter() {
            if with_ids {
                let _ = write!(
                    svg,
                    r#"<path id="{}" class="{SCRIBBLE_CLASS}" d="{}"/>"#,
                    escape_xml(id),
                    escape_xml(d)
                );
            } else {
                let _ = write!(svg, r#"<path class="{SCRIBBLE_CLASS}" d="{}"/>"#, escape_xml(d));
            }
        }
        svg.push_str("</svg>");
        svg
    }

    /// Render once, without ids, for reuse on every page.
    pub fn render_passive(&self) -> OverlayFragment {
        OverlayFragment { svg: self.render(false) }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Alignment
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            svg_number(self.x),
            svg_number(self.y),
            svg_number(self.width),
            svg_number(self.height)
        )
    }
}

/// Visible region and placement of one overlay clone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedOverlay {
    /// Window onto whole-score sheet coordinates
    pub view_box: ViewBox,
    /// Placement relative to the page content origin (display px)
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl AlignedOverlay {
    /// Map an absolute sheet point to an offset inside the placed overlay.
    pub fn to_local(&self, x: f64, y: f64) -> (f64, f64) {
        let vb = &self.view_box;
        let sx = if vb.width > 0.0 { self.width / vb.width } else { 0.0 };
        let sy = if vb.height > 0.0 { self.height / vb.height } else { 0.0 };
        ((x - vb.x) * sx, (y - vb.y) * sy)
    }

    /// Map an absolute sheet point to page content coordinates.
    pub fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        let (lx, ly) = self.to_local(x, y);
        (self.left + lx, self.top + ly)
    }
}

/// Compute the overlay window for a placed staff row.
///
/// The overlay is shifted up by the image's offset inside the annotation
/// sheet so sheet coordinates line up with the blitted slice.
pub fn align_row(row: &StaffRow, metrics: &ScoreMetrics, scale: ZoomScale) -> AlignedOverlay {
    let ratio = metrics.image_ratio();
    let scale = scale.get();
    let source_width = row.source_width() as f64;
    AlignedOverlay {
        view_box: ViewBox {
            x: row.left as f64 * ratio,
            y: 0.0,
            width: source_width * ratio,
            height: metrics.sheet_height,
        },
        left: 0.0,
        top: row.top - metrics.staff_offset * scale,
        width: source_width * ratio * scale,
        height: metrics.sheet_height * scale,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// OverlayFragment
// ═══════════════════════════════════════════════════════════════════════

/// A rendered overlay shared by every page; only ever cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFragment {
    svg: String,
}

impl OverlayFragment {
    pub fn parse(svg: impl Into<String>) -> Result<Self> {
        let svg = svg.into();
        roxmltree::Document::parse(&svg)
            .map_err(|e| FlowscoreError::Codec(format!("overlay fragment: {e}")))?;
        Ok(Self { svg })
    }

    pub fn as_str(&self) -> &str {
        &self.svg
    }

    /// Clone the fragment's content under a root carrying the row's window.
    pub fn clone_aligned(&self, aligned: &AlignedOverlay) -> Result<String> {
        let doc = roxmltree::Document::parse(&self.svg)
            .map_err(|e| FlowscoreError::Codec(format!("overlay fragment: {e}")))?;
        let mut out = format!(
            r#"<svg class="{OVERLAY_CLASS}" x="{}" y="{}" width="{}" height="{}" viewBox="{}">"#,
            svg_number(aligned.left),
            svg_number(aligned.top),
            svg_number(aligned.width),
            svg_number(aligned.height),
            aligned.view_box
        );
        for child in doc.root_element().children() {
            write_node(&mut out, child);
        }
        out.push_str("</svg>");
        Ok(out)
    }
}

fn write_node(out: &mut String, node: roxmltree::Node<'_, '_>) {
    if node.is_text() {
        out.push_str(&escape_xml(node.text().unwrap_or_default()));
        return;
    }
    if !node.is_element() {
        return;
    }
    let name = node.tag_name().name();
    out.push('<');
    out.push_str(name);
    for attr in node.attributes() {
        let _ = write!(out, r#" {}="{}""#, attr.name(), escape_xml(attr.value()));
    }
    if node.has_children() {
        out.push('>');
        for child in node.children() {
            write_node(out, child);
        }
        let _ = write!(out, "</{name}>");
    } else {
        out.push_str("/>");
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════

pub(crate) fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Compact number formatting for SVG attributes: `12.5`, `80`, `-3.25`.
pub(crate) fn svg_number(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
