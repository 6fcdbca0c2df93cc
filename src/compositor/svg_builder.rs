//! SVG builder: accumulates SVG elements and produces a standalone page.

use super::constants::*;
use super::layout::{PageLayout, StaffRow};
use crate::error::Result;
use crate::model::{ScoreMetrics, ZoomScale};
use crate::overlay::{align_row, escape_xml, svg_number, OverlayFragment, SVG_NAMESPACE};

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(super) struct SvgBuilder {
    pub(super) elements: Vec<String>,
    width: f64,
    height: f64,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
        }
    }

    pub(super) fn build(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="{}" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 {} {}" width="{}" height="{}" class="content">"#,
            SVG_NAMESPACE,
            svg_number(self.width),
            svg_number(self.height),
            svg_number(self.width),
            svg_number(self.height)
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub(super) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.elements.push(format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            x, y, w, h, fill
        ));
    }

    pub(super) fn text(&mut self, x: f64, y: f64, content: &str, size: f64, class: &str, fill: &str) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.0}" class="{}" fill="{}">{}</text>"#,
            x, y, size, class, fill, escape_xml(content)
        ));
    }

    /// A window onto strip columns `left..right`, stretched over the row's
    /// display rectangle.
    pub(super) fn strip_slice(&mut self, row: &StaffRow, y: f64, href: &str, strip_width: u32, strip_height: u32) {
        self.elements.push(format!(
            r#"<svg x="0" y="{}" width="{}" height="{}" viewBox="{} 0 {} {}" preserveAspectRatio="none"><image xlink:href="{}" width="{}" height="{}"/></svg>"#,
            svg_number(y),
            svg_number(row.width),
            svg_number(row.height),
            row.left,
            row.source_width(),
            strip_height,
            escape_xml(href),
            strip_width,
            strip_height
        ));
    }

    pub(super) fn raw(&mut self, element: String) {
        self.elements.push(element);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Page rendering
// ═══════════════════════════════════════════════════════════════════════

/// Title block drawn on the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub title: String,
    pub artist: String,
}

/// Render a page as standalone SVG.
///
/// `strip_href` points at the composite strip image (`strip_width` ×
/// `strip_height` natural pixels). When an overlay fragment is given, each
/// row receives its own aligned clone on top of the slice.
#[allow(clippy::too_many_arguments)]
pub fn render_page_svg(
    page: &PageLayout,
    header: &PageHeader,
    strip_href: &str,
    strip_width: u32,
    strip_height: u32,
    metrics: &ScoreMetrics,
    scale: ZoomScale,
    overlay: Option<&OverlayFragment>,
) -> Result<String> {
    let mut svg = SvgBuilder::new(page.width, page.height);

    svg.rect(0.0, 0.0, page.width, page.height, PAGE_BACKGROUND);

    if page.has_header() {
        svg.text(0.0, ARTIST_BASELINE, &header.artist, ARTIST_FONT_SIZE, "flowscore-artist", ARTIST_COLOR);
        svg.text(0.0, TITLE_BASELINE, &header.title, TITLE_FONT_SIZE, "flowscore-title", HEADER_COLOR);
    }

    for row in &page.rows {
        let y = page.header_height + row.top;
        svg.strip_slice(row, y, strip_href, strip_width, strip_height);

        if let Some(fragment) = overlay {
            let mut aligned = align_row(row, metrics, scale);
            aligned.top += page.header_height;
            svg.raw(fragment.clone_aligned(&aligned)?);
        }
    }

    Ok(svg.build())
}
