//! Shared constants for the page compositor (display pixels unless noted).

// ── Page & margins ──────────────────────────────────────────────────
pub const PAGE_MARGIN: f64 = 30.0; // on every side of the viewport
pub const STAFF_GAP: f64 = 15.0; // vertical space between staff rows (before zoom)

// ── Header ──────────────────────────────────────────────────────────
pub const HEADER_HEIGHT: f64 = 100.0; // reserved on the first page for title + artist
pub(super) const ARTIST_FONT_SIZE: f64 = 16.0;
pub(super) const TITLE_FONT_SIZE: f64 = 32.0;
pub(super) const ARTIST_BASELINE: f64 = 28.0;
pub(super) const TITLE_BASELINE: f64 = 72.0;

// ── Colors ──────────────────────────────────────────────────────────
pub(super) const PAGE_BACKGROUND: &str = "white";
pub(super) const HEADER_COLOR: &str = "#1a1a1a";
pub(super) const ARTIST_COLOR: &str = "#555555";
