//! Pager: the open/closed state of the full-score view and the page being
//! shown.
//!
//! Only one page is attached to the host at a time. Every transition reports
//! a [`PageChange`] naming the page to detach (an index into the page list as
//! it was before the transition) and the page to attach, so the host can
//! detach first. Re-composition on resize or rescale builds the complete new
//! page list before swapping it in, and keeps the first bar of the displayed
//! page on screen.

use crate::compositor::{page_for_bar, Compositor, LayoutConfig, PageLayout};
use crate::model::{AnalysisResult, ScoreMetrics, Viewport, ZoomScale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Closed,
    Open { current: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub detach: Option<usize>,
    pub attach: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Pager {
    config: LayoutConfig,
    state: PagerState,
    pages: Vec<PageLayout>,
    viewport: Viewport,
    scale: ZoomScale,
}

impl Pager {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            state: PagerState::Closed,
            pages: Vec::new(),
            viewport: Viewport::new(0.0, 0.0),
            scale: ZoomScale::default(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PagerState::Open { .. })
    }

    pub fn pages(&self) -> &[PageLayout] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn scale(&self) -> ZoomScale {
        self.scale
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            PagerState::Open { current } => Some(current),
            PagerState::Closed => None,
        }
    }

    pub fn current_page(&self) -> Option<&PageLayout> {
        self.current_index().and_then(|i| self.pages.get(i))
    }

    /// "Page X of N" while open.
    pub fn label(&self) -> Option<String> {
        self.current_index()
            .map(|i| format!("Page {} of {}", i + 1, self.pages.len()))
    }

    /// Lay out every page and show the first one.
    pub fn open(
        &mut self,
        analysis: &AnalysisResult,
        metrics: &ScoreMetrics,
        viewport: Viewport,
        scale: ZoomScale,
    ) -> PageChange {
        let detach = self.current_index();
        self.viewport = viewport;
        self.scale = scale;
        self.pages = Compositor::new(analysis, metrics, &self.config, scale, viewport).paginate();
        self.state = PagerState::Open { current: 0 };
        PageChange { detach, attach: Some(0) }
    }

    pub fn next(&mut self) -> Option<PageChange> {
        let current = self.current_index()?;
        self.turn_to(current + 1)
    }

    pub fn previous(&mut self) -> Option<PageChange> {
        let current = self.current_index()?;
        self.turn_to(current.checked_sub(1)?)
    }

    /// Tap navigation: the left half of the view goes back, the right half
    /// goes forward.
    pub fn tap(&mut self, x: f64, view_width: f64) -> Option<PageChange> {
        if x < view_width / 2.0 {
            self.previous()
        } else {
            self.next()
        }
    }

    fn turn_to(&mut self, index: usize) -> Option<PageChange> {
        let current = self.current_index()?;
        if index >= self.pages.len() || index == current {
            return None;
        }
        self.state = PagerState::Open { current: index };
        Some(PageChange {
            detach: Some(current),
            attach: Some(index),
        })
    }

    pub fn resize(
        &mut self,
        analysis: &AnalysisResult,
        metrics: &ScoreMetrics,
        viewport: Viewport,
    ) -> Option<PageChange> {
        self.recompose(analysis, metrics, viewport, self.scale)
    }

    pub fn rescale(
        &mut self,
        analysis: &AnalysisResult,
        metrics: &ScoreMetrics,
        scale: ZoomScale,
    ) -> Option<PageChange> {
        self.recompose(analysis, metrics, self.viewport, scale)
    }

    fn recompose(
        &mut self,
        analysis: &AnalysisResult,
        metrics: &ScoreMetrics,
        viewport: Viewport,
        scale: ZoomScale,
    ) -> Option<PageChange> {
        let current = self.current_index()?;
        let anchor_bar = self.pages.get(current).map_or(0, |page| page.bar_start);

        let pages = Compositor::new(analysis, metrics, &self.config, scale, viewport).paginate();
        let next = page_for_bar(&pages, anchor_bar);

        self.pages = pages;
        self.viewport = viewport;
        self.scale = scale;
        self.state = PagerState::Open { current: next };
        Some(PageChange {
            detach: Some(current),
            attach: Some(next),
        })
    }

    /// Leave the full-score view and release its pages.
    pub fn close(&mut self) -> Option<PageChange> {
        let current = self.current_index()?;
        self.pages.clear();
        self.state = PagerState::Closed;
        Some(PageChange {
            detach: Some(current),
            attach: None,
        })
    }
}
