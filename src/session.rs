//! Score session: lifecycle of the score currently shown by the host.
//!
//! The host drives `mount`/`unmount` from its navigation observer. Each mount
//! hands out a [`MountId`]; analysis results carrying an older id are
//! dropped, so a slow analysis can never land on the wrong score.

use crate::compositor::{LayoutConfig, PageHeader};
use crate::error::{FlowscoreError, Result};
use crate::model::{AnalysisResult, ScoreMetrics, Viewport, ZoomScale};
use crate::options::Options;
use crate::pager::{PageChange, Pager};
use crate::worker::{KeepAwake, Request};

/// Everything the host knows about a score when it appears.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMount {
    pub score_id: String,
    pub title: String,
    pub artist: String,
    pub image_urls: Vec<String>,
    pub metrics: ScoreMetrics,
}

/// Generation token of one mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(u64);

/// State of the "open full score" control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenControl {
    /// Analysis still running
    Pending,
    Enabled,
    /// Analysis failed; the reason is shown to the user
    Disabled(String),
}

#[derive(Debug)]
enum AnalysisState {
    Pending,
    Ready(AnalysisResult),
    Failed(String),
}

#[derive(Debug)]
struct Mounted {
    id: MountId,
    score: ScoreMount,
    analysis: AnalysisState,
}

#[derive(Debug)]
pub struct ScoreSession {
    next_id: u64,
    mounted: Option<Mounted>,
    pager: Pager,
    visible: bool,
    keep_awake_enabled: bool,
}

impl ScoreSession {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            next_id: 0,
            mounted: None,
            pager: Pager::new(config),
            visible: true,
            keep_awake_enabled: true,
        }
    }

    /// Start tracking a new score. Any previous score is unmounted first;
    /// the returned change detaches its page when the view was open.
    pub fn mount(&mut self, score: ScoreMount) -> (MountId, Option<PageChange>) {
        let change = self.unmount();
        self.next_id += 1;
        let id = MountId(self.next_id);
        log::debug!("mounted score {} ({} images)", score.score_id, score.image_urls.len());
        self.mounted = Some(Mounted {
            id,
            score,
            analysis: AnalysisState::Pending,
        });
        (id, change)
    }

    /// Forget the current score and close the full-score view.
    pub fn unmount(&mut self) -> Option<PageChange> {
        let change = self.pager.close();
        if let Some(mounted) = self.mounted.take() {
            log::debug!("unmounted score {}", mounted.score.score_id);
        }
        change
    }

    pub fn mount_id(&self) -> Option<MountId> {
        self.mounted.as_ref().map(|m| m.id)
    }

    pub fn score(&self) -> Option<&ScoreMount> {
        self.mounted.as_ref().map(|m| &m.score)
    }

    /// The worker request analyzing the mounted score.
    pub fn analysis_request(&self) -> Option<Request> {
        self.score().map(|score| Request::Analyze {
            image_urls: score.image_urls.clone(),
        })
    }

    /// Deliver an analysis outcome. Returns false when `id` is stale or the
    /// mount already has a result.
    pub fn finish_analysis(&mut self, id: MountId, result: Result<AnalysisResult>) -> bool {
        let Some(mounted) = self.mounted.as_mut().filter(|m| m.id == id) else {
            log::debug!("dropping analysis for stale mount {id:?}");
            return false;
        };
        if !matches!(mounted.analysis, AnalysisState::Pending) {
            return false;
        }
        mounted.analysis = match result {
            Ok(analysis) => AnalysisState::Ready(analysis),
            Err(e) => {
                log::warn!("Analysis of {} failed: {e}", mounted.score.score_id);
                AnalysisState::Failed(e.to_string())
            }
        };
        true
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match &self.mounted.as_ref()?.analysis {
            AnalysisState::Ready(analysis) => Some(analysis),
            _ => None,
        }
    }

    /// `None` while no score is mounted.
    pub fn open_control(&self) -> Option<OpenControl> {
        let control = match &self.mounted.as_ref()?.analysis {
            AnalysisState::Pending => OpenControl::Pending,
            AnalysisState::Ready(_) => OpenControl::Enabled,
            AnalysisState::Failed(reason) => OpenControl::Disabled(reason.clone()),
        };
        Some(control)
    }

    pub fn header(&self) -> PageHeader {
        self.score()
            .map(|score| PageHeader {
                title: score.title.clone(),
                artist: score.artist.clone(),
            })
            .unwrap_or_default()
    }

    /// Open the full-score view at the first page.
    pub fn open(&mut self, viewport: Viewport, options: &Options) -> Result<PageChange> {
        self.keep_awake_enabled = options.keep_awake;
        let mounted = self
            .mounted
            .as_ref()
            .ok_or_else(|| FlowscoreError::InvalidInput("no score mounted".into()))?;
        let AnalysisState::Ready(analysis) = &mounted.analysis else {
            return Err(FlowscoreError::InvalidInput("analysis not ready".into()));
        };
        Ok(self.pager.open(analysis, &mounted.score.metrics, viewport, options.scale))
    }

    pub fn close(&mut self) -> Option<PageChange> {
        self.pager.close()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn next(&mut self) -> Option<PageChange> {
        self.pager.next()
    }

    pub fn previous(&mut self) -> Option<PageChange> {
        self.pager.previous()
    }

    pub fn tap(&mut self, x: f64, view_width: f64) -> Option<PageChange> {
        self.pager.tap(x, view_width)
    }

    pub fn resize(&mut self, viewport: Viewport) -> Option<PageChange> {
        let (analysis, metrics) = ready(&self.mounted)?;
        self.pager.resize(analysis, metrics, viewport)
    }

    /// Change the zoom by `steps` increments and record it in `options`.
    /// The caller persists the options.
    pub fn zoom(&mut self, steps: i32, options: &mut Options) -> Option<PageChange> {
        options.scale = options.scale.stepped(steps);
        self.rescale(options.scale)
    }

    pub fn rescale(&mut self, scale: ZoomScale) -> Option<PageChange> {
        let (analysis, metrics) = ready(&self.mounted)?;
        self.pager.rescale(analysis, metrics, scale)
    }

    pub fn set_keep_awake_enabled(&mut self, enabled: bool) -> KeepAwake {
        self.keep_awake_enabled = enabled;
        self.keep_awake()
    }

    pub fn visibility_changed(&mut self, visible: bool) -> KeepAwake {
        self.visible = visible;
        self.keep_awake()
    }

    /// Display lock while a score is mounted, visible and the option allows it.
    pub fn keep_awake(&self) -> KeepAwake {
        if self.mounted.is_some() && self.visible && self.keep_awake_enabled {
            KeepAwake::Display
        } else {
            KeepAwake::Off
        }
    }
}

fn ready(mounted: &Option<Mounted>) -> Option<(&AnalysisResult, &ScoreMetrics)> {
    let mounted = mounted.as_ref()?;
    match &mounted.analysis {
        AnalysisState::Ready(analysis) => Some((analysis, &mounted.score.metrics)),
        _ => None,
    }
}

impl Default for ScoreSession {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bar;

    fn mount_of(id: &str) -> ScoreMount {
        ScoreMount {
            score_id: id.to_string(),
            title: "Title".into(),
            artist: "Artist".into(),
            image_urls: vec![format!("{id}.png")],
            metrics: ScoreMetrics::natural(400, 100),
        }
    }

    fn three_bars() -> AnalysisResult {
        AnalysisResult {
            width: 400,
            height: 100,
            left_edge: 0,
            right_edge: 390,
            bars: vec![
                Bar { left_edge: 100, right_edge: 101 },
                Bar { left_edge: 200, right_edge: 201 },
                Bar { left_edge: 300, right_edge: 301 },
            ],
            strip: None,
        }
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut session = ScoreSession::default();
        let (first, _) = session.mount(mount_of("a"));
        let (second, _) = session.mount(mount_of("b"));

        assert!(!session.finish_analysis(first, Ok(three_bars())));
        assert_eq!(session.open_control(), Some(OpenControl::Pending));

        assert!(session.finish_analysis(second, Ok(three_bars())));
        assert_eq!(session.open_control(), Some(OpenControl::Enabled));
        assert!(!session.finish_analysis(second, Ok(three_bars())));

        session.unmount();
        assert!(!session.finish_analysis(second, Ok(three_bars())));
        assert_eq!(session.open_control(), None);
    }

    #[test]
    fn failed_analysis_disables_open() {
        let mut session = ScoreSession::default();
        let (id, _) = session.mount(mount_of("a"));
        let error = FlowscoreError::Fetch {
            url: "a.png".into(),
            reason: "HTTP error, status 404".into(),
        };
        session.finish_analysis(id, Err(error));

        assert!(matches!(session.open_control(), Some(OpenControl::Disabled(reason)) if reason.contains("404")));
        assert!(session.open(Viewport::new(800.0, 600.0), &Options::default()).is_err());
    }

    #[test]
    fn open_requires_ready_analysis() {
        let mut session = ScoreSession::default();
        assert!(session.open(Viewport::new(800.0, 600.0), &Options::default()).is_err());

        let (id, change) = session.mount(mount_of("a"));
        assert_eq!(change, None);
        assert!(session.open(Viewport::new(800.0, 600.0), &Options::default()).is_err());

        session.finish_analysis(id, Ok(three_bars()));
        let change = session.open(Viewport::new(800.0, 600.0), &Options::default()).unwrap();
        assert_eq!(change, PageChange { detach: None, attach: Some(0) });
        assert_eq!(session.pager().label().as_deref(), Some("Page 1 of 1"));

        let change = session.unmount().unwrap();
        assert_eq!(change.attach, None);
        assert!(!session.pager().is_open());
    }

    #[test]
    fn remount_detaches_the_open_page() {
        let mut session = ScoreSession::default();
        let (id, _) = session.mount(mount_of("a"));
        session.finish_analysis(id, Ok(three_bars()));
        session.open(Viewport::new(800.0, 600.0), &Options::default()).unwrap();

        let (next, change) = session.mount(mount_of("b"));
        assert_eq!(change, Some(PageChange { detach: Some(0), attach: None }));
        assert!(!session.pager().is_open());
        assert_eq!(session.mount_id(), Some(next));
        assert_eq!(session.score().map(|s| s.score_id.as_str()), Some("b"));
    }

    #[test]
    fn keep_awake_follows_mount_and_visibility() {
        let mut session = ScoreSession::default();
        assert_eq!(session.keep_awake(), KeepAwake::Off);

        session.mount(mount_of("a"));
        assert_eq!(session.keep_awake(), KeepAwake::Display);
        assert_eq!(session.visibility_changed(false), KeepAwake::Off);
        assert_eq!(session.visibility_changed(true), KeepAwake::Display);
        assert_eq!(session.set_keep_awake_enabled(false), KeepAwake::Off);
    }
}
