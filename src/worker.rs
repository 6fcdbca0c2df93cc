//! Worker: the request/response service that fetches a score's images,
//! runs the detector and forwards power requests to the platform.

use serde::{Deserialize, Serialize};

use crate::detector::{analyze_with, DetectorConfig};
use crate::error::Result;
use crate::model::AnalysisResult;
use crate::sampler::{InkRule, PixelGrid};
use crate::source::{fetch_all, ImageSource};

/// Level of the platform wake lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepAwake {
    /// Keep the screen on.
    Display,
    /// Release any lock.
    #[default]
    Off,
}

/// Platform hook receiving keep-awake requests.
pub trait PowerControl {
    fn set_keep_awake(&mut self, level: KeepAwake);
}

/// Records the last requested level without touching the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPowerControl {
    pub level: KeepAwake,
}

impl PowerControl for NoPowerControl {
    fn set_keep_awake(&mut self, level: KeepAwake) {
        log::debug!("keep awake: {level:?}");
        self.level = level;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Detect extents and bars.
    Analyze { image_urls: Vec<String> },
    /// Same as `Analyze`, and also keep the composite strip.
    BuildStrip { image_urls: Vec<String> },
    SetKeepAwake { level: KeepAwake },
}

#[derive(Debug, Clone)]
pub enum Response {
    Analysis(AnalysisResult),
    Strip(AnalysisResult),
    Ack,
}

pub struct Worker<S, P> {
    source: S,
    power: P,
    detector: DetectorConfig,
    ink: InkRule,
}

impl<S: ImageSource, P: PowerControl> Worker<S, P> {
    pub fn new(source: S, power: P) -> Self {
        Self {
            source,
            power,
            detector: DetectorConfig::default(),
            ink: InkRule::default(),
        }
    }

    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_ink_rule(mut self, ink: InkRule) -> Self {
        self.ink = ink;
        self
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub async fn handle(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::Analyze { image_urls } => self.analyze(&image_urls).await.map(Response::Analysis),
            Request::BuildStrip { image_urls } => self.build_strip(&image_urls).await.map(Response::Strip),
            Request::SetKeepAwake { level } => {
                self.power.set_keep_awake(level);
                Ok(Response::Ack)
            }
        }
    }

    pub async fn analyze(&self, image_urls: &[String]) -> Result<AnalysisResult> {
        let grid = self.load_grid(image_urls).await?;
        Ok(analyze_with(&grid, &self.detector))
    }

    pub async fn build_strip(&self, image_urls: &[String]) -> Result<AnalysisResult> {
        let grid = self.load_grid(image_urls).await?;
        let mut analysis = analyze_with(&grid, &self.detector);
        analysis.strip = Some(grid.composite());
        Ok(analysis)
    }

    async fn load_grid(&self, image_urls: &[String]) -> Result<PixelGrid> {
        let encoded = fetch_all(&self.source, image_urls).await?;
        log::debug!("fetched {} images", encoded.len());
        PixelGrid::decode(&encoded, self.ink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_use_action_tags() {
        let request: Request =
            serde_json::from_str(r#"{"action":"set_keep_awake","level":"display"}"#).unwrap();
        assert_eq!(request, Request::SetKeepAwake { level: KeepAwake::Display });

        let json = serde_json::to_string(&Request::Analyze { image_urls: vec!["a.png".into()] }).unwrap();
        assert_eq!(json, r#"{"action":"analyze","image_urls":["a.png"]}"#);
    }
}
