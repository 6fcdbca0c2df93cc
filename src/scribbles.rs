//! Scribble store: the persisted [`AnnotationOverlay`] of one score.
//!
//! A store only exists after its initial load succeeded, so no write can
//! reach storage before the saved scribbles have been read. Write failures
//! do not roll back the in-memory overlay; they are logged and kept for the
//! host to announce.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{FlowscoreError, Result};
use crate::overlay::{AnnotationOverlay, OverlayFragment, ScribbleId};
use crate::store::{compress_json, decompress_json, KeyValueStore};

#[derive(Debug)]
pub struct ScribbleStore {
    score_id: String,
    overlay: AnnotationOverlay,
    last_save_error: Option<FlowscoreError>,
}

impl ScribbleStore {
    /// Read the saved scribbles of `score_id`. A missing entry is an empty
    /// overlay; an unreadable one is an error.
    pub fn load<K: KeyValueStore + ?Sized>(kv: &K, score_id: &str) -> Result<Self> {
        let overlay = match kv.get(score_id)? {
            Some(payload) => decode_overlay(&payload)?,
            None => AnnotationOverlay::new(),
        };
        log::debug!("loaded {} scribbles for score {score_id}", overlay.len());
        Ok(Self {
            score_id: score_id.to_string(),
            overlay,
            last_save_error: None,
        })
    }

    pub fn score_id(&self) -> &str {
        &self.score_id
    }

    pub fn overlay(&self) -> &AnnotationOverlay {
        &self.overlay
    }

    pub fn render_all(&self, with_ids: bool) -> String {
        self.overlay.render(with_ids)
    }

    pub fn render_passive(&self) -> OverlayFragment {
        self.overlay.render_passive()
    }

    /// Add a path drawn now.
    pub fn add<K: KeyValueStore + ?Sized>(&mut self, kv: &mut K, path: &str) -> ScribbleId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.add_at(kv, path, millis)
    }

    /// Add a path with an id derived from `millis`, bumped until unique.
    pub fn add_at<K: KeyValueStore + ?Sized>(&mut self, kv: &mut K, path: &str, millis: u64) -> ScribbleId {
        let mut stamp = millis;
        let mut id = to_base36(stamp);
        while self.overlay.contains(&id) {
            stamp += 1;
            id = to_base36(stamp);
        }
        self.overlay.insert(id.clone(), path.to_string());
        self.save(kv);
        id
    }

    /// Remove a scribble. Returns false when the id is unknown.
    pub fn delete<K: KeyValueStore + ?Sized>(&mut self, kv: &mut K, id: &str) -> bool {
        if self.overlay.remove(id).is_none() {
            return false;
        }
        self.save(kv);
        true
    }

    pub fn last_save_error(&self) -> Option<&FlowscoreError> {
        self.last_save_error.as_ref()
    }

    pub fn take_save_error(&mut self) -> Option<FlowscoreError> {
        self.last_save_error.take()
    }

    fn save<K: KeyValueStore + ?Sized>(&mut self, kv: &mut K) {
        let result = encode_overlay(&self.overlay).and_then(|payload| kv.set(&self.score_id, payload));
        match result {
            Ok(()) => self.last_save_error = None,
            Err(e) => {
                log::warn!("Failed to save annotations for {}: {e}", self.score_id);
                self.last_save_error = Some(e);
            }
        }
    }
}

pub fn encode_overlay(overlay: &AnnotationOverlay) -> Result<Vec<u8>> {
    compress_json(&serde_json::to_string(overlay)?)
}

pub fn decode_overlay(payload: &[u8]) -> Result<AnnotationOverlay> {
    let json = decompress_json(payload)?;
    let overlay: Option<AnnotationOverlay> = serde_json::from_str(&json)?;
    Ok(overlay.unwrap_or_default())
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
