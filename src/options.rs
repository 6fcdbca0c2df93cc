//! Two-tier user options: a global record shared by every score and a
//! per-score record that overrides it.
//!
//! Loading applies the global record, then the per-score record, key by key.
//! Saving routes each field back to one of the two records: names listed in
//! [`GLOBAL_KEYS`] go to the global record, everything else to the score.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::ZoomScale;
use crate::store::KeyValueStore;

pub const GLOBAL_OPTIONS_KEY: &str = "options";

/// Fields persisted in the global record.
pub const GLOBAL_KEYS: &[&str] = &["keep_awake"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Zoom applied to the full-score view
    pub scale: ZoomScale,
    /// Keep the display awake while a score is shown
    pub keep_awake: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scale: ZoomScale::default(),
            keep_awake: true,
        }
    }
}

/// Locates the two option records of one score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsStore {
    score_key: String,
}

impl OptionsStore {
    pub fn new(score_id: &str) -> Self {
        Self {
            score_key: format!("options_{score_id}"),
        }
    }

    pub fn score_key(&self) -> &str {
        &self.score_key
    }

    /// Read both records. Unreadable or malformed records count as absent,
    /// and a field whose value does not fit keeps the earlier value.
    pub fn load<K: KeyValueStore + ?Sized>(&self, kv: &K) -> Options {
        let mut accepted = Map::new();
        for key in [GLOBAL_OPTIONS_KEY, self.score_key.as_str()] {
            match read_record(kv, key) {
                Ok(Some(record)) => {
                    for (name, value) in record {
                        apply_field(&mut accepted, key, name, value);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Ignoring options record '{key}': {e}"),
            }
        }
        serde_json::from_value(Value::Object(accepted)).unwrap_or_else(|e| {
            log::warn!("Falling back to default options: {e}");
            Options::default()
        })
    }

    /// Write every field to its record.
    pub fn save<K: KeyValueStore + ?Sized>(&self, kv: &mut K, options: &Options) -> Result<()> {
        let Value::Object(fields) = serde_json::to_value(options)? else {
            return Ok(());
        };
        let (global, score): (Map<String, Value>, Map<String, Value>) = fields
            .into_iter()
            .partition(|(name, _)| GLOBAL_KEYS.contains(&name.as_str()));

        kv.set(GLOBAL_OPTIONS_KEY, serde_json::to_vec(&global)?)?;
        kv.set(&self.score_key, serde_json::to_vec(&score)?)?;
        Ok(())
    }
}

/// Merge one field into `accepted` only if the result still deserializes.
fn apply_field(accepted: &mut Map<String, Value>, record: &str, name: String, value: Value) {
    let mut trial = accepted.clone();
    trial.insert(name.clone(), value);
    match serde_json::from_value::<Options>(Value::Object(trial.clone())) {
        Ok(_) => *accepted = trial,
        Err(e) => log::warn!("Ignoring option '{name}' in record '{record}': {e}"),
    }
}

fn read_record<K: KeyValueStore + ?Sized>(kv: &K, key: &str) -> Result<Option<Map<String, Value>>> {
    let Some(bytes) = kv.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_slice(&bytes)? {
        Value::Object(record) => Ok(Some(record)),
        _ => Ok(None),
    }
}
