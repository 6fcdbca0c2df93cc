//! Error type shared by the analysis, storage and binding layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowscoreError {
    /// An image could not be retrieved (transport failure or non-2xx status).
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// An image was retrieved but could not be decoded.
    #[error("Failed to decode image #{index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt payload: {0}")]
    Codec(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FlowscoreError {
    /// True for failures that come from retrieving or decoding images.
    pub fn is_fetch(&self) -> bool {
        matches!(self, FlowscoreError::Fetch { .. } | FlowscoreError::Decode { .. })
    }

    /// True for failures of the persisted key-value layer or its payloads.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            FlowscoreError::Storage(_)
                | FlowscoreError::Codec(_)
                | FlowscoreError::Json(_)
                | FlowscoreError::Zip(_)
                | FlowscoreError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FlowscoreError>;
