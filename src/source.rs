//! Image sources: where the encoded staff images of a score come from.
//!
//! Fetches run concurrently; the first failure aborts the whole set so an
//! analysis never sees a partial strip.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::try_join_all;

use crate::error::{FlowscoreError, Result};

pub trait ImageSource {
    /// Retrieve the encoded bytes of one image.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Fetch every url, in order. Any failure fails the whole set.
pub async fn fetch_all<S: ImageSource + ?Sized>(source: &S, urls: &[String]) -> Result<Vec<Vec<u8>>> {
    try_join_all(urls.iter().map(|url| source.fetch(url))).await
}

// ═══════════════════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ImageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| FlowscoreError::Fetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP error, status {}", status.as_u16())));
        }
        let body = response.bytes().await.map_err(|e| fetch_error(e.to_string()))?;
        Ok(body.to_vec())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Local files
// ═══════════════════════════════════════════════════════════════════════

/// Reads `file://` urls or plain paths, relative paths resolved against `root`.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for FileSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tokio::fs::read(self.resolve(url))
            .await
            .map_err(|e| FlowscoreError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// In memory
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    images: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(url.into(), bytes);
    }
}

impl ImageSource for MemorySource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.images.get(url).cloned().ok_or_else(|| FlowscoreError::Fetch {
            url: url.to_string(),
            reason: "HTTP error, status 404".to_string(),
        })
    }
}
