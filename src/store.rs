//! Key-value persistence used by the scribble and options stores, plus the
//! compressed payload codec.
//!
//! A compressed payload is a ZIP archive holding one deflated
//! `payload.json` entry.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{FlowscoreError, Result};

/// Byte-valued persistence keyed by string.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(name)
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FlowscoreError::Storage(format!("Failed to read '{key}': {e}"))),
        }
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .and_then(|_| std::fs::write(self.path_for(key), value))
            .map_err(|e| FlowscoreError::Storage(format!("Failed to write '{key}': {e}")))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Payload codec
// ═══════════════════════════════════════════════════════════════════════

const PAYLOAD_ENTRY: &str = "payload.json";

/// Deflate a JSON document into a single-entry archive.
pub fn compress_json(json: &str) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(PAYLOAD_ENTRY, options)?;
    writer.write_all(json.as_bytes())?;
    Ok(writer.finish()?.into_inner())
}

/// Largest decompressed payload accepted when reading.
pub const MAX_PAYLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Inverse of [`compress_json`].
pub fn decompress_json(data: &[u8]) -> Result<String> {
    decompress_json_limited(data, MAX_PAYLOAD_BYTES)
}

fn decompress_json_limited(data: &[u8], limit: u64) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let entry = archive
        .by_name(PAYLOAD_ENTRY)
        .map_err(|e| FlowscoreError::Codec(format!("missing {PAYLOAD_ENTRY}: {e}")))?;
    // One byte past the limit marks an oversized entry.
    let mut json = String::new();
    entry.take(limit + 1).read_to_string(&mut json)?;
    if json.len() as u64 > limit {
        return Err(FlowscoreError::Codec(format!(
            "{PAYLOAD_ENTRY} exceeds {limit} bytes"
        )));
    }
    Ok(json)
}
