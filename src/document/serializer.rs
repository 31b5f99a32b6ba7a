// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! gzip container for live set documents.
//!
//! Loading reads the whole file before decoding so I/O failures and
//! format failures stay distinguishable. Saving serializes and compresses
//! in memory, writes a temp file next to the target and renames it into
//! place, so a failed save never leaves a truncated live set behind.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::Document;
use crate::error::{EditError, Result};

/// Default gzip level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read and parse a compressed live set
pub fn load<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| EditError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read live set");

    let document = decode(&bytes)?;
    info!(path = %path.display(), "loaded live set");
    Ok(document)
}

/// Decompress and parse an in-memory live set
pub fn decode(bytes: &[u8]) -> Result<Document> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Err(EditError::format("missing gzip header"));
    }

    let mut xml = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut xml)
        .map_err(|e| EditError::Format(format!("gzip stream is corrupt: {}", e)))?;

    let text = String::from_utf8(xml)
        .map_err(|e| EditError::Format(format!("document is not UTF-8: {}", e)))?;
    Document::parse(&text)
}

/// Serialize and compress a document in memory
pub fn encode(document: &Document, level: u32) -> Result<Vec<u8>> {
    let xml = document.to_xml()?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(&xml).map_err(EditError::format)?;
    encoder.finish().map_err(EditError::format)
}

/// Write a document to `path`, replacing any existing file atomically.
///
/// Returns the number of compressed bytes written.
pub fn save<P: AsRef<Path>>(document: &Document, path: P, level: u32) -> Result<u64> {
    let path = path.as_ref();
    let bytes = encode(document, level)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| EditError::io(&dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(&bytes)
        .map_err(|e| EditError::io(&tmp_path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| EditError::io(&tmp_path, e))?;

    // Temp files are owner-only; an overwritten set keeps its mode
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| EditError::io(&tmp_path, e))?;
    }
    tmp.persist(path).map_err(|e| EditError::io(path, e.error))?;

    info!(path = %path.display(), bytes = bytes.len(), "saved live set");
    Ok(bytes.len() as u64)
}

/// Outcome of a background save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    /// File written
    Saved {
        /// Target path
        path: PathBuf,
        /// Compressed size
        bytes: u64,
    },
    /// Save failed; the target was left untouched
    Failed {
        /// Target path
        path: PathBuf,
        /// Human-readable cause
        reason: String,
    },
}

impl SaveEvent {
    /// Check if the save succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, SaveEvent::Saved { .. })
    }

    /// Target path of the save
    pub fn path(&self) -> &Path {
        match self {
            SaveEvent::Saved { path, .. } | SaveEvent::Failed { path, .. } => path,
        }
    }
}

/// Handle to a save running on the blocking pool
#[derive(Debug)]
pub struct PendingSave {
    path: PathBuf,
    receiver: oneshot::Receiver<SaveEvent>,
}

impl PendingSave {
    /// Target path of the save
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check for completion without blocking
    pub fn try_complete(&mut self) -> Option<SaveEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(self.aborted()),
        }
    }

    /// Wait for completion
    pub async fn wait(self) -> SaveEvent {
        let path = self.path;
        match self.receiver.await {
            Ok(event) => event,
            Err(_) => SaveEvent::Failed {
                path,
                reason: EditError::SaveAborted("save task ended unexpectedly".into()).to_string(),
            },
        }
    }

    fn aborted(&self) -> SaveEvent {
        SaveEvent::Failed {
            path: self.path.clone(),
            reason: EditError::SaveAborted("save task ended unexpectedly".into()).to_string(),
        }
    }
}

/// Save `document` on tokio's blocking pool.
///
/// The document is moved into the task, so callers pass a snapshot and
/// stay free to keep editing their own copy.
pub fn spawn_save(handle: &Handle, document: Document, path: PathBuf, level: u32) -> PendingSave {
    let (sender, receiver) = oneshot::channel();
    let target = path.clone();

    handle.spawn_blocking(move || {
        let event = match save(&document, &target, level) {
            Ok(bytes) => SaveEvent::Saved {
                path: target,
                bytes,
            },
            Err(e) => {
                warn!(path = %target.display(), error = %e, "save failed");
                SaveEvent::Failed {
                    path: target,
                    reason: e.to_string(),
                }
            }
        };
        // Receiver gone means nobody is waiting any more
        let _ = sender.send(event);
    });

    PendingSave { path, receiver }
}
