// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error taxonomy shared by the document, track and session layers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, editing or saving a live set
#[derive(Debug, Error)]
pub enum EditError {
    /// File could not be read or written
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Not a gzip stream, or not a well-formed XML document
    #[error("not a valid live set: {0}")]
    Format(String),

    /// Well-formed document missing a required part
    #[error("unexpected live set structure: {0}")]
    Structure(String),

    /// Document and track index no longer agree
    #[error("track index is out of sync with the document: {0}")]
    Desync(String),

    /// Operation requires a loaded live set
    #[error("no Live Set loaded")]
    NotLoaded,

    /// A save is still running
    #[error("a save is already in progress")]
    SaveInProgress,

    /// Background save ended without reporting a result
    #[error("save did not complete: {0}")]
    SaveAborted(String),
}

impl EditError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EditError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a format error from any displayable cause
    pub fn format(cause: impl std::fmt::Display) -> Self {
        EditError::Format(cause.to_string())
    }
}

/// Result alias for live set operations
pub type Result<T> = std::result::Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = EditError::io(
            "/tmp/missing.als",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/missing.als"));
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_format_error_message() {
        let err = EditError::format("invalid gzip header");
        assert_eq!(err.to_string(), "not a valid live set: invalid gzip header");
    }
}
