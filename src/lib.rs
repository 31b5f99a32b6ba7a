// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! liveprune - prune tracks from Ableton Live sets.
//!
//! A live set (`.als`) is gzip-compressed XML. This crate loads one,
//! indexes its tracks into a group hierarchy, deletes a selection of
//! tracks (asking before taking a group's contents with it) and writes
//! the result back in the background.

pub mod config;
pub mod document;
pub mod error;
pub mod session;
pub mod tracks;
pub mod ui;

pub use config::EditorConfig;
pub use document::{Document, Element};
pub use error::{EditError, Result};
pub use session::{DeleteOutcome, Notice, Session};
pub use tracks::{TrackId, TrackIndex, TrackKind, TrackRecord};
