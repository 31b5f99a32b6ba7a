// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Removes tracks from the document and the index together.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{TrackId, TrackIndex};
use crate::document::{Document, ID_ATTR};
use crate::error::{EditError, Result};

/// Delete `ids` from both the document's `Tracks` section and the index.
///
/// Ids already absent from both are skipped, so replaying the same ids
/// is harmless. Every id is checked before anything is touched: an id
/// present in only one of the two fails with [`EditError::Desync`] and
/// leaves both unchanged.
///
/// Returns the number of tracks removed.
pub fn apply(document: &mut Document, index: &mut TrackIndex, ids: &[TrackId]) -> Result<usize> {
    let in_document: HashSet<String> = document.track_ids()?.into_iter().collect();

    let mut targets: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match (in_document.contains(id), index.contains(id)) {
            (true, true) => targets.push(id),
            (false, false) => debug!(track = %id, "already removed"),
            (true, false) => {
                return Err(EditError::Desync(format!(
                    "track {} is in the document but not in the index",
                    id
                )))
            }
            (false, true) => {
                return Err(EditError::Desync(format!(
                    "track {} is in the index but not in the document",
                    id
                )))
            }
        }
    }

    if targets.is_empty() {
        return Ok(0);
    }

    let doomed: HashSet<&str> = targets.iter().copied().collect();
    let elements_removed = document
        .tracks_mut()?
        .remove_elements(|track| track.attr(ID_ATTR).map_or(false, |id| doomed.contains(id)));

    for id in &targets {
        index.remove(id);
    }

    info!(
        tracks = targets.len(),
        elements = elements_removed,
        remaining = index.len(),
        "deleted tracks"
    );
    Ok(targets.len())
}
