// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Two-pass construction of the track index.
//!
//! Pass 1 creates one record per direct child of `Tracks`; pass 2 links
//! each record into its parent's children in document order.

use tracing::{debug, warn};

use super::{TrackId, TrackIndex, TrackKind, TrackRecord, TOP_LEVEL, UNNAMED_TRACK};
use crate::document::{Document, Element, ID_ATTR};
use crate::error::{EditError, Result};

/// Path from a track element to its display name
const NAME_PATH: [&str; 2] = ["Name", "EffectiveName"];

/// Child element holding the parent group id
const GROUP_ID_TAG: &str = "TrackGroupId";

/// Attribute holding the value of name/group elements
const VALUE_ATTR: &str = "Value";

/// Builds a [`TrackIndex`] from a document
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    unnamed_label: String,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            unnamed_label: UNNAMED_TRACK.to_string(),
        }
    }
}

impl IndexBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name used for tracks without one
    pub fn with_unnamed_label(mut self, label: impl Into<String>) -> Self {
        self.unnamed_label = label.into();
        self
    }

    /// Build the index
    pub fn build(&self, document: &Document) -> Result<TrackIndex> {
        let tracks = document.tracks()?;
        let mut index = TrackIndex::new();

        for (position, element) in tracks.elements().enumerate() {
            let record = self.record_from(position, element)?;
            if let Some(previous) = index.insert(record) {
                warn!(track = %previous.id(), "duplicate track id, later element wins");
            }
        }

        let ids: Vec<TrackId> = index.ids().map(str::to_string).collect();
        let mut orphans = 0;
        for id in &ids {
            let declared_parent = index
                .get(id)
                .map(|record| !record.is_top_level())
                .unwrap_or(false);
            if declared_parent && !index.link_to_parent(id) {
                orphans += 1;
                warn!(track = %id, "parent group not found, showing track at top level");
            }
        }

        index.check_consistency()?;
        debug!(tracks = index.len(), orphans, "built track index");
        Ok(index)
    }

    fn record_from(&self, position: usize, element: &Element) -> Result<TrackRecord> {
        let id = element.attr(ID_ATTR).ok_or_else(|| {
            EditError::Structure(format!(
                "track #{} <{}> has no {} attribute",
                position + 1,
                element.tag(),
                ID_ATTR
            ))
        })?;

        let name = element
            .find_path(&NAME_PATH)
            .and_then(|name| name.attr(VALUE_ATTR))
            .unwrap_or(self.unnamed_label.as_str());

        let parent = element
            .child(GROUP_ID_TAG)
            .and_then(|group| group.attr(VALUE_ATTR))
            .unwrap_or(TOP_LEVEL);

        Ok(TrackRecord::new(id, name, TrackKind::from_tag(element.tag())).with_parent(parent))
    }
}

/// Build a track index with default settings
pub fn build(document: &Document) -> Result<TrackIndex> {
    IndexBuilder::default().build(document)
}
