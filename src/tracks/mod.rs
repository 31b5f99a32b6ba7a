// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Track hierarchy derived from a live set document.
//!
//! This module provides:
//! - The track index (id -> name, kind, parent, children)
//! - Two-pass construction from the `Tracks` section
//! - Cascade resolution of a selection into ids to delete
//! - Mutation applied to document and index together
//! - A widget-free render tree for display

pub mod apply;
pub mod builder;
pub mod cascade;
pub mod render;

pub use apply::apply;
pub use builder::{build, IndexBuilder};
pub use cascade::{pending_confirmations, resolve, Cascade, Confirm};
pub use render::{outline, render_tree, RenderNode};

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::warn;

use crate::error::{EditError, Result};

/// Track identifier, equal to the element's `Id` attribute
pub type TrackId = String;

/// Parent value meaning "top level"
pub const TOP_LEVEL: &str = "-1";

/// Display name used when a track has none
pub const UNNAMED_TRACK: &str = "Unnamed Track";

/// Kind of track, derived from the element tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Group track (contains other tracks)
    Group,
    /// MIDI track
    Midi,
    /// Audio track (also any unrecognised tag)
    Audio,
}

impl TrackKind {
    /// Map an element tag to a kind
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "GroupTrack" => TrackKind::Group,
            "MidiTrack" => TrackKind::Midi,
            _ => TrackKind::Audio,
        }
    }

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Group => "Group",
            TrackKind::Midi => "MIDI",
            TrackKind::Audio => "Audio",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One track in the index
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    id: TrackId,
    name: String,
    kind: TrackKind,
    parent_id: TrackId,
    children: Vec<TrackId>,
}

impl TrackRecord {
    /// Create a top-level record with no children
    pub fn new(id: impl Into<TrackId>, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            parent_id: TOP_LEVEL.to_string(),
            children: Vec::new(),
        }
    }

    /// Set the declared parent
    pub fn with_parent(mut self, parent_id: impl Into<TrackId>) -> Self {
        self.parent_id = parent_id.into();
        self
    }

    /// Track identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Track kind
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Declared parent, `TOP_LEVEL` if none
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Linked children in document order
    pub fn children(&self) -> &[TrackId] {
        &self.children
    }

    /// Check if this is a group track
    pub fn is_group(&self) -> bool {
        self.kind == TrackKind::Group
    }

    /// Check if the declared parent is the top-level sentinel
    pub fn is_top_level(&self) -> bool {
        self.parent_id == TOP_LEVEL
    }

    /// "name (kind)" label
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

/// Track records keyed by id, remembering document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackIndex {
    records: HashMap<TrackId, TrackRecord>,
    order: Vec<TrackId>,
}

impl TrackIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record.
    ///
    /// A record with an existing id replaces the old one but keeps its
    /// position in document order. Returns the replaced record.
    pub fn insert(&mut self, record: TrackRecord) -> Option<TrackRecord> {
        let id = record.id.clone();
        let previous = self.records.insert(id.clone(), record);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Get a record
    pub fn get(&self, id: &str) -> Option<&TrackRecord> {
        self.records.get(id)
    }

    /// Check if a record exists
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids in document order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Records in document order
    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Existing parent record, if any
    pub fn parent_of(&self, id: &str) -> Option<&TrackRecord> {
        let record = self.records.get(id)?;
        if record.is_top_level() {
            return None;
        }
        self.records.get(&record.parent_id)
    }

    /// Records shown at the top of the hierarchy, in document order.
    ///
    /// Includes orphans whose declared parent does not exist.
    pub fn top_level(&self) -> Vec<&TrackRecord> {
        self.records()
            .filter(|record| record.is_top_level() || !self.contains(&record.parent_id))
            .collect()
    }

    /// Tracks removed along with group `id`, depth first, excluding `id`.
    ///
    /// Every child is included, but only children that are groups are
    /// expanded further. Tracks that name a non-group as their parent are
    /// left behind as orphans.
    pub fn descendants(&self, id: &str) -> Vec<TrackId> {
        let mut found = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let Some(record) = self.records.get(current) else {
                continue;
            };
            if current != id {
                found.push(record.id.clone());
                if !record.is_group() {
                    continue;
                }
            }
            for child in record.children.iter().rev() {
                if visited.insert(child.as_str()) {
                    stack.push(child.as_str());
                } else {
                    warn!(track = %child, parent = %current, "track hierarchy contains a cycle");
                }
            }
        }
        found
    }

    /// Append `id` to its declared parent's children.
    ///
    /// Returns false when the record is top level or its parent is missing.
    pub(crate) fn link_to_parent(&mut self, id: &str) -> bool {
        let Some(parent_id) = self
            .records
            .get(id)
            .filter(|record| !record.is_top_level())
            .map(|record| record.parent_id.clone())
        else {
            return false;
        };
        match self.records.get_mut(&parent_id) {
            Some(parent) => {
                parent.children.push(id.to_string());
                true
            }
            None => false,
        }
    }

    /// Remove a record, unlinking it from its parent first
    pub fn remove(&mut self, id: &str) -> Option<TrackRecord> {
        let record = self.records.remove(id)?;
        if !record.is_top_level() {
            if let Some(parent) = self.records.get_mut(&record.parent_id) {
                parent.children.retain(|child| child != id);
            }
        }
        self.order.retain(|existing| existing != id);
        Some(record)
    }

    /// Verify parent/child links agree in both directions
    pub fn check_consistency(&self) -> Result<()> {
        if self.order.len() != self.records.len() {
            return Err(EditError::Desync(format!(
                "{} ordered ids for {} records",
                self.order.len(),
                self.records.len()
            )));
        }

        for record in self.records() {
            for child in &record.children {
                match self.records.get(child) {
                    Some(linked) if linked.parent_id == record.id => {}
                    Some(_) => {
                        return Err(EditError::Desync(format!(
                            "track {} lists {} as a child but it declares another parent",
                            record.id, child
                        )))
                    }
                    None => {
                        return Err(EditError::Desync(format!(
                            "track {} lists missing child {}",
                            record.id, child
                        )))
                    }
                }
            }

            if let Some(parent) = self.parent_of(&record.id) {
                if !parent.children.contains(&record.id) {
                    return Err(EditError::Desync(format!(
                        "track {} is not listed by its parent {}",
                        record.id, parent.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn linked(records: Vec<TrackRecord>) -> TrackIndex {
        let mut index = TrackIndex::new();
        for record in records {
            index.insert(record);
        }
        let ids: Vec<TrackId> = index.ids().map(str::to_string).collect();
        for id in ids {
            index.link_to_parent(&id);
        }
        index
    }

    fn nested() -> TrackIndex {
        linked(vec![
            TrackRecord::new("G", "Drums", TrackKind::Group),
            TrackRecord::new("A", "Kick", TrackKind::Audio).with_parent("G"),
            TrackRecord::new("B", "Perc", TrackKind::Group).with_parent("G"),
            TrackRecord::new("C", "Shaker", TrackKind::Audio).with_parent("B"),
            TrackRecord::new("T", "Vox", TrackKind::Audio),
        ])
    }

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(TrackKind::from_tag("GroupTrack"), TrackKind::Group);
        assert_eq!(TrackKind::from_tag("MidiTrack"), TrackKind::Midi);
        assert_eq!(TrackKind::from_tag("AudioTrack"), TrackKind::Audio);
        assert_eq!(TrackKind::from_tag("ReturnTrack"), TrackKind::Audio);
        assert_eq!(TrackKind::from_tag("grouptrack"), TrackKind::Audio);
    }

    #[test]
    fn test_record_label() {
        let record = TrackRecord::new("1", "Bass", TrackKind::Midi);
        assert_eq!(record.label(), "Bass (MIDI)");
        assert!(record.is_top_level());
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut index = TrackIndex::new();
        index.insert(TrackRecord::new("1", "One", TrackKind::Audio));
        index.insert(TrackRecord::new("2", "Two", TrackKind::Audio));
        let replaced = index.insert(TrackRecord::new("1", "Uno", TrackKind::Midi));

        assert_eq!(replaced.map(|r| r.name), Some("One".to_string()));
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(index.get("1").unwrap().name(), "Uno");
    }

    #[test]
    fn test_descendants_follow_groups() {
        let index = nested();
        assert_eq!(index.descendants("G"), vec!["A", "B", "C"]);
        assert!(index.descendants("T").is_empty());
    }

    #[test]
    fn test_descendants_stop_at_leaf_tracks() {
        let index = linked(vec![
            TrackRecord::new("G", "Drums", TrackKind::Group),
            TrackRecord::new("A", "Kick", TrackKind::Audio).with_parent("G"),
            TrackRecord::new("X", "Layer", TrackKind::Audio).with_parent("A"),
        ]);
        assert_eq!(index.get("A").unwrap().children(), &["X".to_string()]);
        assert_eq!(index.descendants("G"), vec!["A"]);
    }

    #[test]
    fn test_descendants_survive_cycle() {
        let index = linked(vec![
            TrackRecord::new("A", "A", TrackKind::Group).with_parent("B"),
            TrackRecord::new("B", "B", TrackKind::Group).with_parent("A"),
        ]);
        assert_eq!(index.descendants("A"), vec!["B"]);
        assert!(index.top_level().is_empty());
    }

    #[test]
    fn test_descendants_of_deep_chain() {
        let mut records = vec![TrackRecord::new("0", "Group 0", TrackKind::Group)];
        for depth in 1..50_000 {
            records.push(
                TrackRecord::new(depth.to_string(), format!("Group {}", depth), TrackKind::Group)
                    .with_parent((depth - 1).to_string()),
            );
        }
        let index = linked(records);
        assert_eq!(index.descendants("0").len(), 49_999);
    }

    #[test]
    fn test_top_level_includes_orphans() {
        let index = linked(vec![
            TrackRecord::new("1", "One", TrackKind::Audio),
            TrackRecord::new("2", "Lost", TrackKind::Audio).with_parent("99"),
        ]);
        let roots: Vec<&str> = index.top_level().iter().map(|r| r.id()).collect();
        assert_eq!(roots, vec!["1", "2"]);
        assert_eq!(index.get("2").unwrap().parent_id(), "99");
    }

    #[test]
    fn test_remove_unlinks_from_parent() {
        let mut index = nested();
        index.remove("A").unwrap();
        assert_eq!(index.get("G").unwrap().children(), &["B".to_string()]);
        assert!(index.check_consistency().is_ok());
        assert!(index.remove("A").is_none());
    }

    #[test]
    fn test_consistency_detects_missing_child() {
        let mut index = nested();
        index.records.remove("C");
        index.order.retain(|id| id != "C");
        assert!(matches!(
            index.check_consistency(),
            Err(EditError::Desync(_))
        ));
    }
}
