// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editing session: the loaded document, its track index, and the
//! operations a front end calls (load, delete selection, save).

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::EditorConfig;
use crate::document::{serializer, Document, PendingSave, SaveEvent};
use crate::error::{EditError, Result};
use crate::tracks::{self, render_tree, Confirm, IndexBuilder, RenderNode, TrackId, TrackIndex};

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The selection was empty
    NothingSelected,
    /// Every selected item was declined; nothing changed
    Declined,
    /// This many tracks were removed
    Removed(usize),
}

impl DeleteOutcome {
    /// Message to show the user, if any
    pub fn notice(&self) -> Option<Notice> {
        match self {
            DeleteOutcome::NothingSelected => Some(Notice::Info("No tracks selected".to_string())),
            DeleteOutcome::Declined => None,
            DeleteOutcome::Removed(count) => Some(Notice::Success(format!(
                "{} track(s) deleted successfully",
                count
            ))),
        }
    }
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Neutral information
    Info(String),
    /// An operation succeeded
    Success(String),
    /// An operation failed
    Error(String),
}

impl Notice {
    /// Notice for a failed operation
    pub fn failure(action: &str, error: &EditError) -> Self {
        Notice::Error(format!("{}: {}", action, error))
    }

    /// Message text
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Success(message) | Notice::Error(message) => message,
        }
    }

    /// Check if this reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl From<&SaveEvent> for Notice {
    fn from(event: &SaveEvent) -> Self {
        match event {
            SaveEvent::Saved { path, .. } => Notice::Success(format!(
                "Live Set saved successfully to: {}",
                path.display()
            )),
            SaveEvent::Failed { reason, .. } => Notice::Error(format!(
                "An error occurred while saving the Live Set: {}",
                reason
            )),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A loaded live set
#[derive(Debug)]
struct LiveSet {
    path: PathBuf,
    document: Document,
    index: TrackIndex,
    /// Bumped on every successful mutation
    revision: u64,
    /// Revision last written to disk
    saved_revision: u64,
}

/// Save in flight, tagged with what it snapshotted
#[derive(Debug)]
struct InFlightSave {
    pending: PendingSave,
    generation: u64,
    revision: u64,
}

/// Editing session owned by the front end
#[derive(Debug)]
pub struct Session {
    config: EditorConfig,
    builder: IndexBuilder,
    loaded: Option<LiveSet>,
    /// Bumped on every successful load
    generation: u64,
    in_flight: Option<InFlightSave>,
}

impl Session {
    /// Create an empty session
    pub fn new(config: EditorConfig) -> Self {
        let builder = IndexBuilder::new().with_unnamed_label(config.unnamed_track.clone());
        Self {
            config,
            builder,
            loaded: None,
            generation: 0,
            in_flight: None,
        }
    }

    /// Active settings
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Check if a live set is loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Path the current live set was loaded from or last saved to
    pub fn path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|set| set.path.as_path())
    }

    /// Current track index
    pub fn index(&self) -> Option<&TrackIndex> {
        self.loaded.as_ref().map(|set| &set.index)
    }

    /// Current document
    pub fn document(&self) -> Option<&Document> {
        self.loaded.as_ref().map(|set| &set.document)
    }

    /// Check for changes not yet written to disk
    pub fn is_modified(&self) -> bool {
        self.loaded
            .as_ref()
            .map(|set| set.revision != set.saved_revision)
            .unwrap_or(false)
    }

    /// Load a live set, replacing the current one.
    ///
    /// Nothing changes if loading or indexing fails.
    pub fn load_document<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<RenderNode>> {
        let path = path.as_ref();
        let document = serializer::load(path)?;
        let index = self.builder.build(&document)?;
        info!(path = %path.display(), tracks = index.len(), "opened live set");

        self.generation += 1;
        self.loaded = Some(LiveSet {
            path: path.to_path_buf(),
            document,
            index,
            revision: 0,
            saved_revision: 0,
        });
        Ok(self.render())
    }

    /// Render tree of the current index (empty when nothing is loaded)
    pub fn render(&self) -> Vec<RenderNode> {
        self.index().map(render_tree).unwrap_or_default()
    }

    /// Resolve a selection and delete the result
    pub fn delete_selection<C>(&mut self, selection: &[TrackId], confirm: &mut C) -> Result<DeleteOutcome>
    where
        C: Confirm + ?Sized,
    {
        let set = self.loaded.as_ref().ok_or(EditError::NotLoaded)?;
        if selection.is_empty() {
            return Ok(DeleteOutcome::NothingSelected);
        }
        let ids = tracks::resolve(&set.index, selection, confirm);
        self.delete_resolved(&ids)
    }

    /// Delete already-resolved ids (see [`tracks::Cascade`])
    pub fn delete_resolved(&mut self, ids: &[TrackId]) -> Result<DeleteOutcome> {
        let set = self.loaded.as_mut().ok_or(EditError::NotLoaded)?;
        if ids.is_empty() {
            debug!("nothing to delete");
            return Ok(DeleteOutcome::Declined);
        }

        let removed = tracks::apply(&mut set.document, &mut set.index, ids)?;
        if removed > 0 {
            set.revision += 1;
        }
        Ok(DeleteOutcome::Removed(removed))
    }

    /// Start saving a snapshot of the document to `path` in the background.
    ///
    /// Editing may continue while the save runs. Only one save may be in
    /// flight; poll it with [`Session::poll_save`].
    pub fn save_document<P: AsRef<Path>>(&mut self, handle: &Handle, path: P) -> Result<()> {
        let set = self.loaded.as_ref().ok_or(EditError::NotLoaded)?;
        if self.in_flight.is_some() {
            return Err(EditError::SaveInProgress);
        }

        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "saving live set");
        let pending = serializer::spawn_save(
            handle,
            set.document.clone(),
            path,
            self.config.compression_level,
        );
        self.in_flight = Some(InFlightSave {
            pending,
            generation: self.generation,
            revision: set.revision,
        });
        Ok(())
    }

    /// Check if a save is running
    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Collect the result of the running save, if it finished
    pub fn poll_save(&mut self) -> Option<SaveEvent> {
        let in_flight = self.in_flight.as_mut()?;
        let event = in_flight.pending.try_complete()?;
        let finished = self.in_flight.take()?;
        self.record_save(&event, finished.generation, finished.revision);
        Some(event)
    }

    /// Wait for the running save to finish
    pub async fn wait_save(&mut self) -> Option<SaveEvent> {
        let finished = self.in_flight.take()?;
        let event = finished.pending.wait().await;
        self.record_save(&event, finished.generation, finished.revision);
        Some(event)
    }

    fn record_save(&mut self, event: &SaveEvent, generation: u64, revision: u64) {
        if !event.is_success() || generation != self.generation {
            return;
        }
        if let Some(set) = self.loaded.as_mut() {
            set.path = event.path().to_path_buf();
            set.saved_revision = revision;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use crate::tracks::TrackRecord;

    fn write_set(dir: &Path) -> PathBuf {
        let document = Document::parse(
            r#"<Ableton><LiveSet><Tracks>
    <AudioTrack Id="T1"><Name><EffectiveName Value="Vox"/></Name><TrackGroupId Value="-1"/></AudioTrack>
    <GroupTrack Id="G1"><Name><EffectiveName Value="Synths"/></Name><TrackGroupId Value="-1"/></GroupTrack>
    <MidiTrack Id="T2"><Name><EffectiveName Value="Pad"/></Name><TrackGroupId Value="G1"/></MidiTrack>
</Tracks></LiveSet></Ableton>"#,
        )
        .unwrap();
        let path = dir.join("song.als");
        serializer::save(&document, &path, 6).unwrap();
        path
    }

    fn ids(list: &[&str]) -> Vec<TrackId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_renders_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        let tree = session.load_document(write_set(dir.path())).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].children[0].label(), "Pad (MIDI)");
        assert!(!session.is_modified());
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        let good = write_set(dir.path());
        session.load_document(&good).unwrap();

        let bad = dir.path().join("bad.als");
        std::fs::write(&bad, b"not gzip").unwrap();
        assert!(matches!(session.load_document(&bad), Err(EditError::Format(_))));

        let missing_tracks = dir.path().join("empty.als");
        serializer::save(&Document::new(Element::new("Ableton")), &missing_tracks, 6).unwrap();
        assert!(matches!(
            session.load_document(&missing_tracks),
            Err(EditError::Structure(_))
        ));

        assert_eq!(session.path(), Some(good.as_path()));
        assert_eq!(session.index().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_requires_loaded_set() {
        let mut session = Session::default();
        let err = session
            .delete_selection(&ids(&["T1"]), &mut |_: &TrackRecord| true)
            .unwrap_err();
        assert!(matches!(err, EditError::NotLoaded));
    }

    #[test]
    fn test_delete_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        session.load_document(write_set(dir.path())).unwrap();

        let outcome = session.delete_selection(&[], &mut |_: &TrackRecord| true).unwrap();
        assert_eq!(outcome, DeleteOutcome::NothingSelected);

        let outcome = session
            .delete_selection(&ids(&["G1"]), &mut |_: &TrackRecord| false)
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(outcome.notice().is_none());
        assert!(!session.is_modified());

        let outcome = session
            .delete_selection(&ids(&["G1"]), &mut |_: &TrackRecord| true)
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Removed(2));
        assert_eq!(
            outcome.notice().unwrap().message(),
            "2 track(s) deleted successfully"
        );
        assert!(session.is_modified());
        assert_eq!(session.document().unwrap().track_ids().unwrap(), vec!["T1"]);
    }

    #[test]
    fn test_save_without_document() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut session = Session::default();
        let err = session
            .save_document(runtime.handle(), "/tmp/never.als")
            .unwrap_err();
        assert!(matches!(err, EditError::NotLoaded));
    }

    #[tokio::test]
    async fn test_save_roundtrip_and_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        session.load_document(write_set(dir.path())).unwrap();
        session
            .delete_selection(&ids(&["T1"]), &mut |_: &TrackRecord| true)
            .unwrap();

        let target = dir.path().join("edited.als");
        session.save_document(&Handle::current(), &target).unwrap();
        assert!(session.is_saving());
        assert!(matches!(
            session.save_document(&Handle::current(), &target),
            Err(EditError::SaveInProgress)
        ));

        let event = session.wait_save().await.unwrap();
        assert!(event.is_success());
        assert_eq!(Notice::from(&event).message(), format!(
            "Live Set saved successfully to: {}",
            target.display()
        ));
        assert!(!session.is_saving());
        assert!(!session.is_modified());
        assert_eq!(session.path(), Some(target.as_path()));

        let reloaded = serializer::load(&target).unwrap();
        assert_eq!(reloaded.track_ids().unwrap(), vec!["G1", "T2"]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        let original = write_set(dir.path());
        session.load_document(&original).unwrap();
        session
            .delete_selection(&ids(&["T1"]), &mut |_: &TrackRecord| true)
            .unwrap();

        let target = dir.path().join("missing").join("x.als");
        session.save_document(&Handle::current(), &target).unwrap();
        let event = session.wait_save().await.unwrap();

        assert!(Notice::from(&event).is_error());
        assert!(session.is_modified());
        assert_eq!(session.path(), Some(original.as_path()));
        assert_eq!(session.index().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_of_previous_set_leaves_new_set_alone() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_set(dir.path());
        let second = dir.path().join("second.als");
        std::fs::copy(&first, &second).unwrap();

        let mut session = Session::default();
        session.load_document(&first).unwrap();
        session
            .delete_selection(&ids(&["T1"]), &mut |_: &TrackRecord| true)
            .unwrap();
        let target = dir.path().join("edited.als");
        session.save_document(&Handle::current(), &target).unwrap();

        session.load_document(&second).unwrap();
        session
            .delete_selection(&ids(&["T1"]), &mut |_: &TrackRecord| true)
            .unwrap();
        assert!(session.is_modified());

        let event = session.wait_save().await.unwrap();
        assert!(event.is_success());
        assert!(target.exists());
        assert_eq!(session.path(), Some(second.as_path()));
        assert!(session.is_modified());
    }

    #[test]
    fn test_poll_save_without_save() {
        let mut session = Session::default();
        assert!(session.poll_save().is_none());
    }
}
