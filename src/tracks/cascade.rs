// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Expands a selection into the full set of tracks to delete.
//!
//! Selected groups are only expanded after an explicit confirmation;
//! leaf tracks are taken as-is. [`Cascade`] runs step by step so a UI
//! can ask for confirmation over several frames, [`resolve`] runs it in
//! one call against a [`Confirm`] implementation.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::{TrackId, TrackIndex, TrackRecord};

/// Answers "delete this group and everything inside it?"
pub trait Confirm {
    /// Return true to delete the group with all its descendants
    fn confirm_group(&mut self, group: &TrackRecord) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&TrackRecord) -> bool,
{
    fn confirm_group(&mut self, group: &TrackRecord) -> bool {
        self(group)
    }
}

/// Incremental cascade over a selection
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    selection: Vec<TrackId>,
    cursor: usize,
    resolved: Vec<TrackId>,
    seen: HashSet<TrackId>,
}

impl Cascade {
    /// Start a cascade over the selected ids, in selection order
    pub fn new<I, S>(selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TrackId>,
    {
        Self {
            selection: selection.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Advance to the next group needing confirmation.
    ///
    /// Leaf tracks passed on the way are included. Returns `None` once the
    /// whole selection has been processed.
    pub fn next_group<'a>(&mut self, index: &'a TrackIndex) -> Option<&'a TrackRecord> {
        while let Some(id) = self.selection.get(self.cursor).cloned() {
            match index.get(&id) {
                None => {
                    warn!(track = %id, "selected track not in index, skipping");
                    self.cursor += 1;
                }
                Some(_) if self.seen.contains(&id) => {
                    // Covered by an earlier confirmed group, or selected twice
                    self.cursor += 1;
                }
                Some(record) if record.is_group() => return Some(record),
                Some(_) => {
                    self.include(id);
                    self.cursor += 1;
                }
            }
        }
        None
    }

    /// Answer the group returned by the last [`Cascade::next_group`]
    pub fn answer(&mut self, index: &TrackIndex, confirmed: bool) {
        let Some(id) = self.selection.get(self.cursor).cloned() else {
            return;
        };
        self.cursor += 1;

        if !confirmed {
            debug!(track = %id, "group deletion declined");
            return;
        }
        let descendants = index.descendants(&id);
        self.include(id);
        for descendant in descendants {
            self.include(descendant);
        }
    }

    /// Finish the cascade. Groups never answered count as declined.
    pub fn finish(mut self, index: &TrackIndex) -> Vec<TrackId> {
        while self.next_group(index).is_some() {
            self.answer(index, false);
        }
        self.resolved
    }

    fn include(&mut self, id: TrackId) {
        if self.seen.insert(id.clone()) {
            self.resolved.push(id);
        }
    }
}

/// Selected groups that may need a confirmation, in selection order.
///
/// A group nested in another selected group is only asked about if the
/// outer one is declined, so this is the most prompts a cascade can raise.
pub fn pending_confirmations<'a>(index: &'a TrackIndex, selection: &[TrackId]) -> Vec<&'a TrackRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();
    for id in selection {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if let Some(record) = index.get(id) {
            if record.is_group() {
                groups.push(record);
            }
        }
    }
    groups
}

/// Resolve a selection into the ordered ids to delete.
///
/// Each resolved id appears once. An empty result means there is nothing
/// to do.
pub fn resolve<C>(index: &TrackIndex, selection: &[TrackId], confirm: &mut C) -> Vec<TrackId>
where
    C: Confirm + ?Sized,
{
    let mut cascade = Cascade::new(selection.iter().cloned());
    while let Some(group) = cascade.next_group(index) {
        let confirmed = confirm.confirm_group(group);
        cascade.answer(index, confirmed);
    }
    let resolved = cascade.finish(index);
    debug!(selected = selection.len(), resolved = resolved.len(), "resolved deletion");
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracks::tests::linked;
    use crate::tracks::TrackKind;

    fn ids(list: &[&str]) -> Vec<TrackId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut list: Vec<TrackId>) -> Vec<TrackId> {
        list.sort();
        list
    }

    fn index() -> TrackIndex {
        linked(vec![
            TrackRecord::new("G", "Drums", TrackKind::Group),
            TrackRecord::new("A", "Kick", TrackKind::Audio).with_parent("G"),
            TrackRecord::new("B", "Perc", TrackKind::Group).with_parent("G"),
            TrackRecord::new("C", "Shaker", TrackKind::Audio).with_parent("B"),
            TrackRecord::new("T", "Vox", TrackKind::Audio),
            TrackRecord::new("M", "Keys", TrackKind::Midi),
        ])
    }

    #[test]
    fn test_confirmed_group_cascades() {
        let index = index();
        let resolved = resolve(&index, &ids(&["G"]), &mut |_: &TrackRecord| true);
        assert_eq!(sorted(resolved), ids(&["A", "B", "C", "G"]));
    }

    #[test]
    fn test_confirmed_group_leaves_children_of_leaf_tracks() {
        let index = linked(vec![
            TrackRecord::new("G", "Drums", TrackKind::Group),
            TrackRecord::new("A", "Kick", TrackKind::Audio).with_parent("G"),
            TrackRecord::new("X", "Layer", TrackKind::Audio).with_parent("A"),
        ]);
        let resolved = resolve(&index, &ids(&["G"]), &mut |_: &TrackRecord| true);
        assert_eq!(resolved, ids(&["G", "A"]));
    }

    #[test]
    fn test_declined_group_keeps_other_selection() {
        let index = index();
        let mut asked = Vec::new();
        let resolved = resolve(&index, &ids(&["T", "G", "M"]), &mut |g: &TrackRecord| {
            asked.push(g.name().to_string());
            false
        });
        assert_eq!(resolved, ids(&["T", "M"]));
        assert_eq!(asked, vec!["Drums"]);
    }

    #[test]
    fn test_leaves_are_not_confirmed() {
        let index = index();
        let mut prompts = 0;
        let resolved = resolve(&index, &ids(&["A", "C"]), &mut |_: &TrackRecord| {
            prompts += 1;
            true
        });
        assert_eq!(resolved, ids(&["A", "C"]));
        assert_eq!(prompts, 0);
    }

    #[test]
    fn test_nested_selection_has_no_duplicates() {
        let index = index();
        let resolved = resolve(&index, &ids(&["G", "B", "C", "A"]), &mut |_: &TrackRecord| true);
        assert_eq!(resolved.len(), 4);
        assert_eq!(sorted(resolved), ids(&["A", "B", "C", "G"]));
    }

    #[test]
    fn test_covered_group_not_prompted_again() {
        let index = index();
        let mut prompts = 0;
        resolve(&index, &ids(&["G", "B"]), &mut |_: &TrackRecord| {
            prompts += 1;
            true
        });
        assert_eq!(prompts, 1);
    }

    #[test]
    fn test_inner_group_prompted_when_outer_declined() {
        let index = index();
        let resolved = resolve(&index, &ids(&["G", "B"]), &mut |g: &TrackRecord| g.id() == "B");
        assert_eq!(sorted(resolved), ids(&["B", "C"]));
    }

    #[test]
    fn test_empty_and_unknown_selection() {
        let index = index();
        assert!(resolve(&index, &[], &mut |_: &TrackRecord| true).is_empty());
        assert!(resolve(&index, &ids(&["nope"]), &mut |_: &TrackRecord| true).is_empty());
    }

    #[test]
    fn test_pending_confirmations() {
        let index = index();
        let pending = pending_confirmations(&index, &ids(&["T", "B", "G", "B", "nope"]));
        let names: Vec<&str> = pending.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Perc", "Drums"]);
    }

    #[test]
    fn test_stepwise_cascade() {
        let index = index();
        let mut cascade = Cascade::new(["T", "G"]);

        let group = cascade.next_group(&index).unwrap();
        assert_eq!(group.id(), "G");
        cascade.answer(&index, true);
        assert!(cascade.next_group(&index).is_none());

        assert_eq!(sorted(cascade.finish(&index)), ids(&["A", "B", "C", "G", "T"]));
    }

    #[test]
    fn test_unanswered_group_counts_as_declined() {
        let index = index();
        let mut cascade = Cascade::new(["G", "T"]);
        assert!(cascade.next_group(&index).is_some());
        assert_eq!(cascade.finish(&index), ids(&["T"]));
    }
}
