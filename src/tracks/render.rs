// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Widget-free render tree of the track hierarchy.

use std::collections::HashSet;

use super::{TrackId, TrackIndex, TrackKind, TrackRecord};

/// A track and its nested tracks, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// Track identifier
    pub id: TrackId,
    /// Display name
    pub name: String,
    /// Track kind
    pub kind: TrackKind,
    /// Nested tracks in document order
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// "name (kind)" label
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }

    /// Number of nodes in this subtree, self included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RenderNode::count).sum::<usize>()
    }
}

/// Build the render tree: top-level tracks (orphans included) in
/// document order, each with its children nested below.
///
/// Recurses once per group level.
pub fn render_tree(index: &TrackIndex) -> Vec<RenderNode> {
    let mut visited = HashSet::new();
    index
        .top_level()
        .into_iter()
        .map(|record| render_node(index, record, &mut visited))
        .collect()
}

/// Indented text outline, one line per track
pub fn outline(tree: &[RenderNode]) -> Vec<String> {
    let mut lines = Vec::new();
    for node in tree {
        outline_node(node, 0, &mut lines);
    }
    lines
}

fn outline_node(node: &RenderNode, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{} [{}]", "  ".repeat(depth), node.label(), node.id));
    for child in &node.children {
        outline_node(child, depth + 1, lines);
    }
}

fn render_node(
    index: &TrackIndex,
    record: &TrackRecord,
    visited: &mut HashSet<TrackId>,
) -> RenderNode {
    visited.insert(record.id().to_string());

    let mut children = Vec::with_capacity(record.children().len());
    for child_id in record.children() {
        if visited.contains(child_id) {
            continue;
        }
        if let Some(child) = index.get(child_id) {
            children.push(render_node(index, child, visited));
        }
    }

    RenderNode {
        id: record.id().to_string(),
        name: record.name().to_string(),
        kind: record.kind(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracks::tests::linked;

    #[test]
    fn test_render_nested() {
        let index = linked(vec![
            TrackRecord::new("T1", "Vox", TrackKind::Audio),
            TrackRecord::new("G1", "Synths", TrackKind::Group),
            TrackRecord::new("T2", "Pad", TrackKind::Midi).with_parent("G1"),
        ]);
        let tree = render_tree(&index);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].label(), "Vox (Audio)");
        assert_eq!(tree[1].label(), "Synths (Group)");
        assert_eq!(tree[1].children.len(), 1);
        assert_eq!(tree[1].children[0].label(), "Pad (MIDI)");
        assert_eq!(tree.iter().map(RenderNode::count).sum::<usize>(), 3);
    }

    #[test]
    fn test_outline_indents_children() {
        let index = linked(vec![
            TrackRecord::new("G1", "Synths", TrackKind::Group),
            TrackRecord::new("T2", "Pad", TrackKind::Midi).with_parent("G1"),
        ]);
        assert_eq!(
            outline(&render_tree(&index)),
            vec!["Synths (Group) [G1]", "  Pad (MIDI) [T2]"]
        );
    }

    #[test]
    fn test_render_shows_orphans_at_top() {
        let index = linked(vec![
            TrackRecord::new("1", "Lost", TrackKind::Audio).with_parent("gone"),
        ]);
        let tree = render_tree(&index);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, "1");
    }

    #[test]
    fn test_render_terminates_on_self_parent() {
        let index = linked(vec![
            TrackRecord::new("R", "Root", TrackKind::Group),
            TrackRecord::new("S", "Selfish", TrackKind::Group).with_parent("S"),
        ]);
        let tree = render_tree(&index);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }
}
