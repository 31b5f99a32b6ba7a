// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Track tree display widget.

use std::collections::HashSet;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::tracks::{RenderNode, TrackId, TrackKind};

/// One visible line of the track tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    /// Track identifier
    pub id: TrackId,
    /// "name (kind)" label
    pub label: String,
    /// Track kind
    pub kind: TrackKind,
    /// Nesting depth (0 = top level)
    pub depth: usize,
    /// Whether the track has nested tracks
    pub has_children: bool,
    /// Whether nested tracks are shown
    pub expanded: bool,
}

/// Flatten a render tree into visible rows, skipping collapsed subtrees
pub fn flatten(tree: &[RenderNode], collapsed: &HashSet<TrackId>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for node in tree {
        push_rows(node, 0, collapsed, &mut rows);
    }
    rows
}

fn push_rows(node: &RenderNode, depth: usize, collapsed: &HashSet<TrackId>, rows: &mut Vec<TreeRow>) {
    let expanded = !collapsed.contains(&node.id);
    rows.push(TreeRow {
        id: node.id.clone(),
        label: node.label(),
        kind: node.kind,
        depth,
        has_children: !node.children.is_empty(),
        expanded,
    });
    if expanded {
        for child in &node.children {
            push_rows(child, depth + 1, collapsed, rows);
        }
    }
}

/// First row index to draw so `cursor` stays inside `height` rows
pub fn scroll_offset(cursor: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    cursor.saturating_sub(height - 1)
}

/// Widget drawing the track tree
pub struct TrackTreeWidget<'a> {
    rows: &'a [TreeRow],
    cursor: Option<usize>,
    selected: &'a [TrackId],
    block: Option<Block<'a>>,
}

impl<'a> TrackTreeWidget<'a> {
    /// Create a new tree widget
    pub fn new(rows: &'a [TreeRow]) -> Self {
        Self {
            rows,
            cursor: None,
            selected: &[],
            block: None,
        }
    }

    /// Set the cursor row
    pub fn cursor(mut self, index: Option<usize>) -> Self {
        self.cursor = index;
        self
    }

    /// Set the selected track ids
    pub fn selected(mut self, ids: &'a [TrackId]) -> Self {
        self.selected = ids;
        self
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for TrackTreeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if self.rows.is_empty() {
            Paragraph::new("No tracks. Press o to open a Live Set.")
                .style(Style::default().fg(Color::DarkGray))
                .render(area, buf);
            return;
        }

        let height = area.height as usize;
        let offset = scroll_offset(self.cursor.unwrap_or(0), height);

        let lines: Vec<Line> = self
            .rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, row)| {
                let is_cursor = self.cursor == Some(i);
                let is_selected = self.selected.contains(&row.id);
                row_line(row, is_cursor, is_selected)
            })
            .collect();

        Paragraph::new(lines).render(area, buf);
    }
}

/// Build the styled line for one row
fn row_line(row: &TreeRow, is_cursor: bool, is_selected: bool) -> Line<'static> {
    let pointer = if is_cursor {
        Span::styled(">", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        Span::raw(" ")
    };

    let mark = if is_selected {
        Span::styled("[x] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("[ ] ", Style::default().fg(Color::DarkGray))
    };

    let toggle = match (row.has_children, row.expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };

    let mut label_style = match row.kind {
        TrackKind::Group => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        TrackKind::Midi => Style::default().fg(Color::Cyan),
        TrackKind::Audio => Style::default().fg(Color::Green),
    };
    if is_cursor {
        label_style = label_style.add_modifier(Modifier::REVERSED);
    }

    Line::from(vec![
        pointer,
        mark,
        Span::raw("  ".repeat(row.depth)),
        Span::styled(toggle, Style::default().fg(Color::DarkGray)),
        Span::styled(row.label.clone(), label_style),
    ])
}
