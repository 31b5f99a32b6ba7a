// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for liveprune.
//!
//! Provides a ratatui-based tree view of the live set's tracks with
//! selection, group-deletion confirmation, open/save prompts and a
//! status line for notifications.

mod tracks;

pub use tracks::{flatten, TrackTreeWidget, TreeRow};

use std::collections::HashSet;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::session::{Notice, Session};
use crate::tracks::{pending_confirmations, Cascade, RenderNode, TrackId};

/// Spinner frames shown while saving
const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// What a path prompt is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Open a live set
    Open,
    /// Save the live set
    Save,
}

/// Input mode
#[derive(Debug, Clone)]
pub enum Mode {
    /// Navigating the tree
    Browse,
    /// Asking whether to delete a group with its contents
    Confirm {
        /// Cascade waiting for the answer
        cascade: Cascade,
        /// Name of the group in question
        group_name: String,
        /// Number of this prompt, starting at 1
        prompt: usize,
        /// Most prompts this deletion can raise
        total: usize,
    },
    /// Editing a file path
    Prompt {
        /// What the path is for
        purpose: PromptPurpose,
        /// Current input
        input: String,
    },
}

/// UI state
#[derive(Debug, Clone)]
pub struct UiState {
    /// Track hierarchy being shown
    pub tree: Vec<RenderNode>,
    /// Groups whose children are hidden
    pub collapsed: HashSet<TrackId>,
    /// Cursor row in the flattened tree
    pub cursor: usize,
    /// Selected track ids, in selection order
    pub selected: Vec<TrackId>,
    /// Input mode
    pub mode: Mode,
    /// Help text visible
    pub show_help: bool,
    /// Status notification
    pub status: Option<Notice>,
    /// Status notification timestamp
    pub status_time: Option<Instant>,
    /// Spinner frame counter
    pub spinner: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tree: Vec::new(),
            collapsed: HashSet::new(),
            cursor: 0,
            selected: Vec::new(),
            mode: Mode::Browse,
            show_help: false,
            status: None,
            status_time: None,
            spinner: 0,
        }
    }
}

impl UiState {
    /// Visible rows
    pub fn rows(&self) -> Vec<TreeRow> {
        flatten(&self.tree, &self.collapsed)
    }

    /// Replace the tree, dropping selections and collapsed groups that
    /// no longer exist
    pub fn set_tree(&mut self, tree: Vec<RenderNode>, expanded: bool) {
        let mut ids = HashSet::new();
        collect_ids(&tree, &mut ids);

        self.selected.retain(|id| ids.contains(id));
        if expanded {
            self.collapsed.retain(|id| ids.contains(id));
        } else {
            self.collapsed = ids;
        }
        self.tree = tree;
        self.clamp_cursor();
    }

    /// Move the cursor by `delta` rows
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
    }

    /// Track id under the cursor
    pub fn current_id(&self) -> Option<TrackId> {
        self.rows().get(self.cursor).map(|row| row.id.clone())
    }

    /// Select or deselect the track under the cursor
    pub fn toggle_selected(&mut self) {
        let Some(id) = self.current_id() else {
            return;
        };
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    /// Collapse the group under the cursor, or jump to its parent row
    pub fn collapse(&mut self) {
        let rows = self.rows();
        let Some(row) = rows.get(self.cursor) else {
            return;
        };
        if row.has_children && row.expanded {
            self.collapsed.insert(row.id.clone());
            return;
        }
        // Nearest row above with smaller depth is the parent
        if let Some(parent) = rows[..self.cursor]
            .iter()
            .rposition(|candidate| candidate.depth < row.depth)
        {
            self.cursor = parent;
        }
    }

    /// Expand the group under the cursor
    pub fn expand(&mut self) {
        if let Some(id) = self.current_id() {
            self.collapsed.remove(&id);
        }
    }

    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, notice: Notice) {
        self.status = Some(notice);
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self, timeout: Duration) {
        if let Some(time) = self.status_time {
            if time.elapsed() > timeout {
                self.status = None;
                self.status_time = None;
            }
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}

fn collect_ids(nodes: &[RenderNode], ids: &mut HashSet<TrackId>) {
    for node in nodes {
        ids.insert(node.id.clone());
        collect_ids(&node.children, ids);
    }
}

/// Key event result
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// No action needed
    None,
    /// Quit the application
    Quit,
    /// Move cursor up
    Up,
    /// Move cursor down
    Down,
    /// Collapse group / go to parent
    Collapse,
    /// Expand group
    Expand,
    /// Toggle selection of the cursor track
    ToggleSelect,
    /// Delete the selection
    Delete,
    /// Prompt for a file to open
    Open,
    /// Prompt for a path to save to
    Save,
    /// Toggle help
    ToggleHelp,
    /// Answer a confirmation
    Answer(bool),
    /// Type a character into a prompt
    Input(char),
    /// Delete the last prompt character
    Backspace,
    /// Accept the prompt
    Submit,
    /// Leave the prompt or modal
    Cancel,
}

/// Map a key press to an action for the given mode
pub fn map_key(mode: &Mode, code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    match mode {
        Mode::Confirm { .. } => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Answer(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => KeyAction::Answer(false),
            _ => KeyAction::None,
        },
        Mode::Prompt { .. } => match code {
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Esc => KeyAction::Cancel,
            KeyCode::Backspace => KeyAction::Backspace,
            KeyCode::Char(c) => KeyAction::Input(c),
            _ => KeyAction::None,
        },
        Mode::Browse => match code {
            KeyCode::Char('q') => KeyAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => KeyAction::Up,
            KeyCode::Down | KeyCode::Char('j') => KeyAction::Down,
            KeyCode::Left => KeyAction::Collapse,
            KeyCode::Right => KeyAction::Expand,
            KeyCode::Char(' ') => KeyAction::ToggleSelect,
            KeyCode::Char('d') | KeyCode::Delete => KeyAction::Delete,
            KeyCode::Char('o') => KeyAction::Open,
            KeyCode::Char('s') => KeyAction::Save,
            KeyCode::Char('h') | KeyCode::Char('?') => KeyAction::ToggleHelp,
            _ => KeyAction::None,
        },
    }
}

/// Terminal UI application
pub struct App {
    /// UI state
    state: UiState,
    /// Editing session
    session: Session,
    /// Runtime used for background saves
    runtime: Handle,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Whether to continue running
    running: bool,
}

impl App {
    /// Create a new app around a session
    pub fn new(session: Session, runtime: Handle) -> io::Result<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state: UiState::default(),
            session,
            runtime,
            terminal,
            running: true,
        })
    }

    /// Load a live set and show it
    pub fn open(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        match self.session.load_document(&path) {
            Ok(tree) => {
                let count: usize = tree.iter().map(RenderNode::count).sum();
                self.state.selected.clear();
                self.state.cursor = 0;
                self.state
                    .set_tree(tree, self.session.config().start_expanded);
                self.state.set_status(Notice::Success(format!(
                    "Loaded {} ({} tracks)",
                    path.display(),
                    count
                )));
            }
            Err(e) => self
                .state
                .set_status(Notice::failure("Could not load Live Set", &e)),
        }
    }

    /// Run the event loop until the user quits and no save is running
    pub fn run(&mut self) -> io::Result<()> {
        let frame_time = Duration::from_millis(1000 / self.session.config().frame_rate.max(1) as u64);
        let status_timeout = Duration::from_secs(self.session.config().status_timeout_secs);

        loop {
            if let Some(event) = self.session.poll_save() {
                let notice = Notice::from(&event);
                if notice.is_error() {
                    warn!(path = %event.path().display(), "{}", notice);
                }
                self.state.set_status(notice);
            }
            if !self.running && !self.session.is_saving() {
                break;
            }

            self.state.clear_expired_status(status_timeout);
            self.state.spinner = self.state.spinner.wrapping_add(1);
            self.draw()?;

            if event::poll(frame_time)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = map_key(&self.state.mode, key.code, key.modifiers);
                        self.handle(action);
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply a key action
    pub fn handle(&mut self, action: KeyAction) {
        match action {
            KeyAction::None => {}
            KeyAction::Quit => {
                self.running = false;
                if self.session.is_saving() {
                    self.state
                        .set_status(Notice::Info("Finishing save before exit...".to_string()));
                }
            }
            KeyAction::Up => self.state.move_cursor(-1),
            KeyAction::Down => self.state.move_cursor(1),
            KeyAction::Collapse => self.state.collapse(),
            KeyAction::Expand => self.state.expand(),
            KeyAction::ToggleSelect => self.state.toggle_selected(),
            KeyAction::ToggleHelp => self.state.show_help = !self.state.show_help,
            KeyAction::Delete => self.start_delete(),
            KeyAction::Open => {
                let input = self.current_path_text();
                self.state.mode = Mode::Prompt {
                    purpose: PromptPurpose::Open,
                    input,
                };
            }
            KeyAction::Save => self.start_save_prompt(),
            KeyAction::Answer(confirmed) => {
                if let Mode::Confirm {
                    mut cascade,
                    prompt,
                    total,
                    ..
                } = std::mem::replace(&mut self.state.mode, Mode::Browse)
                {
                    if let Some(index) = self.session.index() {
                        cascade.answer(index, confirmed);
                    }
                    self.step_cascade(cascade, prompt, total);
                }
            }
            KeyAction::Input(c) => {
                if let Mode::Prompt { input, .. } = &mut self.state.mode {
                    input.push(c);
                }
            }
            KeyAction::Backspace => {
                if let Mode::Prompt { input, .. } = &mut self.state.mode {
                    input.pop();
                }
            }
            KeyAction::Cancel => self.state.mode = Mode::Browse,
            KeyAction::Submit => {
                if let Mode::Prompt { purpose, input } =
                    std::mem::replace(&mut self.state.mode, Mode::Browse)
                {
                    self.submit_prompt(purpose, input.trim());
                }
            }
        }
    }

    fn current_path_text(&self) -> String {
        self.session
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    fn start_delete(&mut self) {
        if !self.session.is_loaded() {
            self.state
                .set_status(Notice::Info("No Live Set loaded".to_string()));
            return;
        }
        if self.state.selected.is_empty() {
            self.state
                .set_status(Notice::Info("No tracks selected".to_string()));
            return;
        }
        let total = self
            .session
            .index()
            .map(|index| pending_confirmations(index, &self.state.selected).len())
            .unwrap_or(0);
        let cascade = Cascade::new(self.state.selected.iter().cloned());
        self.step_cascade(cascade, 0, total);
    }

    /// Advance the cascade to the next group prompt, or finish it.
    ///
    /// `asked` counts the prompts already answered.
    fn step_cascade(&mut self, mut cascade: Cascade, asked: usize, total: usize) {
        let Some(index) = self.session.index() else {
            return;
        };
        if let Some(group) = cascade.next_group(index) {
            let group_name = group.name().to_string();
            self.state.mode = Mode::Confirm {
                cascade,
                group_name,
                prompt: asked + 1,
                total,
            };
            return;
        }

        let ids = cascade.finish(index);
        debug!(tracks = ids.len(), "deleting resolved selection");
        match self.session.delete_resolved(&ids) {
            Ok(outcome) => {
                if let Some(notice) = outcome.notice() {
                    self.state.set_status(notice);
                }
                self.state.selected.retain(|id| !ids.contains(id));
                let tree = self.session.render();
                self.state.set_tree(tree, true);
            }
            Err(e) => self
                .state
                .set_status(Notice::failure("Could not delete tracks", &e)),
        }
    }

    fn start_save_prompt(&mut self) {
        if !self.session.is_loaded() {
            self.state
                .set_status(Notice::Info("No Live Set loaded".to_string()));
            return;
        }
        if self.session.is_saving() {
            self.state
                .set_status(Notice::Info("A save is already in progress".to_string()));
            return;
        }
        let input = self.current_path_text();
        self.state.mode = Mode::Prompt {
            purpose: PromptPurpose::Save,
            input,
        };
    }

    fn submit_prompt(&mut self, purpose: PromptPurpose, input: &str) {
        if input.is_empty() {
            return;
        }
        match purpose {
            PromptPurpose::Open => self.open(input),
            PromptPurpose::Save => match self.session.save_document(&self.runtime, input) {
                Ok(()) => self
                    .state
                    .set_status(Notice::Info("Saving Live Set...".to_string())),
                Err(e) => self
                    .state
                    .set_status(Notice::failure("Could not save Live Set", &e)),
            },
        }
    }

    /// Draw the UI
    pub fn draw(&mut self) -> io::Result<()> {
        let state = &self.state;
        let title = match self.session.path() {
            Some(path) if self.session.is_modified() => format!(" {} [modified] ", path.display()),
            Some(path) => format!(" {} ", path.display()),
            None => " No Live Set ".to_string(),
        };
        let saving = self.session.is_saving();

        self.terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: tree, status bar
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(3),    // Tracks
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

            let rows = state.rows();
            let tree = TrackTreeWidget::new(&rows)
                .cursor(Some(state.cursor))
                .selected(&state.selected)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(tree, chunks[0]);

            render_status_bar(frame, chunks[1], state, saving);

            match &state.mode {
                Mode::Confirm {
                    group_name,
                    prompt,
                    total,
                    ..
                } => render_confirm(frame, area, group_name, *prompt, *total),
                Mode::Prompt { purpose, input } => render_prompt(frame, area, *purpose, input),
                Mode::Browse => {}
            }

            // Help overlay
            if state.show_help {
                render_help_overlay(frame, area);
            }
        })?;

        Ok(())
    }

    /// Cleanup terminal on drop
    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Centered rectangle of at most `width` x `height`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, state: &UiState, saving: bool) {
    let mut spans = Vec::new();
    if saving {
        let glyph = SPINNER[state.spinner % SPINNER.len()];
        spans.push(Span::styled(
            format!(" {} Saving... ", glyph),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }

    match &state.status {
        Some(notice) => {
            let color = match notice {
                Notice::Error(_) => Color::Red,
                Notice::Success(_) => Color::Green,
                Notice::Info(_) => Color::Yellow,
            };
            spans.push(Span::styled(format!(" {}", notice), Style::default().fg(color)));
        }
        None => spans.push(Span::styled(
            format!(
                " {} selected | Space: Select | d: Delete | o: Open | s: Save | h: Help | q: Quit",
                state.selected.len()
            ),
            Style::default().fg(Color::DarkGray),
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Title of the confirmation modal
fn confirm_title(prompt: usize, total: usize) -> String {
    if total > 1 {
        format!(" Confirm Deletion ({} of {}) ", prompt, total)
    } else {
        " Confirm Deletion ".to_string()
    }
}

/// Render group deletion confirmation
fn render_confirm(frame: &mut Frame, area: Rect, group_name: &str, prompt: usize, total: usize) {
    let modal = centered(area, 60, 7);
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(confirm_title(prompt, total))
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(format!(
            "Deleting group '{}' will also delete all tracks inside. Proceed?",
            group_name
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y: Yes   n/Esc: No",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        modal,
    );
}

/// Render path prompt
fn render_prompt(frame: &mut Frame, area: Rect, purpose: PromptPurpose, input: &str) {
    let modal = centered(area, 70, 5);
    frame.render_widget(Clear, modal);

    let title = match purpose {
        PromptPurpose::Open => " Open Ableton Live Set ",
        PromptPurpose::Save => " Save Modified Ableton Live Set ",
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let text = vec![
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(input.to_string()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(Span::styled(
            "Enter: Accept   Esc: Cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Paragraph::new(text).block(block), modal);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered(area, 46, 15);
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help_text = vec![
        Line::from(Span::styled("Navigation", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down, k/j  Move cursor"),
        Line::from("  Left/Right    Collapse/expand group"),
        Line::from(""),
        Line::from(Span::styled("Editing", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Space         Select track"),
        Line::from("  d/Delete      Delete selected tracks"),
        Line::from(""),
        Line::from(Span::styled("File", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  o             Open Live Set"),
        Line::from("  s             Save Live Set"),
        Line::from("  h/?           Toggle help"),
        Line::from("  q/Ctrl+c      Quit"),
    ];

    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
