// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! A thin shell around the core: a tree pane and a live markup preview. Every
//! user edit goes through `ops::apply_ops`, then the snapshot is saved and
//! both panes are recomputed. Field edits commit on Enter and cancel on Esc,
//! never per keystroke.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::format::xml::{export_xml, highlight_line, import_xml, HighlightKind};
use crate::model::{Forest, Node, NodeId, NodeKind};
use crate::ops::{apply_ops, Op};
use crate::store::SnapshotFolder;

const FOCUS_COLOR: Color = Color::LightGreen;
const SECTION_COLOR: Color = Color::LightBlue;
const DECLARATION_COLOR: Color = Color::DarkGray;
const COMMENT_COLOR: Color = Color::Green;
const TAG_COLOR: Color = Color::LightBlue;
const ATTR_VALUE_COLOR: Color = Color::Yellow;
const FOOTER_LABEL_COLOR: Color = Color::Gray;
const FOOTER_KEY_COLOR: Color = Color::Cyan;

const DEFAULT_LEAF_TAG: &str = "element";
const DEFAULT_SECTION_TAG: &str = "section";
const DEFAULT_ROOT_TAG: &str = "main";

/// Runs the interactive editor until the user quits.
pub fn run(forest: Forest, folder: SnapshotFolder) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(forest, folder);

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                _ => {}
            }
        }
    }

    Ok(())
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }

    fn draw(&mut self, render: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    EditTag { node_id: NodeId, buffer: String },
    EditValue { node_id: NodeId, buffer: String },
    Import { buffer: String },
    ConfirmDelete { node_id: NodeId },
    ConfirmClear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TreeRow {
    node_id: NodeId,
    depth: usize,
    label: String,
    is_section: bool,
}

fn flatten_rows(forest: &Forest) -> Vec<TreeRow> {
    fn walk(nodes: &[Node], depth: usize, rows: &mut Vec<TreeRow>) {
        for node in nodes {
            rows.push(TreeRow {
                node_id: node.id(),
                depth,
                label: row_label(node),
                is_section: node.is_section(),
            });
            walk(node.children(), depth + 1, rows);
        }
    }

    let mut rows = Vec::new();
    walk(forest.roots(), 0, &mut rows);
    rows
}

fn row_label(node: &Node) -> String {
    match node.kind() {
        NodeKind::Leaf => format!("{}: {}", node.tag(), node.value()),
        NodeKind::Section if node.value().is_empty() => node.tag().to_owned(),
        NodeKind::Section => format!("{} [{}]", node.tag(), node.value()),
    }
}

struct App {
    forest: Forest,
    folder: SnapshotFolder,
    mode: Mode,
    cursor: usize,
    rows: Vec<TreeRow>,
    preview: String,
    preview_scroll: u16,
    toast: Option<String>,
    should_quit: bool,
}

impl App {
    fn new(forest: Forest, folder: SnapshotFolder) -> Self {
        let mut app = Self {
            forest,
            folder,
            mode: Mode::Normal,
            cursor: 0,
            rows: Vec::new(),
            preview: String::new(),
            preview_scroll: 0,
            toast: None,
            should_quit: false,
        };
        app.refresh_derived();
        app
    }

    fn refresh_derived(&mut self) {
        self.rows = flatten_rows(&self.forest);
        self.preview = export_xml(&self.forest);
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len().saturating_sub(1);
        }
    }

    fn selected_id(&self) -> Option<NodeId> {
        self.rows.get(self.cursor).map(|row| row.node_id)
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(message.into());
    }

    /// Applies a batch and, on success, persists the snapshot and recomputes
    /// the derived panes.
    fn apply(&mut self, ops: Vec<Op>) -> bool {
        let base_rev = self.forest.rev();
        match apply_ops(&mut self.forest, base_rev, &ops) {
            Ok(_) => {
                self.after_mutation();
                true
            }
            Err(err) => {
                self.set_toast(err.to_string());
                false
            }
        }
    }

    fn after_mutation(&mut self) {
        if let Err(err) = self.folder.save_forest(&self.forest) {
            self.set_toast(format!("save failed: {err}"));
        }
        self.refresh_derived();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.toast = None;
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal_key(key),
            Mode::EditTag { node_id, buffer } => self.handle_edit_tag_key(key, node_id, buffer),
            Mode::EditValue { node_id, buffer } => {
                self.handle_edit_value_key(key, node_id, buffer)
            }
            Mode::Import { buffer } => self.handle_import_key(key, buffer),
            Mode::ConfirmDelete { node_id } => self.handle_confirm_delete_key(key, node_id),
            Mode::ConfirmClear => self.handle_confirm_clear_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.rows.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.rows.len().saturating_sub(1),
            KeyCode::PageDown | KeyCode::Char('J') => {
                self.preview_scroll = self.preview_scroll.saturating_add(1);
            }
            KeyCode::PageUp | KeyCode::Char('K') => {
                self.preview_scroll = self.preview_scroll.saturating_sub(1);
            }
            KeyCode::Char('a') => {
                let parent_id = self.selected_id();
                self.apply(vec![Op::Create {
                    tag: DEFAULT_LEAF_TAG.to_owned(),
                    value: String::new(),
                    kind: NodeKind::Leaf,
                    parent_id,
                }]);
            }
            KeyCode::Char('s') => {
                let parent_id = self.selected_id();
                self.apply(vec![Op::Create {
                    tag: DEFAULT_SECTION_TAG.to_owned(),
                    value: String::new(),
                    kind: NodeKind::Section,
                    parent_id,
                }]);
            }
            KeyCode::Char('r') => {
                self.apply(vec![Op::Create {
                    tag: DEFAULT_ROOT_TAG.to_owned(),
                    value: String::new(),
                    kind: NodeKind::Section,
                    parent_id: None,
                }]);
            }
            KeyCode::Char('t') => {
                if let Some(node_id) = self.selected_id() {
                    let buffer = self
                        .forest
                        .find(node_id)
                        .map(|node| node.tag().to_owned())
                        .unwrap_or_default();
                    self.mode = Mode::EditTag { node_id, buffer };
                }
            }
            KeyCode::Char('v') | KeyCode::Enter => {
                if let Some(node_id) = self.selected_id() {
                    let buffer = self
                        .forest
                        .find(node_id)
                        .map(|node| node.value().to_owned())
                        .unwrap_or_default();
                    self.mode = Mode::EditValue { node_id, buffer };
                }
            }
            KeyCode::Char('m') => {
                if let Some(node_id) = self.selected_id() {
                    let kind = match self.forest.find(node_id).map(|node| node.kind()) {
                        Some(NodeKind::Section) => NodeKind::Leaf,
                        Some(NodeKind::Leaf) => NodeKind::Section,
                        None => return,
                    };
                    self.apply(vec![Op::SetKind { node_id, kind }]);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(node_id) = self.selected_id() {
                    self.mode = Mode::ConfirmDelete { node_id };
                }
            }
            KeyCode::Char('C') => {
                if !self.forest.is_empty() {
                    self.mode = Mode::ConfirmClear;
                }
            }
            KeyCode::Char('i') => {
                self.mode = Mode::Import {
                    buffer: String::new(),
                };
            }
            KeyCode::Char('w') => match self.folder.write_export(&self.preview) {
                Ok(path) => self.set_toast(format!("exported to {}", path.display())),
                Err(err) => self.set_toast(format!("export failed: {err}")),
            },
            _ => {}
        }
    }

    fn handle_edit_tag_key(&mut self, key: KeyEvent, node_id: NodeId, mut buffer: String) {
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => {
                // On a rejected name the edit reverts; the toast carries the
                // validation message.
                self.apply(vec![Op::SetTag {
                    node_id,
                    tag: buffer,
                }]);
            }
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = Mode::EditTag { node_id, buffer };
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                self.mode = Mode::EditTag { node_id, buffer };
            }
            _ => self.mode = Mode::EditTag { node_id, buffer },
        }
    }

    fn handle_edit_value_key(&mut self, key: KeyEvent, node_id: NodeId, mut buffer: String) {
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => {
                self.apply(vec![Op::SetValue {
                    node_id,
                    value: buffer,
                }]);
            }
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = Mode::EditValue { node_id, buffer };
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                self.mode = Mode::EditValue { node_id, buffer };
            }
            _ => self.mode = Mode::EditValue { node_id, buffer },
        }
    }

    fn handle_import_key(&mut self, key: KeyEvent, mut buffer: String) {
        if key.code == KeyCode::Char('d') && key.modifiers.contains(KeyModifiers::CONTROL) {
            match import_xml(&buffer) {
                Ok(imported) => {
                    // Full replacement; a parse failure above left the
                    // current forest untouched.
                    self.forest = imported;
                    self.after_mutation();
                    self.cursor = 0;
                    self.set_toast(format!("imported {} nodes", self.forest.node_count()));
                }
                Err(err) => {
                    self.set_toast(err.to_string());
                    self.mode = Mode::Import { buffer };
                }
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => {
                buffer.push('\n');
                self.mode = Mode::Import { buffer };
            }
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = Mode::Import { buffer };
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                self.mode = Mode::Import { buffer };
            }
            _ => self.mode = Mode::Import { buffer },
        }
    }

    fn handle_confirm_delete_key(&mut self, key: KeyEvent, node_id: NodeId) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.apply(vec![Op::Remove { node_id }]);
            }
            KeyCode::Esc | KeyCode::Char('n') => {}
            _ => self.mode = Mode::ConfirmDelete { node_id },
        }
    }

    fn handle_confirm_clear_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.apply(vec![Op::Clear]);
            }
            KeyCode::Esc | KeyCode::Char('n') => {}
            _ => self.mode = Mode::ConfirmClear,
        }
    }
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let [main_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(frame.size());
    let [tree_area, preview_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
            .areas(main_area);

    draw_tree(frame, app, tree_area);
    draw_preview(frame, app, preview_area);
    draw_footer(frame, app, footer_area);

    if let Mode::Import { buffer } = &app.mode {
        draw_import_popup(frame, buffer);
    }
}

fn draw_tree(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items: Vec<ListItem<'_>> = if app.rows.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "empty document — 'r' adds a root section",
            Style::default().fg(FOOTER_LABEL_COLOR),
        )))]
    } else {
        app.rows
            .iter()
            .map(|row| {
                let marker = if row.is_section { "▸ " } else { "· " };
                let style = if row.is_section {
                    Style::default().fg(SECTION_COLOR)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{}{marker}{}", "  ".repeat(row.depth), row.label),
                    style,
                )))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Document ({} nodes) ", app.forest.node_count())),
        )
        .highlight_style(
            Style::default()
                .fg(FOCUS_COLOR)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.rows.is_empty() {
        state.select(Some(app.cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_preview(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let lines: Vec<Line<'_>> = app
        .preview
        .lines()
        .map(|line| {
            let spans: Vec<Span<'_>> = highlight_line(line)
                .into_iter()
                .map(|span| {
                    let style = match span.kind {
                        HighlightKind::Declaration => Style::default().fg(DECLARATION_COLOR),
                        HighlightKind::Comment => Style::default().fg(COMMENT_COLOR),
                        HighlightKind::Tag => Style::default().fg(TAG_COLOR),
                        HighlightKind::AttrValue => Style::default().fg(ATTR_VALUE_COLOR),
                        HighlightKind::Text => Style::default(),
                    };
                    Span::styled(line[span.range].to_owned(), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let preview = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" XML "))
        .scroll((app.preview_scroll, 0));
    frame.render_widget(preview, area);
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let hint_line = match &app.mode {
        Mode::Normal => hints_line(&[
            ("a", "add"),
            ("s", "add section"),
            ("r", "add root"),
            ("t", "tag"),
            ("v", "value"),
            ("m", "kind"),
            ("x", "delete"),
            ("i", "import"),
            ("w", "export"),
            ("C", "clear"),
            ("q", "quit"),
        ]),
        Mode::EditTag { buffer, .. } => edit_line("tag", buffer),
        Mode::EditValue { buffer, .. } => edit_line("value", buffer),
        Mode::Import { .. } => hints_line(&[("Ctrl-D", "apply"), ("Esc", "cancel")]),
        Mode::ConfirmDelete { .. } => confirm_line("delete this node and its subtree?"),
        Mode::ConfirmClear => confirm_line("clear the whole document?"),
    };

    let toast_line = match &app.toast {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::LightRed),
        )),
        None => Line::from(""),
    };

    frame.render_widget(Paragraph::new(vec![hint_line, toast_line]), area);
}

fn hints_line(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, (key, label)) in hints.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled("  ", Style::default()));
        }
        spans.push(Span::styled(*key, Style::default().fg(FOOTER_KEY_COLOR)));
        spans.push(Span::styled(
            format!(" {label}"),
            Style::default().fg(FOOTER_LABEL_COLOR),
        ));
    }
    Line::from(spans)
}

fn edit_line(field: &'static str, buffer: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{field}: "), Style::default().fg(FOOTER_LABEL_COLOR)),
        Span::styled(buffer.to_owned(), Style::default().fg(FOCUS_COLOR)),
        Span::styled("▏", Style::default().fg(FOCUS_COLOR)),
    ])
}

fn confirm_line(question: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(question, Style::default().fg(Color::LightRed)),
        Span::styled("  y", Style::default().fg(FOOTER_KEY_COLOR)),
        Span::styled("/", Style::default().fg(FOOTER_LABEL_COLOR)),
        Span::styled("n", Style::default().fg(FOOTER_KEY_COLOR)),
    ])
}

fn draw_import_popup(frame: &mut Frame<'_>, buffer: &str) {
    let area = centered_rect(frame.size(), 80, 70);
    frame.render_widget(Clear, area);

    let mut text = buffer.to_owned();
    text.push('▏');
    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Import XML — Ctrl-D apply, Esc cancel "),
        );
    frame.render_widget(popup, area);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::{flatten_rows, App, Mode};
    use crate::model::{Forest, NodeKind};
    use crate::store::SnapshotFolder;

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new(label: &str) -> Self {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "dryad-tui-test-{label}-{}-{nanos}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("create temp dir");
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_in(dir: &TempDir) -> App {
        let mut forest = Forest::new();
        let main = forest.create("main", "", NodeKind::Section, None);
        forest.create("project", "RTS", NodeKind::Leaf, Some(main));
        App::new(forest, SnapshotFolder::new(&dir.path))
    }

    #[test]
    fn flatten_visits_in_document_order_with_depths() {
        let mut forest = Forest::new();
        let main = forest.create("main", "", NodeKind::Section, None);
        forest.create("project", "RTS", NodeKind::Leaf, Some(main));
        let meta = forest.create("meta", "v", NodeKind::Section, Some(main));
        forest.create("version", "1.0.0", NodeKind::Leaf, Some(meta));

        let rows = flatten_rows(&forest);
        let labels: Vec<(&str, usize)> = rows
            .iter()
            .map(|row| (row.label.as_str(), row.depth))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("main", 0),
                ("project: RTS", 1),
                ("meta [v]", 1),
                ("version: 1.0.0", 2),
            ]
        );
    }

    #[test]
    fn add_key_creates_a_child_and_persists() {
        let dir = TempDir::new("add");
        let mut app = app_in(&dir);
        app.handle_key(key(KeyCode::Char('a')));

        assert_eq!(app.forest.node_count(), 3);
        assert!(app.folder.snapshot_path().is_file());
        assert!(app.preview.contains("<element></element>"));
    }

    #[test]
    fn tag_edit_commits_on_enter_and_reverts_invalid_names() {
        let dir = TempDir::new("tag-edit");
        let mut app = app_in(&dir);

        app.handle_key(key(KeyCode::Char('t')));
        assert!(matches!(app.mode, Mode::EditTag { .. }));
        for _ in 0.."main".len() {
            app.handle_key(key(KeyCode::Backspace));
        }
        app.handle_key(key(KeyCode::Char('2')));
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.rows[0].label, "main");
        assert!(app.toast.as_deref().is_some_and(|t| t.contains("invalid tag name")));
    }

    #[test]
    fn delete_requires_confirmation() {
        let dir = TempDir::new("delete");
        let mut app = app_in(&dir);

        app.handle_key(key(KeyCode::Char('x')));
        assert!(matches!(app.mode, Mode::ConfirmDelete { .. }));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.forest.node_count(), 2);

        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.forest.is_empty());
    }

    #[test]
    fn failed_import_keeps_the_forest_and_stays_in_import_mode() {
        let dir = TempDir::new("import-fail");
        let mut app = app_in(&dir);

        app.handle_key(key(KeyCode::Char('i')));
        for ch in "<a><b></a>".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));

        assert!(matches!(app.mode, Mode::Import { .. }));
        assert_eq!(app.forest.node_count(), 2);
        assert!(app.toast.is_some());
    }

    #[test]
    fn successful_import_replaces_the_forest() {
        let dir = TempDir::new("import-ok");
        let mut app = app_in(&dir);

        app.handle_key(key(KeyCode::Char('i')));
        for ch in "<doc><title>hi</title></doc>".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.forest.node_count(), 2);
        assert_eq!(app.rows[0].label, "doc");
        assert_eq!(app.rows[1].label, "title: hi");
    }
}
