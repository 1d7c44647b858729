use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use regex::Regex;

use crate::enhancer::builtin;
use crate::enhancer::{Edit, Engine, KeyOutcome, MenuPresenter, MenuView, NavKey};
use crate::model::composer::Composer;
use crate::model::config::AppConfig;
use crate::model::mode::InputMode;
use crate::model::transcript::{ChatLine, LineKind, Transcript};
use crate::msg::{Direction as MoveDir, Msg};

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[\w.-]+").expect("valid mention regex"));
static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\w+").expect("valid command regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid inline code regex"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+\*\*").expect("valid bold regex"));

pub struct App {
    pub mode: InputMode,
    pub composer: Composer,
    engine: Engine,
    presenter: MenuPresenter,
    pub transcript: Transcript,
    pub config: AppConfig,
    pub should_quit: bool,
    pub notifications: VecDeque<String>,
    menu_view: Option<MenuView>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mode = InputMode::default();
        let engine = Engine::new(builtin::registry_for(&config, mode))
            .with_policy(config.detection_policy());

        Self {
            mode,
            composer: Composer::new(),
            engine,
            presenter: MenuPresenter::new(config.composer.menu_rows),
            transcript: Transcript::new(config.general.max_transcript),
            config,
            should_quit: false,
            notifications: VecDeque::new(),
            menu_view: None,
        }
    }

    /// Whether a completion menu is open. Enter does not send while it is.
    pub fn menu_open(&self) -> bool {
        self.engine.is_open()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The menu as drawn by the last `view` call.
    pub fn menu_view(&self) -> Option<&MenuView> {
        self.menu_view.as_ref()
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Mouse(mouse) => self.handle_mouse(mouse),
            Msg::Resize(_w, _h) => {}
            Msg::InsertChar(ch) => {
                if self.composer.insert_char(ch) {
                    self.text_changed();
                }
            }
            Msg::DeleteChar => {
                if self.composer.delete_char_before() {
                    self.text_changed();
                }
            }
            Msg::MoveCursor(dir) => self.move_cursor(dir),
            Msg::Send => self.send_message(),
            Msg::ToggleRestricted => self.toggle_restricted(),
            Msg::ToolbarInsert(id) => self.toolbar_insert(&id),
            Msg::ConfigChanged(path) => self.reload_config(path),
            Msg::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            return self.update(Msg::Quit);
        }

        if ctrl && key.code == KeyCode::Char('r') {
            return self.update(Msg::ToggleRestricted);
        }

        if alt && let KeyCode::Char(digit @ '1'..='9') = key.code {
            let slot = digit as usize - '1' as usize;
            return match self.engine.toolbar().into_iter().nth(slot) {
                Some((id, _)) => self.update(Msg::ToolbarInsert(id)),
                None => Ok(()),
            };
        }

        // Navigation keys go to the enhancer menu first; only an ignored key
        // reaches the plain composer bindings below.
        if let Some(nav) = nav_key(&key) {
            match self.engine.handle_key(nav) {
                KeyOutcome::Commit(edit) => {
                    self.commit_edit(&edit);
                    return Ok(());
                }
                KeyOutcome::Consumed => return Ok(()),
                KeyOutcome::Ignored => {}
            }
        }

        let msg = match key.code {
            KeyCode::Enter => Msg::Send,
            KeyCode::Esc => {
                self.notifications.clear();
                return Ok(());
            }
            KeyCode::Backspace => Msg::DeleteChar,
            KeyCode::Delete => {
                if self.composer.delete_char_after() {
                    self.text_changed();
                }
                return Ok(());
            }
            KeyCode::Left => Msg::MoveCursor(MoveDir::Left),
            KeyCode::Right => Msg::MoveCursor(MoveDir::Right),
            KeyCode::Home => Msg::MoveCursor(MoveDir::LineStart),
            KeyCode::End => Msg::MoveCursor(MoveDir::LineEnd),
            KeyCode::Char('a') if ctrl => Msg::MoveCursor(MoveDir::LineStart),
            KeyCode::Char('e') if ctrl => Msg::MoveCursor(MoveDir::LineEnd),
            KeyCode::Char('w') if ctrl => {
                if self.composer.delete_word_before() {
                    self.text_changed();
                }
                return Ok(());
            }
            KeyCode::Char(ch) if !ctrl && !alt => Msg::InsertChar(ch),
            _ => return Ok(()),
        };
        self.update(msg)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(view) = self.menu_view.as_ref() else {
            return;
        };
        let hit = view.hit_test(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = hit
                    && let KeyOutcome::Commit(edit) = self.engine.select(index)
                {
                    self.commit_edit(&edit);
                }
            }
            MouseEventKind::Moved => {
                if let Some(index) = hit {
                    self.engine.highlight(index);
                }
            }
            MouseEventKind::ScrollDown => {
                self.engine.handle_key(NavKey::Down);
            }
            MouseEventKind::ScrollUp => {
                self.engine.handle_key(NavKey::Up);
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, dir: MoveDir) {
        let moved = match dir {
            MoveDir::Left => self.composer.move_left(),
            MoveDir::Right => self.composer.move_right(),
            MoveDir::LineStart => self.composer.move_home(),
            MoveDir::LineEnd => self.composer.move_end(),
        };
        if moved {
            self.engine
                .on_caret_move(&self.composer.text(), self.composer.cursor());
            self.menu_view = None;
        }
    }

    fn text_changed(&mut self) {
        self.engine
            .on_change(&self.composer.text(), self.composer.cursor());
        // Rows of the last drawn menu no longer map onto the candidates.
        self.menu_view = None;
    }

    fn commit_edit(&mut self, edit: &Edit) {
        self.composer.commit(edit);
        self.text_changed();
    }

    fn toolbar_insert(&mut self, id: &str) {
        if let Some(edit) = self.engine.insert_marker(id) {
            self.commit_edit(&edit);
        }
    }

    fn send_message(&mut self) {
        if self.engine.is_open() {
            return;
        }

        let text = self.composer.take();
        self.text_changed();

        let body = text.trim();
        if body.is_empty() {
            return;
        }

        tracing::debug!(len = body.len(), "message sent");
        if let Some(command) = body.strip_prefix('/') {
            self.run_command(command);
        } else {
            let nick = self.config.general.nick.clone();
            self.transcript.push(ChatLine::message(nick, body));
        }
    }

    fn run_command(&mut self, input: &str) {
        let (name, args) = input
            .split_once(char::is_whitespace)
            .map(|(name, args)| (name, args.trim()))
            .unwrap_or((input, ""));

        match name {
            "help" => {
                let mut lines = vec![ChatLine::system("commands:")];
                lines.extend(self.config.commands.iter().map(|cmd| {
                    let usage = cmd.usage.as_deref().unwrap_or_default();
                    let description = cmd.description.as_deref().unwrap_or_default();
                    ChatLine::system(format!("  /{} {usage}  {description}", cmd.name))
                }));
                for line in lines {
                    self.transcript.push(line);
                }
            }
            "clear" => self.transcript.clear(),
            "me" if !args.is_empty() => {
                let nick = self.config.general.nick.clone();
                self.transcript.push(ChatLine::action(nick, args));
            }
            _ if self.config.commands.iter().any(|cmd| cmd.name == name) => {
                self.transcript
                    .push(ChatLine::system(format!("/{name} {args}").trim_end()));
            }
            _ => self.push_notification(format!("unknown command: /{name}")),
        }
    }

    fn toggle_restricted(&mut self) {
        self.mode = self.mode.toggled();
        self.rebuild_registry();
        self.push_notification(format!("input mode: {}", self.mode.label()));
    }

    fn rebuild_registry(&mut self) {
        let registry = builtin::registry_for(&self.config, self.mode);
        self.engine.replace_registry(registry);
        self.presenter.reset();
        self.menu_view = None;
    }

    fn reload_config(&mut self, path: PathBuf) {
        match AppConfig::load_layered(Some(&path)) {
            Ok(config) => {
                self.engine.set_policy(config.detection_policy());
                self.presenter.set_max_rows(config.composer.menu_rows);
                self.config = config;
                self.rebuild_registry();
                self.push_notification("config reloaded".to_string());
            }
            Err(err) => {
                tracing::warn!("config reload failed for {}: {err:#}", path.display());
                self.push_notification(format!("config error: {err}"));
            }
        }
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > 8 {
            self.notifications.pop_front();
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // transcript
                Constraint::Length(3), // composer
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_transcript(frame, chunks[0]);
        self.render_composer(frame, chunks[1]);
        self.render_status_bar(frame, chunks[2]);

        let anchor = (chunks[1].width > 0 && chunks[1].height > 0).then_some(chunks[1]);
        self.menu_view = self
            .presenter
            .present(self.engine.active(), anchor, frame.area());
        if let Some(view) = &self.menu_view {
            render_menu(frame, view);
        }
    }

    fn render_transcript(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .transcript
            .tail(area.height as usize)
            .map(render_chat_line)
            .collect();

        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(Color::Rgb(12, 12, 18))),
            area,
        );
    }

    fn render_composer(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2) as usize;
        self.composer.scroll_to_cursor(inner_width);

        let title = format!(" {} ", self.config.general.nick);
        let input = Paragraph::new(self.composer.visible_text(inner_width)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(input, area);

        let column = u16::try_from(self.composer.cursor_column()).unwrap_or(u16::MAX);
        let cursor_x = (area.x + 1).saturating_add(column);
        let cursor_y = area.y + 1;
        if cursor_x < area.x + area.width && cursor_y < area.y + area.height {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            InputMode::Open => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            InputMode::Restricted => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mut spans = vec![Span::styled(format!(" {} ", self.mode.label()), mode_style)];

        if let Some(menu) = self.engine.active() {
            let hint = menu.hint();
            spans.push(Span::styled(
                format!(
                    " {} {}: {} ({}/{}) ",
                    hint.icon,
                    hint.label,
                    menu.trigger().query,
                    menu.selected() + 1,
                    menu.len()
                ),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let toolbar: Vec<String> = self
            .engine
            .toolbar()
            .into_iter()
            .enumerate()
            .map(|(idx, (_, hint))| format!("Alt+{} {} {}", idx + 1, hint.icon, hint.label))
            .collect();
        spans.push(Span::styled(
            format!(" {} ", toolbar.join("  ")),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        ));

        if let Some(note) = self.notifications.back() {
            spans.push(Span::styled(
                format!(" | {note} "),
                Style::default().fg(Color::Yellow).bg(Color::DarkGray),
            ));
        }

        let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}

fn nav_key(key: &KeyEvent) -> Option<NavKey> {
    match key.code {
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => Some(NavKey::Enter),
        KeyCode::Tab => Some(NavKey::Tab),
        KeyCode::Esc => Some(NavKey::Escape),
        _ => None,
    }
}

fn render_menu(frame: &mut Frame, view: &MenuView) {
    frame.render_widget(Clear, view.area);

    let lines: Vec<Line> = view
        .entries
        .iter()
        .map(|entry| {
            let mut spans = Vec::new();
            let (marker, style) = if entry.selected {
                ("> ", Style::default().fg(Color::Black).bg(Color::Cyan))
            } else {
                ("  ", Style::default().fg(Color::Gray))
            };
            spans.push(Span::styled(format!("{marker}{}", entry.label.text), style));
            if let Some(detail) = &entry.label.detail {
                spans.push(Span::styled(
                    format!("  {detail}"),
                    style.fg(if entry.selected {
                        Color::Black
                    } else {
                        Color::DarkGray
                    }),
                ));
            }
            Line::from(spans)
        })
        .collect();

    let menu = Paragraph::new(lines).block(
        Block::default()
            .title(view.title.clone())
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Rgb(10, 10, 18))),
    );
    frame.render_widget(menu, view.area);
}

fn render_chat_line(line: &ChatLine) -> Line<'static> {
    match line.kind {
        LineKind::System => Line::from(Span::styled(
            format!("-- {}", line.body),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
        LineKind::Action => Line::from(Span::styled(
            format!("* {} {}", line.author, line.body),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),
        )),
        LineKind::Message => {
            let mut spans = vec![Span::styled(
                format!("{}: ", line.author),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )];
            spans.extend(render_inline(&line.body, Style::default().fg(Color::Gray)));
            Line::from(spans)
        }
    }
}

fn render_inline(text: &str, base_style: Style) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some((start, end, kind)) = next_token(text, cursor) else {
            spans.push(Span::styled(text[cursor..].to_string(), base_style));
            break;
        };

        if start > cursor {
            spans.push(Span::styled(text[cursor..start].to_string(), base_style));
        }

        let token_style = match kind {
            TokenKind::Mention => base_style
                .fg(Color::Rgb(0, 255, 136))
                .add_modifier(Modifier::BOLD),
            TokenKind::Command => base_style
                .fg(Color::Rgb(255, 102, 0))
                .add_modifier(Modifier::BOLD),
            TokenKind::InlineCode => base_style
                .fg(Color::Rgb(220, 220, 220))
                .bg(Color::Rgb(32, 32, 48)),
            TokenKind::Bold => base_style.add_modifier(Modifier::BOLD),
        };

        spans.push(Span::styled(text[start..end].to_string(), token_style));
        cursor = end;
    }

    spans
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Mention,
    Command,
    InlineCode,
    Bold,
}

fn next_token(text: &str, start_at: usize) -> Option<(usize, usize, TokenKind)> {
    let command = if start_at == 0 {
        COMMAND_RE
            .find(text)
            .map(|m| (m.start(), m.end(), TokenKind::Command))
    } else {
        None
    };

    let candidates = [
        (
            INLINE_CODE_RE
                .find_at(text, start_at)
                .map(|m| (m.start(), m.end(), TokenKind::InlineCode)),
            0,
        ),
        (command, 1),
        (
            MENTION_RE
                .find_at(text, start_at)
                .map(|m| (m.start(), m.end(), TokenKind::Mention)),
            2,
        ),
        (
            BOLD_RE
                .find_at(text, start_at)
                .map(|m| (m.start(), m.end(), TokenKind::Bold)),
            3,
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(hit, priority)| hit.map(|h| (h, priority)))
        .min_by(|((sa, _, _), pa), ((sb, _, _), pb)| sa.cmp(sb).then(pa.cmp(pb)))
        .map(|(h, _)| h)
}
