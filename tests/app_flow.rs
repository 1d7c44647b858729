//! Drives the full app through key, mouse and config messages and renders it
//! into a test backend.

use std::io::Write;

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

use relay_tui::app::App;
use relay_tui::model::config::AppConfig;
use relay_tui::model::mode::InputMode;
use relay_tui::model::transcript::LineKind;
use relay_tui::msg::Msg;

fn app() -> App {
    App::new(AppConfig::defaults().unwrap())
}

fn key(app: &mut App, code: KeyCode) {
    key_with(app, code, KeyModifiers::NONE);
}

fn key_with(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    app.update(Msg::Key(KeyEvent::new(code, modifiers))).unwrap();
}

fn type_str(app: &mut App, text: &str) {
    for ch in text.chars() {
        key(app, KeyCode::Char(ch));
    }
}

fn render(app: &mut App) -> (Terminal<TestBackend>, String) {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal.draw(|f| app.view(f)).unwrap();
    let screen: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect();
    (terminal, screen)
}

#[test]
fn enter_selects_instead_of_sending() {
    let mut app = app();
    type_str(&mut app, "/m");
    assert!(app.menu_open());

    key(&mut app, KeyCode::Down);
    key(&mut app, KeyCode::Enter);

    assert_eq!(app.composer.text(), "/mod ");
    assert_eq!(app.composer.cursor(), 5);
    assert!(!app.menu_open());
    assert!(app.transcript.is_empty());
}

#[test]
fn enter_sends_when_idle() {
    let mut app = app();
    type_str(&mut app, "hello there");
    assert!(!app.menu_open());

    key(&mut app, KeyCode::Enter);

    assert!(app.composer.is_empty());
    let last = app.transcript.last().unwrap();
    assert_eq!(last.kind, LineKind::Message);
    assert_eq!(last.author, "you");
    assert_eq!(last.body, "hello there");
}

#[test]
fn escape_then_enter_sends_raw_text() {
    let mut app = app();
    type_str(&mut app, "@al");
    assert!(app.menu_open());

    key(&mut app, KeyCode::Esc);
    assert!(!app.menu_open());
    assert_eq!(app.composer.text(), "@al");

    key(&mut app, KeyCode::Enter);
    assert_eq!(app.transcript.last().unwrap().body, "@al");
}

#[test]
fn completing_a_mention_then_sending() {
    let mut app = app();
    type_str(&mut app, "hi @ca");
    key(&mut app, KeyCode::Tab);
    assert_eq!(app.composer.text(), "hi @carol ");
    assert!(!app.menu_open());

    type_str(&mut app, "o/");
    key(&mut app, KeyCode::Enter);
    assert_eq!(app.transcript.last().unwrap().body, "hi @carol o/");
}

#[test]
fn caret_move_reopens_menu() {
    let mut app = app();
    type_str(&mut app, "@b x");
    assert!(!app.menu_open());

    key(&mut app, KeyCode::Left);
    key(&mut app, KeyCode::Left);
    assert!(app.menu_open());
    assert_eq!(app.engine().active().unwrap().trigger().query, "b");
}

#[test]
fn restricted_mode_drops_slash_commands() {
    let mut app = app();
    key_with(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
    assert_eq!(app.mode, InputMode::Restricted);

    type_str(&mut app, "/m");
    assert!(!app.menu_open());

    key(&mut app, KeyCode::Backspace);
    key(&mut app, KeyCode::Backspace);
    type_str(&mut app, "@b");
    assert!(app.menu_open());

    key_with(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
    assert_eq!(app.mode, InputMode::Open);
    assert!(!app.menu_open(), "registry swap closes the menu");
    assert_eq!(app.composer.text(), "@b");
}

#[test]
fn menu_renders_above_composer() {
    let mut app = app();
    type_str(&mut app, "/m");
    let (_terminal, screen) = render(&mut app);

    assert!(screen.contains("CHAT"));
    assert!(screen.contains("/me"));
    assert!(screen.contains("/mute"));

    let view = app.menu_view().unwrap();
    assert_eq!(view.entries.len(), 3);
    assert_eq!(view.area.y + view.area.height, 20);
}

#[test]
fn clicking_a_menu_row_commits_it() {
    let mut app = app();
    type_str(&mut app, "/m");
    render(&mut app);

    let view = app.menu_view().unwrap().clone();
    let row = view.area.y + 2;
    let column = view.area.x + 2;

    app.update(Msg::Mouse(MouseEvent {
        kind: MouseEventKind::Moved,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }))
    .unwrap();
    assert_eq!(app.engine().active().unwrap().selected(), 1);

    app.update(Msg::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }))
    .unwrap();
    assert_eq!(app.composer.text(), "/mod ");
    assert!(!app.menu_open());
}

#[test]
fn toolbar_shortcut_inserts_marker() {
    let mut app = app();
    type_str(&mut app, "hey");
    key_with(&mut app, KeyCode::Char('2'), KeyModifiers::ALT);

    assert_eq!(app.composer.text(), "hey @");
    assert_eq!(app.composer.cursor(), 5);
    assert!(app.menu_open());
    assert_eq!(app.engine().active().unwrap().enhancer_id(), "mention");
}

#[test]
fn slash_commands_run_locally() {
    let mut app = app();
    type_str(&mut app, "/me waves");
    key(&mut app, KeyCode::Enter);
    let last = app.transcript.last().unwrap();
    assert_eq!(last.kind, LineKind::Action);
    assert_eq!(last.body, "waves");

    type_str(&mut app, "/nope");
    key(&mut app, KeyCode::Enter);
    assert_eq!(
        app.notifications.back().map(String::as_str),
        Some("unknown command: /nope")
    );

    type_str(&mut app, "/clear");
    key(&mut app, KeyCode::Esc);
    key(&mut app, KeyCode::Enter);
    assert!(app.transcript.is_empty());
}

#[test]
fn bad_config_reload_keeps_registry() {
    let mut app = app();
    let before: Vec<String> = app
        .engine()
        .registry()
        .ids()
        .into_iter()
        .map(String::from)
        .collect();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[composer]\nenhancers = [\"hashtag\"]\n")
        .unwrap();
    app.update(Msg::ConfigChanged(file.path().to_path_buf()))
        .unwrap();

    assert!(
        app.notifications
            .back()
            .is_some_and(|n| n.starts_with("config error"))
    );
    assert_eq!(app.engine().registry().ids(), before);
}

#[test]
fn config_reload_rebuilds_registry() {
    let mut app = app();
    type_str(&mut app, "/m");
    assert!(app.menu_open());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[composer]\nenhancers = [\"mention\"]\nmenu_rows = 2\n")
        .unwrap();
    app.update(Msg::ConfigChanged(file.path().to_path_buf()))
        .unwrap();

    assert!(!app.menu_open());
    assert_eq!(app.composer.text(), "/m");
    assert_eq!(app.engine().registry().ids(), vec!["mention"]);
    assert_eq!(app.config.composer.menu_rows, 2);
}

#[test]
fn caret_lands_after_wide_emote() {
    let mut app = app();
    type_str(&mut app, ":tada");
    key(&mut app, KeyCode::Enter);
    assert_eq!(app.composer.text(), "🎉 ");
    assert_eq!(app.composer.cursor(), 2);

    let (mut terminal, _) = render(&mut app);
    let cursor = terminal.get_cursor_position().unwrap();
    // Border, then two cells of glyph and one of space.
    assert_eq!((cursor.x, cursor.y), (4, 21));
}

#[test]
fn click_after_commit_in_same_batch_is_ignored() {
    let mut app = app();
    type_str(&mut app, "/m");
    render(&mut app);
    let view = app.menu_view().unwrap().clone();

    key(&mut app, KeyCode::Enter);
    assert_eq!(app.composer.text(), "/me ");
    assert!(app.menu_view().is_none());

    app.update(Msg::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: view.area.x + 2,
        row: view.area.y + 2,
        modifiers: KeyModifiers::NONE,
    }))
    .unwrap();
    assert_eq!(app.composer.text(), "/me ");
}
