use crossterm::event::{KeyEvent, MouseEvent};
use std::path::PathBuf;

/// Direction for caret movement inside the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    LineStart,
    LineEnd,
}

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),

    // -- Composer operations
    InsertChar(char),
    DeleteChar,
    MoveCursor(Direction),
    Send,

    // -- Enhancers
    ToggleRestricted,
    ToolbarInsert(String),
    ConfigChanged(PathBuf),

    // -- System
    Quit,
}
