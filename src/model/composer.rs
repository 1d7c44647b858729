use ropey::Rope;
use unicode_width::UnicodeWidthStr;

use crate::enhancer::Edit;

/// Single-line message composer backed by a Rope.
///
/// The caret is a char index into the text, never a byte offset.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    rope: Rope,
    cursor: usize,
    /// First char shown when the text is wider than the input field.
    pub scroll: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Insert a character at the caret. Line breaks are dropped.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' || ch == '\r' {
            return false;
        }
        self.rope.insert_char(self.cursor, ch);
        self.cursor += 1;
        true
    }

    /// Backspace.
    pub fn delete_char_before(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.rope.remove(self.cursor - 1..self.cursor);
        self.cursor -= 1;
        true
    }

    /// Delete.
    pub fn delete_char_after(&mut self) -> bool {
        if self.cursor >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(self.cursor..self.cursor + 1);
        true
    }

    /// Delete the word before the caret (Ctrl+W).
    pub fn delete_word_before(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }

        let mut start = self.cursor;
        while start > 0 && self.rope.char(start - 1).is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.rope.char(start - 1).is_whitespace() {
            start -= 1;
        }

        self.rope.remove(start..self.cursor);
        self.cursor = start;
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.move_to(self.cursor.saturating_sub(1))
    }

    pub fn move_right(&mut self) -> bool {
        self.move_to(self.cursor + 1)
    }

    pub fn move_home(&mut self) -> bool {
        self.move_to(0)
    }

    pub fn move_end(&mut self) -> bool {
        self.move_to(self.rope.len_chars())
    }

    /// Move the caret, clamped to the text. Returns whether it moved.
    pub fn move_to(&mut self, cursor: usize) -> bool {
        let next = cursor.min(self.rope.len_chars());
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    /// Replace text and caret together.
    pub fn commit(&mut self, edit: &Edit) {
        self.rope = Rope::from_str(&edit.value);
        self.cursor = edit.cursor_pos.min(self.rope.len_chars());
    }

    /// Clear the composer and return what was in it.
    pub fn take(&mut self) -> String {
        let text = self.text();
        self.rope = Rope::new();
        self.cursor = 0;
        self.scroll = 0;
        text
    }

    /// Keep the caret inside a field `width` cells wide.
    pub fn scroll_to_cursor(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
        // The caret needs one free cell after the text before it.
        while self.scroll < self.cursor && self.cells(self.scroll, self.cursor) >= width {
            self.scroll += 1;
        }
    }

    /// Cell column of the caret relative to the first visible char.
    pub fn cursor_column(&self) -> usize {
        self.cells(self.scroll.min(self.cursor), self.cursor)
    }

    /// The text visible in a field `width` cells wide. A wide char that would
    /// straddle the right edge is left out.
    pub fn visible_text(&self, width: usize) -> String {
        let start = self.scroll.min(self.rope.len_chars());
        let mut used = 0;
        let mut out = String::new();
        for ch in self.rope.slice(start..).chars() {
            let mut buf = [0; 4];
            let cell = ch.encode_utf8(&mut buf).width();
            if used + cell > width {
                break;
            }
            used += cell;
            out.push(ch);
        }
        out
    }

    /// Display width of chars `[start, end)`.
    fn cells(&self, start: usize, end: usize) -> usize {
        self.rope.slice(start..end).to_string().width()
    }
}
