use ropey::Rope;

use super::error::EnhancerError;

/// Where a completion search applies: the char offset of the marker and the
/// (lower-cased) query typed between the marker and the caret.
///
/// Only valid for the `(text, caret)` pair that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub start: usize,
    pub query: String,
}

/// Placement constraint for a marker character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Marker must be the first char of the text.
    Start,
    /// Marker must open the text or follow whitespace.
    WordBoundary,
    Anywhere,
}

impl Anchor {
    fn accepts(self, chars: &[char], marker_idx: usize) -> bool {
        match self {
            Anchor::Start => marker_idx == 0,
            Anchor::WordBoundary => marker_idx == 0 || chars[marker_idx - 1].is_whitespace(),
            Anchor::Anywhere => true,
        }
    }
}

/// A proposed buffer rewrite. The composer commits `value` and `cursor_pos`
/// together; `cursor_pos` is a char offset into `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub value: String,
    pub cursor_pos: usize,
}

impl Edit {
    pub fn new(value: impl Into<String>, cursor_pos: usize) -> Self {
        Self {
            value: value.into(),
            cursor_pos,
        }
    }

    /// Clamp `cursor_pos` into `[0, value.chars().count()]`.
    pub fn clamped(mut self) -> Self {
        let len = self.value.chars().count();
        if self.cursor_pos > len {
            tracing::warn!(
                cursor_pos = self.cursor_pos,
                len,
                "edit cursor out of bounds, clamping"
            );
            self.cursor_pos = len;
        }
        self
    }
}

/// Scan backward from `caret` for `marker`. Whitespace between the marker and
/// the caret closes the region.
pub fn scan_marker(text: &str, caret: usize, marker: char, anchor: Anchor) -> Option<Trigger> {
    let chars: Vec<char> = text.chars().collect();
    if caret > chars.len() {
        return None;
    }

    let mut idx = caret;
    while idx > 0 {
        let ch = chars[idx - 1];
        if ch == marker {
            let start = idx - 1;
            if !anchor.accepts(&chars, start) {
                return None;
            }
            let query: String = chars[idx..caret].iter().collect();
            return Some(Trigger {
                start,
                query: query.to_lowercase(),
            });
        }
        if ch.is_whitespace() {
            return None;
        }
        idx -= 1;
    }

    None
}

/// Replace chars `[start, caret)` of `text` with `replacement`.
///
/// The cursor lands `cursor_in_replacement` chars into the replacement, or at
/// its end when `None`.
pub fn splice(
    text: &str,
    start: usize,
    caret: usize,
    replacement: &str,
    cursor_in_replacement: Option<usize>,
) -> Result<Edit, EnhancerError> {
    let mut rope = Rope::from_str(text);
    let len = rope.len_chars();
    if caret > len {
        return Err(EnhancerError::OutOfBounds { offset: caret, len });
    }
    if start > caret {
        return Err(EnhancerError::OutOfBounds {
            offset: start,
            len: caret,
        });
    }

    rope.remove(start..caret);
    rope.insert(start, replacement);

    let inserted = replacement.chars().count();
    let within = cursor_in_replacement.unwrap_or(inserted).min(inserted);

    Ok(Edit {
        value: rope.to_string(),
        cursor_pos: start + within,
    })
}

/// Insert `marker` at `caret`, padding with a space when the anchor needs a
/// word boundary and the caret sits right after a non-space char.
pub fn insert_marker(
    text: &str,
    caret: usize,
    marker: char,
    anchor: Anchor,
) -> Result<Edit, EnhancerError> {
    let len = text.chars().count();
    if caret > len {
        return Err(EnhancerError::OutOfBounds { offset: caret, len });
    }

    match anchor {
        // Start-anchored markers only make sense at offset 0, whatever the caret.
        Anchor::Start => {
            if text.starts_with(marker) {
                return Ok(Edit::new(text, 1));
            }
            splice(text, 0, 0, &marker.to_string(), None)
        }
        Anchor::WordBoundary => {
            let needs_space = caret > 0
                && text
                    .chars()
                    .nth(caret - 1)
                    .is_some_and(|prev| !prev.is_whitespace());
            let insert = if needs_space {
                format!(" {marker}")
            } else {
                marker.to_string()
            };
            splice(text, caret, caret, &insert, None)
        }
        Anchor::Anywhere => splice(text, caret, caret, &marker.to_string(), None),
    }
}

/// Case-insensitive prefix filter preserving input order, capped at `limit`.
pub fn prefix_filter<'a, T, F>(items: &'a [T], query: &str, limit: usize, key: F) -> Vec<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| key(item).to_lowercase().starts_with(&needle))
        .take(limit)
        .collect()
}
