use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Message,
    /// `/me` style action.
    Action,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub kind: LineKind,
    pub author: String,
    pub body: String,
}

impl ChatLine {
    pub fn message(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Message,
            author: author.into(),
            body: body.into(),
        }
    }

    pub fn action(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Action,
            author: author.into(),
            body: body.into(),
        }
    }

    pub fn system(body: impl Into<String>) -> Self {
        Self {
            kind: LineKind::System,
            author: String::new(),
            body: body.into(),
        }
    }
}

/// Bounded, locally-echoed message history.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: VecDeque<ChatLine>,
    max: usize,
}

impl Transcript {
    pub fn new(max: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max: max.max(1),
        }
    }

    pub fn push(&mut self, line: ChatLine) {
        self.lines.push_back(line);
        while self.lines.len() > self.max {
            self.lines.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last(&self) -> Option<&ChatLine> {
        self.lines.back()
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> impl Iterator<Item = &ChatLine> {
        self.lines.iter().skip(self.lines.len().saturating_sub(count))
    }
}
