use serde::Deserialize;

use crate::enhancer::error::EnhancerError;
use crate::enhancer::trigger::{Anchor, Edit, Trigger, prefix_filter, scan_marker, splice};
use crate::enhancer::{Enhancer, Hint, Label};

pub const ID: &str = "emote";
const MARKER: char = ':';

/// Shortcode -> glyph pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Emote {
    pub code: String,
    pub glyph: String,
}

/// `:shortcode` completion. Needs `min_query` chars so a lone colon in prose
/// does not open a menu.
#[derive(Debug, Clone)]
pub struct Emotes {
    emotes: Vec<Emote>,
    min_query: usize,
    max_items: usize,
}

impl Emotes {
    pub fn new(emotes: Vec<Emote>, min_query: usize, max_items: usize) -> Self {
        Self {
            emotes,
            min_query,
            max_items,
        }
    }
}

impl Enhancer for Emotes {
    type Item = Emote;

    fn id(&self) -> &str {
        ID
    }

    fn hint(&self) -> Hint {
        Hint::new(MARKER, "emote")
    }

    fn marker(&self) -> Option<(char, Anchor)> {
        Some((MARKER, Anchor::WordBoundary))
    }

    fn detect(&self, text: &str, caret: usize) -> Result<Option<Trigger>, EnhancerError> {
        Ok(scan_marker(text, caret, MARKER, Anchor::WordBoundary)
            .filter(|trigger| trigger.query.chars().count() >= self.min_query))
    }

    fn resolve(&self, query: &str) -> Result<Vec<Self::Item>, EnhancerError> {
        Ok(
            prefix_filter(&self.emotes, query, self.max_items, |emote| emote.code.as_str())
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    fn apply(
        &self,
        item: &Self::Item,
        trigger: &Trigger,
        text: &str,
        caret: usize,
    ) -> Result<Edit, EnhancerError> {
        splice(text, trigger.start, caret, &format!("{} ", item.glyph), None)
    }

    fn render(&self, item: &Self::Item) -> Label {
        Label::new(format!("{} {MARKER}{}{MARKER}", item.glyph, item.code))
    }
}
