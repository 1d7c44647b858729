use crate::enhancer::error::EnhancerError;
use crate::enhancer::trigger::{Anchor, Edit, Trigger, prefix_filter, scan_marker, splice};
use crate::enhancer::{Enhancer, Hint, Label};

pub const ID: &str = "mention";
const MARKER: char = '@';

/// `@name` completion over the known participants.
#[derive(Debug, Clone)]
pub struct Mentions {
    users: Vec<String>,
    max_items: usize,
}

impl Mentions {
    pub fn new(users: Vec<String>, max_items: usize) -> Self {
        Self { users, max_items }
    }
}

impl Enhancer for Mentions {
    type Item = String;

    fn id(&self) -> &str {
        ID
    }

    fn hint(&self) -> Hint {
        Hint::new(MARKER, "mention")
    }

    fn marker(&self) -> Option<(char, Anchor)> {
        Some((MARKER, Anchor::WordBoundary))
    }

    fn detect(&self, text: &str, caret: usize) -> Result<Option<Trigger>, EnhancerError> {
        Ok(scan_marker(text, caret, MARKER, Anchor::WordBoundary))
    }

    fn resolve(&self, query: &str) -> Result<Vec<Self::Item>, EnhancerError> {
        Ok(
            prefix_filter(&self.users, query, self.max_items, String::as_str)
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
        splice(text, trigger.start, caret, &format!("{MARKER}{item} "), None)
    }

    fn render(&self, item: &Self::Item) -> Label {
        Label::new(format!("{MARKER}{item}"))
    }
}
