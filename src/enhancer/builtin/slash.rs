use serde::Deserialize;

use crate::enhancer::error::EnhancerError;
use crate::enhancer::trigger::{Anchor, Edit, Trigger, prefix_filter, scan_marker, splice};
use crate::enhancer::{Enhancer, Hint, Label};

pub const ID: &str = "slash";
const MARKER: char = '/';

/// A chat command offered after a leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Argument synopsis shown next to the name, e.g. `<user> [reason]`.
    #[serde(default)]
    pub usage: Option<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            usage: None,
        }
    }
}

/// Slash-command completion. Only triggers when `/` opens the message.
#[derive(Debug, Clone)]
pub struct SlashCommands {
    commands: Vec<CommandSpec>,
    max_items: usize,
}

impl SlashCommands {
    pub fn new(commands: Vec<CommandSpec>, max_items: usize) -> Self {
        Self {
            commands,
            max_items,
        }
    }
}

impl Enhancer for SlashCommands {
    type Item = CommandSpec;

    fn id(&self) -> &str {
        ID
    }

    fn hint(&self) -> Hint {
        Hint::new(MARKER, "command")
    }

    fn marker(&self) -> Option<(char, Anchor)> {
        Some((MARKER, Anchor::Start))
    }

    fn detect(&self, text: &str, caret: usize) -> Result<Option<Trigger>, EnhancerError> {
        Ok(scan_marker(text, caret, MARKER, Anchor::Start))
    }

    fn resolve(&self, query: &str) -> Result<Vec<Self::Item>, EnhancerError> {
        Ok(
            prefix_filter(&self.commands, query, self.max_items, |cmd| cmd.name.as_str())
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
        let replacement = format!("{MARKER}{} ", item.name);
        splice(text, trigger.start, caret, &replacement, None)
    }

    fn render(&self, item: &Self::Item) -> Label {
        let text = match &item.usage {
            Some(usage) => format!("{MARKER}{} {usage}", item.name),
            None => format!("{MARKER}{}", item.name),
        };
        match &item.description {
            Some(description) => Label::new(text).with_detail(description.clone()),
            None => Label::new(text),
        }
    }
}
