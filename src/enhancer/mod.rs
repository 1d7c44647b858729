//! Input enhancement: trigger detection, candidate menus and completion edits
//! for the single-line message composer.

pub mod builtin;
pub mod engine;
pub mod error;
pub mod menu;
pub mod registry;
pub mod trigger;

pub use engine::{DetectionPolicy, Engine, KeyOutcome, NavKey};
pub use error::EnhancerError;
pub use menu::{MenuPresenter, MenuView};
pub use registry::Registry;
pub use trigger::{Anchor, Edit, Trigger};

/// Presentation hint for an enhancer: shown in the status bar while its menu
/// is open and in the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub icon: char,
    pub label: String,
}

impl Hint {
    pub fn new(icon: char, label: impl Into<String>) -> Self {
        Self {
            icon,
            label: label.into(),
        }
    }
}

/// Render output for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub detail: Option<String>,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// One pluggable completion behavior.
///
/// Every method must be a pure function of its arguments: the engine probes
/// all registered enhancers on each keystroke and may call `detect` on
/// enhancers that never become active.
pub trait Enhancer {
    /// Candidate type produced by `resolve` and consumed by `apply`/`render`.
    type Item;

    /// Stable identifier, unique within a registry.
    fn id(&self) -> &str;

    fn hint(&self) -> Hint;

    /// Marker inserted by the toolbar action, if the enhancer has one.
    fn marker(&self) -> Option<(char, Anchor)> {
        None
    }

    fn detect(&self, text: &str, caret: usize) -> Result<Option<Trigger>, EnhancerError>;

    fn resolve(&self, query: &str) -> Result<Vec<Self::Item>, EnhancerError>;

    /// Replace `[trigger.start, caret)` of `text` with the completion for `item`.
    fn apply(
        &self,
        item: &Self::Item,
        trigger: &Trigger,
        text: &str,
        caret: usize,
    ) -> Result<Edit, EnhancerError>;

    fn render(&self, item: &Self::Item) -> Label;
}
