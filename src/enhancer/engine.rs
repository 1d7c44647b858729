use super::registry::{Matched, Registry};
use super::trigger::{self, Edit, Trigger};
use super::{Hint, Label};

/// Keys the engine intercepts while a menu is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

/// Result of routing a key through the engine.
///
/// The host runs its own handling (e.g. Enter-to-send) only on `Ignored`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Consumed,
    Commit(Edit),
}

/// How the engine reacts to caret moves that do not change the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionPolicy {
    /// Re-run detection on caret-only moves. When false, a caret move closes
    /// any open menu instead.
    pub on_caret_move: bool,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            on_caret_move: true,
        }
    }
}

/// An open completion menu.
pub struct ActiveMenu {
    enhancer_id: String,
    hint: Hint,
    matched: Box<dyn Matched>,
    selected: usize,
}

impl ActiveMenu {
    pub fn enhancer_id(&self) -> &str {
        &self.enhancer_id
    }

    pub fn hint(&self) -> &Hint {
        &self.hint
    }

    pub fn trigger(&self) -> &Trigger {
        self.matched.trigger()
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn labels(&self) -> Vec<Label> {
        (0..self.matched.len())
            .filter_map(|idx| self.matched.label(idx))
            .collect()
    }
}

impl std::fmt::Debug for ActiveMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveMenu")
            .field("enhancer_id", &self.enhancer_id)
            .field("trigger", self.trigger())
            .field("len", &self.len())
            .field("selected", &self.selected)
            .finish()
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Active(ActiveMenu),
}

/// Active-enhancer state machine.
///
/// Holds the registry, the menu state and the `(text, caret)` pair the state
/// was computed for. It never writes to the composer: selections come back as
/// [`Edit`]s for the host to commit.
#[derive(Debug)]
pub struct Engine {
    registry: Registry,
    policy: DetectionPolicy,
    state: State,
    text: String,
    caret: usize,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            policy: DetectionPolicy::default(),
            state: State::Idle,
            text: String::new(),
            caret: 0,
        }
    }

    pub fn with_policy(mut self, policy: DetectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DetectionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DetectionPolicy) {
        self.policy = policy;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Swap the whole enhancer set. Always returns to idle.
    pub fn replace_registry(&mut self, registry: Registry) {
        tracing::debug!(enhancers = ?registry.ids(), "enhancer registry replaced");
        self.registry = registry;
        self.close();
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveMenu> {
        match &self.state {
            State::Active(menu) => Some(menu),
            State::Idle => None,
        }
    }

    /// The buffer changed: re-run detection over the registry.
    pub fn on_change(&mut self, text: &str, caret: usize) {
        self.text = text.to_string();
        self.caret = caret;
        self.state = self.detect();
    }

    /// The caret moved without a text change.
    pub fn on_caret_move(&mut self, text: &str, caret: usize) {
        if self.policy.on_caret_move {
            self.on_change(text, caret);
        } else {
            self.text = text.to_string();
            self.caret = caret;
            self.close();
        }
    }

    pub fn handle_key(&mut self, key: NavKey) -> KeyOutcome {
        let State::Active(menu) = &mut self.state else {
            return KeyOutcome::Ignored;
        };

        let len = menu.len();
        match key {
            NavKey::Down => {
                menu.selected = (menu.selected + 1) % len;
                KeyOutcome::Consumed
            }
            NavKey::Up => {
                menu.selected = (menu.selected + len - 1) % len;
                KeyOutcome::Consumed
            }
            NavKey::Enter | NavKey::Tab => {
                let index = menu.selected;
                self.commit(index)
            }
            NavKey::Escape => {
                self.close();
                KeyOutcome::Consumed
            }
        }
    }

    /// Pointer selection. Same transition as Enter on `index`.
    pub fn select(&mut self, index: usize) -> KeyOutcome {
        let in_range = self.active().is_some_and(|menu| index < menu.len());
        if !in_range {
            return KeyOutcome::Ignored;
        }
        self.commit(index)
    }

    /// Highlight `index` without committing (mouse hover).
    pub fn highlight(&mut self, index: usize) -> bool {
        match &mut self.state {
            State::Active(menu) if index < menu.len() => {
                let changed = menu.selected != index;
                menu.selected = index;
                changed
            }
            _ => false,
        }
    }

    /// Hints for every registered enhancer that has a marker, in priority order.
    pub fn toolbar(&self) -> Vec<(String, Hint)> {
        self.registry
            .iter()
            .filter(|entry| entry.marker().is_some())
            .map(|entry| (entry.id().to_string(), entry.hint()))
            .collect()
    }

    /// Toolbar action: insert the marker of `enhancer_id` at the caret.
    pub fn insert_marker(&self, enhancer_id: &str) -> Option<Edit> {
        let entry = self.registry.get(enhancer_id)?;
        let (marker, anchor) = entry.marker()?;

        match trigger::insert_marker(&self.text, self.caret, marker, anchor) {
            Ok(edit) => Some(edit.clamped()),
            Err(err) => {
                tracing::warn!("toolbar insert for {enhancer_id} failed: {err}");
                None
            }
        }
    }

    fn commit(&mut self, index: usize) -> KeyOutcome {
        let State::Active(menu) = std::mem::take(&mut self.state) else {
            return KeyOutcome::Ignored;
        };

        match menu.matched.apply(index, &self.text, self.caret) {
            Ok(edit) => {
                let edit = edit.clamped();
                tracing::debug!(
                    enhancer = %menu.enhancer_id,
                    cursor_pos = edit.cursor_pos,
                    "completion applied"
                );
                KeyOutcome::Commit(edit)
            }
            Err(err) => {
                tracing::warn!("{err}");
                KeyOutcome::Consumed
            }
        }
    }

    fn close(&mut self) {
        if let State::Active(menu) = std::mem::take(&mut self.state) {
            tracing::debug!(enhancer = %menu.enhancer_id, "menu closed");
        }
    }

    fn detect(&self) -> State {
        for entry in self.registry.iter() {
            match entry.probe(&self.text, self.caret) {
                Ok(Some(matched)) => {
                    tracing::debug!(
                        enhancer = entry.id(),
                        query = %matched.trigger().query,
                        items = matched.len(),
                        "menu active"
                    );
                    return State::Active(ActiveMenu {
                        enhancer_id: entry.id().to_string(),
                        hint: entry.hint(),
                        matched,
                        selected: 0,
                    });
                }
                Ok(None) => {}
                Err(err) => tracing::warn!("skipping enhancer: {err}"),
            }
        }

        State::Idle
    }
}
