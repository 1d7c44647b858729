use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::error::EnhancerError;
use super::trigger::{Anchor, Edit, Trigger};
use super::{Enhancer, Hint, Label};

/// Object-safe view of an [`Enhancer`] with its item type erased.
///
/// The typed items live inside the returned [`Matched`], so every call back
/// into the enhancer still goes through its own `apply`/`render`.
pub trait Probe {
    fn id(&self) -> &str;
    fn hint(&self) -> Hint;
    fn marker(&self) -> Option<(char, Anchor)>;

    /// Detect and resolve in one pass. `Ok(None)` when there is no trigger or
    /// the candidate list is empty.
    fn probe(&self, text: &str, caret: usize) -> Result<Option<Box<dyn Matched>>, EnhancerError>;
}

/// A non-empty candidate list bound to the trigger that produced it.
pub trait Matched {
    fn trigger(&self) -> &Trigger;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn label(&self, index: usize) -> Option<Label>;
    fn apply(&self, index: usize, text: &str, caret: usize) -> Result<Edit, EnhancerError>;
}

/// Row text shown in place of a candidate whose renderer failed.
pub const RENDER_FALLBACK: &str = "\u{fffd}";

struct Registered<E: Enhancer> {
    inner: Arc<E>,
}

struct Candidates<E: Enhancer> {
    enhancer: Arc<E>,
    trigger: Trigger,
    items: Vec<E::Item>,
}

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Whether the current thread is running an enhancer callback whose panic
/// will be caught. A panic hook uses this to log instead of tearing down.
pub fn panic_is_contained() -> bool {
    GUARD_DEPTH.with(|depth| depth.get() > 0)
}

fn guarded<T>(
    id: &str,
    stage: &'static str,
    f: impl FnOnce() -> Result<T, EnhancerError>,
) -> Result<T, EnhancerError> {
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = catch_unwind(AssertUnwindSafe(f));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    result.unwrap_or_else(|_| {
        Err(EnhancerError::Panicked {
            id: id.to_string(),
            stage,
        })
    })
}

impl<E> Probe for Registered<E>
where
    E: Enhancer + 'static,
    E::Item: 'static,
{
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn hint(&self) -> Hint {
        self.inner.hint()
    }

    fn marker(&self) -> Option<(char, Anchor)> {
        self.inner.marker()
    }

    fn probe(&self, text: &str, caret: usize) -> Result<Option<Box<dyn Matched>>, EnhancerError> {
        let id = self.inner.id();

        let Some(trigger) = guarded(id, "detect", || self.inner.detect(text, caret))? else {
            return Ok(None);
        };

        let items = guarded(id, "resolve", || self.inner.resolve(&trigger.query))?;
        if items.is_empty() {
            return Ok(None);
        }

        Ok(Some(Box::new(Candidates {
            enhancer: Arc::clone(&self.inner),
            trigger,
            items,
        })))
    }
}

impl<E> Matched for Candidates<E>
where
    E: Enhancer + 'static,
    E::Item: 'static,
{
    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn label(&self, index: usize) -> Option<Label> {
        let item = self.items.get(index)?;
        let id = self.enhancer.id();

        match guarded(id, "render", || Ok(self.enhancer.render(item))) {
            Ok(label) => Some(label),
            Err(err) => {
                tracing::warn!("{err}");
                Some(Label::new(RENDER_FALLBACK))
            }
        }
    }

    fn apply(&self, index: usize, text: &str, caret: usize) -> Result<Edit, EnhancerError> {
        let id = self.enhancer.id();
        let item = self.items.get(index).ok_or(EnhancerError::OutOfBounds {
            offset: index,
            len: self.items.len(),
        })?;

        guarded(id, "apply", || {
            self.enhancer.apply(item, &self.trigger, text, caret)
        })
    }
}

/// Ordered set of enhancers. Earlier registrations win when several match.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Vec<Arc<dyn Probe>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an enhancer at the lowest priority so far.
    pub fn with<E>(mut self, enhancer: E) -> Self
    where
        E: Enhancer + 'static,
        E::Item: 'static,
    {
        self.push(enhancer);
        self
    }

    pub fn push<E>(&mut self, enhancer: E)
    where
        E: Enhancer + 'static,
        E::Item: 'static,
    {
        if self.get(enhancer.id()).is_some() {
            tracing::warn!(id = enhancer.id(), "duplicate enhancer id registered");
        }
        self.entries.push(Arc::new(Registered {
            inner: Arc::new(enhancer),
        }));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Probe>> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Probe>> {
        self.entries.iter()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.ids())
            .finish()
    }
}
