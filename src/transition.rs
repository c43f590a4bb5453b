//! Transition records and the per-machine transition table.

use crate::event::{Event, EventId};
use crate::state::StateId;
use ahash::{AHashMap, AHashSet};

/// Predicate evaluated before a transition fires. Must be side-effect free;
/// returning `false` cancels the transition and leaves the machine where it
/// is.
pub type Guard = Box<dyn Fn(&Event) -> bool + Send>;

/// Callback executed while a transition fires, between the exit hook of the
/// source state and the entry hook of the target. Actions may push follow-up
/// events onto the queue; they take effect on a later loop iteration.
pub type Action = Box<dyn FnMut(&Event) + Send>;

/// One edge of a state machine: `(from, trigger) -> to`, with an optional
/// guard and an optional action.
///
/// A transition whose source and target are the same state is *internal*:
/// firing it runs only the action, never the exit/entry hooks.
///
/// ```rust
/// use threaded_hsm::{StateId, Transition};
/// # fn example(locked: StateId, open: StateId) {
/// const COIN: u32 = 1;
///
/// let t = Transition::new(locked, COIN, open)
///     .with_guard(|event| event.payload_ref::<u32>().copied().unwrap_or(0) >= 25)
///     .with_action(|_event| println!("unlocking"));
/// # let _ = t;
/// # }
/// ```
pub struct Transition {
    from: StateId,
    trigger: EventId,
    to: StateId,
    guard: Option<Guard>,
    action: Option<Action>,
}

impl Transition {
    pub fn new(from: StateId, trigger: impl Into<EventId>, to: StateId) -> Self {
        Transition {
            from,
            trigger: trigger.into(),
            to,
            guard: None,
            action: None,
        }
    }

    pub fn with_guard(mut self, guard: impl Fn(&Event) -> bool + Send + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    pub fn with_action(mut self, action: impl FnMut(&Event) + Send + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn source(&self) -> StateId {
        self.from
    }

    pub fn trigger(&self) -> EventId {
        self.trigger
    }

    pub fn target(&self) -> StateId {
        self.to
    }

    pub fn is_internal(&self) -> bool {
        self.from == self.to
    }

    /// Evaluates the guard. Absent guard means "allow". The machine calls
    /// this before firing so a rejection can be reported without running any
    /// hook.
    pub(crate) fn guard_allows(&self, event: &Event) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard(event))
    }

    pub(crate) fn run_action(&mut self, event: &Event) {
        if let Some(action) = &mut self.action {
            action(event);
        }
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("trigger", &self.trigger)
            .field("to", &self.to)
            .field("guard", &self.guard.is_some())
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Lookup table owned by one machine: `(source state, event) -> transition`.
///
/// Keys use state identity ([`StateId`]), so two states sharing a name stay
/// distinct. Inserting a duplicate key is rejected rather than silently
/// overwritten. The table also tracks the set of event ids it triggers on,
/// which is what the machine reports as its recognized events.
#[derive(Debug, Default)]
pub struct TransitionTable {
    entries: AHashMap<(StateId, EventId), Transition>,
    triggers: AHashSet<EventId>,
}

impl TransitionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a transition; on a duplicate `(from, trigger)` key the
    /// rejected transition is handed back so the caller can name it in its
    /// error.
    pub(crate) fn insert(&mut self, transition: Transition) -> Result<(), Transition> {
        let key = (transition.source(), transition.trigger());
        if self.entries.contains_key(&key) {
            return Err(transition);
        }
        self.triggers.insert(transition.trigger());
        self.entries.insert(key, transition);
        Ok(())
    }

    /// Looks up the transition for `(from, event)`. A miss means the event
    /// should bubble up to the enclosing machine.
    pub(crate) fn lookup_mut(&mut self, from: StateId, event: EventId) -> Option<&mut Transition> {
        self.entries.get_mut(&(from, event))
    }

    /// Whether any transition triggers on this event.
    pub fn recognizes(&self, event: EventId) -> bool {
        self.triggers.contains(&event)
    }

    pub(crate) fn triggers(&self) -> impl Iterator<Item = EventId> + '_ {
        self.triggers.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
