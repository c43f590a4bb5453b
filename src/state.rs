//! State identities and the protocol application states implement.

use crate::event::Event;
use std::fmt;

/// Stable handle of a registered state.
///
/// Ids are assigned in registration order and are machine-local, so they are
/// deterministic across runs. Two states with the same name remain distinct;
/// the transition table is keyed by id, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    pub(crate) fn from_index(index: usize) -> Self {
        StateId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// The raw registration index.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behavior hooks of a leaf state.
///
/// The enclosing machine calls [`on_entry`](StateHandler::on_entry) when a
/// transition makes the state active, [`on_exit`](StateHandler::on_exit) when
/// the state is left (via a transition or the machine shutting down), and
/// [`on_event`](StateHandler::on_event) for every event dispatched while the
/// state is the active leaf, before the transition table is consulted.
///
/// All hooks default to no-ops; most states only care about a subset. Every
/// hook runs on the dispatch thread, so implementations need `Send` but no
/// internal locking.
pub trait StateHandler: Send {
    fn on_entry(&mut self) {}

    fn on_exit(&mut self) {}

    fn on_event(&mut self, _event: &Event) {}
}

/// A leaf state with no behavior of its own.
///
/// Useful when everything interesting happens in transition actions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopState;

impl StateHandler for NoopState {}
