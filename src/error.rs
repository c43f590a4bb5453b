//! Crate error type.
//!
//! Event-domain faults (no matching transition, rejected guard, unhandled
//! event at the root) are deliberately *not* errors: the machine must stay
//! responsive, so they are logged and dispatch continues. `Error` covers
//! queue interruption and configuration mistakes caught before the loop
//! starts.

use crate::event::EventId;
use crate::state::StateId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The event queue was stopped while a consumer was waiting on it.
    ///
    /// During an orderly shutdown the dispatch loop swallows this and winds
    /// down; surfacing it from [`Hsm::wait`](crate::Hsm::wait) means the
    /// queue was stopped behind the runtime's back.
    #[error("event queue interrupted")]
    Interrupted,

    /// The machine was handed to the runtime without a start state.
    #[error("machine `{0}` has no start state")]
    MissingStart(String),

    /// A transition or terminal configuration referenced an unregistered
    /// state id.
    #[error("machine `{machine}` has no state with id {id}")]
    UnknownState { machine: String, id: StateId },

    /// A second transition was added for the same (state, event) key.
    #[error("machine `{machine}` already has a transition from `{from}` on event {event}")]
    DuplicateTransition {
        machine: String,
        from: String,
        event: EventId,
    },

    /// The execution policy could not launch its dispatch thread.
    #[error("failed to spawn dispatch thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The dispatch thread panicked; the machine state is gone.
    #[error("dispatch thread panicked")]
    DispatchPanic,
}
