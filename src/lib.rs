//! # threaded-hsm: Hierarchical State Machine Runtime
//!
//! An event-driven **hierarchical state machine** (HSM) engine for
//! applications that want to declare nested machines with guards, actions,
//! composite states, and orthogonal regions, and have them driven from a
//! queue on a dedicated thread.
//!
//! ## Design Philosophy
//!
//! - **Hierarchy by ownership:** a composite owns its sub-states outright.
//!   Unhandled events bubble from the innermost active state to its
//!   ancestors as the dispatch recursion unwinds, with no parent pointers and no
//!   reference cycles.
//! - **Identity, not names:** transitions are keyed by [`StateId`], a stable
//!   handle assigned at registration. Names exist for diagnostics only.
//! - **Closures at the edges:** guards and actions are plain closures
//!   carried by the [`Transition`] record; the engine never needs to know
//!   application types.
//! - **One thread, no locks:** every hook, guard, and action runs on the
//!   dispatch thread. The only cross-thread contact point is the
//!   [`EventQueue`], which producers may push from anywhere.
//! - **Keep running:** event-domain faults (no matching transition, rejected
//!   guard, unhandled event) are reported to the diagnostic sink and
//!   dispatch continues.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use threaded_hsm::{Event, EventQueue, Hsm, NoopState, StateMachine, Transition};
//!
//! const PLUG_IN: u32 = 1;
//! const FULL: u32 = 2;
//!
//! let queue = Arc::new(EventQueue::new());
//!
//! let mut charger = StateMachine::new("charger", queue.clone());
//! let idle = charger.add_state("idle", NoopState);
//! let charging = charger.add_state("charging", NoopState);
//! let done = charger.add_state("done", NoopState);
//! charger.add(Transition::new(idle, PLUG_IN, charging))?;
//! charger.add(Transition::new(charging, FULL, done))?;
//! charger.set_start(idle)?;
//! charger.set_stop(done)?;
//!
//! // the machine now lives on its own thread
//! let mut hsm = Hsm::start(charger)?;
//! hsm.push(Event::new(PLUG_IN));
//! hsm.push(Event::new(FULL));
//!
//! // reaching the stop state winds the loop down
//! hsm.wait()?;
//! # Ok::<(), threaded_hsm::Error>(())
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! build (add states / transitions) → Hsm::start (enter, loop launches)
//!     → running (dequeue / dispatch) → stop state reached or Hsm::stop
//!     → exit hooks, queue stopped, thread joined
//! ```
//!
//! Composing a machine into a parent ([`StateMachine::add_machine`]) or
//! starting it moves it, so the transition table is frozen and a machine
//! cannot be started twice: the type system enforces what would otherwise
//! be runtime lifecycle errors.
//!
//! ## Examples
//!
//! See the `demos/` directory for complete programs:
//! - `player.rs`: a nested playback machine driven on its own thread
//! - `jukebox.rs`: orthogonal playback/lighting regions sharing one queue

mod diag;
mod error;
mod event;
mod machine;
mod orthogonal;
mod policy;
mod queue;
mod state;
mod transition;

pub use diag::{DiagnosticSink, LogSink, MemorySink, Severity};
pub use error::Error;
pub use event::{Event, EventId};
pub use machine::{Machine, Outcome, StateMachine};
pub use orthogonal::Orthogonal;
pub use policy::{DispatchLoop, ExecutionPolicy, Hsm, InlinePolicy, ThreadPolicy};
pub use queue::EventQueue;
pub use state::{NoopState, StateHandler, StateId};
pub use transition::{Transition, TransitionTable};
