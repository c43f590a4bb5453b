//! Orthogonal composition: two machines running side by side.

use crate::diag::{DiagnosticSink, Severity};
use crate::error::Error;
use crate::event::{Event, EventId};
use crate::machine::{Machine, Outcome, StateMachine};
use crate::queue::EventQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Two child machines that logically run in parallel.
///
/// Both children share the dispatch thread of the enclosing root; there is
/// no true parallelism between them. Events are routed by recognition: the
/// first child gets the event if it (or anything nested inside it)
/// recognizes the id, otherwise the second child is tried, otherwise the
/// event bubbles to the enclosing machine.
///
/// When *both* children recognize an event, only the first child receives
/// it. Order the children accordingly when their event domains overlap.
///
/// Entry runs the first child, then the second; exit mirrors that in
/// reverse. The composition counts as finished once both children have
/// stopped.
pub struct Orthogonal {
    name: String,
    sink: Arc<dyn DiagnosticSink>,
    first: StateMachine,
    second: StateMachine,
    active: bool,
    interrupt: Arc<AtomicBool>,
}

impl Orthogonal {
    /// Composes two machines. Both should have been built against the same
    /// event queue as the enclosing root.
    pub fn new(name: impl Into<String>, first: StateMachine, second: StateMachine) -> Self {
        let sink = first.sink();
        Orthogonal {
            name: name.into(),
            sink,
            first,
            second,
            active: false,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn first(&self) -> &StateMachine {
        &self.first
    }

    pub fn second(&self) -> &StateMachine {
        &self.second
    }
}

impl Machine for Orthogonal {
    fn name(&self) -> &str {
        &self.name
    }

    fn enter(&mut self) {
        if self.active {
            return;
        }
        self.interrupt.store(false, Ordering::SeqCst);
        self.sink.write_line(
            Severity::Info,
            &format!(
                "[{}] entering regions `{}`, `{}`",
                self.name,
                self.first.name(),
                self.second.name()
            ),
        );
        self.first.enter();
        self.second.enter();
        self.active = true;
    }

    fn exit(&mut self) {
        if !self.active {
            return;
        }
        self.second.exit();
        self.first.exit();
        self.active = false;
        self.interrupt.store(true, Ordering::SeqCst);
        self.sink
            .write_line(Severity::Info, &format!("[{}] exited", self.name));
    }

    fn execute(&mut self, event: &Event) -> Outcome {
        if !self.active {
            return Outcome::Unhandled;
        }
        if self.first.recognizes(event.id()) {
            return self.first.execute(event);
        }
        if self.second.recognizes(event.id()) {
            return self.second.execute(event);
        }
        Outcome::Unhandled
    }

    fn is_running(&self) -> bool {
        self.active && (self.first.is_running() || self.second.is_running())
    }

    fn recognizes(&self, event: EventId) -> bool {
        self.first.recognizes(event) || self.second.recognizes(event)
    }

    fn validate(&self) -> Result<(), Error> {
        self.first.validate()?;
        self.second.validate()
    }

    fn queue(&self) -> &Arc<EventQueue> {
        self.first.queue()
    }

    fn sink(&self) -> Arc<dyn DiagnosticSink> {
        Arc::clone(&self.sink)
    }

    fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }
}
