//! The hierarchical state machine and its dispatch core.
//!
//! A [`StateMachine`] is both a state (it can be registered as a child of
//! another machine) and a container of states. Dispatch descends into the
//! active child first; events the child does not handle bubble back up as the
//! recursion unwinds, so a nested machine only enumerates the events it cares
//! about and leaves the rest (a global shutdown event, say) to its ancestors.

use crate::diag::{self, DiagnosticSink, Severity};
use crate::error::Error;
use crate::event::{Event, EventId};
use crate::orthogonal::Orthogonal;
use crate::queue::EventQueue;
use crate::state::{StateHandler, StateId};
use crate::transition::{Transition, TransitionTable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of dispatching one event into a composite.
///
/// `Unhandled` tells the enclosing machine to try its own table; at the top
/// level it means the event is dropped (and reported at ERROR severity by the
/// dispatch loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Unhandled,
}

/// Contract shared by the composite states the engine can drive: state
/// machines and orthogonal compositions.
///
/// The lifecycle mirrors the leaf [`StateHandler`](crate::StateHandler)
/// protocol (enter, dispatch events, exit) plus the wiring the runtime
/// needs to launch a composite as the root of a dispatch loop.
pub trait Machine: Send {
    fn name(&self) -> &str;

    /// Activates the composite: resets to its start configuration and runs
    /// the entry hooks of the initial states.
    fn enter(&mut self);

    /// Deactivates the composite: runs the exit hooks of the active state
    /// chain innermost-first and sets the interrupt flag. Idempotent.
    fn exit(&mut self);

    /// Dispatches one event.
    fn execute(&mut self, event: &Event) -> Outcome;

    /// Whether the composite has been entered and not yet exited.
    fn is_running(&self) -> bool;

    /// Whether this composite (or any machine nested inside it) triggers on
    /// the event. Orthogonal compositions route events by this.
    fn recognizes(&self, event: EventId) -> bool;

    /// Checks the configuration is complete enough to drive.
    fn validate(&self) -> Result<(), Error>;

    fn queue(&self) -> &Arc<EventQueue>;

    fn sink(&self) -> Arc<dyn DiagnosticSink>;

    fn interrupt_handle(&self) -> Arc<AtomicBool>;
}

/// A registered sub-state: a leaf with its handler, a nested machine, or an
/// orthogonal composition.
enum Child {
    Leaf {
        name: String,
        handler: Box<dyn StateHandler>,
    },
    Machine(Box<StateMachine>),
    Region(Box<Orthogonal>),
}

impl Child {
    fn name(&self) -> &str {
        match self {
            Child::Leaf { name, .. } => name,
            Child::Machine(machine) => machine.name(),
            Child::Region(region) => region.name(),
        }
    }

    fn enter(&mut self) {
        match self {
            Child::Leaf { handler, .. } => handler.on_entry(),
            Child::Machine(machine) => machine.enter(),
            Child::Region(region) => region.enter(),
        }
    }

    fn exit(&mut self) {
        match self {
            Child::Leaf { handler, .. } => handler.on_exit(),
            Child::Machine(machine) => machine.exit(),
            Child::Region(region) => region.exit(),
        }
    }

    fn recognizes(&self, event: EventId) -> bool {
        match self {
            Child::Leaf { .. } => false,
            Child::Machine(machine) => machine.recognizes(event),
            Child::Region(region) => region.recognizes(event),
        }
    }
}

/// A hierarchical state machine.
///
/// Built by registering states ([`add_state`](StateMachine::add_state),
/// [`add_machine`](StateMachine::add_machine),
/// [`add_region`](StateMachine::add_region)), populating the transition
/// table with [`add`](StateMachine::add), and picking terminals with
/// [`set_start`](StateMachine::set_start) /
/// [`set_stop`](StateMachine::set_stop). Hand the finished machine to
/// [`Hsm::start`](crate::Hsm::start) to drive it from its own thread, or
/// drive it synchronously through [`Machine::enter`] / [`Machine::execute`].
///
/// Once a machine is composed into a parent or handed to the runtime it is
/// moved, so its table can no longer change and it cannot be entered twice
/// by accident: the lifecycle misuses the dispatch engine would otherwise
/// have to police at runtime are unrepresentable.
pub struct StateMachine {
    name: String,
    queue: Arc<EventQueue>,
    sink: Arc<dyn DiagnosticSink>,
    children: Vec<Child>,
    table: TransitionTable,
    start: Option<StateId>,
    stop: Option<StateId>,
    current: Option<StateId>,
    interrupt: Arc<AtomicBool>,
}

impl StateMachine {
    /// Creates an empty machine. Nested machines receive a clone of the same
    /// queue; only the machine driven as the root ever consumes from it.
    pub fn new(name: impl Into<String>, queue: Arc<EventQueue>) -> Self {
        StateMachine {
            name: name.into(),
            queue,
            sink: diag::default_sink(),
            children: Vec::new(),
            table: TransitionTable::new(),
            start: None,
            stop: None,
            current: None,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Registers a leaf state, returning its id.
    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        handler: impl StateHandler + 'static,
    ) -> StateId {
        self.children.push(Child::Leaf {
            name: name.into(),
            handler: Box::new(handler),
        });
        StateId::from_index(self.children.len() - 1)
    }

    /// Registers a nested machine as a sub-state, returning its id in this
    /// machine.
    pub fn add_machine(&mut self, machine: StateMachine) -> StateId {
        self.children.push(Child::Machine(Box::new(machine)));
        StateId::from_index(self.children.len() - 1)
    }

    /// Registers an orthogonal composition as a sub-state.
    pub fn add_region(&mut self, region: Orthogonal) -> StateId {
        self.children.push(Child::Region(Box::new(region)));
        StateId::from_index(self.children.len() - 1)
    }

    /// Adds a transition to the table.
    ///
    /// Both endpoints must be registered states of this machine, and at most
    /// one transition may exist per `(source, event)` key.
    pub fn add(&mut self, transition: Transition) -> Result<(), Error> {
        self.check_id(transition.source())?;
        self.check_id(transition.target())?;
        if let Err(rejected) = self.table.insert(transition) {
            return Err(Error::DuplicateTransition {
                machine: self.name.clone(),
                from: self.children[rejected.source().index()].name().to_owned(),
                event: rejected.trigger(),
            });
        }
        Ok(())
    }

    /// Picks the state entered when this machine activates.
    pub fn set_start(&mut self, id: StateId) -> Result<(), Error> {
        self.check_id(id)?;
        self.start = Some(id);
        Ok(())
    }

    /// Picks the state whose arrival terminates this machine. A machine
    /// without a stop state runs until it is shut down from outside.
    pub fn set_stop(&mut self, id: StateId) -> Result<(), Error> {
        self.check_id(id)?;
        self.stop = Some(id);
        Ok(())
    }

    fn check_id(&self, id: StateId) -> Result<(), Error> {
        if id.index() < self.children.len() {
            Ok(())
        } else {
            Err(Error::UnknownState {
                machine: self.name.clone(),
                id,
            })
        }
    }

    /// The active child, or `None` before entry / after exit.
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    /// Name of the active child.
    pub fn current_state_name(&self) -> Option<&str> {
        self.current
            .map(|id| self.children[id.index()].name())
    }

    /// Name of a registered state.
    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.children.get(id.index()).map(Child::name)
    }

    /// Event ids this machine's own table triggers on.
    pub fn events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.table.triggers()
    }

    /// Descends the active-state chain to the innermost active state and
    /// returns its name. For an active orthogonal composition (which has one
    /// active leaf per child) the composition's own name is returned.
    pub fn active_leaf(&self) -> Option<&str> {
        let current = self.current?;
        match &self.children[current.index()] {
            Child::Leaf { name, .. } => Some(name),
            Child::Machine(machine) => machine.active_leaf().or_else(|| Some(machine.name())),
            Child::Region(region) => Some(region.name()),
        }
    }

    fn info(&self, line: &str) {
        self.sink.write_line(Severity::Info, line);
    }
}

impl Machine for StateMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn enter(&mut self) {
        let Some(start) = self.start else {
            // caught by validate() on the runtime path; direct misuse is
            // reported and ignored so hooks stay balanced
            self.sink.write_line(
                Severity::Error,
                &format!("[{}] cannot enter: no start state configured", self.name),
            );
            return;
        };
        if self.current.is_some() {
            return;
        }
        self.interrupt.store(false, Ordering::SeqCst);
        self.current = Some(start);
        self.info(&format!(
            "[{}] entered, start state `{}`",
            self.name,
            self.children[start.index()].name()
        ));
        self.children[start.index()].enter();
    }

    fn exit(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        self.children[current.index()].exit();
        self.interrupt.store(true, Ordering::SeqCst);
        self.info(&format!("[{}] exited", self.name));
    }

    fn execute(&mut self, event: &Event) -> Outcome {
        let Some(current) = self.current else {
            // an exited machine accepts no further transitions
            return Outcome::Unhandled;
        };

        // Descend: the innermost active state sees the event first. A leaf
        // gets its observation hook; a composite gets a full dispatch, and
        // only if that comes back unhandled does this machine's own table
        // run; bubbling up happens as the recursion unwinds.
        match &mut self.children[current.index()] {
            Child::Leaf { handler, .. } => handler.on_event(event),
            Child::Machine(machine) => {
                if machine.execute(event) == Outcome::Handled {
                    return Outcome::Handled;
                }
            }
            Child::Region(region) => {
                if region.execute(event) == Outcome::Handled {
                    return Outcome::Handled;
                }
            }
        }

        let Some(transition) = self.table.lookup_mut(current, event.id()) else {
            return Outcome::Unhandled;
        };

        if !transition.guard_allows(event) {
            // a rejected guard neither transitions nor bubbles
            self.sink.write_line(
                Severity::Info,
                &format!(
                    "[{}] Guard prevented transition `{}` --{}--> `{}`",
                    self.name,
                    self.children[transition.source().index()].name(),
                    event.id(),
                    self.children[transition.target().index()].name()
                ),
            );
            return Outcome::Handled;
        }

        let to = transition.target();
        if transition.is_internal() {
            transition.run_action(event);
            self.sink.write_line(
                Severity::Info,
                &format!(
                    "[{}] internal transition in `{}` on event {}",
                    self.name,
                    self.children[current.index()].name(),
                    event.id()
                ),
            );
            return Outcome::Handled;
        }

        self.children[current.index()].exit();
        transition.run_action(event);
        self.children[to.index()].enter();
        self.current = Some(to);
        self.sink.write_line(
            Severity::Info,
            &format!(
                "[{}] `{}` --{}--> `{}`",
                self.name,
                self.children[current.index()].name(),
                event.id(),
                self.children[to.index()].name()
            ),
        );

        if self.stop == Some(to) {
            self.info(&format!(
                "[{}] reached stop state `{}`",
                self.name,
                self.children[to.index()].name()
            ));
            self.exit();
        }
        Outcome::Handled
    }

    fn is_running(&self) -> bool {
        self.current.is_some()
    }

    fn recognizes(&self, event: EventId) -> bool {
        self.table.recognizes(event) || self.children.iter().any(|child| child.recognizes(event))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.start.is_none() {
            return Err(Error::MissingStart(self.name.clone()));
        }
        for child in &self.children {
            match child {
                Child::Leaf { .. } => {}
                Child::Machine(machine) => machine.validate()?,
                Child::Region(region) => region.validate()?,
            }
        }
        Ok(())
    }

    fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    fn sink(&self) -> Arc<dyn DiagnosticSink> {
        Arc::clone(&self.sink)
    }

    fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }
}
