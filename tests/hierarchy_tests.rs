//! Tests for hierarchical composition: descent to the innermost active
//! state, bubble-up of unrecognized events, and shallow reset of composites.

use std::sync::{Arc, Mutex};
use threaded_hsm::{
    Event, EventQueue, Machine, NoopState, Outcome, StateHandler, StateMachine, Transition,
};

const GO: u32 = 1;
const STEP: u32 = 2;
const HOME: u32 = 3;
const PING: u32 = 4;

struct Probe {
    label: &'static str,
    trace: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    fn new(label: &'static str, trace: &Arc<Mutex<Vec<String>>>) -> Self {
        Probe {
            label,
            trace: Arc::clone(trace),
        }
    }
}

impl StateHandler for Probe {
    fn on_entry(&mut self) {
        self.trace.lock().unwrap().push(format!("enter {}", self.label));
    }

    fn on_exit(&mut self) {
        self.trace.lock().unwrap().push(format!("exit {}", self.label));
    }
}

/// Parent machine with one nested sub-machine and one plain leaf:
///
/// ```text
/// parent: [ sub: [ s1 --STEP--> s2 ] ] --HOME--> idle
/// ```
fn nested_pair(trace: &Arc<Mutex<Vec<String>>>) -> (StateMachine, Arc<EventQueue>) {
    let queue = Arc::new(EventQueue::new());

    let mut sub = StateMachine::new("sub", queue.clone());
    let s1 = sub.add_state("s1", Probe::new("s1", trace));
    let s2 = sub.add_state("s2", Probe::new("s2", trace));
    sub.add(Transition::new(s1, STEP, s2)).unwrap();
    sub.set_start(s1).unwrap();

    let mut parent = StateMachine::new("parent", queue.clone());
    let sub_id = parent.add_machine(sub);
    let idle = parent.add_state("idle", Probe::new("idle", trace));
    parent.add(Transition::new(sub_id, HOME, idle)).unwrap();
    parent.add(Transition::new(idle, GO, sub_id)).unwrap();
    parent.set_start(sub_id).unwrap();

    (parent, queue)
}

// ============================================================================
// Test 1: Entering a composite cascades to its start leaf
// ============================================================================

#[test]
fn test_entry_cascades_to_start_leaf() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let (mut parent, _queue) = nested_pair(&trace);

    parent.enter();

    assert_eq!(parent.current_state_name(), Some("sub"));
    assert_eq!(parent.active_leaf(), Some("s1"));
    assert_eq!(*trace.lock().unwrap(), vec!["enter s1"]);
}

// ============================================================================
// Test 2: The innermost machine sees the event first
// ============================================================================

#[test]
fn test_innermost_machine_wins() {
    let queue = Arc::new(EventQueue::new());

    let mut sub = StateMachine::new("sub", queue.clone());
    let s1 = sub.add_state("s1", NoopState);
    let s2 = sub.add_state("s2", NoopState);
    sub.add(Transition::new(s1, STEP, s2)).unwrap();
    sub.set_start(s1).unwrap();

    // the parent also has a transition on STEP; it must not fire while the
    // child can handle the event itself
    let mut parent = StateMachine::new("parent", queue);
    let sub_id = parent.add_machine(sub);
    let idle = parent.add_state("idle", NoopState);
    parent.add(Transition::new(sub_id, STEP, idle)).unwrap();
    parent.set_start(sub_id).unwrap();

    parent.enter();
    parent.execute(&Event::new(STEP));

    assert_eq!(parent.current_state_name(), Some("sub"));
    assert_eq!(parent.active_leaf(), Some("s2"));
}

// ============================================================================
// Test 3: Unrecognized events bubble up to the parent
// ============================================================================

#[test]
fn test_bubble_up_to_parent() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let (mut parent, _queue) = nested_pair(&trace);

    parent.enter();
    parent.execute(&Event::new(STEP));
    assert_eq!(parent.active_leaf(), Some("s2"));

    // `sub` has no transition for HOME: the event bubbles to `parent`,
    // whose transition exits the whole sub-machine
    let outcome = parent.execute(&Event::new(HOME));
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(parent.current_state_name(), Some("idle"));
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["enter s1", "exit s1", "enter s2", "exit s2", "enter idle"]
    );
}

// ============================================================================
// Test 4: Bubbling with an internal parent transition leaves the child alone
// ============================================================================

#[test]
fn test_internal_parent_transition_keeps_child_active() {
    let queue = Arc::new(EventQueue::new());
    let pings = Arc::new(Mutex::new(0u32));

    let mut sub = StateMachine::new("sub", queue.clone());
    let s1 = sub.add_state("s1", NoopState);
    let s2 = sub.add_state("s2", NoopState);
    sub.add(Transition::new(s1, STEP, s2)).unwrap();
    sub.set_start(s1).unwrap();

    let mut parent = StateMachine::new("parent", queue);
    let sub_id = parent.add_machine(sub);
    let counter = Arc::clone(&pings);
    parent
        .add(Transition::new(sub_id, PING, sub_id).with_action(move |_| {
            *counter.lock().unwrap() += 1;
        }))
        .unwrap();
    parent.set_start(sub_id).unwrap();

    parent.enter();
    parent.execute(&Event::new(STEP));
    parent.execute(&Event::new(PING));

    assert_eq!(*pings.lock().unwrap(), 1);
    // the child was neither exited nor reset by the bubbled event
    assert_eq!(parent.active_leaf(), Some("s2"));
}

// ============================================================================
// Test 5: Re-entering a composite resets it to its start state
// ============================================================================

#[test]
fn test_reentry_resets_to_start_state() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let (mut parent, _queue) = nested_pair(&trace);

    parent.enter();
    parent.execute(&Event::new(STEP)); // s1 -> s2
    parent.execute(&Event::new(HOME)); // sub -> idle
    parent.execute(&Event::new(GO)); // idle -> sub again

    // no deep history: the sub-machine restarts at s1
    assert_eq!(parent.active_leaf(), Some("s1"));
}

// ============================================================================
// Test 6: A nested machine that reaches its stop state goes quiet
// ============================================================================

#[test]
fn test_nested_stop_state_quiesces_child() {
    let queue = Arc::new(EventQueue::new());

    let mut sub = StateMachine::new("sub", queue.clone());
    let s1 = sub.add_state("s1", NoopState);
    let s2 = sub.add_state("s2", NoopState);
    sub.add(Transition::new(s1, STEP, s2)).unwrap();
    sub.set_start(s1).unwrap();
    sub.set_stop(s2).unwrap();

    let mut parent = StateMachine::new("parent", queue);
    let sub_id = parent.add_machine(sub);
    let idle = parent.add_state("idle", NoopState);
    parent.add(Transition::new(sub_id, HOME, idle)).unwrap();
    parent.set_start(sub_id).unwrap();

    parent.enter();
    parent.execute(&Event::new(STEP));

    // the sub-machine terminated itself; events it used to handle now
    // bubble, and the parent can still move on
    assert_eq!(parent.execute(&Event::new(STEP)), Outcome::Unhandled);
    parent.execute(&Event::new(HOME));
    assert_eq!(parent.current_state_name(), Some("idle"));
}

// ============================================================================
// Test 7: Bubble-up is bounded by nesting depth
// ============================================================================

#[test]
fn test_deep_nesting_bubbles_to_the_top() {
    let queue = Arc::new(EventQueue::new());

    // innermost -> outermost, four levels deep; only the outermost machine
    // recognizes HOME
    let mut inner = StateMachine::new("level3", queue.clone());
    let leaf = inner.add_state("leaf", NoopState);
    inner.set_start(leaf).unwrap();

    let mut machine = inner;
    for level in (1..3u32).rev() {
        let mut outer = StateMachine::new(format!("level{level}"), queue.clone());
        let child = outer.add_machine(machine);
        outer.set_start(child).unwrap();
        machine = outer;
    }

    let mut root = StateMachine::new("root", queue);
    let child = root.add_machine(machine);
    let done = root.add_state("done", NoopState);
    root.add(Transition::new(child, HOME, done)).unwrap();
    root.set_start(child).unwrap();

    root.enter();
    assert_eq!(root.active_leaf(), Some("leaf"));

    assert_eq!(root.execute(&Event::new(HOME)), Outcome::Handled);
    assert_eq!(root.current_state_name(), Some("done"));

    // something nobody recognizes climbs all levels and comes back unhandled
    assert_eq!(root.execute(&Event::new(PING)), Outcome::Unhandled);
}
