//! Execution policies: how the dispatch loop is driven.
//!
//! The loop itself is fixed ([`DispatchLoop::run`]); a policy only decides
//! *where* it runs. [`ThreadPolicy`] (the default) gives the root machine a
//! dedicated thread; [`InlinePolicy`] runs the loop on the caller's thread
//! for cooperative setups. [`Hsm`] ties a validated root and a policy
//! together and is the handle the rest of the application keeps.

use crate::diag::{DiagnosticSink, Severity};
use crate::error::Error;
use crate::event::Event;
use crate::machine::{Machine, Outcome};
use crate::queue::EventQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// The dispatch loop, bundled with everything it needs to run.
///
/// Handed to an [`ExecutionPolicy`] by [`Hsm::start`]. One iteration is:
/// block for the next event, hand it to the root, report it at ERROR
/// severity if nothing in the hierarchy handled it. The loop winds down when
/// the root stops running (it reached its stop state) or when the queue is
/// interrupted while the shutdown flag is set. An interruption *without*
/// the flag means the queue was stopped behind the runtime's back and is
/// propagated as fatal.
pub struct DispatchLoop {
    region: Box<dyn Machine>,
    queue: Arc<EventQueue>,
    interrupt: Arc<AtomicBool>,
    sink: Arc<dyn DiagnosticSink>,
}

impl DispatchLoop {
    fn new(region: Box<dyn Machine>) -> Self {
        let queue = Arc::clone(region.queue());
        let interrupt = region.interrupt_handle();
        let sink = region.sink();
        DispatchLoop {
            region,
            queue,
            interrupt,
            sink,
        }
    }

    /// Name of the root being driven; handy for thread naming.
    pub fn region_name(&self) -> &str {
        self.region.name()
    }

    /// Enters the root and consumes events until shutdown. Entry, exit, and
    /// every hook in between run on the calling thread.
    pub fn run(mut self) -> Result<(), Error> {
        self.region.enter();
        loop {
            match self.queue.next_event() {
                Ok(event) => {
                    if self.region.execute(&event) == Outcome::Unhandled {
                        self.sink.write_line(
                            Severity::Error,
                            &format!(
                                "[{}] unhandled event {} at top level",
                                self.region.name(),
                                event.id()
                            ),
                        );
                    }
                    if !self.region.is_running() {
                        // the root ran into its stop state; stop the queue
                        // before anyone joins us
                        self.interrupt.store(true, Ordering::SeqCst);
                        self.queue.stop();
                        self.region.exit();
                        break;
                    }
                }
                Err(Error::Interrupted) if self.interrupt.load(Ordering::SeqCst) => {
                    self.sink.write_line(
                        Severity::Warning,
                        &format!(
                            "[{}] queue interrupted, shutting down",
                            self.region.name()
                        ),
                    );
                    self.region.exit();
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Strategy driving a [`DispatchLoop`].
///
/// `start` launches the loop; `stop` waits for it to terminate. Policies
/// must tolerate `stop` being called more than once.
pub trait ExecutionPolicy: Send {
    fn start(&mut self, dispatch: DispatchLoop) -> Result<(), Error>;

    fn stop(&mut self) -> Result<(), Error>;
}

/// Dedicated-thread policy: the shipped default.
///
/// `start` spawns a thread named after the root that owns the machine for
/// its whole life; `stop` joins it and surfaces the loop's result.
#[derive(Default)]
pub struct ThreadPolicy {
    handle: Option<JoinHandle<Result<(), Error>>>,
}

impl ThreadPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionPolicy for ThreadPolicy {
    fn start(&mut self, dispatch: DispatchLoop) -> Result<(), Error> {
        let thread_name = format!("hsm-{}", dispatch.region_name());
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || dispatch.run())
            .map_err(Error::Spawn)?;
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        match self.handle.take() {
            None => Ok(()),
            Some(handle) => handle.join().map_err(|_| Error::DispatchPanic)?,
        }
    }
}

/// Cooperative policy: `start` runs the loop to completion on the calling
/// thread.
///
/// Useful when the application already owns a thread it wants the machine
/// to live on. The call blocks until the root reaches its stop state or the
/// queue is stopped from elsewhere.
#[derive(Debug, Default)]
pub struct InlinePolicy;

impl InlinePolicy {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionPolicy for InlinePolicy {
    fn start(&mut self, dispatch: DispatchLoop) -> Result<(), Error> {
        dispatch.run()
    }

    fn stop(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A started root machine.
///
/// `Hsm::start` validates the composite, hands it to the policy, and returns
/// this handle. Producers push events through [`push`](Hsm::push) (or a
/// clone of the shared queue) from any thread; [`stop`](Hsm::stop) shuts the
/// machine down from any thread and is idempotent; [`wait`](Hsm::wait)
/// blocks until the machine terminates on its own.
pub struct Hsm {
    queue: Arc<EventQueue>,
    interrupt: Arc<AtomicBool>,
    policy: Box<dyn ExecutionPolicy>,
}

impl std::fmt::Debug for Hsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hsm")
            .field("interrupt", &self.interrupt)
            .finish()
    }
}

impl Hsm {
    /// Starts a root on its own dedicated thread.
    pub fn start(region: impl Machine + 'static) -> Result<Self, Error> {
        Self::start_with_policy(region, Box::new(ThreadPolicy::new()))
    }

    /// Starts a root under the given policy.
    pub fn start_with_policy(
        region: impl Machine + 'static,
        mut policy: Box<dyn ExecutionPolicy>,
    ) -> Result<Self, Error> {
        region.validate()?;
        let dispatch = DispatchLoop::new(Box::new(region));
        let queue = Arc::clone(&dispatch.queue);
        let interrupt = Arc::clone(&dispatch.interrupt);
        policy.start(dispatch)?;
        Ok(Hsm {
            queue,
            interrupt,
            policy,
        })
    }

    /// The shared event queue; clone it for producers.
    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Enqueues an event for dispatch.
    pub fn push(&self, event: Event) {
        self.queue.push(event);
    }

    /// Shuts the machine down: sets the interrupt flag, stops the queue, and
    /// waits for the loop to finish. Safe to call from any thread and safe
    /// to call twice; the second call is a no-op.
    pub fn stop(&mut self) -> Result<(), Error> {
        if !self.interrupt.swap(true, Ordering::SeqCst) {
            self.queue.stop();
        }
        self.policy.stop()
    }

    /// Waits for the machine to terminate by reaching its stop state,
    /// without interrupting it.
    pub fn wait(&mut self) -> Result<(), Error> {
        self.policy.stop()
    }
}

impl Drop for Hsm {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
