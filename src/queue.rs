//! The interruptible blocking event queue.
//!
//! A multi-producer / single-consumer FIFO. Producers on any thread call
//! [`EventQueue::push`]; the dispatch loop is the only consumer and blocks in
//! [`EventQueue::next_event`] until an event arrives or the queue is stopped.
//! [`EventQueue::stop`] wakes every waiter, discards undelivered events, and
//! makes all later `next_event` calls fail with [`Error::Interrupted`].

use crate::diag::{self, DiagnosticSink, Severity};
use crate::error::Error;
use crate::event::Event;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

struct Inner {
    events: VecDeque<Event>,
    stopped: bool,
}

/// Blocking FIFO shared between event producers and the dispatch loop.
///
/// Ordering is strict FIFO per producer; there is no fairness guarantee
/// across producers. Pushing never blocks.
pub struct EventQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
    sink: Arc<dyn DiagnosticSink>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::with_sink(diag::default_sink())
    }

    /// A queue reporting through the given sink instead of the default
    /// `log`-backed one.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        EventQueue {
            inner: Mutex::new(Inner {
                events: VecDeque::new(),
                stopped: false,
            }),
            ready: Condvar::new(),
            sink,
        }
    }

    // A poisoned queue is still structurally sound; keep accepting traffic.
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Appends an event. Never blocks.
    ///
    /// Once the queue is stopped the event is discarded (with a WARNING),
    /// matching the shutdown contract: nothing is delivered after `stop`.
    pub fn push(&self, event: Event) {
        let mut inner = self.lock_inner();
        if inner.stopped {
            drop(inner);
            self.sink.write_line(
                Severity::Warning,
                &format!("event {} discarded, queue is stopped", event.id()),
            );
            return;
        }
        inner.events.push_back(event);
        drop(inner);
        self.ready.notify_one();
    }

    /// Blocks until an event is available or the queue is stopped.
    pub fn next_event(&self) -> Result<Event, Error> {
        let mut inner = self.lock_inner();
        loop {
            if inner.stopped {
                return Err(Error::Interrupted);
            }
            if let Some(event) = inner.events.pop_front() {
                return Ok(event);
            }
            inner = match self.ready.wait(inner) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Stops the queue: wakes all blocked consumers and discards anything
    /// still undelivered. Idempotent.
    pub fn stop(&self) {
        let mut inner = self.lock_inner();
        if inner.stopped {
            return;
        }
        inner.stopped = true;
        let dropped = inner.events.len();
        inner.events.clear();
        drop(inner);
        if dropped > 0 {
            self.sink.write_line(
                Severity::Warning,
                &format!("queue stopped, discarding {dropped} undelivered events"),
            );
        }
        self.ready.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock_inner().stopped
    }

    pub fn len(&self) -> usize {
        self.lock_inner().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use crate::event::EventId;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::new();
        for id in 0..10u32 {
            queue.push(Event::new(id));
        }
        for id in 0..10u32 {
            assert_eq!(queue.next_event().map(|e| e.id()).ok(), Some(EventId::new(id)));
        }
    }

    #[test]
    fn test_next_event_blocks_until_push() {
        let queue = Arc::new(EventQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.next_event().map(|e| e.id()))
        };
        thread::sleep(Duration::from_millis(50));
        queue.push(Event::new(9));
        assert_eq!(consumer.join().unwrap().ok(), Some(EventId::new(9)));
    }

    #[test]
    fn test_stop_wakes_blocked_consumer() {
        let queue = Arc::new(EventQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.next_event())
        };
        thread::sleep(Duration::from_millis(50));
        queue.stop();
        assert!(matches!(consumer.join().unwrap(), Err(Error::Interrupted)));
    }

    #[test]
    fn test_stop_discards_pending_events() {
        let sink = Arc::new(MemorySink::new());
        let queue = EventQueue::with_sink(sink.clone());
        queue.push(Event::new(1));
        queue.push(Event::new(2));
        queue.stop();

        assert!(queue.is_empty());
        assert!(matches!(queue.next_event(), Err(Error::Interrupted)));
        assert!(sink.contains("discarding 2 undelivered events"));
    }

    #[test]
    fn test_push_after_stop_is_discarded() {
        let sink = Arc::new(MemorySink::new());
        let queue = EventQueue::with_sink(sink.clone());
        queue.stop();
        queue.push(Event::new(4));

        assert!(queue.is_empty());
        assert!(sink.contains("event 4 discarded"));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let queue = EventQueue::new();
        queue.stop();
        queue.stop();
        assert!(queue.is_stopped());
    }

    #[test]
    fn test_multiple_producers_all_delivered() {
        let queue = Arc::new(EventQueue::new());
        let producers: Vec<_> = (0..4u32)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..25u32 {
                        queue.push(Event::new(p * 100 + i));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(queue.len(), 100);
    }
}
