//! Events: the immutable tokens that drive a state machine.
//!
//! An [`Event`] is identified by an [`EventId`]. Equality and hashing use the
//! identifier only; the optional payload is opaque to the engine and exists
//! purely for guards, actions, and leaf handlers to inspect.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of an event.
///
/// Applications typically define their event domain as constants or an enum
/// and map it onto `EventId` via `From`/`Into`:
///
/// ```rust
/// use threaded_hsm::EventId;
///
/// const POWER_ON: u32 = 1;
///
/// enum DoorEvent {
///     Open,
///     Close,
/// }
///
/// impl From<DoorEvent> for EventId {
///     fn from(event: DoorEvent) -> EventId {
///         EventId::new(event as u32)
///     }
/// }
///
/// assert_eq!(EventId::new(POWER_ON), EventId::from(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u32);

impl EventId {
    /// Wraps a raw identifier.
    pub const fn new(raw: u32) -> Self {
        EventId(raw)
    }

    /// The raw identifier.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EventId {
    fn from(raw: u32) -> Self {
        EventId(raw)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable event token.
///
/// Produced once, then moved through the queue to the dispatch thread. The
/// payload, if any, travels as an opaque `Any` value; consumers that know the
/// concrete type recover it with [`Event::payload_ref`].
pub struct Event {
    id: EventId,
    payload: Option<Box<dyn Any + Send>>,
}

impl Event {
    /// Creates an event with no payload.
    pub fn new(id: impl Into<EventId>) -> Self {
        Event {
            id: id.into(),
            payload: None,
        }
    }

    /// Creates an event carrying an opaque payload.
    pub fn with_payload(id: impl Into<EventId>, payload: impl Any + Send) -> Self {
        Event {
            id: id.into(),
            payload: Some(Box::new(payload)),
        }
    }

    /// The event identifier.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Whether a payload is attached.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Downcasts the payload to a concrete type.
    ///
    /// Returns `None` when there is no payload or when the payload is of a
    /// different type.
    pub fn payload_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}
