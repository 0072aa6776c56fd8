//! Booking events and listeners
//!
//! The lifecycle engine publishes an event after each committed change.
//! Listeners run after the commit, so their failures cannot undo it; they
//! come back to the caller as warnings.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Error;
use crate::linkage::ConversationLinkage;
use crate::models::Booking;
use crate::outcome::Warning;
use crate::storage::Storage;

/// Kinds of booking event, used by listeners to subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Requested,
    Accepted,
    Rejected,
}

/// Events published by the lifecycle engine
#[derive(Debug, Clone)]
pub enum BookingEvent {
    /// A booking was created and is waiting on the provider
    Requested { booking: Booking },
    /// The provider accepted
    Accepted { booking: Booking },
    /// The provider rejected
    Rejected { booking: Booking },
}

impl BookingEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BookingEvent::Requested { .. } => EventKind::Requested,
            BookingEvent::Accepted { .. } => EventKind::Accepted,
            BookingEvent::Rejected { .. } => EventKind::Rejected,
        }
    }

    pub fn booking(&self) -> &Booking {
        match self {
            BookingEvent::Requested { booking }
            | BookingEvent::Accepted { booking }
            | BookingEvent::Rejected { booking } => booking,
        }
    }
}

/// Trait for event consumers
pub trait BookingListener: Send + Sync {
    /// Name used in logs and warnings
    fn name(&self) -> &str;

    /// Whether this listener wants events of `kind`
    fn wants(&self, kind: EventKind) -> bool;

    /// Handle an event
    fn on_event(&self, storage: &dyn Storage, event: &BookingEvent) -> crate::Result<()>;

    /// Describe a failure of this listener to the caller
    fn failure_warning(&self, event: &BookingEvent, error: &Error) -> Warning {
        Warning::ListenerFailed {
            booking_id: event.booking().id,
            listener: self.name().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Fans events out to registered listeners
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn BookingListener>>,
}

impl EventDispatcher {
    pub const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Dispatcher with the listeners every deployment wants
    pub fn standard(open_conversation_on_accept: bool) -> Self {
        let mut dispatcher = Self::new();
        if open_conversation_on_accept {
            dispatcher.register(Arc::new(ConversationOpener));
        }
        dispatcher
    }

    pub fn register(&mut self, listener: Arc<dyn BookingListener>) {
        debug!(listener = listener.name(), "Registered booking listener");
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every interested listener, collecting failures
    pub fn dispatch(&self, storage: &dyn Storage, event: &BookingEvent) -> Vec<Warning> {
        let kind = event.kind();
        let mut warnings = Vec::new();

        for listener in self.listeners.iter().filter(|l| l.wants(kind)) {
            if let Err(e) = listener.on_event(storage, event) {
                warn!(
                    listener = listener.name(),
                    booking_id = %event.booking().id,
                    error = %e,
                    "Booking listener failed"
                );
                warnings.push(listener.failure_warning(event, &e));
            }
        }

        warnings
    }
}

/// Opens a conversation between the two parties once a booking is accepted
#[derive(Debug, Default, Clone, Copy)]
pub struct ConversationOpener;

impl BookingListener for ConversationOpener {
    fn name(&self) -> &str {
        "conversation-opener"
    }

    fn wants(&self, kind: EventKind) -> bool {
        kind == EventKind::Accepted
    }

    fn on_event(&self, storage: &dyn Storage, event: &BookingEvent) -> crate::Result<()> {
        let booking = event.booking();
        ConversationLinkage::new(storage).ensure_conversation(
            booking.user_id,
            booking.provider_id,
            Some(booking.id),
        )?;
        Ok(())
    }

    fn failure_warning(&self, event: &BookingEvent, error: &Error) -> Warning {
        Warning::ConversationNotOpened {
            booking_id: event.booking().id,
            reason: error.to_string(),
        }
    }
}
