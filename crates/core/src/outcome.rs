//! Degraded-success reporting
//!
//! Side effects that must not undo a committed booking change (provider
//! notification, listener work) report failures as warnings riding next to
//! the successful result.

use serde::Serialize;
use uuid::Uuid;

/// Something that went wrong after the primary change was committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// The provider could not be told about a booking
    #[serde(rename_all = "camelCase")]
    NotificationFailed {
        booking_id: Uuid,
        channel: String,
        reason: String,
    },
    /// An accepted booking did not get its conversation
    #[serde(rename_all = "camelCase")]
    ConversationNotOpened { booking_id: Uuid, reason: String },
    /// Any other listener failed to handle an event
    #[serde(rename_all = "camelCase")]
    ListenerFailed {
        booking_id: Uuid,
        listener: String,
        reason: String,
    },
}

impl Warning {
    pub fn booking_id(&self) -> Uuid {
        match self {
            Warning::NotificationFailed { booking_id, .. }
            | Warning::ConversationNotOpened { booking_id, .. }
            | Warning::ListenerFailed { booking_id, .. } => *booking_id,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::NotificationFailed {
                channel, reason, ..
            } => write!(f, "provider not notified via {}: {}", channel, reason),
            Warning::ConversationNotOpened { reason, .. } => {
                write!(f, "conversation not opened: {}", reason)
            }
            Warning::ListenerFailed {
                listener, reason, ..
            } => write!(f, "{} failed: {}", listener, reason),
        }
    }
}

/// A successful result plus any warnings gathered while producing it
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn into_parts(self) -> (T, Vec<Warning>) {
        (self.value, self.warnings)
    }
}
