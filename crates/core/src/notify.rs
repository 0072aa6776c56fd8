//! Provider notification channel
//!
//! Delivery (email, SMS, push) lives outside the core. The core hands a
//! [`ProviderNotice`] to a [`Notifier`] and treats the call as fire-and-forget:
//! a failure is reported back as a warning, never as a booking failure.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::link::ResponseLink;

/// What a provider needs to decide a booking
#[derive(Debug, Clone)]
pub struct ProviderNotice {
    pub recipient: Uuid,
    pub booking_id: Uuid,
    pub description: String,
    pub link: ResponseLink,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("recipient {0} has no reachable channel")]
    Unreachable(Uuid),
}

/// Out-of-band channel to providers
pub trait Notifier: Send + Sync {
    /// Channel name used in warnings and logs
    fn channel(&self) -> &str;

    fn notify(&self, notice: &ProviderNotice) -> Result<(), NotifyError>;
}

/// Writes notices to the log. Used when no real channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn channel(&self) -> &str {
        "log"
    }

    fn notify(&self, notice: &ProviderNotice) -> Result<(), NotifyError> {
        info!(
            recipient = %notice.recipient,
            booking_id = %notice.booking_id,
            expires_at = %notice.expires_at,
            accept = %notice.link.accept_url(),
            reject = %notice.link.reject_url(),
            "Booking response link issued"
        );
        Ok(())
    }
}

/// Keeps notices in memory so embedders and tests can read the links back
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    outbox: Mutex<Vec<ProviderNotice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent notice for a booking
    pub fn latest_for(&self, booking_id: Uuid) -> Option<ProviderNotice> {
        self.outbox
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|n| n.booking_id == booking_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.outbox.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for MemoryNotifier {
    fn channel(&self) -> &str {
        "memory"
    }

    fn notify(&self, notice: &ProviderNotice) -> Result<(), NotifyError> {
        self.outbox
            .lock()
            .map_err(|_| NotifyError::Delivery("outbox lock poisoned".into()))?
            .push(notice.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenString;

    fn notice(booking_id: Uuid) -> ProviderNotice {
        ProviderNotice {
            recipient: Uuid::new_v4(),
            booking_id,
            description: "fix outlet".into(),
            link: ResponseLink::new(
                "http://localhost:8080",
                TokenString::new(Uuid::new_v4(), "s3cr3t".into()),
            ),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_memory_notifier_keeps_latest() {
        let notifier = MemoryNotifier::new();
        let booking_id = Uuid::new_v4();
        assert!(notifier.latest_for(booking_id).is_none());

        let first = notice(booking_id);
        let second = notice(booking_id);
        notifier.notify(&first).unwrap();
        notifier.notify(&second).unwrap();
        notifier.notify(&notice(Uuid::new_v4())).unwrap();

        assert_eq!(notifier.len(), 3);
        let latest = notifier.latest_for(booking_id).unwrap();
        assert_eq!(latest.link, second.link);
    }

    #[test]
    fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify(&notice(Uuid::new_v4())).is_ok());
        assert_eq!(LogNotifier.channel(), "log");
    }
}
