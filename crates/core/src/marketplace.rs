//! Booking front door
//!
//! Wires the lifecycle engine to the provider notification channel and the
//! event listeners. This is what transports (HTTP, CLI) call.

use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::events::EventDispatcher;
use crate::lifecycle::{BookingLifecycle, BookingRequested, TokenPolicy};
use crate::link::ResponseLink;
use crate::linkage::ConversationLinkage;
use crate::models::{Booking, Decision, IssuedToken};
use crate::notify::{Notifier, ProviderNotice};
use crate::outcome::{Outcome, Warning};
use crate::storage::Storage;

pub struct Marketplace<'a> {
    storage: &'a dyn Storage,
    dispatcher: &'a EventDispatcher,
    notifier: &'a dyn Notifier,
    public_base_url: &'a str,
    policy: TokenPolicy,
}

impl<'a> Marketplace<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        dispatcher: &'a EventDispatcher,
        notifier: &'a dyn Notifier,
        public_base_url: &'a str,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            notifier,
            public_base_url,
            policy: TokenPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn lifecycle(&self) -> BookingLifecycle<'a> {
        BookingLifecycle::new(self.storage)
            .with_dispatcher(self.dispatcher)
            .with_policy(self.policy)
    }

    pub fn conversations(&self) -> ConversationLinkage<'a> {
        ConversationLinkage::new(self.storage)
    }

    /// Create a booking and send its response link to the provider.
    ///
    /// A failed notification leaves the booking in place and comes back as
    /// a warning.
    pub fn request_booking(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
        description: &str,
    ) -> Result<Outcome<BookingRequested>> {
        let mut outcome = self
            .lifecycle()
            .request_booking(user_id, provider_id, description)?;

        let requested = &outcome.value;
        if let Some(warning) = self.notify_provider(&requested.booking, &requested.token) {
            outcome.push(warning);
        }
        Ok(outcome)
    }

    pub fn respond(&self, token: &str, decision: Decision) -> Result<Outcome<Booking>> {
        self.lifecycle().respond(token, decision)
    }

    /// Send a fresh response link for a pending booking
    pub fn reissue_link(&self, booking_id: Uuid) -> Result<Outcome<IssuedToken>> {
        let lifecycle = self.lifecycle();
        let token = lifecycle.reissue_token(booking_id)?;
        let booking = lifecycle.get_booking(booking_id)?;

        let mut outcome = Outcome::clean(token);
        if let Some(warning) = self.notify_provider(&booking, &outcome.value) {
            outcome.push(warning);
        }
        Ok(outcome)
    }

    fn notify_provider(&self, booking: &Booking, token: &IssuedToken) -> Option<Warning> {
        let notice = ProviderNotice {
            recipient: booking.provider_id,
            booking_id: booking.id,
            description: booking.description.clone(),
            link: ResponseLink::new(self.public_base_url, token.token.clone()),
            expires_at: token.expires_at,
        };

        match self.notifier.notify(&notice) {
            Ok(()) => None,
            Err(e) => {
                warn!(booking_id = %booking.id, channel = self.notifier.channel(), error = %e, "Provider notification failed");
                Some(Warning::NotificationFailed {
                    booking_id: booking.id,
                    channel: self.notifier.channel().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, MessageCursor, User};
    use crate::notify::{MemoryNotifier, NotifyError};
    use crate::storage::{Database, UserRepository};

    const BASE: &str = "http://localhost:8080";

    struct Broken;

    impl Notifier for Broken {
        fn channel(&self) -> &str {
            "sms"
        }

        fn notify(&self, notice: &ProviderNotice) -> std::result::Result<(), NotifyError> {
            Err(NotifyError::Unreachable(notice.recipient))
        }
    }

    fn setup() -> (Database, User, User) {
        let db = Database::open_in_memory().unwrap();
        let client = User::client("u1");
        let provider = User::provider("p1", "electrician");
        db.create_user(&client).unwrap();
        db.create_user(&provider).unwrap();
        (db, client, provider)
    }

    #[test]
    fn test_outlet_scenario_end_to_end() {
        let (db, u1, p1) = setup();
        let notifier = MemoryNotifier::new();
        let dispatcher = EventDispatcher::standard(true);
        let market = Marketplace::new(&db, &dispatcher, &notifier, BASE);

        let requested = market
            .request_booking(u1.id, p1.id, "fix outlet")
            .unwrap();
        assert!(!requested.is_degraded());
        let b1 = requested.value.booking;
        assert_eq!(b1.status, BookingStatus::Pending);

        // The provider gets a link that carries the token
        let notice = notifier.latest_for(b1.id).unwrap();
        assert_eq!(notice.recipient, p1.id);
        let link = ResponseLink::parse(&notice.link.accept_url()).unwrap();

        let accepted = market
            .respond(&link.token.to_string(), Decision::accept())
            .unwrap();
        assert_eq!(accepted.value.id, b1.id);
        assert_eq!(accepted.value.status, BookingStatus::Accepted);

        let linkage = market.conversations();
        let c1 = linkage.ensure_conversation(u1.id, p1.id, Some(b1.id)).unwrap();
        assert_eq!(c1.booking_id, Some(b1.id));

        linkage.post_message(c1.id, u1.id, "what time works?").unwrap();
        let page = linkage.list_messages(c1.id, Some(MessageCursor::START), 50).unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].sender_id, u1.id);
        assert_eq!(page.messages[0].content, "what time works?");
    }

    #[test]
    fn test_notification_failure_is_a_warning() {
        let (db, u1, p1) = setup();
        let dispatcher = EventDispatcher::new();
        let market = Marketplace::new(&db, &dispatcher, &Broken, BASE);

        let outcome = market.request_booking(u1.id, p1.id, "fix outlet").unwrap();
        assert!(outcome.is_degraded());
        assert!(matches!(
            &outcome.warnings[0],
            Warning::NotificationFailed { channel, .. } if channel == "sms"
        ));

        // The booking survived and the token still works
        let token = outcome.value.token.token.to_string();
        let booking = market.respond(&token, Decision::Reject).unwrap().value;
        assert_eq!(booking.status, BookingStatus::Rejected);
    }

    #[test]
    fn test_reissue_link_notifies_again() {
        let (db, u1, p1) = setup();
        let notifier = MemoryNotifier::new();
        let dispatcher = EventDispatcher::new();
        let market = Marketplace::new(&db, &dispatcher, &notifier, BASE);

        let booking = market
            .request_booking(u1.id, p1.id, "fix outlet")
            .unwrap()
            .value
            .booking;
        let reissued = market.reissue_link(booking.id).unwrap();
        assert!(!reissued.is_degraded());
        assert_eq!(notifier.len(), 2);
        assert_eq!(
            notifier.latest_for(booking.id).unwrap().link.token,
            reissued.value.token
        );
    }
}
