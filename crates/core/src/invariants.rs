//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Conversation, ResponseToken};

/// Validate that a booking's state is internally consistent
pub fn assert_booking_invariants(booking: &Booking) {
    debug_assert!(
        booking.user_id != booking.provider_id,
        "Booking {} has the same requester and provider {}",
        booking.id,
        booking.user_id
    );

    debug_assert!(
        !booking.description.trim().is_empty(),
        "Booking {} has empty description",
        booking.id
    );

    // Decision time exists exactly when the booking is terminal
    debug_assert!(
        booking.status.is_terminal() == booking.decided_at.is_some(),
        "Booking {} is {} but decided_at is {:?}",
        booking.id,
        booking.status,
        booking.decided_at
    );

    // Price is only ever set by an acceptance
    debug_assert!(
        booking.price.is_none() || booking.status == BookingStatus::Accepted,
        "Booking {} has price {:?} while {}",
        booking.id,
        booking.price,
        booking.status
    );
}

/// Validate that a conversation is stored in normalized pair order
pub fn assert_conversation_invariants(conversation: &Conversation) {
    debug_assert!(
        conversation.participant_a < conversation.participant_b,
        "Conversation {} participants not normalized: {} / {}",
        conversation.id,
        conversation.participant_a,
        conversation.participant_b
    );

    debug_assert!(
        conversation.participant_a != Uuid::nil(),
        "Conversation {} has nil participant",
        conversation.id
    );

    debug_assert!(
        conversation.last_activity_at >= conversation.created_at,
        "Conversation {} last activity precedes creation",
        conversation.id
    );
}

/// Validate that a token record is consistent
pub fn assert_token_invariants(token: &ResponseToken) {
    debug_assert!(
        token.consumed_at.is_some() == token.decision.is_some(),
        "Token {} consumed_at {:?} but decision {:?}",
        token.id,
        token.consumed_at,
        token.decision
    );

    debug_assert!(
        token.expires_at > token.created_at || token.consumed_at.is_none(),
        "Token {} was consumed despite expiring at creation",
        token.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParticipantPair;
    use chrono::Duration;

    #[test]
    fn test_valid_booking_passes() {
        let booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), "fix outlet".into());
        assert_booking_invariants(&booking);
    }

    #[test]
    fn test_valid_conversation_passes() {
        let conv = Conversation::new(ParticipantPair::new(Uuid::new_v4(), Uuid::new_v4()), None);
        assert_conversation_invariants(&conv);
    }

    #[test]
    fn test_fresh_token_passes() {
        let token = ResponseToken::new(Uuid::new_v4(), "hash".into(), Duration::hours(72));
        assert_token_invariants(&token);
    }

    #[test]
    #[should_panic(expected = "same requester and provider")]
    #[cfg(debug_assertions)]
    fn test_self_booking_panics_in_debug() {
        let id = Uuid::new_v4();
        let booking = Booking::new(id, id, "fix outlet".into());
        assert_booking_invariants(&booking);
    }
}
