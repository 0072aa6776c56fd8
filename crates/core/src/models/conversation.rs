//! Conversation model - a thread between exactly two participants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unordered participant pair, normalized so (a, b) and (b, a) are equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantPair {
    low: Uuid,
    high: Uuid,
}

impl ParticipantPair {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }
}

/// A persistent message thread, optionally tagged with the booking it grew
/// out of. The booking link is advisory context, not ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(pair: ParticipantPair, booking_id: Option<Uuid>) -> Self {
        let now = super::now();
        Self {
            id: Uuid::new_v4(),
            participant_a: pair.low(),
            participant_b: pair.high(),
            booking_id,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair::new(self.participant_a, self.participant_b)
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.pair().contains(user_id)
    }

    /// The participant that is not `user_id`
    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_a == user_id {
            Some(self.participant_b)
        } else if self.participant_b == user_id {
            Some(self.participant_a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_unordered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ParticipantPair::new(a, b), ParticipantPair::new(b, a));
        assert!(ParticipantPair::new(a, b).low() <= ParticipantPair::new(a, b).high());
    }

    #[test]
    fn test_other_participant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = Conversation::new(ParticipantPair::new(a, b), None);
        assert_eq!(conv.other_participant(a), Some(b));
        assert_eq!(conv.other_participant(b), Some(a));
        assert_eq!(conv.other_participant(Uuid::new_v4()), None);
    }
}
