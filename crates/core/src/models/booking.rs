//! Booking model and its three-state lifecycle

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Rejected)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// A provider's answer to a booking request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "decision")]
pub enum Decision {
    /// Accept, optionally quoting a price
    Accept { price: Option<f64> },
    Reject,
}

impl Decision {
    pub fn accept() -> Self {
        Decision::Accept { price: None }
    }

    pub fn accept_with_price(price: f64) -> Self {
        Decision::Accept { price: Some(price) }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept { .. } => "accept",
            Decision::Reject => "reject",
        }
    }

    /// Status the booking ends up in
    pub fn target_status(&self) -> BookingStatus {
        match self {
            Decision::Accept { .. } => BookingStatus::Accepted,
            Decision::Reject => BookingStatus::Rejected,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            Decision::Accept { price } => *price,
            Decision::Reject => None,
        }
    }
}

/// A service request from a client to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub description: String,
    pub price: Option<f64>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn new(user_id: Uuid, provider_id: Uuid, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            provider_id,
            description,
            price: None,
            status: BookingStatus::Pending,
            created_at: super::now(),
            decided_at: None,
        }
    }

    /// Whether `user_id` is the requester or the provider
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.provider_id == user_id
    }
}
