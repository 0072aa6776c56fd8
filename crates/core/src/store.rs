//! Booking store
//!
//! Owns booking records. Creation validates participants against the
//! directory; the only mutation after that is the single status transition
//! driven by the lifecycle engine.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::invariants::assert_booking_invariants;
use crate::models::{Booking, BookingStatus, Role};
use crate::storage::Storage;

pub struct BookingStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> BookingStore<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Validate and persist a new pending booking
    #[instrument(skip(self, description))]
    pub fn create_booking(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
        description: &str,
    ) -> Result<Booking> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::validation("description must not be empty"));
        }
        if user_id == provider_id {
            return Err(Error::validation("a user cannot book themselves"));
        }

        let directory = Directory::new(self.storage);
        directory.resolve_user(user_id)?;
        directory.require_role(provider_id, Role::Provider)?;

        let booking = Booking::new(user_id, provider_id, description.to_string());
        assert_booking_invariants(&booking);
        self.storage.insert_booking(&booking)?;

        info!(booking_id = %booking.id, "Booking created");
        Ok(booking)
    }

    pub fn get_booking(&self, booking_id: Uuid) -> Result<Booking> {
        self.storage
            .find_booking_by_id(booking_id)?
            .ok_or_else(|| Error::not_found("booking", booking_id))
    }

    /// Bookings where the user is requester or provider, newest first
    pub fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.storage.list_bookings_for_user(user_id)
    }

    /// Apply the one legal transition out of `pending`.
    ///
    /// The storage update is conditional on the row still being pending, so
    /// of two racing callers exactly one wins.
    #[instrument(skip(self))]
    pub(crate) fn set_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        price: Option<f64>,
    ) -> Result<Booking> {
        if !BookingStatus::Pending.can_transition_to(new_status) {
            let current = self.get_booking(booking_id)?.status;
            return Err(Error::InvalidTransition {
                booking_id,
                current,
            });
        }

        let applied = self
            .storage
            .transition_booking(booking_id, new_status, price, Utc::now())?;

        let booking = self.get_booking(booking_id)?;
        if !applied {
            return Err(Error::InvalidTransition {
                booking_id,
                current: booking.status,
            });
        }

        assert_booking_invariants(&booking);
        info!(booking_id = %booking_id, status = %new_status, "Booking decided");
        Ok(booking)
    }
}
