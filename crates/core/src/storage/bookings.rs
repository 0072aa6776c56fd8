//! Booking storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    fmt_datetime, parse_datetime, parse_datetime_opt, parse_status, parse_uuid, OptionalExt,
};
use crate::error::Result;
use crate::models::{Booking, BookingStatus};

const BOOKING_COLUMNS: &str =
    "id, user_id, provider_id, description, price, status, created_at, decided_at";

pub struct BookingRecords<'a> {
    conn: &'a Connection,
}

impl<'a> BookingRecords<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new booking
    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    pub fn insert(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            "INSERT INTO bookings (id, user_id, provider_id, description, price, status, created_at, decided_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                booking.id.to_string(),
                booking.user_id.to_string(),
                booking.provider_id.to_string(),
                booking.description,
                booking.price,
                booking.status.as_str(),
                fmt_datetime(booking.created_at),
                booking.decided_at.map(fmt_datetime),
            ],
        )?;
        Ok(())
    }

    /// Get booking by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE id = ?1",
            BOOKING_COLUMNS
        ))?;

        let booking = stmt
            .query_row(params![id.to_string()], Self::map_booking)
            .optional()?;

        Ok(booking)
    }

    /// All bookings the user requested or was asked to fulfil, newest first
    #[instrument(skip(self))]
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings
             WHERE user_id = ?1 OR provider_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            BOOKING_COLUMNS
        ))?;

        let bookings = stmt
            .query_map(params![user_id.to_string()], Self::map_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Move a pending booking to `status` in one conditional update.
    ///
    /// Returns false when no pending row matched, i.e. the booking is missing
    /// or another caller already decided it.
    #[instrument(skip(self))]
    pub fn transition_from_pending(
        &self,
        id: Uuid,
        status: BookingStatus,
        price: Option<f64>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE bookings
             SET status = ?1, price = COALESCE(?2, price), decided_at = ?3
             WHERE id = ?4 AND status = 'pending'",
            params![
                status.as_str(),
                price,
                fmt_datetime(decided_at),
                id.to_string(),
            ],
        )?;
        Ok(updated == 1)
    }

    fn map_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
        Ok(Booking {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            user_id: parse_uuid(&row.get::<_, String>(1)?)?,
            provider_id: parse_uuid(&row.get::<_, String>(2)?)?,
            description: row.get(3)?,
            price: row.get(4)?,
            status: parse_status(&row.get::<_, String>(5)?)?,
            created_at: parse_datetime(&row.get::<_, String>(6)?)?,
            decided_at: parse_datetime_opt(row.get::<_, Option<String>>(7)?)?,
        })
    }
}
