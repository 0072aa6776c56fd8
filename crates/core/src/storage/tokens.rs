//! Response token storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{fmt_datetime, parse_datetime, parse_datetime_opt, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::ResponseToken;

const TOKEN_COLUMNS: &str =
    "id, booking_id, secret_hash, created_at, expires_at, consumed_at, decision";

pub struct TokenStore<'a> {
    conn: &'a Connection,
}

impl<'a> TokenStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new token record
    #[instrument(skip(self, token), fields(token_id = %token.id, booking_id = %token.booking_id))]
    pub fn create(&self, token: &ResponseToken) -> Result<()> {
        self.conn.execute(
            "INSERT INTO response_tokens (id, booking_id, secret_hash, created_at, expires_at, consumed_at, decision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id.to_string(),
                token.booking_id.to_string(),
                token.secret_hash,
                fmt_datetime(token.created_at),
                fmt_datetime(token.expires_at),
                token.consumed_at.map(fmt_datetime),
                token.decision,
            ],
        )?;
        Ok(())
    }

    /// Find token by ID
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<ResponseToken>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM response_tokens WHERE id = ?1",
            TOKEN_COLUMNS
        ))?;

        let token = stmt
            .query_row(params![id.to_string()], Self::map_token)
            .optional()?;

        Ok(token)
    }

    /// List all tokens issued for a booking, oldest first
    pub fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<ResponseToken>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM response_tokens WHERE booking_id = ?1 ORDER BY created_at ASC",
            TOKEN_COLUMNS
        ))?;

        let tokens = stmt
            .query_map(params![booking_id.to_string()], Self::map_token)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tokens)
    }

    /// Mark a token used, but only if it is unused and unexpired at `now`.
    ///
    /// Check and consume happen in the same statement, so of two concurrent
    /// callers at most one gets `true`.
    #[instrument(skip(self))]
    pub fn consume(&self, id: Uuid, decision: &str, now: DateTime<Utc>) -> Result<bool> {
        let now = fmt_datetime(now);
        let updated = self.conn.execute(
            "UPDATE response_tokens SET consumed_at = ?1, decision = ?2
             WHERE id = ?3 AND consumed_at IS NULL AND expires_at > ?1",
            params![now, decision, id.to_string()],
        )?;
        Ok(updated == 1)
    }

    /// Delete expired tokens that were never used.
    ///
    /// Consumed tokens are kept as an audit trail of who decided what, when.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let count = self.conn.execute(
            "DELETE FROM response_tokens WHERE consumed_at IS NULL AND expires_at <= ?1",
            params![fmt_datetime(now)],
        )?;
        Ok(count as u64)
    }

    fn map_token(row: &Row<'_>) -> rusqlite::Result<ResponseToken> {
        Ok(ResponseToken {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            booking_id: parse_uuid(&row.get::<_, String>(1)?)?,
            secret_hash: row.get(2)?,
            created_at: parse_datetime(&row.get::<_, String>(3)?)?,
            expires_at: parse_datetime(&row.get::<_, String>(4)?)?,
            consumed_at: parse_datetime_opt(row.get::<_, Option<String>>(5)?)?,
            decision: row.get(6)?,
        })
    }
}
