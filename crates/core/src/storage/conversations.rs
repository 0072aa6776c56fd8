//! Conversation storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{fmt_datetime, parse_datetime, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::Result;
use crate::models::{Conversation, ParticipantPair};

const CONVERSATION_COLUMNS: &str =
    "id, participant_low, participant_high, booking_id, created_at, last_activity_at";

pub struct ConversationStore<'a> {
    conn: &'a Connection,
}

impl<'a> ConversationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert unless a conversation for the same pair already exists.
    ///
    /// Returns true if this call created the row. Relies on the
    /// `UNIQUE(participant_low, participant_high)` constraint, so concurrent
    /// callers cannot both create one.
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    pub fn insert_if_absent(&self, conversation: &Conversation) -> Result<bool> {
        let pair = conversation.pair();
        let inserted = self.conn.execute(
            "INSERT INTO conversations (id, participant_low, participant_high, booking_id, created_at, last_activity_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(participant_low, participant_high) DO NOTHING",
            params![
                conversation.id.to_string(),
                pair.low().to_string(),
                pair.high().to_string(),
                conversation.booking_id.map(|id| id.to_string()),
                fmt_datetime(conversation.created_at),
                fmt_datetime(conversation.last_activity_at),
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Find conversation by ID
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM conversations WHERE id = ?1",
            CONVERSATION_COLUMNS
        ))?;

        let conversation = stmt
            .query_row(params![id.to_string()], Self::map_conversation)
            .optional()?;

        Ok(conversation)
    }

    /// Find the conversation between two participants, in either order
    pub fn find_by_pair(&self, pair: ParticipantPair) -> Result<Option<Conversation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM conversations WHERE participant_low = ?1 AND participant_high = ?2",
            CONVERSATION_COLUMNS
        ))?;

        let conversation = stmt
            .query_row(
                params![pair.low().to_string(), pair.high().to_string()],
                Self::map_conversation,
            )
            .optional()?;

        Ok(conversation)
    }

    /// List a user's conversations, most recently active first
    #[instrument(skip(self))]
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM conversations
             WHERE participant_low = ?1 OR participant_high = ?1
             ORDER BY last_activity_at DESC, created_at DESC",
            CONVERSATION_COLUMNS
        ))?;

        let conversations = stmt
            .query_map(params![user_id.to_string()], Self::map_conversation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(conversations)
    }

    fn map_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
        Ok(Conversation {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            participant_a: parse_uuid(&row.get::<_, String>(1)?)?,
            participant_b: parse_uuid(&row.get::<_, String>(2)?)?,
            booking_id: parse_uuid_opt(row.get::<_, Option<String>>(3)?)?,
            created_at: parse_datetime(&row.get::<_, String>(4)?)?,
            last_activity_at: parse_datetime(&row.get::<_, String>(5)?)?,
        })
    }
}
