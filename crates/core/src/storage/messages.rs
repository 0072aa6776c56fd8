//! Message storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{fmt_datetime, parse_datetime, parse_uuid};
use crate::error::Result;
use crate::models::{Message, MessageCursor};

pub struct MessageStore<'a> {
    conn: &'a Connection,
}

impl<'a> MessageStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a message and advance the conversation's last activity.
    ///
    /// Both writes share one transaction.
    #[instrument(skip(self, content))]
    pub fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Message> {
        let id = Uuid::new_v4();
        let sent = fmt_datetime(sent_at);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO messages (id, conversation_id, sender_id, content, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                conversation_id.to_string(),
                sender_id.to_string(),
                content,
                sent,
            ],
        )?;
        let sequence = tx.last_insert_rowid();

        // Never moves backwards, even if clocks disagree between writers
        tx.execute(
            "UPDATE conversations SET last_activity_at = MAX(last_activity_at, ?1) WHERE id = ?2",
            params![sent, conversation_id.to_string()],
        )?;
        tx.commit()?;

        Ok(Message {
            id,
            conversation_id,
            sender_id,
            content: content.to_string(),
            sent_at,
            sequence,
        })
    }

    /// Messages strictly after `after`, oldest first, at most `limit`
    pub fn list_after(
        &self,
        conversation_id: Uuid,
        after: MessageCursor,
        limit: u32,
    ) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, id, conversation_id, sender_id, content, sent_at
             FROM messages
             WHERE conversation_id = ?1 AND seq > ?2
             ORDER BY seq ASC
             LIMIT ?3",
        )?;

        let messages = stmt
            .query_map(
                params![conversation_id.to_string(), after.0, limit],
                Self::map_message,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Get message count for a conversation
    pub fn count_for_conversation(&self, conversation_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
            params![conversation_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn map_message(row: &Row<'_>) -> rusqlite::Result<Message> {
        Ok(Message {
            sequence: row.get(0)?,
            id: parse_uuid(&row.get::<_, String>(1)?)?,
            conversation_id: parse_uuid(&row.get::<_, String>(2)?)?,
            sender_id: parse_uuid(&row.get::<_, String>(3)?)?,
            content: row.get(4)?,
            sent_at: parse_datetime(&row.get::<_, String>(5)?)?,
        })
    }
}
