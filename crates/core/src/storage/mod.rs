//! SQLite storage layer for HandyHub

mod bookings;
mod conversations;
mod messages;
mod migrations;
mod parse;
mod tokens;
mod traits;
mod users;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Booking, BookingStatus, Conversation, Message, MessageCursor, ParticipantPair,
    ResponseToken, User,
};

pub use bookings::BookingRecords;
pub use conversations::ConversationStore;
pub use messages::MessageStore;
pub use tokens::TokenStore;
pub use traits::{
    BookingRepository, ConversationRepository, Storage, TokenRepository, UserRepository,
};
pub use users::UserStore;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "Database opened");
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<u32> {
        migrations::get_current_version(&self.conn)
    }

    /// Get user store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get booking records
    pub fn bookings(&self) -> BookingRecords<'_> {
        BookingRecords::new(&self.conn)
    }

    /// Get response token store
    pub fn tokens(&self) -> TokenStore<'_> {
        TokenStore::new(&self.conn)
    }

    /// Get conversation store
    pub fn conversations(&self) -> ConversationStore<'_> {
        ConversationStore::new(&self.conn)
    }

    /// Get message store
    pub fn messages(&self) -> MessageStore<'_> {
        MessageStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl UserRepository for Database {
    fn create_user(&self, user: &User) -> Result<()> {
        self.users().create(user)
    }

    fn upsert_user(&self, user: &User) -> Result<()> {
        self.users().upsert(user)
    }

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.users().find_by_id(id)
    }
}

impl BookingRepository for Database {
    fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.bookings().insert(booking)
    }

    fn find_booking_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        self.bookings().find_by_id(id)
    }

    fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.bookings().list_for_user(user_id)
    }

    fn transition_booking(
        &self,
        id: Uuid,
        status: BookingStatus,
        price: Option<f64>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.bookings()
            .transition_from_pending(id, status, price, decided_at)
    }
}

impl TokenRepository for Database {
    fn create_token(&self, token: &ResponseToken) -> Result<()> {
        self.tokens().create(token)
    }

    fn find_token_by_id(&self, id: Uuid) -> Result<Option<ResponseToken>> {
        self.tokens().find_by_id(id)
    }

    fn list_tokens_for_booking(&self, booking_id: Uuid) -> Result<Vec<ResponseToken>> {
        self.tokens().list_for_booking(booking_id)
    }

    fn consume_token(&self, id: Uuid, decision: &str, now: DateTime<Utc>) -> Result<bool> {
        self.tokens().consume(id, decision, now)
    }

    fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        self.tokens().purge_expired(now)
    }
}

impl ConversationRepository for Database {
    fn insert_conversation_if_absent(&self, conversation: &Conversation) -> Result<bool> {
        self.conversations().insert_if_absent(conversation)
    }

    fn find_conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.conversations().find_by_id(id)
    }

    fn find_conversation_by_pair(&self, pair: ParticipantPair) -> Result<Option<Conversation>> {
        self.conversations().find_by_pair(pair)
    }

    fn list_conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        self.conversations().list_for_user(user_id)
    }

    fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Message> {
        self.messages()
            .append(conversation_id, sender_id, content, sent_at)
    }

    fn list_messages_after(
        &self,
        conversation_id: Uuid,
        after: MessageCursor,
        limit: u32,
    ) -> Result<Vec<Message>> {
        self.messages().list_after(conversation_id, after, limit)
    }
}
