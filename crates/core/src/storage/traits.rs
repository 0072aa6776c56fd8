//! Storage repository traits
//!
//! These traits define the storage interface the booking core runs against,
//! allowing for different implementations (SQLite, mock, future server DB).
//! Repositories report absence as `None` and lost races as `false`; turning
//! those into domain errors is the job of the components above them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Booking, BookingStatus, Conversation, Message, MessageCursor, ParticipantPair,
    ResponseToken, User,
};

/// User repository operations
pub trait UserRepository {
    /// Create a new user
    fn create_user(&self, user: &User) -> Result<()>;

    /// Insert or refresh a user
    fn upsert_user(&self, user: &User) -> Result<()>;

    /// Find user by ID
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Booking repository operations
pub trait BookingRepository {
    /// Persist a new booking
    fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// Find booking by ID
    fn find_booking_by_id(&self, id: Uuid) -> Result<Option<Booking>>;

    /// List bookings where the user is requester or provider, newest first
    fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>>;

    /// Conditionally move a pending booking to `status`
    fn transition_booking(
        &self,
        id: Uuid,
        status: BookingStatus,
        price: Option<f64>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Response token repository operations
pub trait TokenRepository {
    /// Store a token record
    fn create_token(&self, token: &ResponseToken) -> Result<()>;

    /// Find token by ID
    fn find_token_by_id(&self, id: Uuid) -> Result<Option<ResponseToken>>;

    /// List tokens issued for a booking
    fn list_tokens_for_booking(&self, booking_id: Uuid) -> Result<Vec<ResponseToken>>;

    /// Atomically consume an unused, unexpired token
    fn consume_token(&self, id: Uuid, decision: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Remove expired, unused tokens
    fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Conversation and message repository operations
pub trait ConversationRepository {
    /// Create a conversation unless its participant pair already has one
    fn insert_conversation_if_absent(&self, conversation: &Conversation) -> Result<bool>;

    /// Find conversation by ID
    fn find_conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Find the conversation for a participant pair
    fn find_conversation_by_pair(&self, pair: ParticipantPair) -> Result<Option<Conversation>>;

    /// List a user's conversations, most recently active first
    fn list_conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>>;

    /// Append a message
    fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Message>;

    /// List messages after a cursor, oldest first
    fn list_messages_after(
        &self,
        conversation_id: Uuid,
        after: MessageCursor,
        limit: u32,
    ) -> Result<Vec<Message>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite or mocks.
pub trait Storage:
    UserRepository + BookingRepository + TokenRepository + ConversationRepository
{
}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: UserRepository + BookingRepository + TokenRepository + ConversationRepository
{
}
