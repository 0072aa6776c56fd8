//! Wire types for the HTTP API
//!
//! Request and response bodies are camelCase JSON. Core models are mapped
//! into views here so storage details (token hashes, sequence columns) never
//! leak onto the wire by accident.

use chrono::{DateTime, Utc};
use handyhub_core::{
    Booking, BookingStatus, Conversation, Decision, IssuedToken, Message, MessageCursor,
    MessagePage, Warning,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub description: String,
}

/// Query of the provider's response link
#[derive(Debug, Clone, Deserialize)]
pub struct RespondQuery {
    pub token: Option<String>,
    pub decision: Option<String>,
    pub price: Option<f64>,
}

impl RespondQuery {
    pub fn token(&self) -> Result<&str, ApiError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request("missing token"))
    }

    pub fn decision(&self) -> Result<Decision, ApiError> {
        match (self.decision.as_deref(), self.price) {
            (Some("accept"), Some(price)) => Ok(Decision::accept_with_price(price)),
            (Some("accept"), None) => Ok(Decision::accept()),
            (Some("reject"), None) => Ok(Decision::Reject),
            (Some("reject"), Some(_)) => {
                Err(ApiError::bad_request("a price can only accompany accept"))
            }
            (Some(other), _) => Err(ApiError::bad_request(format!(
                "decision must be accept or reject, got '{}'",
                other
            ))),
            (None, _) => Err(ApiError::bad_request("missing decision")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub description: String,
    pub price: Option<f64>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            provider_id: b.provider_id,
            description: b.description,
            price: b.price,
            status: b.status,
            created_at: b.created_at,
            decided_at: b.decided_at,
        }
    }
}

/// A booking plus any degraded-success warnings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEnvelope {
    pub booking: BookingView,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub booking_id: Uuid,
    pub status: BookingStatus,
}

/// A reissued link goes to the provider, so only its expiry is returned
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReissueView {
    pub booking_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub warnings: Vec<Warning>,
}

impl ReissueView {
    pub fn new(token: &IssuedToken, warnings: Vec<Warning>) -> Self {
        Self {
            booking_id: token.booking_id,
            expires_at: token.expires_at,
            warnings,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationView {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            participants: [c.participant_a, c.participant_b],
            booking_id: c.booking_id,
            created_at: c.created_at,
            last_activity_at: c.last_activity_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub cursor: MessageCursor,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        let cursor = m.cursor();
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            content: m.content,
            sent_at: m.sent_at,
            cursor,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl MessagesQuery {
    pub fn cursor(&self) -> Result<Option<MessageCursor>, ApiError> {
        self.cursor
            .as_deref()
            .map(|c| c.parse::<MessageCursor>().map_err(ApiError::BadRequest))
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageView {
    pub messages: Vec<MessageView>,
    pub next_cursor: Option<MessageCursor>,
}

impl From<MessagePage> for MessagePageView {
    fn from(page: MessagePage) -> Self {
        Self {
            messages: page.messages.into_iter().map(MessageView::from).collect(),
            next_cursor: page.next_cursor,
        }
    }
}
