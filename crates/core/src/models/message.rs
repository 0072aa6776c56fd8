//! Message model for conversation threads

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An append-only chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    /// Storage sequence; strictly increasing in append order
    pub sequence: i64,
}

impl Message {
    pub fn cursor(&self) -> MessageCursor {
        MessageCursor(self.sequence)
    }

    pub fn format_timestamp(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }
}

/// Position in a conversation's message stream. Listing from a cursor returns
/// messages strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCursor(pub i64);

impl MessageCursor {
    /// Cursor positioned before the first message
    pub const START: MessageCursor = MessageCursor(0);
}

impl fmt::Display for MessageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageCursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .map(MessageCursor)
            .ok_or_else(|| format!("invalid message cursor '{}'", s))
    }
}

/// One page of messages, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Cursor to continue from; `None` when the page was not full
    pub next_cursor: Option<MessageCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_parse() {
        assert_eq!("42".parse::<MessageCursor>().unwrap(), MessageCursor(42));
        assert_eq!("0".parse::<MessageCursor>().unwrap(), MessageCursor::START);
        assert!("-1".parse::<MessageCursor>().is_err());
        assert!("abc".parse::<MessageCursor>().is_err());
    }
}
