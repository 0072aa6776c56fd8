//! Conversation linkage
//!
//! Owns conversations and their messages. A conversation pairs two users,
//! is created lazily the first time either side opens it, and may carry a
//! weak reference to the booking it grew out of.

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::invariants::assert_conversation_invariants;
use crate::models::{Conversation, Message, MessageCursor, MessagePage, ParticipantPair};
use crate::storage::Storage;

/// Default number of messages per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

pub struct ConversationLinkage<'a> {
    storage: &'a dyn Storage,
}

impl<'a> ConversationLinkage<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Return the conversation between two users, creating it if needed.
    ///
    /// An existing conversation is returned as is; its booking link is never
    /// overwritten.
    #[instrument(skip(self))]
    pub fn ensure_conversation(
        &self,
        participant_a: Uuid,
        participant_b: Uuid,
        booking_id: Option<Uuid>,
    ) -> Result<Conversation> {
        if participant_a == participant_b {
            return Err(Error::validation(
                "a conversation needs two different participants",
            ));
        }

        let directory = Directory::new(self.storage);
        directory.resolve_user(participant_a)?;
        directory.resolve_user(participant_b)?;

        let pair = ParticipantPair::new(participant_a, participant_b);
        let candidate = Conversation::new(pair, booking_id);
        if self.storage.insert_conversation_if_absent(&candidate)? {
            info!(conversation_id = %candidate.id, "Conversation opened");
            assert_conversation_invariants(&candidate);
            return Ok(candidate);
        }

        let existing = self.storage.find_conversation_by_pair(pair)?.ok_or_else(|| {
            Error::StorageUnavailable("conversation vanished after conflict".into())
        })?;
        debug!(conversation_id = %existing.id, "Conversation already open");
        Ok(existing)
    }

    pub fn get_conversation(&self, conversation_id: Uuid) -> Result<Conversation> {
        self.storage
            .find_conversation_by_id(conversation_id)?
            .ok_or_else(|| Error::not_found("conversation", conversation_id))
    }

    /// Append a message from one of the two participants
    #[instrument(skip(self, content))]
    pub fn post_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(Error::validation("message content must not be empty"));
        }

        let conversation = self.get_conversation(conversation_id)?;
        if !conversation.has_participant(sender_id) {
            return Err(Error::validation(format!(
                "user {} is not part of conversation {}",
                sender_id, conversation_id
            )));
        }

        let message = self
            .storage
            .append_message(conversation_id, sender_id, content, crate::models::now())?;
        debug!(message_id = %message.id, sequence = message.sequence, "Message appended");
        Ok(message)
    }

    /// Conversations the user takes part in, most recently active first
    pub fn list_conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        Directory::new(self.storage).resolve_user(user_id)?;
        self.storage.list_conversations_for_user(user_id)
    }

    /// One page of messages strictly after `cursor`, oldest first
    pub fn list_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<MessageCursor>,
        limit: u32,
    ) -> Result<MessagePage> {
        if limit == 0 {
            return Err(Error::validation("page size must be at least 1"));
        }
        self.get_conversation(conversation_id)?;

        let after = cursor.unwrap_or(MessageCursor::START);
        let messages = self
            .storage
            .list_messages_after(conversation_id, after, limit)?;

        let next_cursor = if messages.len() as u32 == limit {
            messages.last().map(Message::cursor)
        } else {
            None
        };

        Ok(MessagePage {
            messages,
            next_cursor,
        })
    }

    /// Lazily walk every message after `cursor`, one page at a time
    pub fn messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<MessageCursor>,
    ) -> MessageIter<'a> {
        MessageIter {
            linkage: ConversationLinkage {
                storage: self.storage,
            },
            conversation_id,
            cursor: cursor.unwrap_or(MessageCursor::START),
            page_size: DEFAULT_PAGE_SIZE,
            buffer: Vec::new().into_iter(),
            done: false,
        }
    }
}

/// Iterator over a conversation's messages.
///
/// Fetches a page whenever its buffer runs dry and stops after the first
/// short page or error. Restart from any message with [`Message::cursor`].
pub struct MessageIter<'a> {
    linkage: ConversationLinkage<'a>,
    conversation_id: Uuid,
    cursor: MessageCursor,
    page_size: u32,
    buffer: std::vec::IntoIter<Message>,
    done: bool,
}

impl MessageIter<'_> {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Position of the last message yielded
    pub fn cursor(&self) -> MessageCursor {
        self.cursor
    }
}

impl Iterator for MessageIter<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(message) = self.buffer.next() {
            self.cursor = message.cursor();
            return Some(Ok(message));
        }
        if self.done {
            return None;
        }

        match self
            .linkage
            .list_messages(self.conversation_id, Some(self.cursor), self.page_size)
        {
            Ok(page) => {
                self.done = page.next_cursor.is_none();
                self.buffer = page.messages.into_iter();
                let message = self.buffer.next()?;
                self.cursor = message.cursor();
                Some(Ok(message))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::storage::{Database, UserRepository};

    fn setup() -> (Database, User, User) {
        let db = Database::open_in_memory().unwrap();
        let client = User::client("u1");
        let provider = User::provider("p1", "electrician");
        db.create_user(&client).unwrap();
        db.create_user(&provider).unwrap();
        (db, client, provider)
    }

    #[test]
    fn test_ensure_conversation_either_order() {
        let (db, a, b) = setup();
        let linkage = ConversationLinkage::new(&db);

        let first = linkage.ensure_conversation(a.id, b.id, None).unwrap();
        let second = linkage.ensure_conversation(b.id, a.id, None).unwrap();
        let third = linkage.ensure_conversation(a.id, b.id, None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.id, third.id);
        assert_eq!(linkage.get_conversation(first.id).unwrap(), first);
        assert_eq!(linkage.list_conversations_for_user(a.id).unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_keeps_original_booking_link() {
        let (db, a, b) = setup();
        let linkage = ConversationLinkage::new(&db);
        let booking = Uuid::new_v4();

        let first = linkage.ensure_conversation(a.id, b.id, None).unwrap();
        let again = linkage
            .ensure_conversation(a.id, b.id, Some(booking))
            .unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.booking_id, None);
    }

    #[test]
    fn test_ensure_rejects_self_and_unknown() {
        let (db, a, _) = setup();
        let linkage = ConversationLinkage::new(&db);
        assert!(matches!(
            linkage.ensure_conversation(a.id, a.id, None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            linkage.ensure_conversation(a.id, Uuid::new_v4(), None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_post_message_rules() {
        let (db, a, b) = setup();
        let linkage = ConversationLinkage::new(&db);
        let conv = linkage.ensure_conversation(a.id, b.id, None).unwrap();

        assert!(matches!(
            linkage.post_message(conv.id, a.id, "  "),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            linkage.post_message(conv.id, Uuid::new_v4(), "hello"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            linkage.post_message(Uuid::new_v4(), a.id, "hello"),
            Err(Error::NotFound(_))
        ));

        let message = linkage
            .post_message(conv.id, a.id, "what time works?")
            .unwrap();
        assert_eq!(message.sender_id, a.id);

        let page = linkage.list_messages(conv.id, None, 10).unwrap();
        assert_eq!(page.messages, vec![message]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_conversations_ordered_by_activity() {
        let (db, a, b) = setup();
        let c = User::provider("p2", "painter");
        db.create_user(&c).unwrap();
        let linkage = ConversationLinkage::new(&db);

        let with_b = linkage.ensure_conversation(a.id, b.id, None).unwrap();
        let with_c = linkage.ensure_conversation(a.id, c.id, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        linkage.post_message(with_b.id, b.id, "ping").unwrap();

        let listed = linkage.list_conversations_for_user(a.id).unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![with_b.id, with_c.id]);
    }

    #[test]
    fn test_paging_and_iterator() {
        let (db, a, b) = setup();
        let linkage = ConversationLinkage::new(&db);
        let conv = linkage.ensure_conversation(a.id, b.id, None).unwrap();
        for i in 0..7 {
            let sender = if i % 2 == 0 { a.id } else { b.id };
            linkage
                .post_message(conv.id, sender, &format!("msg {}", i))
                .unwrap();
        }

        let first = linkage.list_messages(conv.id, None, 3).unwrap();
        assert_eq!(first.messages.len(), 3);
        let cursor = first.next_cursor.unwrap();
        let second = linkage.list_messages(conv.id, Some(cursor), 3).unwrap();
        assert_eq!(second.messages[0].content, "msg 3");

        let all: Vec<String> = linkage
            .messages(conv.id, None)
            .page_size(2)
            .map(|m| m.unwrap().content)
            .collect();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], "msg 0");
        assert_eq!(all[6], "msg 6");

        // Restart from the middle
        let tail: Vec<String> = linkage
            .messages(conv.id, Some(cursor))
            .map(|m| m.unwrap().content)
            .collect();
        assert_eq!(tail, vec!["msg 3", "msg 4", "msg 5", "msg 6"]);
    }

    #[test]
    fn test_iterator_unknown_conversation_yields_error_once() {
        let (db, ..) = setup();
        let linkage = ConversationLinkage::new(&db);
        let mut iter = linkage.messages(Uuid::new_v4(), None);
        assert!(matches!(iter.next(), Some(Err(Error::NotFound(_)))));
        assert!(iter.next().is_none());
    }
}
