//! Conversation (message group) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupId, Message, User, UserId};

/// Summary of the most recent message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestMessage {
    pub message: String,
    pub user: UserId,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for LatestMessage {
    fn from(message: &Message) -> Self {
        Self {
            message: message.message.clone(),
            user: message.user,
            nickname: message.nickname.clone(),
            created_at: message.created_at,
        }
    }
}

/// A conversation between two or more users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MessageGroupWire", into = "MessageGroupWire")]
pub struct MessageGroup {
    pub id: GroupId,
    pub is_direct_message: bool,
    pub attendants: Vec<User>,
    pub latest: Option<LatestMessage>,
}

impl MessageGroup {
    /// The other participant of a direct message, as seen by `viewer`
    pub fn counterpart(&self, viewer: UserId) -> Option<&User> {
        self.attendants.iter().find(|user| user.id != viewer)
    }

    /// Replace the latest-message summary if `message` is newer
    pub fn apply_latest(&mut self, message: &Message) -> bool {
        let newer = self
            .latest
            .as_ref()
            .map_or(true, |latest| latest.created_at <= message.created_at);
        if newer {
            self.latest = Some(LatestMessage::from(message));
        }
        newer
    }

    pub fn latest_created_at(&self) -> Option<DateTime<Utc>> {
        self.latest.as_ref().map(|latest| latest.created_at)
    }
}

/// Live-pushed messages of one conversation not yet part of paginated history.
///
/// Append-only; written solely by the live-push handler of its conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingBuffer {
    group: GroupId,
    messages: Vec<Message>,
}

impl IncomingBuffer {
    pub const fn new(group: GroupId) -> Self {
        Self {
            group,
            messages: Vec::new(),
        }
    }

    pub const fn group(&self) -> GroupId {
        self.group
    }

    /// Append a pushed message; messages for other conversations are refused
    pub fn push(&mut self, message: Message) -> bool {
        if message.group != self.group {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// Backend flattens the latest message into `latest_message*` fields that are
// either all present or all absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageGroupWire {
    id: GroupId,
    #[serde(default)]
    is_direct_message: bool,
    #[serde(default)]
    attendants: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_message_user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_message_nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_message_created_at: Option<DateTime<Utc>>,
}

impl From<MessageGroupWire> for MessageGroup {
    fn from(wire: MessageGroupWire) -> Self {
        let latest = match (
            wire.latest_message,
            wire.latest_message_user,
            wire.latest_message_created_at,
        ) {
            (Some(message), Some(user), Some(created_at)) => Some(LatestMessage {
                message,
                user,
                nickname: wire.latest_message_nickname.unwrap_or_default(),
                created_at,
            }),
            _ => None,
        };
        Self {
            id: wire.id,
            is_direct_message: wire.is_direct_message,
            attendants: wire.attendants,
            latest,
        }
    }
}

impl From<MessageGroup> for MessageGroupWire {
    fn from(group: MessageGroup) -> Self {
        let (latest_message, latest_message_user, latest_message_nickname, created_at) =
            match group.latest {
                Some(latest) => (
                    Some(latest.message),
                    Some(latest.user),
                    Some(latest.nickname),
                    Some(latest.created_at),
                ),
                None => (None, None, None, None),
            };
        Self {
            id: group.id,
            is_direct_message: group.is_direct_message,
            attendants: group.attendants,
            latest_message,
            latest_message_user,
            latest_message_nickname,
            latest_message_created_at: created_at,
        }
    }
}
