//! Message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{GroupId, MessageId, User, UserId};
use crate::error::{Error, Result};

/// Client-generated idempotency key attached to every send attempt.
///
/// Unlike [`MessageId`], it exists before the server has seen the message,
/// so it is the key used to recognize the same message across sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Generate a fresh random identifier (UUID v4)
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received from the server
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Server id, [`MessageId::UNCONFIRMED`] until acknowledged
    pub id: MessageId,
    /// Conversation the message belongs to
    pub group: GroupId,
    /// Author
    pub user: UserId,
    /// Author display name at send time
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    /// Message body
    pub message: String,
    pub identifier: Identifier,
}

impl Message {
    /// Build the locally-owned placeholder shown before the server confirms a send
    pub fn provisional(
        group: GroupId,
        author: &User,
        body: impl Into<String>,
        identifier: Identifier,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::UNCONFIRMED,
            group,
            user: author.id,
            nickname: author.nickname.clone(),
            created_at,
            message: body.into(),
            identifier,
        }
    }

    /// Whether this copy came from the server
    pub const fn is_confirmed(&self) -> bool {
        self.id.is_confirmed()
    }

    /// Creation time truncated to the minute
    pub fn minute_key(&self) -> i64 {
        crate::format::minute_key(self.created_at)
    }
}

/// Wire shape of a message before validation.
///
/// Every field is optional so a single bad record does not fail a whole page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl RawMessage {
    /// Check required fields and convert into a [`Message`]
    pub fn validate(self) -> Result<Message> {
        self.try_into()
    }
}

impl From<&Message> for RawMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: Some(message.id.get()),
            group: Some(message.group.get()),
            user: Some(message.user.get()),
            nickname: Some(message.nickname.clone()),
            created_at: Some(message.created_at.to_rfc3339()),
            message: Some(message.message.clone()),
            identifier: Some(message.identifier.to_string()),
        }
    }
}

impl TryFrom<RawMessage> for Message {
    type Error = Error;

    fn try_from(value: RawMessage) -> Result<Self> {
        let identifier = value
            .identifier
            .map(|identifier| identifier.trim().to_string())
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| missing("identifier"))?;
        let created_at = value.created_at.ok_or_else(|| missing("created_at"))?;
        let created_at = DateTime::parse_from_rfc3339(created_at.trim())
            .map_err(|error| {
                Error::MalformedRecord(format!(
                    "message {identifier} has invalid created_at: {error}"
                ))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            id: MessageId::new(value.id.ok_or_else(|| missing("id"))?),
            group: GroupId::new(value.group.ok_or_else(|| missing("group"))?),
            user: UserId::new(value.user.ok_or_else(|| missing("user"))?),
            nickname: value.nickname.unwrap_or_default(),
            created_at,
            message: value.message.ok_or_else(|| missing("message"))?,
            identifier: Identifier(identifier),
        })
    }
}

fn missing(field: &str) -> Error {
    Error::MalformedRecord(format!("message is missing '{field}'"))
}
