//! Optimistic send path.
//!
//! A send immediately materializes a provisional message carrying a fresh
//! [`Identifier`]. The provisional copy is never removed; once the server copy
//! with the same identifier shows up in history or the live stream, the merge
//! prefers it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::api::ChatApi;
use crate::error::{Error, Result};
use crate::models::{GroupId, Identifier, Message, User};

/// Text currently typed into the composer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    text: String,
}

impl Draft {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

/// Request produced by staging a send, to be fired at the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub group: GroupId,
    pub body: String,
    pub identifier: Identifier,
}

impl PendingSend {
    /// Fire the request. Failures are returned and logged, never retried.
    pub async fn dispatch<A: ChatApi>(&self, api: &A) -> Result<()> {
        match api
            .send_message(self.group, &self.body, &self.identifier)
            .await
        {
            Ok(receipt) if receipt.is_success => Ok(()),
            Ok(_) => {
                tracing::warn!(
                    group = %self.group,
                    identifier = %self.identifier,
                    "Backend refused message"
                );
                Err(Error::Api("message was not accepted".to_string()))
            }
            Err(error) => {
                tracing::warn!(
                    group = %self.group,
                    identifier = %self.identifier,
                    "Failed to send message: {}",
                    error
                );
                Err(error)
            }
        }
    }
}

/// Append-only buffer of locally created messages
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the draft into a provisional message and clear the draft.
    ///
    /// Blank drafts are rejected and left untouched.
    pub fn stage(&mut self, draft: &mut Draft, group: GroupId, author: &User) -> Result<PendingSend> {
        self.stage_with(draft, group, author, Identifier::generate(), Utc::now())
    }

    pub(crate) fn stage_with(
        &mut self,
        draft: &mut Draft,
        group: GroupId,
        author: &User,
        identifier: Identifier,
        now: DateTime<Utc>,
    ) -> Result<PendingSend> {
        if draft.is_blank() {
            return Err(Error::EmptyMessage);
        }
        let body = draft.take();
        self.messages.push(Message::provisional(
            group,
            author,
            body.clone(),
            identifier.clone(),
            now,
        ));
        Ok(PendingSend {
            group,
            body,
            identifier,
        })
    }

    /// Stage the draft and fire the request
    pub async fn send<A: ChatApi>(
        &mut self,
        api: &A,
        draft: &mut Draft,
        group: GroupId,
        author: &User,
    ) -> Result<Identifier> {
        let pending = self.stage(draft, group, author)?;
        pending.dispatch(api).await?;
        Ok(pending.identifier)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Provisional messages with no server-confirmed copy in `merged`
    pub fn pending<'a>(&'a self, merged: &[Message]) -> Vec<&'a Message> {
        let confirmed = merged
            .iter()
            .filter(|message| message.is_confirmed())
            .map(|message| &message.identifier)
            .collect::<HashSet<_>>();
        self.messages
            .iter()
            .filter(|message| !confirmed.contains(&message.identifier))
            .collect()
    }
}
