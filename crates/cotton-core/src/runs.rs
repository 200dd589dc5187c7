//! Grouping of merged messages into display runs.
//!
//! A run is a contiguous stretch of messages by the same author within the
//! same minute. Runs are always rebuilt from the full merged sequence: a late
//! message with an older timestamp can split or join existing runs.

use chrono::{DateTime, Utc};

use crate::models::{Identifier, Message, UserId};

/// Contiguous messages by one author within one minute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRun {
    user: UserId,
    minute: i64,
    messages: Vec<Message>,
}

impl MergedRun {
    fn open(first: Message) -> Self {
        Self {
            user: first.user,
            minute: first.minute_key(),
            messages: vec![first],
        }
    }

    fn accepts(&self, message: &Message) -> bool {
        self.user == message.user && self.minute == message.minute_key()
    }

    /// Rendering key: the identifier of the first message
    pub fn key(&self) -> &Identifier {
        &self.first().identifier
    }

    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Author display name as carried by the first message
    pub fn nickname(&self) -> &str {
        &self.first().nickname
    }

    pub const fn minute_key(&self) -> i64 {
        self.minute
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; a run holds at least one message
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the run was written by `viewer`
    pub fn is_from(&self, viewer: UserId) -> bool {
        self.user == viewer
    }

    pub fn first_created_at(&self) -> DateTime<Utc> {
        self.first().created_at
    }

    pub fn last_created_at(&self) -> DateTime<Utc> {
        self.messages
            .last()
            .map_or_else(|| self.first_created_at(), |message| message.created_at)
    }

    fn first(&self) -> &Message {
        &self.messages[0]
    }
}

/// Lazy, restartable run iterator over a merged sequence
#[derive(Debug, Clone)]
pub struct RunIter<'a> {
    messages: &'a [Message],
    position: usize,
}

impl Iterator for RunIter<'_> {
    type Item = MergedRun;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.messages.get(self.position)?;
        let mut run = MergedRun::open(first.clone());
        self.position += 1;

        while let Some(message) = self.messages.get(self.position) {
            if !run.accepts(message) {
                break;
            }
            run.messages.push(message.clone());
            self.position += 1;
        }
        Some(run)
    }
}

/// Iterate runs of an ordered message sequence
pub const fn runs(messages: &[Message]) -> RunIter<'_> {
    RunIter {
        messages,
        position: 0,
    }
}

/// Group an ordered message sequence into runs
pub fn group_runs(messages: &[Message]) -> Vec<MergedRun> {
    runs(messages).collect()
}
