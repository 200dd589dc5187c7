//! Deduplicating merge of paginated history, live pushes and optimistic sends.
//!
//! The merged view is recomputed from scratch whenever any input changes.
//! [`MergeMemo`] only skips the recomputation when all three inputs are
//! unchanged.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::models::{Identifier, Message};
use crate::runs::{group_runs, MergedRun};

/// Merge the three message sources into one deduplicated, time-ordered list.
///
/// `history` must already be in chronological order. Messages are keyed by
/// [`Identifier`]: a server-confirmed copy replaces an unconfirmed placeholder,
/// otherwise the first occurrence wins. The result is stably sorted by
/// `created_at`, so equal timestamps keep their arrival order.
pub fn merge(history: &[Message], incoming: &[Message], optimistic: &[Message]) -> Vec<Message> {
    let capacity = history.len() + incoming.len() + optimistic.len();
    let mut merged: Vec<Message> = Vec::with_capacity(capacity);
    let mut slots: HashMap<&Identifier, usize> = HashMap::with_capacity(capacity);

    for message in history.iter().chain(incoming).chain(optimistic) {
        if let Some(&slot) = slots.get(&message.identifier) {
            if !merged[slot].is_confirmed() && message.is_confirmed() {
                merged[slot] = message.clone();
            }
        } else {
            slots.insert(&message.identifier, merged.len());
            merged.push(message.clone());
        }
    }

    merged.sort_by_key(|message| message.created_at);
    merged
}

/// Cached merge output keyed by a content fingerprint of the inputs.
#[derive(Debug, Default)]
pub struct MergeMemo {
    fingerprint: Option<u64>,
    merged: Vec<Message>,
    runs: Vec<MergedRun>,
    recomputations: usize,
}

impl MergeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merged messages for the given inputs, recomputed only when they changed
    pub fn messages(
        &mut self,
        history: &[Message],
        incoming: &[Message],
        optimistic: &[Message],
    ) -> &[Message] {
        self.refresh(history, incoming, optimistic);
        &self.merged
    }

    /// Display runs for the given inputs, regrouped on every recomputation
    pub fn runs(
        &mut self,
        history: &[Message],
        incoming: &[Message],
        optimistic: &[Message],
    ) -> &[MergedRun] {
        self.refresh(history, incoming, optimistic);
        &self.runs
    }

    /// How many times the merge actually ran
    pub const fn recomputations(&self) -> usize {
        self.recomputations
    }

    /// Forget the cached output
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn refresh(&mut self, history: &[Message], incoming: &[Message], optimistic: &[Message]) {
        let fingerprint = fingerprint(history, incoming, optimistic);
        if self.fingerprint == Some(fingerprint) {
            return;
        }

        self.merged = merge(history, incoming, optimistic);
        self.runs = group_runs(&self.merged);
        self.fingerprint = Some(fingerprint);
        self.recomputations += 1;
        tracing::debug!(
            history = history.len(),
            incoming = incoming.len(),
            optimistic = optimistic.len(),
            merged = self.merged.len(),
            runs = self.runs.len(),
            "Recomputed merged message view"
        );
    }
}

fn fingerprint(history: &[Message], incoming: &[Message], optimistic: &[Message]) -> u64 {
    let mut hasher = DefaultHasher::new();
    history.hash(&mut hasher);
    incoming.hash(&mut hasher);
    optimistic.hash(&mut hasher);
    hasher.finish()
}
