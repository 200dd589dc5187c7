//! Cursor-paginated responses

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token pointing at the next page.
///
/// The backend hands out the absolute URL of the next page; other sources may
/// use any token they like.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of records, newest first as the backend orders them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "results", alias = "items")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub const fn new(items: Vec<T>, next: Option<Cursor>) -> Self {
        Self { items, next }
    }

    /// Final page of a sequence
    pub const fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}
