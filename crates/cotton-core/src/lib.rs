//! cotton-core - Core library for Cotton
//!
//! This crate contains the shared models, the message merge and grouping
//! logic, scroll coordination, and the backend API client used by all Cotton
//! interfaces.

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod format;
pub mod groups;
pub mod live;
pub mod merge;
pub mod models;
pub mod outbox;
pub mod pagination;
pub mod reactions;
pub mod runs;
pub mod scroll;
pub mod util;
pub mod viewer;

pub use error::{Error, Result};
pub use merge::merge;
pub use models::{GroupId, Identifier, Message, MessageGroup, MessageId, UserId};
pub use runs::{group_runs, MergedRun};
pub use viewer::MessageViewer;
