//! Data models for Cotton

mod group;
mod ids;
mod message;
mod page;
mod post;
mod user;

pub use group::{IncomingBuffer, LatestMessage, MessageGroup};
pub use ids::{GroupId, MessageId, PostId, UserId};
pub use message::{Identifier, Message, RawMessage};
pub use page::{Cursor, Page};
pub use post::{Post, Reaction, RepostedBy};
pub use user::{ProfileImage, User};
