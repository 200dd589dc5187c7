//! Timeline post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PostId, User};

/// Who reposted a post into the viewer's timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepostedBy {
    pub nickname: String,
}

/// A timeline post with the viewer's reaction flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user: User,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub favorites_count: u64,
    #[serde(default)]
    pub views_count: u64,
    /// `None` when the server does not know the viewer (signed out)
    #[serde(default)]
    pub has_favorite: Option<bool>,
    #[serde(default)]
    pub has_bookmark: Option<bool>,
    #[serde(default)]
    pub has_repost: Option<bool>,
    #[serde(default)]
    pub has_view: Option<bool>,
    #[serde(default, rename = "relavant_repost")]
    pub relevant_repost: Option<RepostedBy>,
}

/// Viewer reactions that can be toggled on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Favorite,
    Bookmark,
    Repost,
    View,
}

impl Reaction {
    /// Child collection path on the post resource
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Favorite => "favorites",
            Self::Bookmark => "bookmarks",
            Self::Repost => "reposts",
            Self::View => "views",
        }
    }

    /// The flag the server reported for this reaction
    pub const fn server_flag(self, post: &Post) -> Option<bool> {
        match self {
            Self::Favorite => post.has_favorite,
            Self::Bookmark => post.has_bookmark,
            Self::Repost => post.has_repost,
            Self::View => post.has_view,
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}
