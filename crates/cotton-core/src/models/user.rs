//! User model

use serde::{Deserialize, Serialize};

use super::UserId;

/// Avatar image variants served by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
}

/// A user account as seen by other users
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: String,
    #[serde(default)]
    pub profile_image: Option<ProfileImage>,
}

impl User {
    /// Create a user without an avatar
    pub fn new(id: UserId, username: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            nickname: nickname.into(),
            profile_image: None,
        }
    }

    /// Preferred avatar URL, the small variant first
    pub fn avatar_url(&self) -> Option<&str> {
        let image = self.profile_image.as_ref()?;
        image.small.as_deref().or(image.url.as_deref())
    }

    /// Display name, falling back to the username when no nickname is set
    pub fn display_name(&self) -> &str {
        if self.nickname.trim().is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}
