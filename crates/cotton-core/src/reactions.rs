//! Local reaction state for timeline posts.
//!
//! Server flags on a [`Post`] go stale as soon as the viewer toggles a
//! reaction. [`ReactionOverrides`] keeps the viewer's own toggles for one view
//! and answers what should be displayed.

use std::collections::HashMap;

use crate::api::PostApi;
use crate::error::{Error, Result};
use crate::models::{Post, PostId, Reaction, UserId};

/// A reaction toggle to send to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionChange {
    pub post: PostId,
    pub reaction: Reaction,
    pub on: bool,
}

impl ReactionChange {
    pub async fn submit<A: PostApi>(&self, api: &A) -> Result<()> {
        api.set_reaction(self.post, self.reaction, self.on)
            .await
            .inspect_err(|error| {
                tracing::warn!(
                    post = %self.post,
                    reaction = %self.reaction,
                    on = self.on,
                    "Failed to update reaction: {}",
                    error
                );
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReactionOverrides {
    viewer: Option<UserId>,
    overrides: HashMap<(PostId, Reaction), bool>,
}

impl ReactionOverrides {
    /// `viewer` is `None` when signed out; every transition then fails
    pub fn new(viewer: Option<UserId>) -> Self {
        Self {
            viewer,
            overrides: HashMap::new(),
        }
    }

    pub fn favorite(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::Favorite, true)
    }

    pub fn unfavorite(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::Favorite, false)
    }

    pub fn bookmark(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::Bookmark, true)
    }

    pub fn unbookmark(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::Bookmark, false)
    }

    pub fn repost(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::Repost, true)
    }

    pub fn unrepost(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::Repost, false)
    }

    /// Views are recorded once and never withdrawn
    pub fn mark_viewed(&mut self, post: &Post) -> Result<ReactionChange> {
        self.set(post, Reaction::View, true)
    }

    /// Displayed state: the local override, else the server flag
    pub fn effective(&self, post: &Post, reaction: Reaction) -> Option<bool> {
        self.overrides
            .get(&(post.id, reaction))
            .copied()
            .or_else(|| reaction.server_flag(post))
    }

    /// Favorite count adjusted for a local toggle the server has not counted
    pub fn favorites_count(&self, post: &Post) -> u64 {
        let server = post.has_favorite.unwrap_or(false);
        match self.overrides.get(&(post.id, Reaction::Favorite)) {
            Some(true) if !server => post.favorites_count + 1,
            Some(false) if server => post.favorites_count.saturating_sub(1),
            _ => post.favorites_count,
        }
    }

    /// True only when the server says "not viewed" and nothing was recorded locally
    pub fn should_record_view(&self, post: &Post) -> bool {
        self.viewer.is_some()
            && post.has_view == Some(false)
            && !self.overrides.contains_key(&(post.id, Reaction::View))
    }

    pub fn is_signed_in(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    fn set(&mut self, post: &Post, reaction: Reaction, on: bool) -> Result<ReactionChange> {
        if self.viewer.is_none() {
            return Err(Error::NotSignedIn);
        }
        self.overrides.insert((post.id, reaction), on);
        Ok(ReactionChange {
            post: post.id,
            reaction,
            on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Timeline;
    use crate::models::{Cursor, Page, User};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn post(id: i64) -> Post {
        Post {
            id: PostId::new(id),
            user: User::new(UserId::new(2), "bo", "Bo"),
            created_at: Utc::now(),
            text: "hello".to_string(),
            favorites_count: 4,
            views_count: 0,
            has_favorite: Some(false),
            has_bookmark: Some(true),
            has_repost: None,
            has_view: Some(false),
            relevant_repost: None,
        }
    }

    #[derive(Default)]
    struct RecordingPosts {
        calls: Mutex<Vec<ReactionChange>>,
    }

    impl PostApi for RecordingPosts {
        async fn timeline(&self, _timeline: Timeline, _cursor: Option<&Cursor>) -> Result<Page<Post>> {
            Ok(Page::last(Vec::new()))
        }

        async fn set_reaction(&self, post: PostId, reaction: Reaction, on: bool) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(ReactionChange { post, reaction, on });
            Ok(())
        }
    }

    #[test]
    fn signed_out_viewer_cannot_react() {
        let mut overrides = ReactionOverrides::new(None);
        assert!(matches!(
            overrides.favorite(&post(1)),
            Err(Error::NotSignedIn)
        ));
        assert!(!overrides.should_record_view(&post(1)));
        assert_eq!(overrides.effective(&post(1), Reaction::Favorite), Some(false));
    }

    #[test]
    fn overrides_take_precedence_over_server_flags() {
        let mut overrides = ReactionOverrides::new(Some(UserId::new(1)));
        let post = post(1);

        overrides.favorite(&post).unwrap();
        overrides.unbookmark(&post).unwrap();

        assert_eq!(overrides.effective(&post, Reaction::Favorite), Some(true));
        assert_eq!(overrides.effective(&post, Reaction::Bookmark), Some(false));
        assert_eq!(overrides.effective(&post, Reaction::Repost), None);
        assert_eq!(overrides.favorites_count(&post), 5);

        overrides.unfavorite(&post).unwrap();
        assert_eq!(overrides.favorites_count(&post), 4);
    }

    #[test]
    fn view_is_recorded_once() {
        let mut overrides = ReactionOverrides::new(Some(UserId::new(1)));
        let unseen = post(1);
        assert!(overrides.should_record_view(&unseen));

        overrides.mark_viewed(&unseen).unwrap();
        assert!(!overrides.should_record_view(&unseen));

        let unknown = Post {
            has_view: None,
            ..post(2)
        };
        assert!(!overrides.should_record_view(&unknown));
    }

    #[tokio::test]
    async fn change_is_submitted_through_api() {
        let api = RecordingPosts::default();
        let mut overrides = ReactionOverrides::new(Some(UserId::new(1)));

        let change = overrides.repost(&post(7)).unwrap();
        change.submit(&api).await.unwrap();
        overrides.unrepost(&post(7)).unwrap().submit(&api).await.unwrap();

        assert_eq!(
            api.calls.lock().unwrap().as_slice(),
            &[
                ReactionChange {
                    post: PostId::new(7),
                    reaction: Reaction::Repost,
                    on: true
                },
                ReactionChange {
                    post: PostId::new(7),
                    reaction: Reaction::Repost,
                    on: false
                },
            ]
        );
    }
}
