//! Conversation list state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::{ChatApi, GroupSource};
use crate::error::Result;
use crate::format::format_date_based_on_year;
use crate::models::{GroupId, Message, MessageGroup, User, UserId};
use crate::pagination::{Arrangement, CursorPagination};

/// One row of the conversation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub group: GroupId,
    /// The other participant of a direct message
    pub counterpart: Option<User>,
    pub title: String,
    pub preview: Option<String>,
    pub latest_at: Option<DateTime<Utc>>,
    pub date_label: Option<String>,
}

impl GroupSummary {
    pub fn from_group(group: &MessageGroup, viewer: UserId, now: DateTime<Utc>) -> Self {
        let counterpart = group.counterpart(viewer).cloned();
        let title = counterpart.as_ref().map_or_else(
            || {
                group
                    .attendants
                    .iter()
                    .map(User::display_name)
                    .collect::<Vec<_>>()
                    .join(", ")
            },
            |user| user.display_name().to_string(),
        );
        Self {
            group: group.id,
            counterpart,
            title,
            preview: group.latest.as_ref().map(|latest| latest.message.clone()),
            latest_at: group.latest_created_at(),
            date_label: group
                .latest_created_at()
                .map(|created_at| format_date_based_on_year(created_at, now)),
        }
    }

    fn matches(&self, query: &str) -> bool {
        let contains = |value: &str| value.to_lowercase().contains(query);
        contains(&self.title)
            || self
                .counterpart
                .as_ref()
                .is_some_and(|user| contains(&user.username))
            || self.preview.as_deref().is_some_and(contains)
    }
}

/// Cursor-paginated conversation list of one viewer
#[derive(Debug, Clone)]
pub struct GroupList {
    viewer: UserId,
    groups: CursorPagination<MessageGroup>,
}

impl GroupList {
    pub const fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            groups: CursorPagination::new(Arrangement::AsDelivered),
        }
    }

    /// Fetch the next page of conversations
    pub async fn load_more<A: ChatApi + Sync>(&mut self, api: &A) -> Result<usize> {
        self.groups.fetch_next(&GroupSource::new(api)).await
    }

    pub const fn has_next(&self) -> bool {
        self.groups.has_next()
    }

    pub fn groups(&self) -> &[MessageGroup] {
        self.groups.items()
    }

    pub fn get(&self, id: GroupId) -> Option<&MessageGroup> {
        self.groups().iter().find(|group| group.id == id)
    }

    /// Direct-message rows matching `query` (case-insensitive; empty matches all)
    pub fn search(&self, query: &str, now: DateTime<Utc>) -> Vec<GroupSummary> {
        let query = query.trim().to_lowercase();
        self.groups()
            .iter()
            .filter(|group| group.is_direct_message)
            .map(|group| GroupSummary::from_group(group, self.viewer, now))
            .filter(|summary| query.is_empty() || summary.matches(&query))
            .collect()
    }

    /// Update a conversation's latest message and move it to the top.
    ///
    /// Returns false when the conversation is not loaded yet.
    pub fn apply_message(&mut self, message: &Message) -> bool {
        let groups = self.groups.items_mut();
        let Some(position) = groups.iter().position(|group| group.id == message.group) else {
            return false;
        };
        let mut group = groups.remove(position);
        group.apply_latest(message);
        groups.insert(0, group);
        true
    }

    /// Replace a conversation with a fresh server copy, inserting it if unknown
    pub fn apply_group(&mut self, updated: MessageGroup) {
        let groups = self.groups.items_mut();
        groups.retain(|group| group.id != updated.id);
        groups.insert(0, updated);
    }

    pub fn reset(&mut self) {
        self.groups.reset();
    }
}

/// Unread message counter shared between views
#[derive(Debug, Clone, Default)]
pub struct UnreadCounter(Arc<AtomicUsize>);

impl UnreadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SendReceipt;
    use crate::error::Error;
    use crate::models::{Cursor, Identifier, LatestMessage, MessageId, Page, RawMessage};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const VIEWER: UserId = UserId::new(1);

    fn user(id: i64, name: &str) -> User {
        User::new(UserId::new(id), name.to_lowercase(), name)
    }

    fn dm(id: i64, other: User, latest: Option<&str>) -> MessageGroup {
        MessageGroup {
            id: GroupId::new(id),
            is_direct_message: true,
            attendants: vec![user(1, "Me"), other.clone()],
            latest: latest.map(|text| LatestMessage {
                message: text.to_string(),
                user: other.id,
                nickname: other.nickname.clone(),
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            }),
        }
    }

    struct GroupsApi {
        groups: Vec<MessageGroup>,
    }

    impl ChatApi for GroupsApi {
        async fn fetch_messages(
            &self,
            _group: GroupId,
            _cursor: Option<&Cursor>,
            _page_size: usize,
        ) -> Result<Page<RawMessage>> {
            Ok(Page::last(Vec::new()))
        }

        async fn send_message(
            &self,
            _group: GroupId,
            _body: &str,
            _identifier: &Identifier,
        ) -> Result<SendReceipt> {
            Ok(SendReceipt { is_success: true })
        }

        async fn mark_read(&self, _group: GroupId) -> Result<()> {
            Ok(())
        }

        async fn list_groups(&self, _cursor: Option<&Cursor>) -> Result<Page<MessageGroup>> {
            Ok(Page::last(self.groups.clone()))
        }

        async fn create_group(
            &self,
            _users: &[UserId],
            _is_direct_message: bool,
        ) -> Result<MessageGroup> {
            Err(Error::Api("unsupported".to_string()))
        }
    }

    async fn loaded_list() -> GroupList {
        let mut group_chat = dm(3, user(4, "Dee"), None);
        group_chat.is_direct_message = false;
        let api = GroupsApi {
            groups: vec![
                dm(1, user(2, "Bo"), Some("see you")),
                dm(2, user(3, "Cy"), None),
                group_chat,
            ],
        };
        let mut list = GroupList::new(VIEWER);
        list.load_more(&api).await.unwrap();
        list
    }

    #[test]
    fn summary_uses_counterpart_and_latest_message() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let summary = GroupSummary::from_group(&dm(1, user(2, "Bo"), Some("see you")), VIEWER, now);
        assert_eq!(summary.title, "Bo");
        assert_eq!(summary.preview.as_deref(), Some("see you"));
        assert_eq!(summary.date_label.as_deref(), Some("09:30"));
    }

    #[tokio::test]
    async fn search_filters_direct_messages() {
        let list = loaded_list().await;
        let now = Utc::now();
        assert!(!list.has_next());
        assert_eq!(list.search("", now).len(), 2);

        let hits = list.search("  SEE ", now);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].group, GroupId::new(1));
        assert_eq!(list.search("cy", now)[0].group, GroupId::new(2));
        assert!(list.search("dee", now).is_empty());
    }

    #[tokio::test]
    async fn live_message_moves_group_to_top() {
        let mut list = loaded_list().await;
        let message = Message {
            id: MessageId::new(10),
            group: GroupId::new(2),
            user: UserId::new(3),
            nickname: "Cy".to_string(),
            created_at: Utc::now(),
            message: "ping".to_string(),
            identifier: Identifier::new("p"),
        };

        assert!(list.apply_message(&message));
        assert_eq!(list.groups()[0].id, GroupId::new(2));
        assert_eq!(list.groups()[0].latest.as_ref().unwrap().message, "ping");

        let unknown = Message {
            group: GroupId::new(99),
            ..message
        };
        assert!(!list.apply_message(&unknown));
    }

    #[tokio::test]
    async fn apply_group_replaces_existing_copy() {
        let mut list = loaded_list().await;
        list.apply_group(dm(1, user(2, "Bo"), Some("updated")));
        assert_eq!(list.groups().len(), 3);
        assert_eq!(list.groups()[0].latest.as_ref().unwrap().message, "updated");
    }

    #[test]
    fn unread_counter_is_shared() {
        let counter = UnreadCounter::new();
        let clone = counter.clone();
        counter.increment();
        clone.increment();
        assert_eq!(counter.get(), 2);
        clone.reset();
        assert_eq!(counter.get(), 0);
    }
}
