//! End-to-end conversation flow against an in-memory backend.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cotton_core::api::{ChatApi, SendReceipt};
use cotton_core::models::{Cursor, Page, RawMessage, User};
use cotton_core::viewer::{LoadOutcome, ViewerConfig};
use cotton_core::{
    Error, GroupId, Identifier, Message, MessageGroup, MessageId, MessageViewer, Result, UserId,
};
use pretty_assertions::assert_eq;

const GROUP: GroupId = GroupId::new(5);

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn raw(id: i64, user: i64, offset_secs: i64, text: &str) -> RawMessage {
    RawMessage {
        id: Some(id),
        group: Some(GROUP.get()),
        user: Some(user),
        nickname: Some(format!("user-{user}")),
        created_at: Some((base_time() + Duration::seconds(offset_secs)).to_rfc3339()),
        message: Some(text.to_string()),
        identifier: Some(format!("srv-{id}")),
    }
}

/// Serves history newest-first in pages keyed by cursor, and records sends
struct FakeBackend {
    pages: HashMap<Option<String>, Page<RawMessage>>,
    sent: Mutex<Vec<(String, Identifier)>>,
}

impl FakeBackend {
    fn new() -> Self {
        let mut pages = HashMap::new();
        pages.insert(
            None,
            Page::new(
                vec![raw(4, 2, 100, "four"), raw(3, 2, 90, "three")],
                Some(Cursor::new("page-2")),
            ),
        );
        pages.insert(
            Some("page-2".to_string()),
            Page::last(vec![raw(2, 1, 30, "two"), raw(1, 1, 10, "one")]),
        );
        Self {
            pages,
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl ChatApi for FakeBackend {
    async fn fetch_messages(
        &self,
        group: GroupId,
        cursor: Option<&Cursor>,
        _page_size: usize,
    ) -> Result<Page<RawMessage>> {
        assert_eq!(group, GROUP);
        let key = cursor.map(|cursor| cursor.as_str().to_string());
        let mut page = self
            .pages
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::Api("no such page (404)".to_string()))?;
        // messages sent so far come back confirmed on later pages
        let sent = self.sent.lock().unwrap();
        let confirmed = sent.iter().enumerate().map(|(index, (body, identifier))| {
            let id = 42 + i64::try_from(index).unwrap();
            RawMessage {
                identifier: Some(identifier.as_str().to_string()),
                ..raw(id, 1, 200, body)
            }
        });
        page.items.splice(0..0, confirmed);
        Ok(page)
    }

    async fn send_message(
        &self,
        _group: GroupId,
        body: &str,
        identifier: &Identifier,
    ) -> Result<SendReceipt> {
        self.sent
            .lock()
            .unwrap()
            .push((body.to_string(), identifier.clone()));
        Ok(SendReceipt { is_success: true })
    }

    async fn mark_read(&self, _group: GroupId) -> Result<()> {
        Ok(())
    }

    async fn list_groups(&self, _cursor: Option<&Cursor>) -> Result<Page<MessageGroup>> {
        Ok(Page::last(Vec::new()))
    }

    async fn create_group(&self, _users: &[UserId], _is_direct_message: bool) -> Result<MessageGroup> {
        Err(Error::Api("unsupported".to_string()))
    }
}

fn me() -> User {
    User::new(UserId::new(1), "me", "Me")
}

fn open_viewer() -> MessageViewer {
    let group = MessageGroup {
        id: GROUP,
        is_direct_message: true,
        attendants: vec![me(), User::new(UserId::new(2), "bo", "Bo")],
        latest: None,
    };
    MessageViewer::new(group, me(), ViewerConfig::default())
}

fn texts(viewer: &mut MessageViewer) -> Vec<String> {
    viewer
        .messages()
        .iter()
        .map(|message| message.message.clone())
        .collect()
}

#[tokio::test]
async fn paginates_backwards_until_exhausted() {
    let api = FakeBackend::new();
    let mut viewer = open_viewer();

    let outcome = viewer.load_older(&api, None).await.unwrap();
    assert_eq!(outcome, Some(LoadOutcome::Applied { count: 2 }));
    assert_eq!(texts(&mut viewer), vec!["three", "four"]);

    viewer.load_older(&api, None).await.unwrap();
    assert_eq!(texts(&mut viewer), vec!["one", "two", "three", "four"]);
    assert!(!viewer.has_older());

    assert_eq!(viewer.load_older(&api, None).await.unwrap(), None);
    assert_eq!(viewer.runs().len(), 2);
}

#[tokio::test]
async fn optimistic_send_is_replaced_by_confirmed_copy() {
    let api = FakeBackend::new();
    let mut viewer = open_viewer();
    viewer.load_older(&api, None).await.unwrap();

    viewer.draft_mut().set("hi");
    let identifier = viewer.send(&api).await.unwrap();
    assert_eq!(api.sent.lock().unwrap().as_slice(), &[("hi".to_string(), identifier.clone())]);

    let provisional = viewer
        .messages()
        .iter()
        .find(|message| message.identifier == identifier)
        .cloned()
        .unwrap();
    assert_eq!(provisional.id, MessageId::UNCONFIRMED);
    assert_eq!(viewer.pending().len(), 1);

    // the backend echoes the message back through the live channel
    viewer.push_live(Message {
        id: MessageId::new(42),
        ..provisional.clone()
    });
    // at-least-once delivery
    viewer.push_live(Message {
        id: MessageId::new(42),
        ..provisional
    });

    let matching = viewer
        .messages()
        .iter()
        .filter(|message| message.identifier == identifier)
        .map(|message| message.id)
        .collect::<Vec<_>>();
    assert_eq!(matching, vec![MessageId::new(42)]);
    assert!(viewer.pending().is_empty());
}

#[tokio::test]
async fn history_page_confirms_optimistic_send() {
    let api = FakeBackend::new();
    let mut viewer = open_viewer();
    viewer.load_older(&api, None).await.unwrap();

    viewer.draft_mut().set("hi");
    let identifier = viewer.send(&api).await.unwrap();
    assert_eq!(viewer.pending().len(), 1);

    assert_eq!(
        viewer.load_older(&api, None).await.unwrap(),
        Some(LoadOutcome::Applied { count: 3 })
    );

    let matching = viewer
        .messages()
        .iter()
        .filter(|message| message.identifier == identifier)
        .map(|message| (message.id, message.message.clone()))
        .collect::<Vec<_>>();
    assert_eq!(matching, vec![(MessageId::new(42), "hi".to_string())]);
    assert!(viewer.pending().is_empty());
    assert_eq!(
        texts(&mut viewer),
        vec!["one", "two", "three", "four", "hi"]
    );
}

#[tokio::test]
async fn page_for_previous_group_is_discarded() {
    let api = FakeBackend::new();
    let mut viewer = open_viewer();

    let request = viewer.begin_load_older(None).unwrap();
    let result = request.fetch(&api).await;
    viewer.switch_group(MessageGroup {
        id: GroupId::new(6),
        is_direct_message: false,
        attendants: Vec::new(),
        latest: None,
    });

    assert_eq!(
        viewer.finish_load_older(&request, result).unwrap(),
        LoadOutcome::Discarded
    );
    assert!(viewer.messages().is_empty());
    assert!(viewer.has_older());
}

#[tokio::test]
async fn transport_error_keeps_cursor_for_retry() {
    let mut api = FakeBackend::new();
    let mut viewer = open_viewer();
    viewer.load_older(&api, None).await.unwrap();

    let second = api.pages.remove(&Some("page-2".to_string())).unwrap();
    let error = viewer.load_older(&api, None).await.unwrap_err();
    assert!(error.is_transport());
    assert!(!viewer.is_loading());

    api.pages.insert(Some("page-2".to_string()), second);
    assert_eq!(
        viewer.load_older(&api, None).await.unwrap(),
        Some(LoadOutcome::Applied { count: 2 })
    );
}
