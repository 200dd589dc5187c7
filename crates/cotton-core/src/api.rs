//! Typed HTTP client for the social backend.
//!
//! [`ChatApi`] and [`PostApi`] are the seams the view state depends on;
//! [`HttpClient`] implements both with reqwest.

use std::future::Future;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    Cursor, GroupId, Identifier, Message, MessageGroup, Page, Post, PostId, RawMessage, Reaction,
    UserId,
};
use crate::pagination::PageSource;
use crate::util::{compact_text, is_http_url};

/// Backend answer to a send request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub is_success: bool,
}

/// Conversation endpoints
pub trait ChatApi {
    fn fetch_messages(
        &self,
        group: GroupId,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> impl Future<Output = Result<Page<RawMessage>>> + Send;

    fn send_message(
        &self,
        group: GroupId,
        body: &str,
        identifier: &Identifier,
    ) -> impl Future<Output = Result<SendReceipt>> + Send;

    fn mark_read(&self, group: GroupId) -> impl Future<Output = Result<()>> + Send;

    fn list_groups(
        &self,
        cursor: Option<&Cursor>,
    ) -> impl Future<Output = Result<Page<MessageGroup>>> + Send;

    fn create_group(
        &self,
        users: &[UserId],
        is_direct_message: bool,
    ) -> impl Future<Output = Result<MessageGroup>> + Send;
}

/// Which timeline to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    Global,
    Following,
}

impl Timeline {
    const fn path(self) -> &'static str {
        match self {
            Self::Global => "/posts/timeline/global/",
            Self::Following => "/posts/timeline/followings/",
        }
    }
}

/// Timeline endpoints
pub trait PostApi {
    fn timeline(
        &self,
        timeline: Timeline,
        cursor: Option<&Cursor>,
    ) -> impl Future<Output = Result<Page<Post>>> + Send;

    /// Add (`on`) or remove a reaction of the signed-in user
    fn set_reaction(
        &self,
        post: PostId,
        reaction: Reaction,
        on: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// reqwest-backed implementation of the backend API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpClient {
    /// Builds a client for an explicit API base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim();
        if !is_http_url(base_url) {
            return Err(Error::InvalidConfiguration(
                "API base URL must include http:// or https://".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: None,
            client: reqwest::Client::builder().build()?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.require_api_base_url()?)
    }

    /// Attach a bearer token to every request
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        self
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Cursor URLs from the backend are absolute; anything else is a token
    fn page_url(&self, first_page: &str, cursor: Option<&Cursor>) -> String {
        match cursor {
            Some(cursor) if is_http_url(cursor.as_str()) => cursor.to_string(),
            Some(cursor) => {
                let separator = if first_page.contains('?') { '&' } else { '?' };
                format!(
                    "{first_page}{separator}cursor={}",
                    urlencoding::encode(cursor.as_str())
                )
            }
            None => first_page.to_string(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        Ok(expect_success(response).await?.json::<T>().await?)
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, url).json(body).send().await?;
        Ok(expect_success(response).await?.json::<T>().await?)
    }

    async fn send_empty(&self, method: Method, url: &str) -> Result<()> {
        let response = self.request(method, url).send().await?;
        expect_success(response).await?;
        Ok(())
    }
}

impl ChatApi for HttpClient {
    async fn fetch_messages(
        &self,
        group: GroupId,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> Result<Page<RawMessage>> {
        let first_page = self.endpoint(&format!(
            "/message_groups/{group}/messages/?page_size={page_size}"
        ));
        let url = self.page_url(&first_page, cursor);
        tracing::debug!(%group, %url, "Fetching message page");
        self.get_json(&url).await
    }

    async fn send_message(
        &self,
        group: GroupId,
        body: &str,
        identifier: &Identifier,
    ) -> Result<SendReceipt> {
        let url = self.endpoint(&format!("/message_groups/{group}/send_message/"));
        let payload = serde_json::json!({
            "message": body,
            "identifier": identifier,
        });
        self.post_json(&url, &payload).await
    }

    async fn mark_read(&self, group: GroupId) -> Result<()> {
        let url = self.endpoint(&format!("/message_groups/{group}/check_messages/"));
        self.send_empty(Method::POST, &url).await
    }

    async fn list_groups(&self, cursor: Option<&Cursor>) -> Result<Page<MessageGroup>> {
        let first_page = self.endpoint("/message_groups/");
        let url = self.page_url(&first_page, cursor);
        self.get_json(&url).await
    }

    async fn create_group(&self, users: &[UserId], is_direct_message: bool) -> Result<MessageGroup> {
        let url = self.endpoint("/message_groups/create/");
        let payload = serde_json::json!({
            "users": users,
            "is_direct_message": is_direct_message,
        });
        self.post_json(&url, &payload).await
    }
}

impl PostApi for HttpClient {
    async fn timeline(&self, timeline: Timeline, cursor: Option<&Cursor>) -> Result<Page<Post>> {
        let first_page = self.endpoint(timeline.path());
        let url = self.page_url(&first_page, cursor);
        self.get_json(&url).await
    }

    async fn set_reaction(&self, post: PostId, reaction: Reaction, on: bool) -> Result<()> {
        let url = self.endpoint(&format!("/posts/{post}/{}/", reaction.endpoint()));
        let method = if on { Method::POST } else { Method::DELETE };
        self.send_empty(method, &url).await
    }
}

/// Message history of one conversation as a [`PageSource`].
///
/// Malformed records are dropped from the page and logged.
#[derive(Debug, Clone, Copy)]
pub struct MessageSource<'a, A> {
    api: &'a A,
    group: GroupId,
    page_size: usize,
}

impl<'a, A: ChatApi> MessageSource<'a, A> {
    pub const fn new(api: &'a A, group: GroupId, page_size: usize) -> Self {
        Self {
            api,
            group,
            page_size,
        }
    }
}

impl<A: ChatApi + Sync> PageSource<Message> for MessageSource<'_, A> {
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<Message>> {
        let page = self
            .api
            .fetch_messages(self.group, cursor, self.page_size)
            .await?;
        let items = page
            .items
            .into_iter()
            .filter_map(|raw| match raw.validate() {
                Ok(message) => Some(message),
                Err(error) => {
                    tracing::warn!(group = %self.group, "Dropping message from page: {}", error);
                    None
                }
            })
            .collect();
        Ok(Page::new(items, page.next))
    }
}

/// Conversation list as a [`PageSource`]
#[derive(Debug, Clone, Copy)]
pub struct GroupSource<'a, A> {
    api: &'a A,
}

impl<'a, A: ChatApi> GroupSource<'a, A> {
    pub const fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<A: ChatApi + Sync> PageSource<MessageGroup> for GroupSource<'_, A> {
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<MessageGroup>> {
        self.api.list_groups(cursor).await
    }
}

/// Timeline posts as a [`PageSource`]
#[derive(Debug, Clone, Copy)]
pub struct TimelineSource<'a, A> {
    api: &'a A,
    timeline: Timeline,
}

impl<'a, A: PostApi> TimelineSource<'a, A> {
    pub const fn new(api: &'a A, timeline: Timeline) -> Self {
        Self { api, timeline }
    }
}

impl<A: PostApi + Sync> PageSource<Post> for TimelineSource<'_, A> {
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<Post>> {
        self.api.timeline(self.timeline, cursor).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

async fn expect_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api(parse_api_error(status, &body)))
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.detail.or(payload.message).or(payload.error) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn new_rejects_invalid_base_url() {
        assert!(HttpClient::new("api.example.com").is_err());
        let client = HttpClient::new(" https://api.example.com/ ").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn page_url_follows_absolute_cursor() {
        let client = HttpClient::new("https://api.example.com").unwrap();
        let first = client.endpoint("/message_groups/1/messages/?page_size=20");
        assert_eq!(client.page_url(&first, None), first);

        let absolute = Cursor::new("https://api.example.com/message_groups/1/messages/?cursor=cD0y");
        assert_eq!(client.page_url(&first, Some(&absolute)), absolute.as_str());

        let token = Cursor::new("cD0y=");
        assert_eq!(
            client.page_url(&first, Some(&token)),
            "https://api.example.com/message_groups/1/messages/?page_size=20&cursor=cD0y%3D"
        );
    }

    #[test]
    fn blank_access_token_is_ignored() {
        let client = HttpClient::new("https://api.example.com")
            .unwrap()
            .with_access_token(Some("  ".to_string()));
        assert!(client.access_token.is_none());
    }

    #[test]
    fn parse_api_error_prefers_detail() {
        assert_eq!(
            parse_api_error(StatusCode::FORBIDDEN, r#"{"detail": "Not a member"}"#),
            "Not a member (403)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            "boom (500)"
        );
    }

    struct OnePageApi {
        page: Mutex<Option<Page<RawMessage>>>,
    }

    impl ChatApi for OnePageApi {
        async fn fetch_messages(
            &self,
            _group: GroupId,
            _cursor: Option<&Cursor>,
            _page_size: usize,
        ) -> Result<Page<RawMessage>> {
            Ok(self.page.lock().unwrap().take().unwrap())
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
            Ok(Page::last(Vec::new()))
        }

        async fn create_group(
            &self,
            _users: &[UserId],
            _is_direct_message: bool,
        ) -> Result<MessageGroup> {
            Err(Error::Api("unsupported".to_string()))
        }
    }

    #[tokio::test]
    async fn message_source_drops_malformed_records() {
        let good = RawMessage {
            id: Some(1),
            group: Some(1),
            user: Some(1),
            nickname: Some("Ann".to_string()),
            created_at: Some("2024-05-01T10:00:00Z".to_string()),
            message: Some("hi".to_string()),
            identifier: Some("a".to_string()),
        };
        let bad = RawMessage {
            identifier: None,
            ..good.clone()
        };
        let api = OnePageApi {
            page: Mutex::new(Some(Page::new(
                vec![good, bad],
                Some(Cursor::new("next")),
            ))),
        };

        let page = MessageSource::new(&api, GroupId::new(1), 20)
            .fetch_page(None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].identifier.as_str(), "a");
        assert_eq!(page.next, Some(Cursor::new("next")));
    }
}
