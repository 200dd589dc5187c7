use chrono::{DateTime, Utc};
use cotton_core::api::HttpClient;
use cotton_core::config::ClientConfig;
use cotton_core::format::{format_message_time, format_minute_key, format_relative_time};
use cotton_core::groups::GroupSummary;
use cotton_core::models::{Post, Reaction, User};
use cotton_core::reactions::ReactionOverrides;
use cotton_core::viewer::ViewerConfig;
use cotton_core::{GroupId, MergedRun, Message, MessageGroup, UserId};
use serde::Serialize;

use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Resolved profile, API client and identity for one command
#[derive(Debug, Clone)]
pub struct Session {
    pub profile_name: String,
    pub config: ClientConfig,
    pub api: HttpClient,
    pub access_token: Option<String>,
    pub viewer: Option<User>,
}

impl Session {
    pub fn open(profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(profile);
        let profile = profiles.profile(&profile_name).cloned().unwrap_or_default();
        Self::from_profile(profile_name, &profile, ClientConfig::from_env()?)
    }

    /// Environment variables take precedence over the stored profile
    pub fn from_profile(
        profile_name: String,
        profile: &CliProfile,
        env_config: ClientConfig,
    ) -> Result<Self, CliError> {
        let config = ClientConfig {
            api_base_url: env_config.api_base_url.clone().or_else(|| profile.api_base_url()),
            live_url: env_config.live_url.clone().or_else(|| profile.live_url()),
            ..env_config
        }
        .validate()?;
        if config.api_base_url.is_none() {
            return Err(CliError::NotConfigured(profile_name));
        }

        let access_token = profile.access_token();
        let api = HttpClient::from_config(&config)?.with_access_token(access_token.clone());
        tracing::debug!(profile = %profile_name, base_url = api.base_url(), "Opened session");
        Ok(Self {
            profile_name,
            config,
            api,
            access_token,
            viewer: profile.viewer(),
        })
    }

    pub fn require_viewer(&self) -> Result<User, CliError> {
        self.viewer
            .clone()
            .ok_or_else(|| CliError::NoViewer(self.profile_name.clone()))
    }

    pub fn viewer_id(&self) -> Option<UserId> {
        self.viewer.as_ref().map(|viewer| viewer.id)
    }

    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig::from(&self.config)
    }
}

/// Conversation known only by its ID
pub const fn bare_group(id: GroupId) -> MessageGroup {
    MessageGroup {
        id,
        is_direct_message: false,
        attendants: Vec::new(),
        latest: None,
    }
}

#[derive(Debug, Serialize)]
pub struct MessageItem {
    pub id: i64,
    pub identifier: String,
    pub text: String,
    pub created_at: String,
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct RunItem {
    pub user: i64,
    pub nickname: String,
    pub minute: String,
    pub messages: Vec<MessageItem>,
}

pub fn run_to_item(run: &MergedRun) -> RunItem {
    RunItem {
        user: run.user().get(),
        nickname: run.nickname().to_string(),
        minute: format_minute_key(run.minute_key()),
        messages: run
            .messages()
            .iter()
            .map(|message| MessageItem {
                id: message.id.get(),
                identifier: message.identifier.to_string(),
                text: message.message.clone(),
                created_at: message.created_at.to_rfc3339(),
                confirmed: message.is_confirmed(),
            })
            .collect(),
    }
}

pub fn format_run_header(run: &MergedRun, viewer: Option<UserId>) -> String {
    let time = format_message_time(run.first_created_at());
    if viewer.is_some_and(|viewer| run.is_from(viewer)) {
        format!("{} (you)  {time}", run.nickname())
    } else {
        format!("{}  {time}", run.nickname())
    }
}

pub fn format_message_line(message: &Message) -> String {
    if message.is_confirmed() {
        format!("  {}", message.message)
    } else {
        format!("  {}  (sending)", message.message)
    }
}

pub fn format_run_lines(runs: &[MergedRun], viewer: Option<UserId>) -> Vec<String> {
    let mut lines = Vec::new();
    for run in runs {
        lines.push(format_run_header(run, viewer));
        lines.extend(run.messages().iter().map(format_message_line));
    }
    lines
}

pub fn format_group_lines(summaries: &[GroupSummary]) -> Vec<String> {
    summaries
        .iter()
        .map(|summary| {
            let preview = summary
                .preview
                .as_deref()
                .map(|text| message_preview(text, 40))
                .unwrap_or_default();
            let date = summary.date_label.as_deref().unwrap_or("");
            format!(
                "{:<6}  {:<20}  {preview:<40}  {date}",
                summary.group.to_string(),
                message_preview(&summary.title, 20)
            )
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct PostItem {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created_at: String,
    pub relative_time: String,
    pub favorites: u64,
    pub favorited: Option<bool>,
    pub bookmarked: Option<bool>,
    pub reposted_by: Option<String>,
}

pub fn post_to_item(post: &Post, overrides: &ReactionOverrides, now: DateTime<Utc>) -> PostItem {
    PostItem {
        id: post.id.get(),
        author: post.user.display_name().to_string(),
        text: post.text.clone(),
        created_at: post.created_at.to_rfc3339(),
        relative_time: format_relative_time(
            post.created_at.timestamp_millis(),
            now.timestamp_millis(),
        ),
        favorites: overrides.favorites_count(post),
        favorited: overrides.effective(post, Reaction::Favorite),
        bookmarked: overrides.effective(post, Reaction::Bookmark),
        reposted_by: post
            .relevant_repost
            .as_ref()
            .map(|repost| repost.nickname.clone()),
    }
}

pub fn format_post_lines(
    posts: &[Post],
    overrides: &ReactionOverrides,
    now: DateTime<Utc>,
) -> Vec<String> {
    posts
        .iter()
        .map(|post| {
            let item = post_to_item(post, overrides, now);
            let heart = if item.favorited == Some(true) { "♥" } else { "♡" };
            let line = format!(
                "{:<8}  {:<16}  {:<40}  {heart} {:<4}  {}",
                item.id,
                message_preview(&item.author, 16),
                message_preview(&item.text, 40),
                item.favorites,
                item.relative_time
            );
            match item.reposted_by {
                Some(nickname) => format!("{line}  (reposted by {nickname})"),
                None => line,
            }
        })
        .collect()
}

pub fn message_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
