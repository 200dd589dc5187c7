//! Client configuration.
//!
//! Provides a `ClientConfig` struct used by every Cotton front end to find the
//! REST API and the live-push endpoint and to tune the conversation view.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scroll::ScrollConfig;
use crate::util::{is_http_url, is_ws_url, normalize_text_option};

pub const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_PAGINATION_INTERVAL_MS: u64 = 500;
const DEFAULT_AUTOSCROLL_DELAY_MS: u64 = 100;
const DEFAULT_MARK_READ_DELAY_MS: u64 = 1000;
const MAX_PAGE_SIZE: usize = 100;

/// Endpoints and view tuning for a Cotton client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_pagination_interval_ms")]
    pub pagination_interval_ms: u64,
    #[serde(default = "default_autoscroll_delay_ms")]
    pub autoscroll_delay_ms: u64,
    #[serde(default = "default_mark_read_delay_ms")]
    pub mark_read_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            live_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            pagination_interval_ms: DEFAULT_PAGINATION_INTERVAL_MS,
            autoscroll_delay_ms: DEFAULT_AUTOSCROLL_DELAY_MS,
            mark_read_delay_ms: DEFAULT_MARK_READ_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config document and validate it.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.validate()
    }

    /// Build a config from `COTTON_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            api_base_url: std::env::var("COTTON_API_BASE_URL").ok(),
            live_url: std::env::var("COTTON_LIVE_URL").ok(),
            ..Self::default()
        };
        if let Some(page_size) = normalize_text_option(std::env::var("COTTON_PAGE_SIZE").ok()) {
            config.page_size = page_size.parse().map_err(|_| {
                Error::InvalidConfiguration(format!(
                    "COTTON_PAGE_SIZE must be a positive integer, got '{page_size}'"
                ))
            })?;
        }
        config.validate()
    }

    /// Normalize URLs and check numeric bounds.
    pub fn validate(self) -> Result<Self> {
        let api_base_url = normalize_text_option(self.api_base_url)
            .map(|url| normalize_url(&url, "api_base_url", is_http_url, "http:// or https://"))
            .transpose()?;
        let live_url = normalize_text_option(self.live_url)
            .map(|url| normalize_url(&url, "live_url", is_ws_url, "ws:// or wss://"))
            .transpose()?;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidConfiguration(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(Self {
            api_base_url,
            live_url,
            ..self
        })
    }

    /// REST API base URL, required for any backend call
    pub fn require_api_base_url(&self) -> Result<&str> {
        self.api_base_url.as_deref().ok_or_else(|| {
            Error::InvalidConfiguration("api_base_url is not configured".to_string())
        })
    }

    /// Live-push URL, derived from the API base URL when not set explicitly
    pub fn resolved_live_url(&self) -> Option<String> {
        if let Some(url) = self.live_url.clone() {
            return Some(url);
        }
        let base = self.api_base_url.as_deref()?;
        let ws_base = base
            .strip_prefix("https://")
            .map(|rest| format!("wss://{rest}"))
            .or_else(|| base.strip_prefix("http://").map(|rest| format!("ws://{rest}")))?;
        Some(format!("{ws_base}/ws/messages/"))
    }

    pub const fn scroll_config(&self) -> ScrollConfig {
        ScrollConfig {
            pagination_interval: Duration::from_millis(self.pagination_interval_ms),
            autoscroll_delay: Duration::from_millis(self.autoscroll_delay_ms),
        }
    }

    pub const fn mark_read_delay(&self) -> Duration {
        Duration::from_millis(self.mark_read_delay_ms)
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

const fn default_pagination_interval_ms() -> u64 {
    DEFAULT_PAGINATION_INTERVAL_MS
}

const fn default_autoscroll_delay_ms() -> u64 {
    DEFAULT_AUTOSCROLL_DELAY_MS
}

const fn default_mark_read_delay_ms() -> u64 {
    DEFAULT_MARK_READ_DELAY_MS
}

fn normalize_url(
    value: &str,
    field: &str,
    scheme_ok: fn(&str) -> bool,
    expected: &str,
) -> Result<String> {
    if scheme_ok(value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidConfiguration(format!(
            "'{field}' must include {expected}"
        )))
    }
}
