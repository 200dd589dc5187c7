//! Error types for cotton-core

use thiserror::Error;

/// Result type alias using cotton-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cotton-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Live channel failure
    #[error("Live channel error: {0}")]
    WebSocket(String),

    /// A page fetch or send resolved after the viewing context changed
    #[error("Result arrived for a view that is no longer current")]
    StaleResult,

    /// A record is missing required fields
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Send was attempted with an empty body
    #[error("Message body cannot be empty")]
    EmptyMessage,

    /// An action requires a signed-in viewer
    #[error("This action requires a signed-in user")]
    NotSignedIn,

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Network or server failure on fetch, send or the live channel.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api(_) | Self::WebSocket(_))
    }

    /// Completion for a context that has since been replaced.
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResult)
    }
}
