use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] cotton_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Message text cannot be empty")]
    EmptyMessage,
    #[error(
        "Profile '{0}' has no API URL. Run `cotton config init --api-base-url <URL>` or set COTTON_API_BASE_URL."
    )]
    NotConfigured(String),
    #[error(
        "Profile '{0}' has no signed-in user. Run `cotton config init --user-id <ID> --nickname <NAME>`."
    )]
    NoViewer(String),
    #[error("Live channel is not configured for profile '{0}'")]
    LiveNotConfigured(String),
}
