use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cotton_core::GroupId;

#[derive(Parser)]
#[command(name = "cotton")]
#[command(about = "Read and write Cotton conversations from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List direct-message conversations
    Groups {
        /// Filter by name, username or latest message
        #[arg(short, long)]
        query: Option<String>,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the message history of a conversation
    Messages {
        /// Conversation ID
        group: GroupId,
        /// Number of pages to load, newest first
        #[arg(long, default_value = "1")]
        pages: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a message to a conversation
    Send {
        /// Conversation ID
        group: GroupId,
        /// Message text
        #[arg(trailing_var_arg = true, required = true)]
        body: Vec<String>,
    },
    /// Follow a conversation live
    Watch {
        /// Conversation ID
        group: GroupId,
    },
    /// Show timeline posts
    Timeline {
        /// Show the following timeline instead of the global one
        #[arg(long)]
        following: bool,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
        /// Record a view for every listed post not seen before
        #[arg(long)]
        mark_viewed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// REST API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Live-push WebSocket URL (derived from the API URL when omitted)
        #[arg(long, value_name = "URL")]
        live_url: Option<String>,
        /// Bearer token for the API
        #[arg(long, value_name = "TOKEN")]
        access_token: Option<String>,
        /// ID of the signed-in user
        #[arg(long, value_name = "ID")]
        user_id: Option<i64>,
        /// Username of the signed-in user
        #[arg(long, value_name = "NAME")]
        username: Option<String>,
        /// Nickname shown on sent messages
        #[arg(long, value_name = "NAME")]
        nickname: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}
