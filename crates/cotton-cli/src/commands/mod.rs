pub mod common;
pub mod completions;
pub mod config;
pub mod groups;
pub mod messages;
pub mod send;
pub mod timeline;
pub mod watch;
