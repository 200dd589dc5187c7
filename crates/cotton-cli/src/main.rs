//! Cotton CLI - Command-line interface for Cotton conversations
//!
//! Read, follow and answer conversations from the terminal.

mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::groups::run_groups;
use crate::commands::messages::run_messages;
use crate::commands::send::run_send;
use crate::commands::timeline::run_timeline;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "cotton=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Groups { query, pages, json } => {
            run_groups(query.as_deref(), pages, json, profile).await?;
        }
        Commands::Messages { group, pages, json } => {
            run_messages(group, pages, json, profile).await?;
        }
        Commands::Send { group, body } => run_send(group, &body, profile).await?,
        Commands::Watch { group } => run_watch(group, profile).await?,
        Commands::Timeline {
            following,
            pages,
            mark_viewed,
            json,
        } => {
            run_timeline(following, pages, mark_viewed, json, profile).await?;
        }
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
        Commands::Config { command } => run_config(command, profile)?,
    }

    Ok(())
}
