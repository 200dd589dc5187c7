use chrono::Utc;
use cotton_core::groups::GroupList;

use crate::commands::common::{format_group_lines, Session};
use crate::error::CliError;

pub async fn run_groups(
    query: Option<&str>,
    pages: usize,
    as_json: bool,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let session = Session::open(profile)?;
    let viewer = session.require_viewer()?;

    let mut list = GroupList::new(viewer.id);
    for _ in 0..pages.max(1) {
        list.load_more(&session.api).await?;
        if !list.has_next() {
            break;
        }
    }

    let summaries = list.search(query.unwrap_or(""), Utc::now());
    if as_json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if summaries.is_empty() {
        println!("No conversations");
    } else {
        for line in format_group_lines(&summaries) {
            println!("{line}");
        }
    }

    Ok(())
}
