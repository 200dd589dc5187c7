use cotton_core::{GroupId, MessageViewer};

use crate::commands::common::{bare_group, format_run_lines, run_to_item, RunItem, Session};
use crate::error::CliError;

/// Open a viewer on `group` and load up to `pages` pages of history
pub async fn load_history(
    session: &Session,
    group: GroupId,
    pages: usize,
) -> Result<MessageViewer, CliError> {
    let mut viewer = MessageViewer::new(
        bare_group(group),
        session.require_viewer()?,
        session.viewer_config(),
    );
    for _ in 0..pages.max(1) {
        if viewer.load_older(&session.api, None).await?.is_none() {
            break;
        }
    }
    Ok(viewer)
}

pub async fn run_messages(
    group: GroupId,
    pages: usize,
    as_json: bool,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let session = Session::open(profile)?;
    let mut viewer = load_history(&session, group, pages).await?;

    let runs = viewer.runs();
    if as_json {
        let items = runs.iter().map(run_to_item).collect::<Vec<RunItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if runs.is_empty() {
        println!("No messages");
    } else {
        for line in format_run_lines(runs, session.viewer_id()) {
            println!("{line}");
        }
    }

    Ok(())
}
