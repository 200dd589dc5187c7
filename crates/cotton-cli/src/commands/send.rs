use cotton_core::{GroupId, MessageViewer};

use crate::commands::common::{bare_group, normalize_content, Session};
use crate::error::CliError;

pub async fn run_send(
    group: GroupId,
    body_parts: &[String],
    profile: Option<&str>,
) -> Result<(), CliError> {
    let body = normalize_content(&body_parts.join(" ")).ok_or(CliError::EmptyMessage)?;
    let session = Session::open(profile)?;

    let mut viewer = MessageViewer::new(
        bare_group(group),
        session.require_viewer()?,
        session.viewer_config(),
    );
    viewer.draft_mut().set(body);
    let identifier = viewer.send(&session.api).await?;

    println!("{identifier}");
    Ok(())
}
