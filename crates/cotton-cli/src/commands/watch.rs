use cotton_core::groups::UnreadCounter;
use cotton_core::live::{LiveConnection, LiveEvent};
use cotton_core::{GroupId, Identifier, Message, MessageViewer, UserId};

use crate::commands::common::{format_message_line, format_run_header, format_run_lines, Session};
use crate::commands::messages::load_history;
use crate::error::CliError;

pub async fn run_watch(group: GroupId, profile: Option<&str>) -> Result<(), CliError> {
    let session = Session::open(profile)?;
    let viewer_id = session.viewer_id();
    let live_url = session
        .config
        .resolved_live_url()
        .ok_or_else(|| CliError::LiveNotConfigured(session.profile_name.clone()))?;

    let mut viewer = load_history(&session, group, 1).await?;
    for line in format_run_lines(viewer.runs(), viewer_id) {
        println!("{line}");
    }
    let mut last_run = viewer.runs().last().map(|run| run.key().clone());

    let mut connection = LiveConnection::connect(&live_url, session.access_token.as_deref()).await?;
    let unread = UnreadCounter::new();
    viewer.schedule_mark_read(session.api.clone(), unread.clone());

    loop {
        let event = tokio::select! {
            event = connection.recv() => event,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(event) = event else {
            eprintln!("Live channel closed");
            break;
        };

        match event {
            LiveEvent::Message(message) => {
                let identifier = message.identifier.clone();
                let from_other = viewer_id != Some(message.user);
                let seen = is_confirmed_in(&mut viewer, &identifier);
                if !viewer.push_live(message) || seen {
                    continue;
                }
                if from_other {
                    unread.increment();
                    viewer.schedule_mark_read(session.api.clone(), unread.clone());
                }
                print_arrival(&mut viewer, &identifier, &mut last_run, viewer_id);
            }
            LiveEvent::GroupUpdated(updated) => {
                tracing::debug!(group = %updated.id, "Group updated");
            }
            LiveEvent::ServerError(message) => eprintln!("Server: {message}"),
        }
    }

    viewer.close();
    connection.close();
    Ok(())
}

fn is_confirmed_in(viewer: &mut MessageViewer, identifier: &Identifier) -> bool {
    viewer
        .messages()
        .iter()
        .any(|message: &Message| message.is_confirmed() && &message.identifier == identifier)
}

fn print_arrival(
    viewer: &mut MessageViewer,
    identifier: &Identifier,
    last_run: &mut Option<Identifier>,
    viewer_id: Option<UserId>,
) {
    let Some(run) = viewer
        .runs()
        .iter()
        .find(|run| run.messages().iter().any(|message| &message.identifier == identifier))
    else {
        return;
    };
    if last_run.as_ref() != Some(run.key()) {
        println!("{}", format_run_header(run, viewer_id));
        *last_run = Some(run.key().clone());
    }
    if let Some(message) = run
        .messages()
        .iter()
        .find(|message| &message.identifier == identifier)
    {
        println!("{}", format_message_line(message));
    }
}
