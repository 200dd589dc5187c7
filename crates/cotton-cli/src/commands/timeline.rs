use chrono::Utc;
use cotton_core::api::{Timeline, TimelineSource};
use cotton_core::models::Post;
use cotton_core::pagination::{Arrangement, CursorPagination};
use cotton_core::reactions::ReactionOverrides;

use crate::commands::common::{format_post_lines, post_to_item, PostItem, Session};
use crate::error::CliError;

pub async fn run_timeline(
    following: bool,
    pages: usize,
    mark_viewed: bool,
    as_json: bool,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let session = Session::open(profile)?;
    let timeline = if following {
        Timeline::Following
    } else {
        Timeline::Global
    };

    let source = TimelineSource::new(&session.api, timeline);
    let mut posts = CursorPagination::<Post>::new(Arrangement::AsDelivered);
    for _ in 0..pages.max(1) {
        posts.fetch_next(&source).await?;
        if !posts.has_next() {
            break;
        }
    }

    let mut overrides = ReactionOverrides::new(session.viewer_id());
    if mark_viewed {
        record_views(&session, &mut overrides, posts.items()).await?;
    }

    let now = Utc::now();
    if as_json {
        let items = posts
            .items()
            .iter()
            .map(|post| post_to_item(post, &overrides, now))
            .collect::<Vec<PostItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if posts.items().is_empty() {
        println!("No posts");
    } else {
        for line in format_post_lines(posts.items(), &overrides, now) {
            println!("{line}");
        }
    }

    Ok(())
}

async fn record_views(
    session: &Session,
    overrides: &mut ReactionOverrides,
    posts: &[Post],
) -> Result<(), CliError> {
    let mut recorded = 0usize;
    for post in posts {
        if !overrides.should_record_view(post) {
            continue;
        }
        overrides.mark_viewed(post)?.submit(&session.api).await?;
        recorded += 1;
    }
    tracing::info!(recorded, "Recorded post views");
    Ok(())
}
