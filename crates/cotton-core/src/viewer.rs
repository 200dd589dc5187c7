//! Per-view state of one open conversation.
//!
//! A [`MessageViewer`] owns the paginated history, the live incoming buffer and
//! the outbox of one group, and derives the merged, grouped message list from
//! them. Everything is plain `&mut self` state; network calls are split into a
//! begin step that hands out a [`LoadRequest`] and a finish step that applies
//! the result only when it still belongs to the current view.

use std::time::Duration;

use tokio::time::Instant;

use crate::api::{ChatApi, MessageSource};
use crate::config::{ClientConfig, DEFAULT_PAGE_SIZE};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::groups::UnreadCounter;
use crate::merge::MergeMemo;
use crate::models::{GroupId, Identifier, IncomingBuffer, Message, MessageGroup, Page, User};
use crate::outbox::{Draft, Outbox, PendingSend};
use crate::pagination::{Arrangement, CursorPagination, FetchTicket, PageSource};
use crate::runs::MergedRun;
use crate::scroll::{
    Intersection, NewMessageAction, ScrollAnchor, ScrollCommand, ScrollConfig, ScrollCoordinator,
    Viewport,
};

const DEFAULT_MARK_READ_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub scroll: ScrollConfig,
    pub page_size: usize,
    pub mark_read_delay: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            mark_read_delay: DEFAULT_MARK_READ_DELAY,
        }
    }
}

impl From<&ClientConfig> for ViewerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            scroll: config.scroll_config(),
            page_size: config.page_size,
            mark_read_delay: config.mark_read_delay(),
        }
    }
}

/// A history fetch handed out by the viewer, to be run against the API
#[derive(Debug, Clone)]
pub struct LoadRequest {
    ticket: FetchTicket,
    group: GroupId,
    page_size: usize,
}

impl LoadRequest {
    pub const fn group(&self) -> GroupId {
        self.group
    }

    pub async fn fetch<A: ChatApi + Sync>(&self, api: &A) -> Result<Page<Message>> {
        MessageSource::new(api, self.group, self.page_size)
            .fetch_page(self.ticket.cursor())
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { count: usize },
    /// The view was closed or moved on before the page arrived
    Discarded,
}

#[derive(Debug)]
pub struct MessageViewer {
    config: ViewerConfig,
    viewer: User,
    group: MessageGroup,
    history: CursorPagination<Message>,
    incoming: IncomingBuffer,
    outbox: Outbox,
    draft: Draft,
    memo: MergeMemo,
    scroll: ScrollCoordinator,
    mark_read: Debouncer,
    alive: bool,
}

impl MessageViewer {
    pub fn new(group: MessageGroup, viewer: User, config: ViewerConfig) -> Self {
        Self {
            scroll: ScrollCoordinator::new(&config.scroll),
            incoming: IncomingBuffer::new(group.id),
            history: CursorPagination::new(Arrangement::Chronological),
            outbox: Outbox::new(),
            draft: Draft::default(),
            memo: MergeMemo::new(),
            mark_read: Debouncer::new(),
            alive: true,
            config,
            viewer,
            group,
        }
    }

    pub const fn group(&self) -> &MessageGroup {
        &self.group
    }

    pub const fn viewer(&self) -> &User {
        &self.viewer
    }

    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    pub const fn has_older(&self) -> bool {
        self.history.has_next()
    }

    pub const fn is_loading(&self) -> bool {
        self.history.is_in_flight()
    }

    /// Start fetching the next older page.
    ///
    /// Pass the viewport when content is already on screen so the scroll
    /// position can be restored after the prepend. Returns `None` while a
    /// fetch is in flight, once history is exhausted, or after `close`.
    pub fn begin_load_older(&mut self, before: Option<Viewport>) -> Option<LoadRequest> {
        if !self.alive {
            return None;
        }
        let ticket = self.history.begin_fetch()?;
        if let Some(before) = before.filter(|_| self.history.is_first_fetch_done()) {
            self.scroll.anchor.record(before);
        }
        Some(LoadRequest {
            ticket,
            group: self.group.id,
            page_size: self.config.page_size,
        })
    }

    /// Apply a page fetched for `request`.
    ///
    /// Results for a closed view, another group or an older generation are
    /// dropped and reported as [`LoadOutcome::Discarded`].
    pub fn finish_load_older(
        &mut self,
        request: &LoadRequest,
        result: Result<Page<Message>>,
    ) -> Result<LoadOutcome> {
        if !self.alive || request.group != self.group.id {
            tracing::debug!(group = %request.group, "Discarding page for inactive view");
            return Ok(LoadOutcome::Discarded);
        }
        match self.history.complete(&request.ticket, result) {
            Ok(count) => Ok(LoadOutcome::Applied { count }),
            Err(error) if error.is_stale() => {
                tracing::debug!(group = %request.group, "Discarding stale page");
                Ok(LoadOutcome::Discarded)
            }
            Err(error) => {
                self.scroll.anchor = ScrollAnchor::default();
                Err(error)
            }
        }
    }

    /// Fetch and apply the next older page; `None` if no fetch was started
    pub async fn load_older<A: ChatApi + Sync>(
        &mut self,
        api: &A,
        before: Option<Viewport>,
    ) -> Result<Option<LoadOutcome>> {
        let Some(request) = self.begin_load_older(before) else {
            return Ok(None);
        };
        let result = request.fetch(api).await;
        self.finish_load_older(&request, result).map(Some)
    }

    /// Sentinel visibility change; yields a fetch when the trigger allows one.
    ///
    /// An event inside the minimum interval is held; see
    /// [`Self::deferred_load_at`] and [`Self::load_deferred`].
    pub fn on_sentinel(
        &mut self,
        intersection: Intersection,
        now: Instant,
        viewport: Viewport,
    ) -> Option<LoadRequest> {
        let decision = self.scroll.trigger.on_sentinel(
            intersection,
            now,
            self.history.has_next(),
            self.history.is_in_flight(),
        );
        if !decision.should_fetch() {
            tracing::trace!(?decision, "Sentinel ignored");
            return None;
        }
        self.begin_load_older(Some(viewport))
    }

    /// Fire a sentinel event held back by the minimum interval, once due
    pub fn poll_sentinel(&mut self, now: Instant, viewport: Viewport) -> Option<LoadRequest> {
        let decision = self.scroll.trigger.poll(
            now,
            self.history.has_next(),
            self.history.is_in_flight(),
        )?;
        if !decision.should_fetch() {
            return None;
        }
        self.begin_load_older(Some(viewport))
    }

    /// When a held sentinel event becomes due
    pub const fn deferred_load_at(&self) -> Option<Instant> {
        self.scroll.trigger.pending_deadline()
    }

    /// Wait out a held sentinel event, then fetch and apply the page.
    ///
    /// Returns `Ok(None)` when nothing was held or the event no longer
    /// warrants a fetch.
    pub async fn load_deferred<A: ChatApi + Sync>(
        &mut self,
        api: &A,
        viewport: Viewport,
    ) -> Result<Option<LoadOutcome>> {
        let Some(deadline) = self.deferred_load_at() else {
            return Ok(None);
        };
        tokio::time::sleep_until(deadline).await;
        let Some(request) = self.poll_sentinel(Instant::now(), viewport) else {
            return Ok(None);
        };
        let result = request.fetch(api).await;
        self.finish_load_older(&request, result).map(Some)
    }

    /// Scroll correction after older messages were rendered above the fold
    pub fn after_prepend(&mut self, after: Viewport) -> Option<ScrollCommand> {
        self.scroll.anchor.restore(after)
    }

    /// Accept a live message for this conversation; others are ignored
    pub fn push_live(&mut self, message: Message) -> bool {
        if !self.alive || message.group != self.group.id {
            return false;
        }
        self.group.apply_latest(&message);
        self.incoming.push(message)
    }

    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Insert the draft as a provisional message without sending it yet
    pub fn stage_send(&mut self) -> Result<PendingSend> {
        self.outbox
            .stage(&mut self.draft, self.group.id, &self.viewer)
    }

    /// Optimistically send the draft
    pub async fn send<A: ChatApi>(&mut self, api: &A) -> Result<Identifier> {
        self.outbox
            .send(api, &mut self.draft, self.group.id, &self.viewer)
            .await
    }

    /// Merged, deduplicated messages in chronological order
    pub fn messages(&mut self) -> &[Message] {
        self.memo.messages(
            self.history.items(),
            self.incoming.as_slice(),
            self.outbox.messages(),
        )
    }

    /// Display runs of [`Self::messages`]
    pub fn runs(&mut self) -> &[MergedRun] {
        self.memo.runs(
            self.history.items(),
            self.incoming.as_slice(),
            self.outbox.messages(),
        )
    }

    /// Sent messages the server has not confirmed yet
    pub fn pending(&mut self) -> Vec<&Message> {
        let merged = self.memo.messages(
            self.history.items(),
            self.incoming.as_slice(),
            self.outbox.messages(),
        );
        self.outbox.pending(merged)
    }

    pub fn on_new_message(&mut self, viewport: Viewport) -> NewMessageAction {
        self.scroll.autoscroll.on_new_message(viewport)
    }

    pub fn on_user_scroll(&mut self, viewport: Viewport) -> bool {
        self.scroll.autoscroll.on_user_scroll(viewport)
    }

    pub fn on_affordance_clicked(&mut self) -> ScrollCommand {
        self.scroll.autoscroll.on_affordance_clicked()
    }

    pub const fn has_affordance(&self) -> bool {
        self.scroll.autoscroll.has_affordance()
    }

    /// Show another conversation, dropping all state of the current one
    pub fn switch_group(&mut self, group: MessageGroup) {
        tracing::debug!(from = %self.group.id, to = %group.id, "Switching conversation");
        self.scroll.trigger.detach();
        self.mark_read.cancel();
        self.history.reset();
        self.incoming = IncomingBuffer::new(group.id);
        self.outbox = Outbox::new();
        self.draft = Draft::default();
        self.memo.clear();
        self.scroll = ScrollCoordinator::new(&self.config.scroll);
        self.group = group;
        self.alive = true;
    }

    /// Tear the view down; completions arriving later are discarded
    pub fn close(&mut self) {
        self.alive = false;
        self.scroll.trigger.detach();
        self.mark_read.cancel();
        self.history.reset();
    }

    /// Mark the conversation read after the configured delay.
    ///
    /// Rescheduling replaces the pending call. On success `unread` is reset.
    pub fn schedule_mark_read<A>(&mut self, api: A, unread: UnreadCounter)
    where
        A: ChatApi + Send + Sync + 'static,
    {
        if !self.alive {
            return;
        }
        let group = self.group.id;
        self.mark_read.schedule(self.config.mark_read_delay, async move {
            match api.mark_read(group).await {
                Ok(()) => unread.reset(),
                Err(error) => tracing::warn!(%group, "Failed to mark messages read: {}", error),
            }
        });
    }

    pub fn is_mark_read_pending(&self) -> bool {
        self.mark_read.is_pending()
    }
}
