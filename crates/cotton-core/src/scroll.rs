//! Scroll coordination for a conversation view.
//!
//! Three independent behaviors, all driven by the rendering layer:
//! backward pagination when the sentinel above the oldest message becomes
//! visible, scroll-anchor preservation across prepends, and autoscroll (or a
//! "new message" affordance) when messages arrive.

use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_PAGINATION_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_AUTOSCROLL_DELAY: Duration = Duration::from_millis(100);

/// Scroll metrics of the message container, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    pub const fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Within one screen of the bottom
    pub fn is_near_bottom(&self) -> bool {
        self.client_height * 2.0 > self.scroll_height - self.scroll_top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Scroll request for the rendering layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCommand {
    /// Jump to an absolute offset without animation
    JumpTo { top: f64 },
    /// Scroll to the current bottom of the container
    ToBottom { behavior: ScrollBehavior },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Minimum time between two backward-pagination requests
    pub pagination_interval: Duration,
    /// Settle time before autoscrolling to a new message
    pub autoscroll_delay: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            pagination_interval: DEFAULT_PAGINATION_INTERVAL,
            autoscroll_delay: DEFAULT_AUTOSCROLL_DELAY,
        }
    }
}

/// Visibility change reported by the intersection observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    Entered,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Detached,
    NotVisible,
    Exhausted,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Fetch,
    /// Inside the minimum interval; the fetch is held until the interval ends
    Deferred(Duration),
    Suppressed(SuppressReason),
}

impl TriggerDecision {
    pub const fn should_fetch(self) -> bool {
        matches!(self, Self::Fetch)
    }
}

/// Gate between sentinel visibility and backward pagination.
///
/// The first visible sentinel fires at once. A repeat inside the minimum
/// interval is not dropped: it leaves a pending deadline that
/// [`PaginationTrigger::poll`] fires once the interval has passed. A later
/// event replaces the pending one, and `Exited` or `detach` cancels it.
#[derive(Debug, Clone)]
pub struct PaginationTrigger {
    min_interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<Instant>,
    attached: bool,
}

impl PaginationTrigger {
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fired: None,
            pending: None,
            attached: true,
        }
    }

    /// Decide whether a sentinel event should request the next older page
    pub fn on_sentinel(
        &mut self,
        intersection: Intersection,
        now: Instant,
        has_next: bool,
        in_flight: bool,
    ) -> TriggerDecision {
        self.pending = None;
        if intersection == Intersection::Exited {
            return if self.attached {
                TriggerDecision::Suppressed(SuppressReason::NotVisible)
            } else {
                TriggerDecision::Suppressed(SuppressReason::Detached)
            };
        }
        self.decide(now, has_next, in_flight)
    }

    /// Fire a held sentinel event whose deadline has passed.
    ///
    /// Returns `None` when nothing is pending. A pending event survives an
    /// in-flight fetch and fires on a later poll.
    pub fn poll(
        &mut self,
        now: Instant,
        has_next: bool,
        in_flight: bool,
    ) -> Option<TriggerDecision> {
        let deadline = self.pending?;
        if now < deadline {
            return Some(TriggerDecision::Deferred(deadline - now));
        }
        if in_flight && self.attached && has_next {
            return Some(TriggerDecision::Suppressed(SuppressReason::InFlight));
        }
        self.pending = None;
        Some(self.decide(now, has_next, in_flight))
    }

    /// Deadline of the held sentinel event, if any
    pub const fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    fn decide(&mut self, now: Instant, has_next: bool, in_flight: bool) -> TriggerDecision {
        if !self.attached {
            return TriggerDecision::Suppressed(SuppressReason::Detached);
        }
        if !has_next {
            return TriggerDecision::Suppressed(SuppressReason::Exhausted);
        }
        if in_flight {
            return TriggerDecision::Suppressed(SuppressReason::InFlight);
        }
        if let Some(last) = self.last_fired {
            let ready_at = last + self.min_interval;
            if now < ready_at {
                self.pending = Some(ready_at);
                return TriggerDecision::Deferred(ready_at - now);
            }
        }
        self.last_fired = Some(now);
        TriggerDecision::Fetch
    }

    /// Stop reacting to the sentinel (view context changed)
    pub fn detach(&mut self) {
        self.attached = false;
        self.pending = None;
    }

    pub fn attach(&mut self) {
        self.attached = true;
        self.last_fired = None;
        self.pending = None;
    }

    pub const fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Keeps the visible content in place when older messages are prepended
#[derive(Debug, Clone, Default)]
pub struct ScrollAnchor {
    recorded_height: Option<f64>,
}

impl ScrollAnchor {
    /// Remember the scrollable height before a prepend
    pub fn record(&mut self, before: Viewport) {
        self.recorded_height = Some(before.scroll_height);
    }

    /// Offset the scroll position by the height the prepend added
    pub fn restore(&mut self, after: Viewport) -> Option<ScrollCommand> {
        let before = self.recorded_height.take()?;
        let delta = after.scroll_height - before;
        Some(ScrollCommand::JumpTo {
            top: after.scroll_top + delta,
        })
    }

    pub const fn is_recorded(&self) -> bool {
        self.recorded_height.is_some()
    }
}

/// What to do when a new message lands in the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewMessageAction {
    /// Viewer is at the bottom: follow the conversation after the delay
    ScrollToBottomAfter(Duration),
    /// Viewer is reading history: show the "new message" affordance
    ShowAffordance,
}

/// Autoscroll and the "new message" affordance
#[derive(Debug, Clone)]
pub struct Autoscroll {
    delay: Duration,
    affordance: bool,
}

impl Autoscroll {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            affordance: false,
        }
    }

    pub fn on_new_message(&mut self, viewport: Viewport) -> NewMessageAction {
        if viewport.is_near_bottom() {
            NewMessageAction::ScrollToBottomAfter(self.delay)
        } else {
            self.affordance = true;
            NewMessageAction::ShowAffordance
        }
    }

    /// Returns true when the affordance was cleared by this scroll
    pub fn on_user_scroll(&mut self, viewport: Viewport) -> bool {
        if self.affordance && viewport.is_near_bottom() {
            self.affordance = false;
            return true;
        }
        false
    }

    pub fn on_affordance_clicked(&mut self) -> ScrollCommand {
        self.affordance = false;
        ScrollCommand::ToBottom {
            behavior: ScrollBehavior::Smooth,
        }
    }

    pub const fn has_affordance(&self) -> bool {
        self.affordance
    }
}

/// The three scroll behaviors of one conversation view
#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    pub trigger: PaginationTrigger,
    pub anchor: ScrollAnchor,
    pub autoscroll: Autoscroll,
}

impl ScrollCoordinator {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            trigger: PaginationTrigger::new(config.pagination_interval),
            anchor: ScrollAnchor::default(),
            autoscroll: Autoscroll::new(config.autoscroll_delay),
        }
    }
}
