//! Host event wiring.
//!
//! Listeners are registered in a [`Subscriptions`] table as plain
//! [`Handler`] values; registering returns a [`SubscriptionId`] that removes
//! the listener again. High-frequency events are rate limited by
//! [`Throttle`] (leading edge, drops calls inside the window) and
//! [`Debounce`] (trailing edge, fires once the input settles). Both use the
//! page scheduler for their timers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dom::ElementId;
use crate::scheduler::{Job, Scheduler, TimerHandle};

/// Events delivered by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The page scrolled; the new offset is read from the document.
    Scroll,
    /// The viewport changed size.
    Resize,
    /// Pointer moved to client coordinates `(x, y)` over `target`.
    PointerMove {
        x: f64,
        y: f64,
        target: Option<ElementId>,
    },
    PointerLeave { target: ElementId },
    Click { target: ElementId },
    /// All page resources finished loading.
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Scroll,
    Resize,
    PointerMove,
    PointerLeave,
    Click,
    Load,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Scroll => EventKind::Scroll,
            HostEvent::Resize => EventKind::Resize,
            HostEvent::PointerMove { .. } => EventKind::PointerMove,
            HostEvent::PointerLeave { .. } => EventKind::PointerLeave,
            HostEvent::Click { .. } => EventKind::Click,
            HostEvent::Load => EventKind::Load,
        }
    }
}

/// What a listener does when its event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "handler", content = "element", rename_all = "snake_case")]
pub enum Handler {
    /// Re-scan tracked elements (throttled on scroll, debounced on resize).
    VisibilityCheck,
    /// Offset background shapes (throttled).
    Parallax,
    /// Feed the pointer position to the cursor glow.
    CursorTrack,
    CardTilt(ElementId),
    CardReset(ElementId),
    SmoothScroll(ElementId),
    MarkLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default, Clone)]
pub struct Subscriptions {
    entries: Vec<(SubscriptionId, EventKind, Handler)>,
    next_id: u64,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, kind, handler));
        id
    }

    /// Dispose a listener. Returns false if it was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _, _)| *sid != id);
        self.entries.len() != before
    }

    /// Handlers registered for `kind`, in registration order.
    pub fn handlers_for(&self, kind: EventKind) -> Vec<Handler> {
        self.entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| *h)
            .collect()
    }

    pub fn is_subscribed(&self, kind: EventKind, handler: Handler) -> bool {
        self.entries
            .iter()
            .any(|(_, k, h)| *k == kind && *h == handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleKey {
    VisibilityScroll,
    Parallax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceKey {
    VisibilityResize,
}

/// Leading-edge throttle: the first call passes, calls within `limit` after
/// it are dropped.
#[derive(Debug, Clone)]
pub struct Throttle {
    key: ThrottleKey,
    limit: Duration,
    blocked: bool,
}

impl Throttle {
    pub fn new(key: ThrottleKey, limit: Duration) -> Self {
        Self {
            key,
            limit,
            blocked: false,
        }
    }

    /// True if the call may proceed. Starts the blocking window when it does.
    pub fn admit<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if self.blocked {
            return false;
        }
        self.blocked = true;
        scheduler.schedule(self.limit, Job::ThrottleRelease(self.key));
        true
    }

    pub fn release(&mut self) {
        self.blocked = false;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

/// Trailing-edge debounce: every trigger restarts the wait; the action runs
/// once, `wait` after the last trigger.
#[derive(Debug, Clone)]
pub struct Debounce {
    key: DebounceKey,
    wait: Duration,
    pending: Option<TimerHandle>,
}

impl Debounce {
    pub fn new(key: DebounceKey, wait: Duration) -> Self {
        Self {
            key,
            wait,
            pending: None,
        }
    }

    pub fn trigger<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.pending = Some(scheduler.schedule(self.wait, Job::DebounceFire(self.key)));
    }

    /// Called when the fire job runs. Returns true if the action should run.
    pub fn fire(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
