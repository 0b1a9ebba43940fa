//! Deferred work.
//!
//! Timers and animation frames are modelled as [`Job`] values queued in a
//! [`Scheduler`]. Nothing runs on its own: the page pulls due jobs and
//! dispatches them, so no callback ever holds a borrow of page state. This is
//! the same caller-driven style as a `tick()` loop, with the schedule made
//! explicit.
//!
//! Two schedulers are provided:
//!
//! - [`ManualScheduler`]: virtual time that only moves when told to. Wall
//!   clock is a fixed base instant plus elapsed virtual time.
//! - [`RealtimeScheduler`]: monotonic time from `std::time::Instant` and the
//!   local wall clock from `chrono::Local`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::dom::ElementId;
use crate::wiring::{DebounceKey, ThrottleKey};

/// Spacing of animation frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", content = "arg", rename_all = "snake_case")]
pub enum Job {
    /// Advance the loading progress bar one step.
    LoadingProgress,
    /// Loading overlay has been shown long enough; start fading it out.
    LoadingHold,
    /// Loading overlay is gone; time to evaluate the gate.
    LoadingFaded,
    CountdownTick,
    /// Return a pulsed countdown cell to its resting scale.
    CellSettle(ElementId),
    UnlockComplete,
    /// Staggered reveal of a single element.
    RevealElement(ElementId),
    /// Deferred setup after the content became visible.
    PostReveal,
    ThrottleRelease(ThrottleKey),
    DebounceFire(DebounceKey),
    CursorFrame,
    TypewriterStart(usize),
    TypewriterChar(usize),
    /// Effects that wait for the host `load` event.
    LateEffects,
}

/// Handle returned by [`Scheduler::schedule`], used to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

pub trait Scheduler {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Run `job` once after `delay`.
    fn schedule(&mut self, delay: Duration, job: Job) -> TimerHandle;

    /// Returns false if the handle already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Run `job` on the next animation frame.
    fn request_frame(&mut self, job: Job) -> TimerHandle {
        self.schedule(FRAME_INTERVAL, job)
    }

    /// Remove and return the earliest job that is due now.
    fn pop_due(&mut self) -> Option<Job>;

    /// Time until the earliest pending job, zero if one is already due.
    fn next_due_in(&self) -> Option<Duration>;

    fn pending(&self) -> usize;
}

/// Ordered timer storage keyed by due time in milliseconds. Jobs with the same
/// due time run in scheduling order.
#[derive(Debug, Default, Clone)]
pub struct TimerQueue {
    entries: BTreeMap<(u64, u64), (TimerHandle, Job)>,
    keys: HashMap<TimerHandle, (u64, u64)>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, due_ms: u64, job: Job) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let handle = TimerHandle(seq);
        self.entries.insert((due_ms, seq), (handle, job));
        self.keys.insert(handle, (due_ms, seq));
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.keys.remove(&handle) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest entry if it is due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, Job)> {
        let (&key, _) = self.entries.iter().next()?;
        if key.0 > now_ms {
            return None;
        }
        let (handle, job) = self.entries.remove(&key)?;
        self.keys.remove(&handle);
        Some((key.0, job))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending jobs in due order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.entries.values().map(|(_, job)| job)
    }
}

/// Virtual-time scheduler for tests and simulation.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    base: NaiveDateTime,
    elapsed_ms: u64,
    queue: TimerQueue,
}

impl ManualScheduler {
    /// Start virtual time at wall-clock instant `base`.
    pub fn new(base: NaiveDateTime) -> Self {
        Self {
            base,
            elapsed_ms: 0,
            queue: TimerQueue::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Pop the next job due no later than `until`, moving virtual time to
    /// that job's due instant.
    pub fn pop_until(&mut self, until: Duration) -> Option<Job> {
        let until_ms = duration_ms(until);
        let (due, job) = self.queue.pop_due(until_ms)?;
        self.elapsed_ms = self.elapsed_ms.max(due);
        Some(job)
    }

    /// Move virtual time forward without running anything. Time never moves
    /// backwards.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = self.elapsed_ms.max(duration_ms(elapsed));
    }

    pub fn queue(&self) -> &TimerQueue {
        &self.queue
    }

    /// True if a job equal to `job` is pending.
    pub fn has_pending(&self, job: &Job) -> bool {
        self.queue.jobs().any(|j| j == job)
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> NaiveDateTime {
        offset_clock(self.base, self.elapsed_ms)
    }

    fn schedule(&mut self, delay: Duration, job: Job) -> TimerHandle {
        self.queue
            .push(self.elapsed_ms.saturating_add(duration_ms(delay)), job)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.cancel(handle)
    }

    fn pop_due(&mut self) -> Option<Job> {
        self.queue.pop_due(self.elapsed_ms).map(|(_, job)| job)
    }

    fn next_due_in(&self) -> Option<Duration> {
        self.queue
            .next_due()
            .map(|due| Duration::from_millis(due.saturating_sub(self.elapsed_ms)))
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Wall-clock scheduler for live hosts.
#[derive(Debug)]
pub struct RealtimeScheduler {
    origin: Instant,
    /// Wall clock at `origin`; `None` follows the local clock.
    start: Option<NaiveDateTime>,
    queue: TimerQueue,
}

impl Default for RealtimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            start: None,
            queue: TimerQueue::new(),
        }
    }

    /// Real time passing from a chosen wall-clock instant.
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            ..Self::new()
        }
    }

    fn elapsed_ms(&self) -> u64 {
        duration_ms(self.origin.elapsed())
    }
}

impl Scheduler for RealtimeScheduler {
    fn now(&self) -> NaiveDateTime {
        match self.start {
            Some(start) => offset_clock(start, self.elapsed_ms()),
            None => chrono::Local::now().naive_local(),
        }
    }

    fn schedule(&mut self, delay: Duration, job: Job) -> TimerHandle {
        let due = self.elapsed_ms().saturating_add(duration_ms(delay));
        self.queue.push(due, job)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.cancel(handle)
    }

    fn pop_due(&mut self) -> Option<Job> {
        let now = self.elapsed_ms();
        self.queue.pop_due(now).map(|(_, job)| job)
    }

    fn next_due_in(&self) -> Option<Duration> {
        let now = self.elapsed_ms();
        self.queue
            .next_due()
            .map(|due| Duration::from_millis(due.saturating_sub(now)))
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `base + elapsed_ms`, pinned to the last representable instant.
fn offset_clock(base: NaiveDateTime, elapsed_ms: u64) -> NaiveDateTime {
    let ms = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
    chrono::Duration::try_milliseconds(ms)
        .and_then(|offset| base.checked_add_signed(offset))
        .unwrap_or(NaiveDateTime::MAX)
}
