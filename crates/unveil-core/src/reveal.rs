//! Reveal controller.
//!
//! A forward-only state machine deciding when the page content becomes
//! visible. Like a timer engine it owns no thread: every timed step is a
//! [`Job`] handed to the [`Scheduler`], and the page calls back into the
//! matching `on_*` method when that job comes due.
//!
//! ## State Transitions
//!
//! ```text
//! Loading -> Revealed                    (inside the window, or no gate)
//! Loading -> Locked -> Unlocking -> Revealed   (countdown runs out)
//! ```
//!
//! Every handler checks the current state first, so a stale or duplicated
//! job is a no-op rather than a backwards move.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::decor::countdown::CountdownCells;
use crate::dom::{Document, Selector};
use crate::error::TransitionError;
use crate::events::Event;
use crate::gate::{self, AnnualWindow, CountdownSnapshot};
use crate::scheduler::{Job, Scheduler, TimerHandle};
use crate::visibility::{TRACKED_CLASS, VISIBLE_CLASS};

pub const LOADING_SCREEN_ID: &str = "loadingScreen";
pub const LOCK_SCREEN_ID: &str = "lockScreen";
pub const CONTENT_ID: &str = "birthdayContent";

pub const HIDDEN_CLASS: &str = "hidden";
pub const UNLOCKING_CLASS: &str = "unlocking";
pub const REVEALING_CLASS: &str = "revealing";
pub const HERO_CLASS: &str = "hero";

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealState {
    /// Loading sequence is playing; nothing decided yet.
    Loading,
    /// Outside the window; countdown running.
    Locked,
    /// Countdown reached zero; unlock animation playing.
    Unlocking,
    /// Content visible. Terminal.
    Revealed,
}

impl RevealState {
    pub fn can_transition_to(self, next: RevealState) -> bool {
        use RevealState::*;
        matches!(
            (self, next),
            (Loading, Locked) | (Loading, Revealed) | (Locked, Unlocking) | (Unlocking, Revealed)
        )
    }

    pub fn is_revealed(self) -> bool {
        self == RevealState::Revealed
    }
}

/// Delays used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTimings {
    pub loading_hold: Duration,
    pub loading_fade: Duration,
    pub unlock: Duration,
    pub stagger: Duration,
    pub post_reveal: Duration,
}

impl RevealTimings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            loading_hold: Duration::from_millis(config.loading.hold_ms),
            loading_fade: Duration::from_millis(config.loading.fade_ms),
            unlock: Duration::from_millis(config.reveal.unlock_duration_ms),
            stagger: Duration::from_millis(config.reveal.stagger_ms),
            post_reveal: Duration::from_millis(config.reveal.post_reveal_delay_ms),
        }
    }
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone)]
pub struct RevealController {
    state: RevealState,
    gate: Option<AnnualWindow>,
    timings: RevealTimings,
    /// Window start the countdown runs toward (only set once Locked).
    target: Option<NaiveDateTime>,
    countdown_timer: Option<TimerHandle>,
    last_snapshot: Option<CountdownSnapshot>,
    cells: CountdownCells,
}

impl RevealController {
    /// `gate = None` means content is never gated.
    pub fn new(gate: Option<AnnualWindow>, timings: RevealTimings) -> Self {
        Self {
            state: RevealState::Loading,
            gate,
            timings,
            target: None,
            countdown_timer: None,
            last_snapshot: None,
            cells: CountdownCells::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn gate(&self) -> Option<AnnualWindow> {
        self.gate
    }

    pub fn target(&self) -> Option<NaiveDateTime> {
        self.target
    }

    pub fn last_snapshot(&self) -> Option<CountdownSnapshot> {
        self.last_snapshot
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Apply a state change if it moves forward along a permitted edge.
    pub fn transition(&mut self, to: RevealState, at: NaiveDateTime) -> Result<Event, TransitionError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            tracing::warn!(?from, ?to, "rejected reveal transition");
            return Err(TransitionError { from, to });
        }
        self.state = to;
        tracing::info!(?from, ?to, "reveal state changed");
        Ok(Event::StateChanged { from, to, at })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the loading sequence. Without a loading overlay the gate is
    /// evaluated straight away.
    pub fn begin_loading<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if self.state != RevealState::Loading {
            return Vec::new();
        }
        if doc.find_by_id(LOADING_SCREEN_ID).is_none() {
            tracing::trace!("no loading overlay, deciding immediately");
            return self.decide(doc, sched);
        }
        sched.schedule(self.timings.loading_hold, Job::LoadingHold);
        vec![Event::LoadingStarted { at: sched.now() }]
    }

    /// Overlay has been shown long enough: start hiding it.
    pub fn on_loading_hold<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if self.state != RevealState::Loading {
            return Vec::new();
        }
        if let Some(overlay) = doc.find_by_id(LOADING_SCREEN_ID) {
            doc.add_class(overlay, HIDDEN_CLASS);
        }
        sched.schedule(self.timings.loading_fade, Job::LoadingFaded);
        Vec::new()
    }

    pub fn on_loading_faded<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if self.state != RevealState::Loading {
            return Vec::new();
        }
        let mut events = vec![Event::LoadingFinished { at: sched.now() }];
        events.extend(self.decide(doc, sched));
        events
    }

    /// Evaluate the gate and leave the Loading state.
    pub fn decide<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if self.state != RevealState::Loading {
            return Vec::new();
        }
        let now = sched.now();
        let window = match self.gate {
            Some(window) if !gate::is_within_window(window, now) => window,
            _ => return self.enter_revealed(doc, sched),
        };

        let mut events = Vec::new();
        match self.transition(RevealState::Locked, now) {
            Ok(event) => events.push(event),
            Err(_) => return events,
        }
        if let Some(lock) = doc.find_by_id(LOCK_SCREEN_ID) {
            doc.remove_class(lock, HIDDEN_CLASS);
        }
        if let Some(content) = doc.find_by_id(CONTENT_ID) {
            doc.add_class(content, HIDDEN_CLASS);
        }
        self.cells = CountdownCells::locate(&*doc);
        self.target = Some(gate::next_occurrence(window, now));
        events.extend(self.on_countdown_tick(doc, sched));
        events
    }

    /// One countdown step while Locked.
    pub fn on_countdown_tick<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if self.state != RevealState::Locked {
            return Vec::new();
        }
        self.countdown_timer = None;
        let now = sched.now();
        let Some(target) = self.target else {
            return Vec::new();
        };
        let remaining = (target - now).num_milliseconds();

        let Some(snapshot) = CountdownSnapshot::from_millis(remaining) else {
            self.last_snapshot = None;
            return self.begin_unlock(doc, sched);
        };

        self.last_snapshot = Some(snapshot);
        self.cells.render(doc, sched, &snapshot);
        self.countdown_timer = Some(sched.schedule(TICK_INTERVAL, Job::CountdownTick));
        vec![Event::CountdownTicked { snapshot, at: now }]
    }

    fn begin_unlock<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if let Some(handle) = self.countdown_timer.take() {
            sched.cancel(handle);
        }
        let event = match self.transition(RevealState::Unlocking, sched.now()) {
            Ok(event) => event,
            Err(_) => return Vec::new(),
        };
        if let Some(lock) = doc.find_by_id(LOCK_SCREEN_ID) {
            doc.add_class(lock, UNLOCKING_CLASS);
        }
        sched.schedule(self.timings.unlock, Job::UnlockComplete);
        vec![event]
    }

    /// Unlock animation finished.
    pub fn on_unlock_complete<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        if self.state != RevealState::Unlocking {
            return Vec::new();
        }
        if let Some(content) = doc.find_by_id(CONTENT_ID) {
            doc.add_class(content, REVEALING_CLASS);
        }
        self.enter_revealed(doc, sched)
    }

    fn enter_revealed<D, S>(&mut self, doc: &mut D, sched: &mut S) -> Vec<Event>
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        let event = match self.transition(RevealState::Revealed, sched.now()) {
            Ok(event) => event,
            Err(_) => return Vec::new(),
        };
        self.target = None;

        if let Some(lock) = doc.find_by_id(LOCK_SCREEN_ID) {
            doc.add_class(lock, HIDDEN_CLASS);
        }
        match doc.find_by_id(CONTENT_ID) {
            Some(content) => doc.remove_class(content, HIDDEN_CLASS),
            None => tracing::trace!("content region missing"),
        }

        let hero = Selector::class(TRACKED_CLASS)
            .within(Selector::class(HERO_CLASS))
            .without(VISIBLE_CLASS);
        for (index, el) in doc.find_all(&hero).into_iter().enumerate() {
            let step = u32::try_from(index).unwrap_or(u32::MAX);
            let delay = self.timings.stagger.saturating_mul(step);
            sched.schedule(delay, Job::RevealElement(el));
        }
        sched.schedule(self.timings.post_reveal, Job::PostReveal);
        vec![event]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Rect, VirtualDocument};
    use crate::scheduler::ManualScheduler;
    use chrono::NaiveDate;

    fn at(m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn doc() -> VirtualDocument {
        let mut doc = VirtualDocument::default();
        let body = doc.body().unwrap();
        let lock = doc
            .insert(body, "div", Some(LOCK_SCREEN_ID), &[HIDDEN_CLASS], Rect::default())
            .unwrap();
        for id in ["days", "hours", "minutes", "seconds"] {
            doc.insert(lock, "span", Some(id), &[], Rect::default());
        }
        let content = doc
            .insert(body, "main", Some(CONTENT_ID), &[HIDDEN_CLASS], Rect::default())
            .unwrap();
        let hero = doc
            .insert(content, "section", None, &[HERO_CLASS], Rect::default())
            .unwrap();
        for top in [100.0, 200.0, 300.0] {
            doc.insert(hero, "p", None, &[TRACKED_CLASS], Rect::new(0.0, top, 10.0, 10.0));
        }
        doc
    }

    /// Drop jobs until `wanted` comes due.
    fn skip_to(sched: &mut ManualScheduler, until: Duration, wanted: &Job) -> bool {
        while let Some(job) = sched.pop_until(until) {
            if &job == wanted {
                return true;
            }
        }
        false
    }

    fn controller() -> RevealController {
        RevealController::new(Some(AnnualWindow::new(0, 20).unwrap()), RevealTimings::default())
    }

    #[test]
    fn only_forward_edges_are_permitted() {
        use RevealState::*;
        assert!(Loading.can_transition_to(Locked));
        assert!(Loading.can_transition_to(Revealed));
        assert!(Locked.can_transition_to(Unlocking));
        assert!(Unlocking.can_transition_to(Revealed));

        assert!(!Locked.can_transition_to(Revealed));
        assert!(!Revealed.can_transition_to(Loading));
        assert!(!Revealed.can_transition_to(Locked));
        assert!(!Unlocking.can_transition_to(Locked));
        assert!(!Loading.can_transition_to(Unlocking));
    }

    #[test]
    fn rejected_transition_leaves_state_untouched() {
        let mut c = controller();
        let err = c.transition(RevealState::Unlocking, at(1, 1, 0, 0, 0)).unwrap_err();
        assert_eq!(err.from, RevealState::Loading);
        assert_eq!(c.state(), RevealState::Loading);
    }

    #[test]
    fn inside_window_reveals_without_countdown() {
        let mut doc = doc();
        let mut sched = ManualScheduler::new(at(1, 20, 0, 0, 0));
        let mut c = controller();

        let events = c.decide(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Revealed);
        assert_eq!(events.len(), 1);
        assert!(c.last_snapshot().is_none());
        assert!(!sched.has_pending(&Job::CountdownTick));

        let content = doc.find_by_id(CONTENT_ID).unwrap();
        let lock = doc.find_by_id(LOCK_SCREEN_ID).unwrap();
        assert!(!doc.has_class(content, HIDDEN_CLASS));
        assert!(doc.has_class(lock, HIDDEN_CLASS));
        assert!(sched.has_pending(&Job::PostReveal));
    }

    #[test]
    fn no_gate_reveals_immediately() {
        let mut doc = doc();
        let mut sched = ManualScheduler::new(at(6, 1, 12, 0, 0));
        let mut c = RevealController::new(None, RevealTimings::default());
        c.decide(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Revealed);
    }

    #[test]
    fn outside_window_locks_and_renders_countdown() {
        let mut doc = doc();
        let mut sched = ManualScheduler::new(at(1, 19, 23, 59, 58));
        let mut c = controller();

        c.decide(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Locked);
        assert_eq!(c.target(), Some(at(1, 20, 0, 0, 0)));
        assert_eq!(c.last_snapshot().unwrap().seconds, 2);

        let seconds = doc.find_by_id("seconds").unwrap();
        assert_eq!(doc.text(seconds).as_deref(), Some("02"));
        let lock = doc.find_by_id(LOCK_SCREEN_ID).unwrap();
        assert!(!doc.has_class(lock, HIDDEN_CLASS));
    }

    #[test]
    fn countdown_expiry_passes_through_unlocking() {
        let mut doc = doc();
        let mut sched = ManualScheduler::new(at(1, 19, 23, 59, 59));
        let mut c = controller();

        c.decide(&mut doc, &mut sched);
        assert_eq!(c.last_snapshot().unwrap().seconds, 1);

        assert!(skip_to(&mut sched, Duration::from_secs(1), &Job::CountdownTick));
        let events = c.on_countdown_tick(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Unlocking);
        assert!(matches!(
            events[0],
            Event::StateChanged {
                from: RevealState::Locked,
                to: RevealState::Unlocking,
                ..
            }
        ));
        let lock = doc.find_by_id(LOCK_SCREEN_ID).unwrap();
        assert!(doc.has_class(lock, UNLOCKING_CLASS));

        // Stale ticks after expiry do nothing.
        assert!(c.on_countdown_tick(&mut doc, &mut sched).is_empty());

        while let Some(job) = sched.pop_until(Duration::from_millis(2500)) {
            if job == Job::UnlockComplete {
                c.on_unlock_complete(&mut doc, &mut sched);
            }
        }
        assert_eq!(c.state(), RevealState::Revealed);
        let content = doc.find_by_id(CONTENT_ID).unwrap();
        assert!(doc.has_class(content, REVEALING_CLASS));
        assert!(!doc.has_class(content, HIDDEN_CLASS));
    }

    #[test]
    fn hero_elements_are_staggered() {
        let mut doc = doc();
        let mut sched = ManualScheduler::new(at(1, 20, 9, 0, 0));
        let mut c = controller();
        c.decide(&mut doc, &mut sched);

        let hero = doc.find_all(&Selector::class(TRACKED_CLASS));
        let mut seen = Vec::new();
        while let Some(job) = sched.pop_until(Duration::from_millis(250)) {
            if let Job::RevealElement(el) = job {
                seen.push((el, sched.elapsed().as_millis()));
            }
        }
        assert_eq!(seen, vec![(hero[0], 0), (hero[1], 100), (hero[2], 200)]);
    }

    #[test]
    fn loading_overlay_delays_decision() {
        let mut doc = doc();
        let body = doc.body().unwrap();
        let overlay = doc
            .insert(body, "div", Some(LOADING_SCREEN_ID), &[], Rect::default())
            .unwrap();
        let mut sched = ManualScheduler::new(at(1, 20, 9, 0, 0));
        let mut c = controller();

        c.begin_loading(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Loading);

        assert_eq!(sched.pop_until(Duration::from_millis(4500)), Some(Job::LoadingHold));
        c.on_loading_hold(&mut doc, &mut sched);
        assert!(doc.has_class(overlay, HIDDEN_CLASS));

        assert_eq!(sched.pop_until(Duration::from_millis(5700)), Some(Job::LoadingFaded));
        c.on_loading_faded(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Revealed);
    }

    #[test]
    fn missing_regions_do_not_block_the_state_machine() {
        let mut doc = VirtualDocument::default();
        let mut sched = ManualScheduler::new(at(1, 19, 23, 59, 59));
        let mut c = controller();
        c.begin_loading(&mut doc, &mut sched);
        assert_eq!(c.state(), RevealState::Locked);

        while let Some(job) = sched.pop_until(Duration::from_secs(3)) {
            match job {
                Job::CountdownTick => {
                    c.on_countdown_tick(&mut doc, &mut sched);
                }
                Job::UnlockComplete => {
                    c.on_unlock_complete(&mut doc, &mut sched);
                }
                _ => {}
            }
        }
        assert_eq!(c.state(), RevealState::Revealed);
    }
}
