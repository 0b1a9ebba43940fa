//! Page runtime.
//!
//! [`Page`] owns the document, the scheduler and one instance of every
//! component. A host drives it with two calls:
//!
//! - [`Page::dispatch`] for each host event (scroll, resize, pointer, click,
//!   load)
//! - [`Page::run_due`] whenever the scheduler has due jobs
//!
//! Every observable change is appended to a bounded [`Event`] journal.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::time::Duration;

use crate::config::Config;
use crate::decor::countdown;
use crate::decor::cursor::CursorGlow;
use crate::decor::particles;
use crate::decor::progress::ProgressBar;
use crate::decor::typewriter::Typewriter;
use crate::decor::{self, parallax, tilt, DecorationKind};
use crate::dom::{Document, ElementId, ElementSpec, Selector};
use crate::error::Result;
use crate::events::{Event, Journal};
use crate::reveal::{RevealController, RevealState, RevealTimings, LOADING_SCREEN_ID};
use crate::scheduler::{Job, ManualScheduler, Scheduler};
use crate::visibility::{RevealPath, VisibilityScanner};
use crate::wiring::{
    Debounce, DebounceKey, EventKind, Handler, HostEvent, SubscriptionId, Subscriptions, Throttle,
    ThrottleKey,
};

pub const LOADED_CLASS: &str = "loaded";
/// Console greeting, one log line per entry.
pub const GREETING: [&str; 2] = [
    "✨ Happy Birthday! ✨",
    "Made with 💝 for someone special",
];

pub struct Page<D: Document, S: Scheduler> {
    doc: D,
    sched: S,
    config: Config,
    rng: Pcg64,
    controller: RevealController,
    scanner: VisibilityScanner,
    subscriptions: Subscriptions,
    scroll_throttle: Throttle,
    parallax_throttle: Throttle,
    resize_debounce: Debounce,
    progress: Option<ProgressBar>,
    cursor: Option<CursorGlow>,
    typewriter: Option<Typewriter>,
    shapes: Vec<ElementId>,
    initialized: bool,
    effects_started: bool,
    scans: usize,
    journal: Journal,
}

impl<D: Document, S: Scheduler> Page<D, S> {
    /// Fails only on an invalid configuration.
    pub fn new(doc: D, sched: S, config: Config) -> Result<Self> {
        config.validate()?;
        let window = config.window()?;
        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::seed_from_u64(rand::random()),
        };
        let wiring = &config.wiring;
        Ok(Self {
            controller: RevealController::new(window, RevealTimings::from_config(&config)),
            scanner: VisibilityScanner::from_config(&config.reveal),
            subscriptions: Subscriptions::new(),
            scroll_throttle: Throttle::new(
                ThrottleKey::VisibilityScroll,
                Duration::from_millis(wiring.scroll_throttle_ms),
            ),
            parallax_throttle: Throttle::new(
                ThrottleKey::Parallax,
                Duration::from_millis(wiring.parallax_throttle_ms),
            ),
            resize_debounce: Debounce::new(
                DebounceKey::VisibilityResize,
                Duration::from_millis(wiring.resize_debounce_ms),
            ),
            progress: None,
            cursor: None,
            typewriter: None,
            shapes: Vec::new(),
            initialized: false,
            effects_started: false,
            scans: 0,
            journal: Journal::default(),
            doc,
            sched,
            config,
            rng,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> RevealState {
        self.controller.state()
    }

    pub fn controller(&self) -> &RevealController {
        &self.controller
    }

    pub fn scanner(&self) -> &VisibilityScanner {
        &self.scanner
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn scheduler(&self) -> &S {
        &self.sched
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cursor(&self) -> Option<&CursorGlow> {
        self.cursor.as_ref()
    }

    pub fn effects_started(&self) -> bool {
        self.effects_started
    }

    /// Events still held in the journal, oldest first.
    pub fn events(&self) -> &[Event] {
        self.journal.as_slice()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.journal.drain()
    }

    /// Number of visibility scans run so far. Unaffected by draining.
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Wire up listeners and start the loading sequence. Runs once.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        for line in GREETING {
            tracing::info!("{line}");
        }

        self.init_cursor();
        self.init_smooth_scroll();
        self.subscriptions
            .subscribe(EventKind::Scroll, Handler::VisibilityCheck);
        self.subscriptions
            .subscribe(EventKind::Resize, Handler::VisibilityCheck);
        self.subscriptions.subscribe(EventKind::Load, Handler::MarkLoaded);

        if self.doc.find_by_id(LOADING_SCREEN_ID).is_some() {
            self.init_loading_screen();
        }
        let events = self.controller.begin_loading(&mut self.doc, &mut self.sched);
        self.record(events);
    }

    /// Route a host event to its subscribed handlers.
    pub fn dispatch(&mut self, event: HostEvent) {
        if matches!(event, HostEvent::Scroll | HostEvent::Resize) {
            self.sync_observer();
        }
        for handler in self.subscriptions.handlers_for(event.kind()) {
            self.handle(handler, event);
        }
    }

    /// Run every job that is due now. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.sched.pop_due() {
            self.run_job(job);
            ran += 1;
        }
        ran
    }

    pub fn run_job(&mut self, job: Job) {
        tracing::trace!(?job, "running job");
        match job {
            Job::LoadingProgress => self.on_loading_progress(),
            Job::LoadingHold => {
                let events = self.controller.on_loading_hold(&mut self.doc, &mut self.sched);
                self.record(events);
            }
            Job::LoadingFaded => {
                let events = self.controller.on_loading_faded(&mut self.doc, &mut self.sched);
                self.record(events);
            }
            Job::CountdownTick => {
                let events = self.controller.on_countdown_tick(&mut self.doc, &mut self.sched);
                self.record(events);
            }
            Job::CellSettle(el) => countdown::settle(&mut self.doc, el),
            Job::UnlockComplete => {
                let events = self.controller.on_unlock_complete(&mut self.doc, &mut self.sched);
                self.record(events);
            }
            Job::RevealElement(el) => {
                if self.scanner.reveal(&mut self.doc, el) {
                    let at = self.sched.now();
                    self.journal.push(Event::ElementRevealed {
                        element: el,
                        path: RevealPath::Stagger,
                        at,
                    });
                }
            }
            Job::PostReveal => self.on_post_reveal(),
            Job::ThrottleRelease(ThrottleKey::VisibilityScroll) => self.scroll_throttle.release(),
            Job::ThrottleRelease(ThrottleKey::Parallax) => self.parallax_throttle.release(),
            Job::DebounceFire(DebounceKey::VisibilityResize) => {
                if self.resize_debounce.fire() {
                    self.visibility_check();
                }
            }
            Job::CursorFrame => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.frame(&mut self.doc);
                    self.sched.request_frame(Job::CursorFrame);
                }
            }
            Job::TypewriterStart(line) => {
                if let Some(tw) = self.typewriter.as_mut() {
                    tw.on_start(&mut self.sched, line);
                }
            }
            Job::TypewriterChar(line) => {
                if let Some(tw) = self.typewriter.as_mut() {
                    tw.on_char(&mut self.doc, &mut self.sched, line);
                }
            }
            Job::LateEffects => self.start_effects(),
        }
    }

    /// Register an extra listener. The returned id disposes it again.
    pub fn subscribe(&mut self, kind: EventKind, handler: Handler) -> SubscriptionId {
        self.subscriptions.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn record(&mut self, events: Vec<Event>) {
        for event in events {
            let locked = matches!(
                event,
                Event::StateChanged {
                    to: RevealState::Locked,
                    ..
                }
            );
            self.journal.push(event);
            if locked {
                self.spawn_lock_decorations();
            }
        }
    }

    fn skip(&mut self, feature: &str) {
        tracing::trace!(feature, "feature skipped");
        let at = self.sched.now();
        self.journal.push(Event::FeatureSkipped {
            feature: feature.to_string(),
            at,
        });
    }

    fn spawn(&mut self, kind: DecorationKind, specs: Vec<ElementSpec>) {
        match decor::spawn_into(&mut self.doc, kind.container_id(), &specs) {
            Some(count) => {
                tracing::debug!(?kind, count, "decoration spawned");
                let at = self.sched.now();
                self.journal.push(Event::DecorationSpawned { kind, count, at });
            }
            None => self.skip(kind.container_id()),
        }
    }

    fn init_cursor(&mut self) {
        if !self.config.cursor.enabled {
            return;
        }
        match CursorGlow::locate(&self.doc, self.config.cursor.smoothing) {
            Some(glow) => {
                self.cursor = Some(glow);
                self.subscriptions
                    .subscribe(EventKind::PointerMove, Handler::CursorTrack);
                self.sched.request_frame(Job::CursorFrame);
            }
            None => self.skip("cursor_glow"),
        }
    }

    fn init_smooth_scroll(&mut self) {
        if !self.config.effects.smooth_scroll {
            return;
        }
        for anchor in self.doc.find_all(&Selector::attr_prefix("a", "href", "#")) {
            self.subscriptions
                .subscribe(EventKind::Click, Handler::SmoothScroll(anchor));
        }
    }

    fn init_loading_screen(&mut self) {
        let installed = particles::install_keyframes(&mut self.doc, &mut self.rng);
        tracing::debug!(installed, "loading keyframes");

        let stars = particles::loading_stars(&mut self.rng, self.config.loading.star_count);
        self.spawn(DecorationKind::LoadingStars, stars);
        let rising = particles::loading_particles(&mut self.rng, self.config.loading.particle_count);
        self.spawn(DecorationKind::LoadingParticles, rising);

        match ProgressBar::locate(&self.doc, &self.config.loading) {
            Some(bar) => {
                self.progress = Some(bar);
                self.schedule_progress();
            }
            None => self.skip("progress_bar"),
        }
    }

    fn schedule_progress(&mut self) {
        let interval = Duration::from_millis(self.config.loading.progress_interval_ms);
        self.sched.schedule(interval, Job::LoadingProgress);
    }

    fn on_loading_progress(&mut self) {
        let Some(bar) = self.progress.as_mut() else {
            return;
        };
        if !bar.step(&mut self.doc) {
            self.schedule_progress();
        }
    }

    fn spawn_lock_decorations(&mut self) {
        let counts = &self.config.particles;
        let (star_count, particle_count) = (counts.lock_screen_star_count, counts.lock_screen_particle_count);
        let stars = particles::lock_stars(&mut self.rng, star_count);
        self.spawn(DecorationKind::LockStars, stars);
        let floating = particles::lock_particles(&mut self.rng, particle_count);
        self.spawn(DecorationKind::LockParticles, floating);
    }

    fn on_post_reveal(&mut self) {
        if !self.controller.state().is_revealed() {
            return;
        }
        let hero = particles::hero_particles(&mut self.rng, self.config.particles.hero_particle_count);
        self.spawn(DecorationKind::HeroParticles, hero);

        if self.scanner.observe(&self.doc) == 0 && !self.scanner.is_observing() {
            self.skip("intersection_observer");
        }
        self.sync_observer();
        self.visibility_check();

        if self.config.effects.typewriter {
            let tw = Typewriter::start(&mut self.doc, &mut self.sched, &self.config.typewriter);
            if tw.is_empty() {
                self.skip("typewriter");
            } else {
                self.typewriter = Some(tw);
            }
        }
        self.start_effects();
    }

    /// Parallax and card tilt. Content-gated and started at most once.
    fn start_effects(&mut self) {
        if self.effects_started || !self.controller.state().is_revealed() {
            return;
        }
        self.effects_started = true;

        if self.config.effects.parallax {
            self.shapes = parallax::shapes(&self.doc);
            if self.shapes.is_empty() {
                self.skip("parallax");
            } else {
                self.subscriptions.subscribe(EventKind::Scroll, Handler::Parallax);
            }
        }
        if self.config.effects.tilt {
            for card in tilt::cards(&self.doc) {
                self.subscriptions
                    .subscribe(EventKind::PointerMove, Handler::CardTilt(card));
                self.subscriptions
                    .subscribe(EventKind::PointerLeave, Handler::CardReset(card));
            }
        }
        let at = self.sched.now();
        self.journal.push(Event::EffectsStarted { at });
    }

    fn sync_observer(&mut self) {
        let revealed = self.scanner.sync_observer(&mut self.doc);
        let at = self.sched.now();
        self.journal
            .extend(revealed.into_iter().map(|element| Event::ElementRevealed {
                element,
                path: RevealPath::Observer,
                at,
            }));
    }

    /// Explicit scan. Hidden content has no geometry on a real page, so the
    /// scan only runs once the content is revealed.
    fn visibility_check(&mut self) {
        if !self.controller.state().is_revealed() {
            return;
        }
        let revealed = self.scanner.scan(&mut self.doc);
        let at = self.sched.now();
        let count = revealed.len();
        self.scans += 1;
        self.journal
            .extend(revealed.into_iter().map(|element| Event::ElementRevealed {
                element,
                path: RevealPath::Scan,
                at,
            }));
        self.journal.push(Event::VisibilityScanned {
            revealed: count,
            at,
        });
    }

    fn handle(&mut self, handler: Handler, event: HostEvent) {
        match (handler, event) {
            (Handler::VisibilityCheck, HostEvent::Scroll) => {
                if self.scroll_throttle.admit(&mut self.sched) {
                    self.visibility_check();
                }
            }
            (Handler::VisibilityCheck, HostEvent::Resize) => {
                self.resize_debounce.trigger(&mut self.sched);
            }
            (Handler::Parallax, HostEvent::Scroll) => {
                if self.parallax_throttle.admit(&mut self.sched) {
                    parallax::apply(&mut self.doc, &self.shapes);
                }
            }
            (Handler::CursorTrack, HostEvent::PointerMove { x, y, .. }) => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.track(x, y);
                }
            }
            (Handler::CardTilt(card), HostEvent::PointerMove { x, y, target: Some(target) }) => {
                if self.doc.contains(card, target) {
                    tilt::tilt(&mut self.doc, card, x, y);
                }
            }
            (Handler::CardReset(card), HostEvent::PointerLeave { target }) if target == card => {
                tilt::reset(&mut self.doc, card);
            }
            (Handler::SmoothScroll(anchor), HostEvent::Click { target }) => {
                if self.doc.contains(anchor, target) {
                    self.scroll_to_anchor(anchor);
                }
            }
            (Handler::MarkLoaded, HostEvent::Load) => self.on_load(),
            _ => {}
        }
    }

    fn scroll_to_anchor(&mut self, anchor: ElementId) {
        let Some(href) = self.doc.attribute(anchor, "href") else {
            return;
        };
        let id = href.trim_start_matches('#');
        if id.is_empty() {
            return;
        }
        match self.doc.find_by_id(id) {
            Some(target) => self.doc.scroll_into_view(target),
            None => tracing::trace!(%href, "anchor target missing"),
        }
    }

    fn on_load(&mut self) {
        if let Some(body) = self.doc.body() {
            self.doc.add_class(body, LOADED_CLASS);
        }
        let at = self.sched.now();
        self.journal.push(Event::PageLoaded { at });
        let delay = Duration::from_millis(self.config.effects.late_effects_delay_ms);
        self.sched.schedule(delay, Job::LateEffects);
    }
}

impl<D: Document> Page<D, ManualScheduler> {
    /// Move virtual time forward by `by`, running every job that comes due
    /// on the way. Returns how many jobs ran.
    pub fn advance(&mut self, by: Duration) -> usize {
        let until = self.sched.elapsed() + by;
        let mut ran = 0;
        while let Some(job) = self.sched.pop_until(until) {
            self.run_job(job);
            ran += 1;
        }
        self.sched.set_elapsed(until);
        ran
    }

    pub fn elapsed(&self) -> Duration {
        self.sched.elapsed()
    }
}
