//! # Unveil Core Library
//!
//! Effects layer for a celebratory page that stays locked until a fixed day
//! of the year. The library is host-agnostic: the page is reached through the
//! [`Document`] trait and time through the [`Scheduler`] trait, so the same
//! runtime drives a browser binding, the CLI simulator and the tests.
//!
//! ## Architecture
//!
//! - **Time Gate**: pure calendar functions deciding whether "now" falls on
//!   the annual window, and how long until it does
//! - **Reveal Controller**: forward-only state machine
//!   (Loading, Locked, Unlocking, Revealed) driven by scheduled jobs
//! - **Visibility Scanner**: one-way scroll reveal of tracked elements through
//!   an observer path and an explicit scan path
//! - **Decoration**: particles, progress bar, cursor glow, parallax, tilt and
//!   typewriter; cosmetic only
//! - **Wiring**: listener subscriptions with throttle and debounce
//!
//! ## Key Components
//!
//! - [`Page`]: owns everything above and is what a host drives
//! - [`RevealController`]: the state machine
//! - [`Config`]: TOML configuration with per-field defaults
//! - [`VirtualDocument`] / [`ManualScheduler`]: in-memory host for tests and
//!   simulation

pub mod config;
pub mod decor;
pub mod dom;
pub mod error;
pub mod events;
pub mod gate;
pub mod page;
pub mod reveal;
pub mod scheduler;
pub mod visibility;
pub mod wiring;

pub use config::Config;
pub use decor::DecorationKind;
pub use dom::{Document, ElementId, PageLayout, Rect, Selector, Viewport, VirtualDocument};
pub use error::{ConfigError, CoreError, TransitionError, ValidationError};
pub use events::{Event, Journal};
pub use gate::{AnnualWindow, CountdownSnapshot};
pub use page::Page;
pub use reveal::{RevealController, RevealState};
pub use scheduler::{Job, ManualScheduler, RealtimeScheduler, Scheduler};
pub use visibility::{RevealPath, VisibilityScanner};
pub use wiring::{HostEvent, Subscriptions};
