use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::decor::DecorationKind;
use crate::dom::ElementId;
use crate::gate::CountdownSnapshot;
use crate::reveal::RevealState;
use crate::visibility::RevealPath;

/// Default number of events a [`Journal`] holds before discarding old ones.
pub const JOURNAL_CAPACITY: usize = 4096;

/// Every observable change in the page runtime produces an Event.
/// The page keeps them in a journal; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    LoadingStarted {
        at: NaiveDateTime,
    },
    LoadingFinished {
        at: NaiveDateTime,
    },
    StateChanged {
        from: RevealState,
        to: RevealState,
        at: NaiveDateTime,
    },
    CountdownTicked {
        snapshot: CountdownSnapshot,
        at: NaiveDateTime,
    },
    ElementRevealed {
        element: ElementId,
        path: RevealPath,
        at: NaiveDateTime,
    },
    VisibilityScanned {
        revealed: usize,
        at: NaiveDateTime,
    },
    DecorationSpawned {
        kind: DecorationKind,
        count: usize,
        at: NaiveDateTime,
    },
    /// A feature was skipped because its element or host capability is missing.
    FeatureSkipped {
        feature: String,
        at: NaiveDateTime,
    },
    /// Content-gated effects (parallax, tilt) were wired up.
    EffectsStarted {
        at: NaiveDateTime,
    },
    PageLoaded {
        at: NaiveDateTime,
    },
}

impl Event {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            Event::LoadingStarted { at }
            | Event::LoadingFinished { at }
            | Event::StateChanged { at, .. }
            | Event::CountdownTicked { at, .. }
            | Event::ElementRevealed { at, .. }
            | Event::VisibilityScanned { at, .. }
            | Event::DecorationSpawned { at, .. }
            | Event::FeatureSkipped { at, .. }
            | Event::EffectsStarted { at }
            | Event::PageLoaded { at } => *at,
        }
    }
}

/// Bounded event log. Once full, the oldest half is discarded so a page left
/// ticking on the lock screen keeps a fixed footprint.
#[derive(Debug, Clone)]
pub struct Journal {
    events: Vec<Event>,
    capacity: usize,
    dropped: u64,
}

impl Default for Journal {
    fn default() -> Self {
        Self::with_capacity(JOURNAL_CAPACITY)
    }
}

impl Journal {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.events.len() >= self.capacity {
            let evict = (self.capacity / 2).max(1);
            self.events.drain(..evict);
            self.dropped += evict as u64;
            tracing::trace!(evict, "journal full, oldest events discarded");
        }
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Take every retained event, leaving the journal empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded so far to stay within capacity.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<Event> for Journal {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}
