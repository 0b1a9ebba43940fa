//! Countdown cells on the lock screen.
//!
//! Each changed cell pulses to `scale(1.1)` and settles back to `scale(1)`
//! 100ms later. Unchanged cells are left alone.

use std::time::Duration;

use crate::dom::{Document, ElementId};
use crate::gate::CountdownSnapshot;
use crate::scheduler::{Job, Scheduler};

pub const CELL_IDS: [&str; 4] = ["days", "hours", "minutes", "seconds"];

const PULSE_TRANSFORM: &str = "scale(1.1)";
pub const REST_TRANSFORM: &str = "scale(1)";
const SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownCells {
    cells: [Option<ElementId>; 4],
}

impl CountdownCells {
    pub fn locate<D: Document + ?Sized>(doc: &D) -> Self {
        Self {
            cells: CELL_IDS.map(|id| doc.find_by_id(id)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Write the padded snapshot into the cells. Returns how many changed.
    pub fn render<D, S>(&self, doc: &mut D, sched: &mut S, snapshot: &CountdownSnapshot) -> usize
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        let mut changed = 0;
        for (cell, value) in self.cells.iter().zip(snapshot.padded()) {
            let Some(el) = *cell else { continue };
            if doc.text(el).as_deref() == Some(value.as_str()) {
                continue;
            }
            doc.set_style(el, "transform", PULSE_TRANSFORM);
            doc.set_text(el, &value);
            sched.schedule(SETTLE_DELAY, Job::CellSettle(el));
            changed += 1;
        }
        changed
    }
}

/// Settle a pulsed cell.
pub fn settle<D: Document + ?Sized>(doc: &mut D, el: ElementId) {
    doc.set_style(el, "transform", REST_TRANSFORM);
}
