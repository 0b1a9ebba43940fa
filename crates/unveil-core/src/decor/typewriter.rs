//! Character-by-character typing of hero quote lines.

use std::time::Duration;

use crate::config::TypewriterConfig;
use crate::dom::{Document, ElementId, Selector};
use crate::scheduler::{Job, Scheduler};

pub const LINE_CLASS: &str = "quote-line";

#[derive(Debug, Clone)]
struct Line {
    el: ElementId,
    chars: Vec<char>,
    typed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    lines: Vec<Line>,
    char_interval: Duration,
}

impl Typewriter {
    /// Capture and clear every quote line, then schedule each line's start.
    pub fn start<D, S>(doc: &mut D, sched: &mut S, config: &TypewriterConfig) -> Self
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        let line_delay = Duration::from_millis(config.line_delay_ms);
        let lines = doc
            .find_all(&Selector::class(LINE_CLASS))
            .into_iter()
            .enumerate()
            .map(|(index, el)| {
                let text = doc.text(el).unwrap_or_default();
                doc.set_text(el, "");
                doc.set_style(el, "opacity", "1");
                let step = u32::try_from(index).unwrap_or(u32::MAX);
                sched.schedule(line_delay.saturating_mul(step), Job::TypewriterStart(index));
                Line {
                    el,
                    chars: text.chars().collect(),
                    typed: 0,
                }
            })
            .collect();
        Self {
            lines,
            char_interval: Duration::from_millis(config.char_interval_ms),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.lines.iter().all(|l| l.typed >= l.chars.len())
    }

    pub fn on_start<S: Scheduler + ?Sized>(&mut self, sched: &mut S, line: usize) {
        if self.lines.get(line).is_some() {
            sched.schedule(self.char_interval, Job::TypewriterChar(line));
        }
    }

    /// Type the next character of `line`, rescheduling while text remains.
    pub fn on_char<D, S>(&mut self, doc: &mut D, sched: &mut S, line: usize)
    where
        D: Document + ?Sized,
        S: Scheduler + ?Sized,
    {
        let Some(l) = self.lines.get_mut(line) else {
            return;
        };
        if l.typed >= l.chars.len() {
            return;
        }
        l.typed += 1;
        let text: String = l.chars[..l.typed].iter().collect();
        doc.set_text(l.el, &text);
        if l.typed < l.chars.len() {
            sched.schedule(self.char_interval, Job::TypewriterChar(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Rect, VirtualDocument};
    use crate::scheduler::ManualScheduler;
    use chrono::NaiveDate;

    #[test]
    fn lines_are_typed_in_sequence() {
        let mut doc = VirtualDocument::default();
        let body = doc.body().unwrap();
        let first = doc.insert(body, "p", None, &[LINE_CLASS], Rect::default()).unwrap();
        let second = doc.insert(body, "p", None, &[LINE_CLASS], Rect::default()).unwrap();
        doc.set_text(first, "hé");
        doc.set_text(second, "yo");

        let mut sched = ManualScheduler::new(
            NaiveDate::from_ymd_opt(2026, 1, 20)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        let mut tw = Typewriter::start(&mut doc, &mut sched, &TypewriterConfig::default());
        assert_eq!(tw.len(), 2);
        assert_eq!(doc.text(first).as_deref(), Some(""));
        assert_eq!(doc.style(first, "opacity").as_deref(), Some("1"));

        while let Some(job) = sched.pop_until(Duration::from_millis(1500)) {
            match job {
                Job::TypewriterStart(i) => tw.on_start(&mut sched, i),
                Job::TypewriterChar(i) => tw.on_char(&mut doc, &mut sched, i),
                _ => {}
            }
        }
        assert_eq!(doc.text(first).as_deref(), Some("hé"));
        assert_eq!(doc.text(second).as_deref(), Some(""));

        while let Some(job) = sched.pop_until(Duration::from_secs(3)) {
            match job {
                Job::TypewriterStart(i) => tw.on_start(&mut sched, i),
                Job::TypewriterChar(i) => tw.on_char(&mut doc, &mut sched, i),
                _ => {}
            }
        }
        assert_eq!(doc.text(second).as_deref(), Some("yo"));
        assert!(tw.is_finished());
    }
}
