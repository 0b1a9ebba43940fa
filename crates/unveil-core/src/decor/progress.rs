//! Loading progress bar.

use crate::config::LoadingConfig;
use crate::dom::{Document, ElementId};

pub const PERCENT_ID: &str = "progressPercent";
pub const FILL_ID: &str = "progressFill";

#[derive(Debug, Clone)]
pub struct ProgressBar {
    percent_el: ElementId,
    fill_el: Option<ElementId>,
    increment: f64,
    progress: f64,
}

impl ProgressBar {
    /// `None` when the page has no percentage label.
    pub fn locate<D: Document + ?Sized>(doc: &D, config: &LoadingConfig) -> Option<Self> {
        let percent_el = doc.find_by_id(PERCENT_ID)?;
        let steps = config.progress_duration_ms as f64 / config.progress_interval_ms.max(1) as f64;
        Some(Self {
            percent_el,
            fill_el: doc.find_by_id(FILL_ID),
            increment: 100.0 / steps.max(1.0),
            progress: 0.0,
        })
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }

    /// Advance one interval and render. Returns true once 100% is reached.
    pub fn step<D: Document + ?Sized>(&mut self, doc: &mut D) -> bool {
        self.progress = (self.progress + self.increment).min(100.0);
        doc.set_text(self.percent_el, &format!("{}%", self.progress.floor() as u32));
        if let Some(fill) = self.fill_el {
            doc.set_style(fill, "width", &format!("{}%", self.progress));
        }
        self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Rect, VirtualDocument};

    #[test]
    fn reaches_hundred_in_expected_steps() {
        let mut doc = VirtualDocument::default();
        let body = doc.body().unwrap();
        let percent = doc.insert(body, "span", Some(PERCENT_ID), &[], Rect::default()).unwrap();
        let fill = doc.insert(body, "div", Some(FILL_ID), &[], Rect::default()).unwrap();

        let config = LoadingConfig {
            progress_duration_ms: 300,
            progress_interval_ms: 30,
            ..LoadingConfig::default()
        };
        let mut bar = ProgressBar::locate(&doc, &config).unwrap();
        let mut steps = 0;
        while !bar.step(&mut doc) {
            steps += 1;
            assert!(steps < 20);
        }
        assert_eq!(doc.text(percent).as_deref(), Some("100%"));
        assert_eq!(doc.style(fill, "width").as_deref(), Some("100%"));
        assert!(steps >= 9);
    }

    #[test]
    fn percent_label_is_floored() {
        let mut doc = VirtualDocument::default();
        let body = doc.body().unwrap();
        let percent = doc.insert(body, "span", Some(PERCENT_ID), &[], Rect::default()).unwrap();
        let mut bar = ProgressBar::locate(&doc, &LoadingConfig::default()).unwrap();
        bar.step(&mut doc);
        // 100 / (4000 / 30) = 0.75
        assert_eq!(doc.text(percent).as_deref(), Some("0%"));
        bar.step(&mut doc);
        assert_eq!(doc.text(percent).as_deref(), Some("1%"));
    }

    #[test]
    fn missing_label_skips_the_bar() {
        let doc = VirtualDocument::default();
        assert!(ProgressBar::locate(&doc, &LoadingConfig::default()).is_none());
    }
}
