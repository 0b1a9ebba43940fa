//! Scroll-reveal visibility scanner.
//!
//! Tracked elements (class `animate-on-scroll`) become visible (class
//! `visible`) the first time they enter the reveal region. Two trigger paths
//! feed the same one-way transition:
//!
//! 1. **Observer**: every pending element is registered once; intersection
//!    records from the host reveal intersecting targets and unregister them.
//! 2. **Scan**: an explicit geometry pass over all pending elements, run after
//!    the reveal transition and on (rate-limited) scroll/resize. Elements it
//!    reveals are unregistered from the observer as well.
//!
//! An element that already carries `visible` is skipped by both paths, so
//! neither can fire twice for it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::RevealConfig;
use crate::dom::{Document, ElementId, Rect, Selector, Viewport};

pub const TRACKED_CLASS: &str = "animate-on-scroll";
pub const VISIBLE_CLASS: &str = "visible";

/// Which path revealed an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPath {
    Observer,
    Scan,
    Stagger,
}

/// One intersection record, as a host observer would deliver it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct VisibilityScanner {
    threshold: f64,
    root_margin_bottom_px: f64,
    observed: BTreeSet<ElementId>,
    observer_active: bool,
}

impl VisibilityScanner {
    pub fn new(threshold: f64, root_margin_bottom_px: f64) -> Self {
        Self {
            threshold,
            root_margin_bottom_px,
            observed: BTreeSet::new(),
            observer_active: false,
        }
    }

    pub fn from_config(config: &RevealConfig) -> Self {
        Self::new(config.scroll_threshold, config.root_margin_bottom_px)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_observing(&self) -> bool {
        self.observer_active
    }

    pub fn is_observed(&self, el: ElementId) -> bool {
        self.observed.contains(&el)
    }

    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    /// Start the observer path: register every tracked element that is not
    /// yet visible. Skipped when the host has no observer support or the page
    /// has no tracked elements. Returns the number of registrations.
    pub fn observe<D: Document + ?Sized>(&mut self, doc: &D) -> usize {
        if !doc.capabilities().intersection_observer {
            tracing::trace!("intersection observer unavailable, relying on scans");
            return 0;
        }
        let tracked = doc.find_all(&Selector::class(TRACKED_CLASS));
        if tracked.is_empty() {
            return 0;
        }
        self.observer_active = true;
        let before = self.observed.len();
        self.observed.extend(
            tracked
                .into_iter()
                .filter(|el| !doc.has_class(*el, VISIBLE_CLASS)),
        );
        let added = self.observed.len() - before;
        tracing::debug!(added, "observing tracked elements");
        added
    }

    pub fn unobserve(&mut self, el: ElementId) -> bool {
        self.observed.remove(&el)
    }

    /// Scan predicate: the element's top is above the threshold line and its
    /// bottom is below the top edge of the viewport.
    pub fn qualifies(&self, rect: &Rect, viewport_height: f64) -> bool {
        rect.top < viewport_height * (1.0 - self.threshold) && rect.bottom() > 0.0
    }

    /// Observer root: the viewport with its bottom edge pulled up by the
    /// root margin.
    pub fn root_rect(&self, viewport: &Viewport) -> Rect {
        Rect::new(
            0.0,
            0.0,
            viewport.width,
            (viewport.height - self.root_margin_bottom_px).max(0.0),
        )
    }

    /// Visible fraction of `rect` inside the observer root. Zero-area boxes
    /// count as fully visible when they touch the root.
    pub fn intersection_ratio(&self, rect: &Rect, viewport: &Viewport) -> f64 {
        let root = self.root_rect(viewport);
        match rect.intersection(&root) {
            None => 0.0,
            Some(_) if rect.area() == 0.0 => 1.0,
            Some(overlap) => overlap.area() / rect.area(),
        }
    }

    /// Intersection records for every observed element, computed from the
    /// document's current geometry. Used by hosts without a native observer
    /// callback, such as the virtual document.
    pub fn take_records<D: Document + ?Sized>(&self, doc: &D) -> Vec<ObserverEntry> {
        let viewport = doc.viewport();
        self.observed
            .iter()
            .filter_map(|el| {
                let rect = doc.bounding_rect(*el)?;
                let ratio = self.intersection_ratio(&rect, &viewport);
                Some(ObserverEntry {
                    target: *el,
                    is_intersecting: ratio > 0.0 && ratio >= self.threshold,
                    ratio,
                })
            })
            .collect()
    }

    /// Observer path: reveal intersecting targets and stop watching them.
    pub fn handle_entries<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        entries: &[ObserverEntry],
    ) -> Vec<ElementId> {
        let mut revealed = Vec::new();
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            if !self.observed.remove(&entry.target) {
                continue;
            }
            if mark_visible(doc, entry.target) {
                revealed.push(entry.target);
            }
        }
        revealed
    }

    /// Compute and handle records in one step.
    pub fn sync_observer<D: Document + ?Sized>(&mut self, doc: &mut D) -> Vec<ElementId> {
        if !self.observer_active || self.observed.is_empty() {
            return Vec::new();
        }
        let records = self.take_records(&*doc);
        self.handle_entries(doc, &records)
    }

    /// Scan path over every pending tracked element.
    pub fn scan<D: Document + ?Sized>(&mut self, doc: &mut D) -> Vec<ElementId> {
        let viewport_height = doc.viewport().height;
        let pending = doc.find_all(&Selector::class(TRACKED_CLASS).without(VISIBLE_CLASS));
        let mut revealed = Vec::new();
        for el in pending {
            let Some(rect) = doc.bounding_rect(el) else {
                continue;
            };
            if self.qualifies(&rect, viewport_height) && self.reveal(doc, el) {
                revealed.push(el);
            }
        }
        tracing::debug!(revealed = revealed.len(), "visibility scan");
        revealed
    }

    /// Reveal one element immediately and drop it from observation.
    /// Returns false if it was already visible.
    pub fn reveal<D: Document + ?Sized>(&mut self, doc: &mut D, el: ElementId) -> bool {
        self.observed.remove(&el);
        mark_visible(doc, el)
    }
}

fn mark_visible<D: Document + ?Sized>(doc: &mut D, el: ElementId) -> bool {
    if doc.has_class(el, VISIBLE_CLASS) {
        return false;
    }
    doc.add_class(el, VISIBLE_CLASS);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Capabilities, VirtualDocument};

    fn page(tops: &[f64]) -> (VirtualDocument, Vec<ElementId>) {
        let mut doc = VirtualDocument::new(Viewport {
            width: 1000.0,
            height: 1000.0,
            scroll_y: 0.0,
        });
        let body = doc.body().unwrap();
        let els = tops
            .iter()
            .map(|top| {
                doc.insert(body, "div", None, &[TRACKED_CLASS], Rect::new(0.0, *top, 400.0, 100.0))
                    .unwrap()
            })
            .collect();
        (doc, els)
    }

    #[test]
    fn element_at_half_height_is_revealed_by_scan() {
        let (mut doc, els) = page(&[500.0]);
        let mut scanner = VisibilityScanner::new(0.12, 80.0);
        assert_eq!(scanner.scan(&mut doc), vec![els[0]]);
        assert!(doc.has_class(els[0], VISIBLE_CLASS));
    }

    #[test]
    fn threshold_line_is_exclusive() {
        let scanner = VisibilityScanner::new(0.12, 80.0);
        assert!(scanner.qualifies(&Rect::new(0.0, 879.0, 10.0, 10.0), 1000.0));
        assert!(!scanner.qualifies(&Rect::new(0.0, 880.0, 10.0, 10.0), 1000.0));
        assert!(!scanner.qualifies(&Rect::new(0.0, -200.0, 10.0, 100.0), 1000.0));
    }

    #[test]
    fn repeated_scans_are_idempotent() {
        let (mut doc, els) = page(&[100.0, 2000.0]);
        let mut scanner = VisibilityScanner::new(0.12, 80.0);
        assert_eq!(scanner.scan(&mut doc), vec![els[0]]);
        assert!(scanner.scan(&mut doc).is_empty());
        assert!(doc.has_class(els[0], VISIBLE_CLASS));
        assert!(!doc.has_class(els[1], VISIBLE_CLASS));

        doc.scroll_to(1500.0);
        assert_eq!(scanner.scan(&mut doc), vec![els[1]]);
        doc.scroll_to(0.0);
        assert!(scanner.scan(&mut doc).is_empty());
        assert!(doc.has_class(els[1], VISIBLE_CLASS));
    }

    #[test]
    fn observer_fires_once_then_unregisters() {
        let (mut doc, els) = page(&[100.0, 2000.0]);
        let mut scanner = VisibilityScanner::new(0.12, 80.0);
        assert_eq!(scanner.observe(&doc), 2);

        assert_eq!(scanner.sync_observer(&mut doc), vec![els[0]]);
        assert!(!scanner.is_observed(els[0]));
        assert!(scanner.is_observed(els[1]));

        // A stale record for an unregistered target is ignored.
        let stale = ObserverEntry {
            target: els[0],
            is_intersecting: true,
            ratio: 1.0,
        };
        assert!(scanner.handle_entries(&mut doc, &[stale]).is_empty());
    }

    #[test]
    fn scan_unregisters_from_observer() {
        let (mut doc, els) = page(&[100.0]);
        let mut scanner = VisibilityScanner::new(0.12, 80.0);
        scanner.observe(&doc);
        assert_eq!(scanner.scan(&mut doc), vec![els[0]]);
        assert!(!scanner.is_observed(els[0]));
        assert!(scanner.sync_observer(&mut doc).is_empty());
    }

    #[test]
    fn observer_respects_bottom_margin_and_ratio() {
        let scanner = VisibilityScanner::new(0.12, 80.0);
        let viewport = Viewport {
            width: 1000.0,
            height: 1000.0,
            scroll_y: 0.0,
        };
        // Root ends at 920px: an element starting at 900 with 100px height is 20% inside.
        let ratio = scanner.intersection_ratio(&Rect::new(0.0, 900.0, 100.0, 100.0), &viewport);
        assert!((ratio - 0.2).abs() < 1e-9);
        // Starting at 910 only 10% is inside, below the 12% threshold.
        let ratio = scanner.intersection_ratio(&Rect::new(0.0, 910.0, 100.0, 100.0), &viewport);
        assert!(ratio < scanner.threshold());
    }

    #[test]
    fn observer_is_skipped_without_capability() {
        let (doc, _) = page(&[100.0]);
        let mut doc = doc.with_capabilities(Capabilities {
            fine_pointer: true,
            intersection_observer: false,
        });
        let mut scanner = VisibilityScanner::new(0.12, 80.0);
        assert_eq!(scanner.observe(&doc), 0);
        assert!(!scanner.is_observing());
        assert_eq!(scanner.scan(&mut doc).len(), 1);
    }
}
