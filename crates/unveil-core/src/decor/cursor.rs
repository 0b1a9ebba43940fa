//! Cursor glow that trails the pointer.

use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementId};

pub const CURSOR_GLOW_ID: &str = "cursorGlow";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[derive(Debug, Clone)]
pub struct CursorGlow {
    el: ElementId,
    smoothing: f64,
    pointer: Point,
    position: Point,
}

impl CursorGlow {
    /// Needs both the glow element and a fine pointer.
    pub fn locate<D: Document + ?Sized>(doc: &D, smoothing: f64) -> Option<Self> {
        if !doc.capabilities().fine_pointer {
            return None;
        }
        Some(Self {
            el: doc.find_by_id(CURSOR_GLOW_ID)?,
            smoothing,
            pointer: Point::default(),
            position: Point::default(),
        })
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn track(&mut self, x: f64, y: f64) {
        self.pointer = Point { x, y };
    }

    /// One animation frame: move toward the pointer and render.
    pub fn frame<D: Document + ?Sized>(&mut self, doc: &mut D) {
        self.position = Point {
            x: lerp(self.position.x, self.pointer.x, self.smoothing),
            y: lerp(self.position.y, self.pointer.y, self.smoothing),
        };
        doc.set_style(self.el, "left", &format!("{}px", self.position.x));
        doc.set_style(self.el, "top", &format!("{}px", self.position.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Capabilities, Rect, VirtualDocument};

    fn doc() -> VirtualDocument {
        let mut doc = VirtualDocument::default();
        let body = doc.body().unwrap();
        doc.insert(body, "div", Some(CURSOR_GLOW_ID), &[], Rect::default());
        doc
    }

    #[test]
    fn glow_converges_on_pointer() {
        let mut doc = doc();
        let mut glow = CursorGlow::locate(&doc, 0.15).unwrap();
        glow.track(100.0, 200.0);
        glow.frame(&mut doc);
        assert!((glow.position().x - 15.0).abs() < 1e-9);
        assert!((glow.position().y - 30.0).abs() < 1e-9);
        for _ in 0..200 {
            glow.frame(&mut doc);
        }
        assert!((glow.position().x - 100.0).abs() < 0.01);
        let el = doc.find_by_id(CURSOR_GLOW_ID).unwrap();
        assert!(doc.style(el, "left").unwrap().ends_with("px"));
    }

    #[test]
    fn coarse_pointer_disables_glow() {
        let doc = doc().with_capabilities(Capabilities {
            fine_pointer: false,
            intersection_observer: true,
        });
        assert!(CursorGlow::locate(&doc, 0.15).is_none());
    }
}
