//! 3D tilt on hovered cards.

use crate::dom::{Document, ElementId, Rect, Selector};

pub const CARD_CLASSES: [&str; 2] = ["about-card", "mca-card-main"];
pub const RESET_TRANSFORM: &str = "perspective(1000px) rotateX(0) rotateY(0) translateY(0)";

const DAMPING: f64 = 30.0;

pub fn cards<D: Document + ?Sized>(doc: &D) -> Vec<ElementId> {
    doc.find_all(&Selector::any_of(
        CARD_CLASSES.iter().map(|c| Selector::class(c)).collect(),
    ))
}

/// Rotation (x, y) in degrees for a pointer at viewport coordinates.
pub fn rotation(rect: &Rect, x: f64, y: f64) -> (f64, f64) {
    let local_x = x - rect.left;
    let local_y = y - rect.top;
    let rotate_x = (local_y - rect.height / 2.0) / DAMPING;
    let rotate_y = (rect.width / 2.0 - local_x) / DAMPING;
    (rotate_x, rotate_y)
}

pub fn transform(rect: &Rect, x: f64, y: f64) -> String {
    let (rx, ry) = rotation(rect, x, y);
    format!("perspective(1000px) rotateX({rx}deg) rotateY({ry}deg) translateY(-10px)")
}

pub fn tilt<D: Document + ?Sized>(doc: &mut D, card: ElementId, x: f64, y: f64) {
    if let Some(rect) = doc.bounding_rect(card) {
        doc.set_style(card, "transform", &transform(&rect, x, y));
    }
}

pub fn reset<D: Document + ?Sized>(doc: &mut D, card: ElementId) {
    doc.set_style(card, "transform", RESET_TRANSFORM);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_is_flat() {
        let rect = Rect::new(100.0, 100.0, 300.0, 200.0);
        assert_eq!(rotation(&rect, 250.0, 200.0), (0.0, 0.0));
    }

    #[test]
    fn corners_tilt_toward_pointer() {
        let rect = Rect::new(0.0, 0.0, 300.0, 300.0);
        let (rx, ry) = rotation(&rect, 0.0, 0.0);
        assert_eq!((rx, ry), (-5.0, 5.0));
        assert_eq!(
            transform(&rect, 300.0, 300.0),
            "perspective(1000px) rotateX(5deg) rotateY(-5deg) translateY(-10px)"
        );
    }
}
