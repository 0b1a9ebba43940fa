//! Scroll parallax on background shapes.

use crate::dom::{Document, ElementId, Selector};

pub const SHAPE_CLASS: &str = "bg-shape";

/// Speed factor for the shape at `index`; later shapes move faster.
pub fn speed(index: usize) -> f64 {
    0.02 + index as f64 * 0.01
}

pub fn transform(scroll_y: f64, index: usize) -> String {
    // Adding zero folds -0.0 into 0.0.
    let offset = -(scroll_y * speed(index)) + 0.0;
    format!("translate(0, {offset}px)")
}

pub fn shapes<D: Document + ?Sized>(doc: &D) -> Vec<ElementId> {
    doc.find_all(&Selector::class(SHAPE_CLASS))
}

/// Offset every shape for the current scroll position.
pub fn apply<D: Document + ?Sized>(doc: &mut D, shapes: &[ElementId]) {
    let scroll_y = doc.viewport().scroll_y;
    for (index, shape) in shapes.iter().enumerate() {
        doc.set_style(*shape, "transform", &transform(scroll_y, index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Rect, VirtualDocument};

    fn offset(transform: &str) -> f64 {
        transform
            .trim_start_matches("translate(0, ")
            .trim_end_matches("px)")
            .parse()
            .unwrap()
    }

    #[test]
    fn offsets_scale_with_index() {
        assert!((offset(&transform(1000.0, 0)) + 20.0).abs() < 1e-9);
        assert!((offset(&transform(1000.0, 1)) + 30.0).abs() < 1e-9);
        assert_eq!(transform(0.0, 3), "translate(0, 0px)");
    }

    #[test]
    fn apply_uses_current_scroll() {
        let mut doc = VirtualDocument::default();
        let body = doc.body().unwrap();
        doc.insert(body, "div", None, &[SHAPE_CLASS], Rect::default());
        doc.insert(body, "div", None, &[SHAPE_CLASS], Rect::default());
        doc.scroll_to(500.0);

        let found = shapes(&doc);
        apply(&mut doc, &found);
        let first = doc.style(found[0], "transform").unwrap();
        let second = doc.style(found[1], "transform").unwrap();
        assert!((offset(&first) + 10.0).abs() < 1e-9);
        assert!((offset(&second) + 15.0).abs() < 1e-9);
    }
}
