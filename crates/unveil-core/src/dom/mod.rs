//! Narrow document interface.
//!
//! The page runtime never talks to a rendering engine directly. Everything it
//! needs from the page goes through [`Document`]: lookups by id or selector,
//! geometry, class/style/text mutation and element creation. A browser host
//! implements the trait over its DOM bindings; [`VirtualDocument`] is the
//! in-memory implementation used by tests and the CLI simulator.
//!
//! Lookups return `Option` and mutations on unknown handles are no-ops. A
//! malformed page loses the affected effect, nothing more.

mod layout;
mod virtual_doc;

pub use layout::{ElementLayout, PageLayout};
pub use virtual_doc::VirtualDocument;

use serde::{Deserialize, Serialize};

/// Opaque handle to an element owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, edge-touching boxes included as zero-area overlaps.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Same box moved vertically by `dy`.
    pub fn translated_y(&self, dy: f64) -> Rect {
        Rect {
            top: self.top + dy,
            ..*self
        }
    }
}

/// Visible area of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Vertical scroll offset of the page.
    #[serde(default)]
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_y: 0.0,
        }
    }
}

/// Host features that some effects depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// A precise pointer (mouse, trackpad) is present.
    #[serde(default = "default_true")]
    pub fine_pointer: bool,
    /// The host can deliver intersection observer records.
    #[serde(default = "default_true")]
    pub intersection_observer: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            fine_pointer: true,
            intersection_observer: true,
        }
    }
}

/// The subset of CSS selectors the runtime uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `.class`
    Class(String),
    /// `tag[attr^="prefix"]`
    AttrPrefix {
        tag: String,
        attr: String,
        prefix: String,
    },
    /// `base:not(.class)`
    Without { base: Box<Selector>, class: String },
    /// `ancestor target`
    Within {
        ancestor: Box<Selector>,
        target: Box<Selector>,
    },
    /// `a, b, ...`
    AnyOf(Vec<Selector>),
}

impl Selector {
    pub fn class(name: &str) -> Self {
        Selector::Class(name.to_string())
    }

    pub fn attr_prefix(tag: &str, attr: &str, prefix: &str) -> Self {
        Selector::AttrPrefix {
            tag: tag.to_string(),
            attr: attr.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn without(self, class: &str) -> Self {
        Selector::Without {
            base: Box::new(self),
            class: class.to_string(),
        }
    }

    pub fn within(self, ancestor: Selector) -> Self {
        Selector::Within {
            ancestor: Box::new(ancestor),
            target: Box::new(self),
        }
    }

    pub fn any_of(selectors: Vec<Selector>) -> Self {
        Selector::AnyOf(selectors)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Class(name) => write!(f, ".{name}"),
            Selector::AttrPrefix { tag, attr, prefix } => write!(f, "{tag}[{attr}^=\"{prefix}\"]"),
            Selector::Without { base, class } => write!(f, "{base}:not(.{class})"),
            Selector::Within { ancestor, target } => write!(f, "{ancestor} {target}"),
            Selector::AnyOf(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// Description of an element to create.
///
/// Decoration generators return these instead of touching the document, which
/// keeps them pure and lets the caller decide where (and whether) to insert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub text: Option<String>,
    /// Inline style declarations in insertion order.
    pub style: Vec<(String, String)>,
}

impl ElementSpec {
    pub fn div() -> Self {
        Self {
            tag: "div".into(),
            ..Self::default()
        }
    }

    pub fn class(mut self, name: &str) -> Self {
        self.classes.extend(name.split_whitespace().map(str::to_string));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style.push((property.to_string(), value.into()));
        self
    }

    /// Value of the last declaration for `property`.
    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }
}

/// Everything the page runtime needs from the host page.
pub trait Document {
    fn find_by_id(&self, id: &str) -> Option<ElementId>;

    /// Matching elements in document order.
    fn find_all(&self, selector: &Selector) -> Vec<ElementId>;

    /// Box relative to the viewport (already adjusted for scrolling).
    fn bounding_rect(&self, el: ElementId) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    fn capabilities(&self) -> Capabilities;

    fn body(&self) -> Option<ElementId>;

    /// True if `el` is `ancestor` or lies inside it.
    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool;

    fn has_class(&self, el: ElementId, class: &str) -> bool;

    fn add_class(&mut self, el: ElementId, class: &str);

    fn remove_class(&mut self, el: ElementId, class: &str);

    fn style(&self, el: ElementId, property: &str) -> Option<String>;

    fn set_style(&mut self, el: ElementId, property: &str, value: &str);

    fn text(&self, el: ElementId) -> Option<String>;

    fn set_text(&mut self, el: ElementId, text: &str);

    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;

    /// Create an element from `spec` as the last child of `parent`.
    fn append_child(&mut self, parent: ElementId, spec: &ElementSpec) -> Option<ElementId>;

    /// Install a stylesheet under `id` unless one with that id exists.
    /// Returns true when the sheet was added.
    fn install_stylesheet(&mut self, id: &str, css: &str) -> bool;

    fn scroll_into_view(&mut self, el: ElementId);
}
