//! In-memory document.
//!
//! Keeps a flat arena of nodes in creation order, which is also document
//! order for pages built top-down from a [`PageLayout`](super::PageLayout).
//! Layout boxes are stored in page coordinates; `bounding_rect` subtracts the
//! current scroll offset the way a browser reports client rects.

use std::collections::{BTreeMap, BTreeSet};

use super::{Capabilities, Document, ElementId, ElementSpec, Rect, Selector, Viewport};

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    dom_id: Option<String>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    rect: Rect,
}

#[derive(Debug, Clone)]
pub struct VirtualDocument {
    nodes: Vec<Node>,
    stylesheets: BTreeMap<String, String>,
    viewport: Viewport,
    capabilities: Capabilities,
}

impl Default for VirtualDocument {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl VirtualDocument {
    /// Empty document containing only `<body>`.
    pub fn new(viewport: Viewport) -> Self {
        let body = Node {
            tag: "body".into(),
            rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
            ..Node::default()
        };
        Self {
            nodes: vec![body],
            stylesheets: BTreeMap::new(),
            viewport,
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn set_capabilities(&mut self, capabilities: Capabilities) {
        self.capabilities = capabilities;
    }

    /// Add an element under `parent` with an optional `id` and a layout box
    /// in page coordinates.
    pub fn insert(
        &mut self,
        parent: ElementId,
        tag: &str,
        dom_id: Option<&str>,
        classes: &[&str],
        rect: Rect,
    ) -> Option<ElementId> {
        self.node(parent)?;
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag: tag.to_string(),
            dom_id: dom_id.map(str::to_string),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent: Some(parent),
            rect,
            ..Node::default()
        });
        self.nodes[parent.0 as usize].children.push(id);
        Some(id)
    }

    pub fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Move an element's layout box (page coordinates).
    pub fn set_rect(&mut self, el: ElementId, rect: Rect) {
        if let Some(node) = self.node_mut(el) {
            node.rect = rect;
        }
    }

    pub fn scroll_to(&mut self, scroll_y: f64) {
        self.viewport.scroll_y = scroll_y.max(0.0);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    pub fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.node(el).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.stylesheets.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(el.0 as usize)
    }

    fn node_mut(&mut self, el: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(el.0 as usize)
    }

    fn ancestors(&self, el: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.node(el).and_then(|n| n.parent), move |p| {
            self.node(*p).and_then(|n| n.parent)
        })
    }

    fn matches(&self, el: ElementId, selector: &Selector) -> bool {
        let Some(node) = self.node(el) else {
            return false;
        };
        match selector {
            Selector::Class(name) => node.classes.contains(name),
            Selector::AttrPrefix { tag, attr, prefix } => {
                node.tag == *tag
                    && node
                        .attributes
                        .get(attr)
                        .is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Selector::Without { base, class } => {
                self.matches(el, base) && !node.classes.contains(class)
            }
            Selector::Within { ancestor, target } => {
                self.matches(el, target) && self.ancestors(el).any(|a| self.matches(a, ancestor))
            }
            Selector::AnyOf(items) => items.iter().any(|s| self.matches(el, s)),
        }
    }
}

impl Document for VirtualDocument {
    fn find_by_id(&self, id: &str) -> Option<ElementId> {
        if id.is_empty() {
            return None;
        }
        self.nodes
            .iter()
            .position(|n| n.dom_id.as_deref() == Some(id))
            .map(|i| ElementId(i as u32))
    }

    fn find_all(&self, selector: &Selector) -> Vec<ElementId> {
        (0..self.nodes.len() as u32)
            .map(ElementId)
            .filter(|el| self.matches(*el, selector))
            .collect()
    }

    fn bounding_rect(&self, el: ElementId) -> Option<Rect> {
        self.node(el)
            .map(|n| n.rect.translated_y(-self.viewport.scroll_y))
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn body(&self) -> Option<ElementId> {
        self.node(ElementId(0)).map(|_| ElementId(0))
    }

    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool {
        ancestor == el || self.ancestors(el).any(|a| a == ancestor)
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el).is_some_and(|n| n.classes.contains(class))
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.node_mut(el) {
            node.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.node_mut(el) {
            node.classes.remove(class);
        }
    }

    fn style(&self, el: ElementId, property: &str) -> Option<String> {
        self.node(el).and_then(|n| n.style.get(property).cloned())
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.style.insert(property.to_string(), value.to_string());
        }
    }

    fn text(&self, el: ElementId) -> Option<String> {
        self.node(el).map(|n| n.text.clone())
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        if let Some(node) = self.node_mut(el) {
            node.text = text.to_string();
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.node(el).and_then(|n| n.attributes.get(name).cloned())
    }

    fn append_child(&mut self, parent: ElementId, spec: &ElementSpec) -> Option<ElementId> {
        let classes: Vec<&str> = spec.classes.iter().map(String::as_str).collect();
        let el = self.insert(parent, &spec.tag, None, &classes, Rect::default())?;
        if let Some(node) = self.node_mut(el) {
            node.text = spec.text.clone().unwrap_or_default();
            for (property, value) in &spec.style {
                node.style.insert(property.clone(), value.clone());
            }
        }
        Some(el)
    }

    fn install_stylesheet(&mut self, id: &str, css: &str) -> bool {
        if self.stylesheets.contains_key(id) {
            return false;
        }
        self.stylesheets.insert(id.to_string(), css.to_string());
        true
    }

    fn scroll_into_view(&mut self, el: ElementId) {
        if let Some(top) = self.node(el).map(|n| n.rect.top) {
            self.scroll_to(top);
        }
    }
}
