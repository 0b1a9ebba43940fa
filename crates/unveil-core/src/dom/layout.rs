//! TOML page layouts for the virtual document.
//!
//! A layout lists the elements of a page as a tree, with the ids, classes and
//! layout boxes the runtime looks for:
//!
//! ```toml
//! [viewport]
//! width = 1280
//! height = 800
//!
//! [[element]]
//! id = "birthdayContent"
//! classes = ["hidden"]
//! rect = { top = 0, width = 1280, height = 3000 }
//!
//! [[element.children]]
//! classes = ["animate-on-scroll"]
//! rect = { top = 1400, width = 600, height = 200 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{Capabilities, Document, ElementId, Rect, VirtualDocument, Viewport};
use crate::error::{CoreError, Result};

const SAMPLE_LAYOUT: &str = include_str!("../../layouts/sample.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementLayout {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<ElementLayout>,
}

fn default_tag() -> String {
    "div".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementLayout>,
}

impl PageLayout {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CoreError::Layout(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The bundled demo page: loading overlay, lock screen with countdown,
    /// hero section and a long scrolling body.
    pub fn sample() -> Result<Self> {
        Self::from_toml_str(SAMPLE_LAYOUT)
    }

    pub fn build(&self) -> VirtualDocument {
        let mut doc = VirtualDocument::new(self.viewport).with_capabilities(self.capabilities);
        if let Some(body) = doc.body() {
            for element in &self.elements {
                insert_tree(&mut doc, body, element);
            }
        }
        doc
    }
}

fn insert_tree(doc: &mut VirtualDocument, parent: ElementId, layout: &ElementLayout) {
    let classes: Vec<&str> = layout.classes.iter().map(String::as_str).collect();
    let Some(el) = doc.insert(parent, &layout.tag, layout.id.as_deref(), &classes, layout.rect) else {
        return;
    };
    if let Some(text) = &layout.text {
        doc.set_text(el, text);
    }
    for (name, value) in &layout.attributes {
        doc.set_attribute(el, name, value);
    }
    for child in &layout.children {
        insert_tree(doc, el, child);
    }
}
