//! Built-in cards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Capability, Card, CardType, ToolbarItem};
use crate::dom::{NodeId, Tree};

/// Horizontal rule.
#[derive(Debug, Default, Clone, Copy)]
pub struct HrCard;

impl Card for HrCard {
    fn card_type(&self) -> CardType {
        CardType::Block
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Activatable, Capability::Selectable, Capability::Toolbar]
    }

    fn value(&self) -> Value {
        Value::Null
    }

    fn set_value(&mut self, _value: Value) {}

    fn render(&mut self, tree: &mut Tree, center: NodeId) {
        let hr = tree.create_element("hr");
        tree.append(center, hr);
    }

    fn toolbar(&self) -> Vec<ToolbarItem> {
        vec![ToolbarItem::Dnd, ToolbarItem::Delete]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageValue {
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Inline image. Keeps the raw value it was built from so unknown fields
/// survive a round trip.
#[derive(Debug, Clone)]
pub struct ImageCard {
    raw: Value,
    image: ImageValue,
    maximized: bool,
}

impl ImageCard {
    pub fn new(value: Value) -> Self {
        let image = serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            log::warn!("image card value not understood: {err}");
            ImageValue::default()
        });
        Self {
            raw: value,
            image,
            maximized: false,
        }
    }

    pub fn image(&self) -> &ImageValue {
        &self.image
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }
}

impl Card for ImageCard {
    fn card_type(&self) -> CardType {
        CardType::Inline
    }

    fn capabilities(&self) -> &[Capability] {
        &[
            Capability::Activatable,
            Capability::Selectable,
            Capability::Focusable,
            Capability::Resizable,
            Capability::Maximizable,
            Capability::Toolbar,
        ]
    }

    fn value(&self) -> Value {
        self.raw.clone()
    }

    fn set_value(&mut self, value: Value) {
        *self = Self {
            maximized: self.maximized,
            ..Self::new(value)
        };
    }

    fn resize(&mut self, width: u32) {
        self.image.width = Some(width);
        match &mut self.raw {
            Value::Object(map) => {
                map.insert("width".to_string(), Value::from(width));
            }
            raw => *raw = serde_json::to_value(&self.image).unwrap_or_default(),
        }
    }

    fn render(&mut self, tree: &mut Tree, center: NodeId) {
        let img = tree.create_element_with("img", &[("src", self.image.src.as_str())]);
        if let Some(alt) = &self.image.alt {
            tree.set_attr(img, "alt", alt);
        }
        if let Some(width) = self.image.width {
            tree.set_attr(img, "width", &width.to_string());
        }
        tree.append(center, img);
    }

    fn toolbar(&self) -> Vec<ToolbarItem> {
        vec![
            ToolbarItem::Dnd,
            ToolbarItem::Copy,
            ToolbarItem::Maximize,
            ToolbarItem::Delete,
        ]
    }

    fn maximize(&mut self, tree: &mut Tree, root: NodeId) {
        self.maximized = true;
        tree.node_mut(root).add_class("card-maximized");
    }

    fn expand(&mut self, tree: &mut Tree, root: NodeId) {
        self.maximized = false;
        tree.node_mut(root).remove_class("card-maximized");
    }
}
