//! Card toolbars: one button per action, hidden until the card activates.

use crate::dom::{CARD_ELEMENT, NodeId, Tree};

use super::Activation;

pub const TOOLBAR_ELEMENT: &str = "toolbar";
pub const ACTION_ATTR: &str = "data-action";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarItem {
    /// Drag handle.
    Dnd,
    Copy,
    Delete,
    Maximize,
    Collapse,
    Expand,
    Custom(String),
}

impl ToolbarItem {
    pub fn name(&self) -> &str {
        match self {
            ToolbarItem::Dnd => "dnd",
            ToolbarItem::Copy => "copy",
            ToolbarItem::Delete => "delete",
            ToolbarItem::Maximize => "maximize",
            ToolbarItem::Collapse => "collapse",
            ToolbarItem::Expand => "expand",
            ToolbarItem::Custom(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dnd" => ToolbarItem::Dnd,
            "copy" => ToolbarItem::Copy,
            "delete" => ToolbarItem::Delete,
            "maximize" => ToolbarItem::Maximize,
            "collapse" => ToolbarItem::Collapse,
            "expand" => ToolbarItem::Expand,
            other => ToolbarItem::Custom(other.to_string()),
        }
    }
}

/// What running a toolbar action did, for the editor to follow up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarOutcome {
    /// Drag started; the host moves the card.
    Dragging,
    /// Serialized card, ready for the clipboard.
    Copied(String),
    /// Card removed from the document.
    Removed(Activation),
    /// Maximize/collapse/expand switched the card's mode. Not an undoable
    /// edit, so history is cleared.
    ModeSwitched,
    Custom,
}

/// Append a hidden toolbar with one button per item to `body`.
pub(crate) fn build(tree: &mut Tree, body: NodeId, items: &[ToolbarItem]) -> NodeId {
    let toolbar = tree.create_element_with("div", &[(CARD_ELEMENT, TOOLBAR_ELEMENT)]);
    tree.node_mut(toolbar).set_css("display", "none");
    for item in items {
        let button = tree.create_element_with("span", &[(ACTION_ATTR, item.name())]);
        tree.append(toolbar, button);
    }
    tree.append(body, toolbar);
    toolbar
}

pub(crate) fn find(tree: &Tree, root: NodeId) -> Option<NodeId> {
    tree.descendants(root)
        .into_iter()
        .find(|id| tree.node(*id).card_element() == Some(TOOLBAR_ELEMENT))
}

pub(crate) fn show(tree: &mut Tree, root: NodeId, visible: bool) {
    if let Some(toolbar) = find(tree, root) {
        tree.node_mut(toolbar)
            .set_css("display", if visible { "block" } else { "none" });
    }
}

/// Actions offered by the toolbar under `root`.
pub fn items(tree: &Tree, root: NodeId) -> Vec<ToolbarItem> {
    let Some(toolbar) = find(tree, root) else {
        return Vec::new();
    };
    tree.children(toolbar)
        .iter()
        .filter_map(|b| tree.attr(*b, ACTION_ATTR))
        .map(ToolbarItem::from_name)
        .collect()
}
