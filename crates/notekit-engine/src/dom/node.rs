//! Node facade.
//!
//! Higher layers never poke at [`Tree`] storage for classification or
//! attribute work; they go through these handles:
//!
//! - [`NodeRef`]: copyable read handle for navigation, attribute reads and
//!   classification predicates. Predicates never fail; a node without the
//!   queried characteristic answers `false`.
//! - [`NodeMut`]: write handle whose mutators consume and return the handle
//!   so call chains read top to bottom.
//! - [`NodesMut`]: the same over several nodes at once, plus scoped event
//!   listeners released by [`NodesMut::remove_all_events`].
//!
//! ```
//! use notekit_engine::dom::Tree;
//!
//! let mut tree = Tree::new();
//! let p = tree.create_element("p");
//! tree.node_mut(p).set_attr("data-x", "1").add_class("lead").set_css("color", "red");
//!
//! let node = tree.node(p);
//! assert!(node.is_block());
//! assert_eq!(node.css("color").as_deref(), Some("red"));
//! ```

use std::rc::Rc;

use super::schema;
use super::selector::Selector;
use super::style::{format_style, parse_style};
use super::tree::{NodeId, Tree};
use super::{
    BOOKMARK_ANCHOR, BOOKMARK_CURSOR, BOOKMARK_FOCUS, CARD_ELEMENT, CARD_KEY, CARD_TYPE,
    CONTENT_EDITABLE, DATA_ELEMENT, INDENT, ROOT_ELEMENT, ZWSP_CHAR,
};

impl Tree {
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut { tree: self, id }
    }

    pub fn nodes_mut(&mut self, ids: Vec<NodeId>) -> NodesMut<'_> {
        NodesMut { tree: self, ids }
    }

    /// Elements under `scope` (exclusive) matching `selector`, in document
    /// order.
    pub fn select(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let selector = Selector::parse(selector);
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }
}

#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<{name}>{}", self.id),
            None => write!(f, "{:?}{}", self.text().unwrap_or(""), self.id),
        }
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn wrap(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    // ============ Data ============

    pub fn name(&self) -> Option<&'a str> {
        self.tree.name(self.id)
    }

    pub fn is_element(&self) -> bool {
        self.tree.is_element(self.id)
    }

    pub fn is_text(&self) -> bool {
        self.tree.is_text(self.id)
    }

    pub fn text(&self) -> Option<&'a str> {
        self.tree.text(self.id)
    }

    pub fn text_content(&self) -> String {
        self.tree.text_content(self.id)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.tree.attr(self.id, name)
    }

    pub fn classes(&self) -> Vec<&'a str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    pub fn css(&self, prop: &str) -> Option<String> {
        let style = self.attr("style")?;
        parse_style(style)
            .into_iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v)
    }

    /// List nesting level from the indent attribute, 0 when absent.
    pub fn indent(&self) -> usize {
        self.attr(INDENT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Length as a range offset: chars for text, children otherwise.
    pub fn len(&self) -> usize {
        self.tree.node_len(self.id)
    }

    // ============ Navigation ============

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.tree.parent(self.id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |id| NodeRef { tree, id: *id })
    }

    pub fn first(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.tree.first_child(self.id))
    }

    pub fn last(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.tree.last_child(self.id))
    }

    pub fn prev(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.tree.prev_sibling(self.id))
    }

    pub fn next(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.tree.next_sibling(self.id))
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_element(&self) -> Option<NodeRef<'a>> {
        let mut node = self.prev();
        while let Some(n) = node {
            if n.is_element() {
                return Some(n);
            }
            node = n.prev();
        }
        None
    }

    /// Nearest following sibling that is an element.
    pub fn next_element(&self) -> Option<NodeRef<'a>> {
        let mut node = self.next();
        while let Some(n) = node {
            if n.is_element() {
                return Some(n);
            }
            node = n.next();
        }
        None
    }

    /// This node or its nearest ancestor matching `selector`.
    pub fn closest(&self, selector: &str) -> Option<NodeRef<'a>> {
        let selector = Selector::parse(selector);
        self.closest_where(|n| selector.matches(n.tree, n.id))
    }

    /// This node or its nearest ancestor satisfying `pred`.
    pub fn closest_where(&self, pred: impl Fn(&NodeRef<'a>) -> bool) -> Option<NodeRef<'a>> {
        let mut node = Some(*self);
        while let Some(n) = node {
            if pred(&n) {
                return Some(n);
            }
            node = n.parent();
        }
        None
    }

    /// Descendants matching `selector`.
    pub fn find(&self, selector: &str) -> Vec<NodeRef<'a>> {
        let tree = self.tree;
        tree.select(self.id, selector)
            .into_iter()
            .map(|id| NodeRef { tree, id })
            .collect()
    }

    pub fn matches(&self, selector: &str) -> bool {
        Selector::parse(selector).matches(self.tree, self.id)
    }

    // ============ Classification ============

    fn is_named(&self, pred: fn(&str) -> bool) -> bool {
        self.name().is_some_and(pred)
    }

    pub fn is_card(&self) -> bool {
        self.attr(CARD_TYPE).is_some() && self.attr(CARD_KEY).is_some()
    }

    pub fn is_block_card(&self) -> bool {
        self.is_card() && self.attr(CARD_TYPE) == Some("block")
    }

    pub fn is_inline_card(&self) -> bool {
        self.is_card() && self.attr(CARD_TYPE) == Some("inline")
    }

    pub fn is_block(&self) -> bool {
        if self.is_card() {
            return self.is_block_card();
        }
        self.is_named(schema::is_block_tag)
    }

    pub fn is_inline(&self) -> bool {
        if self.is_card() {
            return self.is_inline_card();
        }
        self.is_named(schema::is_inline_tag)
    }

    pub fn is_mark(&self) -> bool {
        !self.is_card() && !self.is_bookmark() && self.is_named(schema::is_mark_tag)
    }

    pub fn is_void(&self) -> bool {
        self.is_named(schema::is_void_tag)
    }

    pub fn is_solid(&self) -> bool {
        self.is_named(schema::is_solid_tag)
    }

    pub fn is_root(&self) -> bool {
        self.attr(DATA_ELEMENT) == Some(ROOT_ELEMENT)
    }

    /// Whether content here may be edited: decided by the nearest
    /// `contenteditable` on this node or its ancestors.
    pub fn is_editable(&self) -> bool {
        self.closest_where(|n| n.attr(CONTENT_EDITABLE).is_some())
            .is_some_and(|n| n.attr(CONTENT_EDITABLE) == Some("true"))
    }

    pub fn is_table(&self) -> bool {
        self.is_named(schema::is_table_tag)
    }

    pub fn is_heading(&self) -> bool {
        self.is_named(schema::is_heading_tag)
    }

    /// Headings and elements flagged `data-title`.
    pub fn is_title(&self) -> bool {
        self.is_heading() || (self.is_element() && self.attr("data-title").is_some())
    }

    pub fn is_list(&self) -> bool {
        !self.is_card() && self.is_named(schema::is_list_tag)
    }

    pub fn is_list_item(&self) -> bool {
        self.name() == Some("li")
    }

    pub fn is_bookmark(&self) -> bool {
        matches!(
            self.attr(DATA_ELEMENT),
            Some(BOOKMARK_ANCHOR | BOOKMARK_FOCUS | BOOKMARK_CURSOR)
        )
    }

    /// The `data-card-element` role of a card part, if this is one.
    pub fn card_element(&self) -> Option<&'a str> {
        self.attr(CARD_ELEMENT)
    }

    /// Nearest enclosing card root, this node included.
    pub fn card_root(&self) -> Option<NodeRef<'a>> {
        self.closest_where(|n| n.is_card())
    }

    /// Nearest enclosing block, this node included.
    pub fn block(&self) -> Option<NodeRef<'a>> {
        self.closest_where(|n| n.is_block() || n.is_root())
    }

    /// True when the node renders nothing a caret could stand next to:
    /// empty or zero-width text, `br`, bookmark markers, and elements made
    /// only of those. Cards and other voids are content.
    pub fn is_empty(&self) -> bool {
        if let Some(text) = self.text() {
            return text.chars().all(|c| c == ZWSP_CHAR);
        }
        if self.is_card() {
            return false;
        }
        if self.is_void() {
            return self.name() == Some("br");
        }
        if self.is_bookmark() {
            return true;
        }
        self.children().all(|c| c.is_empty())
    }
}

/// Chainable write handle over one node.
pub struct NodeMut<'a> {
    tree: &'a mut Tree,
    id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn read(&self) -> NodeRef<'_> {
        self.tree.node(self.id)
    }

    pub fn set_attr(self, name: &str, value: &str) -> Self {
        self.tree.set_attr(self.id, name, value);
        self
    }

    pub fn remove_attr(self, name: &str) -> Self {
        self.tree.remove_attr(self.id, name);
        self
    }

    pub fn add_class(self, class: &str) -> Self {
        let mut classes: Vec<String> = self
            .read()
            .classes()
            .into_iter()
            .map(str::to_string)
            .collect();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        self.tree.set_attr(self.id, "class", &classes.join(" "));
        self
    }

    pub fn remove_class(self, class: &str) -> Self {
        let classes: Vec<String> = self
            .read()
            .classes()
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        if classes.is_empty() {
            self.tree.remove_attr(self.id, "class");
        } else {
            self.tree.set_attr(self.id, "class", &classes.join(" "));
        }
        self
    }

    pub fn set_css(self, prop: &str, value: &str) -> Self {
        let mut decls = self
            .read()
            .attr("style")
            .map(parse_style)
            .unwrap_or_default();
        match decls.iter_mut().find(|(p, _)| p == prop) {
            Some((_, v)) => *v = value.to_string(),
            None => decls.push((prop.to_string(), value.to_string())),
        }
        self.tree.set_attr(self.id, "style", &format_style(&decls));
        self
    }

    /// Remove one declaration; the `style` attribute goes when it empties.
    pub fn remove_css(self, prop: &str) -> Self {
        let Some(style) = self.read().attr("style").map(parse_style) else {
            return self;
        };
        let decls: Vec<_> = style.into_iter().filter(|(p, _)| p != prop).collect();
        if decls.is_empty() {
            self.tree.remove_attr(self.id, "style");
        } else {
            self.tree.set_attr(self.id, "style", &format_style(&decls));
        }
        self
    }

    pub fn set_text(self, text: &str) -> Self {
        self.tree.set_text(self.id, text);
        self
    }

    pub fn append(self, child: NodeId) -> Self {
        self.tree.append(self.id, child);
        self
    }

    pub fn prepend(self, child: NodeId) -> Self {
        self.tree.prepend(self.id, child);
        self
    }

    pub fn before(self, node: NodeId) -> Self {
        self.tree.insert_before(self.id, node);
        self
    }

    pub fn after(self, node: NodeId) -> Self {
        self.tree.insert_after(self.id, node);
        self
    }

    /// Put `node` in this node's place. The handle keeps pointing at the
    /// (now detached) original.
    pub fn replace_with(self, node: NodeId) -> Self {
        self.tree.replace(self.id, node);
        self
    }

    pub fn remove(self) -> Self {
        self.tree.detach(self.id);
        self
    }

    pub fn empty(self) -> Self {
        self.tree.empty(self.id);
        self
    }

    pub fn clone_node(&mut self, deep: bool) -> NodeId {
        self.tree.clone_node(self.id, deep)
    }

    pub fn on(self, event: &str, handler: impl Fn(NodeId) + 'static) -> Self {
        self.tree.add_listener(self.id, event, Rc::new(handler));
        self
    }

    pub fn remove_all_events(self) -> Self {
        self.tree.remove_listeners(self.id, None);
        self
    }
}

/// Chainable write handle over several nodes.
pub struct NodesMut<'a> {
    tree: &'a mut Tree,
    ids: Vec<NodeId>,
}

impl<'a> NodesMut<'a> {
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn for_each(self, f: impl Fn(NodeMut<'_>)) -> Self {
        for id in &self.ids {
            f(self.tree.node_mut(*id));
        }
        self
    }

    pub fn set_attr(self, name: &str, value: &str) -> Self {
        self.for_each(|n| {
            n.set_attr(name, value);
        })
    }

    pub fn remove_attr(self, name: &str) -> Self {
        self.for_each(|n| {
            n.remove_attr(name);
        })
    }

    pub fn add_class(self, class: &str) -> Self {
        self.for_each(|n| {
            n.add_class(class);
        })
    }

    pub fn remove_class(self, class: &str) -> Self {
        self.for_each(|n| {
            n.remove_class(class);
        })
    }

    pub fn set_css(self, prop: &str, value: &str) -> Self {
        self.for_each(|n| {
            n.set_css(prop, value);
        })
    }

    pub fn remove(self) -> Self {
        self.for_each(|n| {
            n.remove();
        })
    }

    /// Register `handler` for `event` on every node.
    pub fn on(self, event: &str, handler: impl Fn(NodeId) + 'static) -> Self {
        let handler: Rc<dyn Fn(NodeId)> = Rc::new(handler);
        for id in &self.ids {
            self.tree.add_listener(*id, event, Rc::clone(&handler));
        }
        self
    }

    pub fn off(self, event: &str) -> Self {
        for id in &self.ids {
            self.tree.remove_listeners(*id, Some(event));
        }
        self
    }

    /// Drop every listener registered on these nodes.
    pub fn remove_all_events(self) -> Self {
        for id in &self.ids {
            self.tree.remove_listeners(*id, None);
        }
        self
    }
}
