//! Arena-backed document tree.
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]. Removing a node only
//! detaches it: the slot stays valid so ranges, bookmarks and the card
//! registry can still ask where a node went (`is_attached_to`). Text offsets
//! are counted in chars, element offsets in child indices, the same way a
//! DOM range counts them.
//!
//! Subtrees known to be dead are handed to [`Tree::discard`] instead. They
//! stay readable until [`Tree::collect_garbage`] runs, which puts their
//! slots on a free list for later allocations. The editor collects only once
//! nothing it owns can still point into discarded content.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Index of a node in its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The single document node every attached node descends from.
    Document,
    /// A detached container whose children move out when it is inserted.
    Fragment,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub name: String,
    /// Attributes in insertion order.
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    live: bool,
}

/// Handler registered on a node through the facade.
pub type Listener = Rc<dyn Fn(NodeId)>;

pub struct Tree {
    nodes: Vec<NodeData>,
    document: NodeId,
    listeners: HashMap<NodeId, Vec<(String, Listener)>>,
    /// Slots ready for reuse.
    free: Vec<NodeId>,
    /// Roots of discarded subtrees awaiting collection.
    garbage: Vec<NodeId>,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.node_count())
            .field("slots", &self.nodes.len())
            .field("document", &self.document)
            .finish()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte position of the `chars`-th char, clamped to the end.
pub(crate) fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

impl Tree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            listeners: HashMap::new(),
            free: Vec::new(),
            garbage: Vec::new(),
        };
        tree.document = tree.alloc(NodeKind::Document);
        tree
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            live: true,
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = data;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    /// Nodes currently allocated, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Arena slots ever allocated; freed slots count until reused.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    // ============ Creation ============

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(name)))
    }

    pub fn create_element_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(name);
        for (k, v) in attrs {
            data.set(k, *v);
        }
        self.alloc(NodeKind::Element(data))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    // ============ Node data ============

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Tag name, `None` for non-elements.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Fragment)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text(t) = &mut self.nodes[id.0].kind {
            *t = text.to_string();
        }
    }

    /// Length of a text node in chars.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    /// Maximum offset inside `id`: chars for text, child count otherwise.
    pub fn node_len(&self, id: NodeId) -> usize {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => t.chars().count(),
            _ => self.nodes[id.0].children.len(),
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element_mut(id) {
            e.set(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.remove(name))
    }

    /// Insert `text` at char `offset` of a text node.
    pub fn insert_text(&mut self, id: NodeId, offset: usize, text: &str) {
        if let NodeKind::Text(t) = &mut self.nodes[id.0].kind {
            let at = byte_offset(t, offset);
            t.insert_str(at, text);
        }
    }

    /// Remove chars `start..end` from a text node, returning them.
    pub fn delete_text(&mut self, id: NodeId, start: usize, end: usize) -> String {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(t) if start < end => {
                let from = byte_offset(t, start);
                let to = byte_offset(t, end);
                t.drain(from..to).collect()
            }
            _ => String::new(),
        }
    }

    /// Chars `start..end` of a text node.
    pub fn substring(&self, id: NodeId, start: usize, end: usize) -> String {
        self.text(id)
            .map(|t| t.chars().skip(start).take(end.saturating_sub(start)).collect())
            .unwrap_or_default()
    }

    // ============ Navigation ============

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.0].children.get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].children.len()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.last().copied()
    }

    /// Position of `id` among its parent's children.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent.0].children.iter().position(|c| *c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index(id)?;
        self.child(parent, index + 1)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True when `node` is currently reachable from `root`.
    pub fn is_attached_to(&self, node: NodeId, root: NodeId) -> bool {
        self.contains(root, node)
    }

    /// Outermost ancestor (the document for attached nodes).
    pub fn top(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Nearest node containing both `a` and `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        std::iter::once(a)
            .chain(self.ancestors(a))
            .find(|candidate| self.contains(*candidate, b))
    }

    /// Child indices from the top ancestor down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut node = id;
        while let Some(index) = self.index(node) {
            path.push(index);
            node = self.nodes[node.0].parent.unwrap_or(node);
        }
        path.reverse();
        path
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    // ============ Mutation ============

    /// Remove `id` from its parent. The node and its subtree stay in the
    /// arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Insert `node` as child `index` of `parent`. Fragments contribute
    /// their children instead of themselves.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) {
        if self.is_fragment(node) {
            let children = self.take_children(node);
            for (i, child) in children.into_iter().enumerate() {
                self.insert_at(parent, index + i, child);
            }
            return;
        }
        debug_assert!(
            !self.contains(node, parent),
            "cannot insert a node into its own subtree"
        );

        let mut index = index;
        if self.nodes[node.0].parent == Some(parent)
            && let Some(old) = self.index(node)
            && old < index
        {
            index -= 1;
        }
        self.detach(node);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    pub fn append(&mut self, parent: NodeId, node: NodeId) {
        let len = self.child_count(parent);
        self.insert_at(parent, len, node);
    }

    pub fn prepend(&mut self, parent: NodeId, node: NodeId) {
        self.insert_at(parent, 0, node);
    }

    /// Insert `node` just before `reference`. No-op when `reference` is
    /// detached.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index(reference)) {
            self.insert_at(parent, index, node);
        }
    }

    /// Insert `node` just after `reference`. No-op when `reference` is
    /// detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index(reference)) {
            self.insert_at(parent, index + 1, node);
        }
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Replace `id` with its own children.
    pub fn unwrap(&mut self, id: NodeId) {
        for child in self.take_children(id) {
            self.insert_before(id, child);
        }
        self.detach(id);
    }

    /// Put `wrapper` where `id` is and move `id` inside it.
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) {
        self.insert_before(id, wrapper);
        self.append(wrapper, id);
    }

    /// Detach and return all children of `id`.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    /// Detach all children of `id`.
    pub fn empty(&mut self, id: NodeId) {
        self.take_children(id);
    }

    // ============ Reclaiming ============

    /// Detach `id` and mark its subtree dead. Nothing may hold ids into it
    /// once [`collect_garbage`](Self::collect_garbage) runs.
    pub fn discard(&mut self, id: NodeId) {
        if id == self.document {
            return;
        }
        self.detach(id);
        self.garbage.push(id);
    }

    /// [`discard`](Self::discard) every child of `id`.
    pub fn discard_children(&mut self, id: NodeId) {
        let children = self.take_children(id);
        self.garbage.extend(children);
    }

    /// Free every discarded subtree that is still detached. Returns the
    /// number of slots freed.
    pub fn collect_garbage(&mut self) -> usize {
        let mut stack: Vec<NodeId> = std::mem::take(&mut self.garbage)
            .into_iter()
            .filter(|id| self.nodes[id.0].live && self.nodes[id.0].parent.is_none())
            .collect();
        let mut freed = 0;
        while let Some(id) = stack.pop() {
            let data = &mut self.nodes[id.0];
            if !data.live {
                continue;
            }
            data.live = false;
            data.parent = None;
            data.kind = NodeKind::Fragment;
            stack.append(&mut data.children);
            self.listeners.remove(&id);
            self.free.push(id);
            freed += 1;
        }
        if freed > 0 {
            log::trace!("freed {freed} node slots");
        }
        freed
    }

    /// Copy `id` (and its subtree when `deep`) into new detached nodes.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let copy = self.alloc(self.nodes[id.0].kind.clone());
        if !deep {
            return copy;
        }
        let mut stack = vec![(id, copy)];
        while let Some((original, copy)) = stack.pop() {
            for child in self.children(original).to_vec() {
                let child_copy = self.alloc(self.nodes[child.0].kind.clone());
                self.append(copy, child_copy);
                stack.push((child, child_copy));
            }
        }
        copy
    }

    /// Split a text node at char `offset`. The right half becomes a new text
    /// node placed right after `id` and is returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> NodeId {
        let len = self.text_len(id);
        let tail = self.delete_text(id, offset.min(len), len);
        let right = self.create_text(&tail);
        self.insert_after(id, right);
        right
    }

    /// Merge adjacent text children and drop empty ones, in the whole
    /// subtree.
    pub fn normalize(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(parent) = stack.pop() {
            let mut i = 0;
            while let Some(child) = self.child(parent, i) {
                if let Some(text) = self.text(child) {
                    if text.is_empty() {
                        self.detach(child);
                        continue;
                    }
                    if let Some(prev) = i.checked_sub(1).and_then(|p| self.child(parent, p))
                        && self.is_text(prev)
                    {
                        let text = text.to_string();
                        let len = self.text_len(prev);
                        self.insert_text(prev, len, &text);
                        self.detach(child);
                        continue;
                    }
                } else {
                    stack.push(child);
                }
                i += 1;
            }
        }
    }

    // ============ Listeners ============

    pub fn add_listener(&mut self, id: NodeId, event: &str, listener: Listener) {
        self.listeners
            .entry(id)
            .or_default()
            .push((event.to_string(), listener));
    }

    /// Drop listeners on `id`, for one event or for all of them.
    pub fn remove_listeners(&mut self, id: NodeId, event: Option<&str>) {
        match event {
            None => {
                self.listeners.remove(&id);
            }
            Some(event) => {
                if let Some(list) = self.listeners.get_mut(&id) {
                    list.retain(|(e, _)| e != event);
                }
            }
        }
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.listeners.get(&id).map(Vec::len).unwrap_or(0)
    }

    /// Call every `event` listener on `id`. Returns how many ran.
    pub fn dispatch(&self, id: NodeId, event: &str) -> usize {
        let handlers: Vec<Listener> = self
            .listeners
            .get(&id)
            .map(|list| {
                list.iter()
                    .filter(|(e, _)| e == event)
                    .map(|(_, l)| Rc::clone(l))
                    .collect()
            })
            .unwrap_or_default();
        for handler in &handlers {
            handler(id);
        }
        handlers.len()
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
