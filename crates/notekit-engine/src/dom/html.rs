//! HTML value parsing and serialization.
//!
//! Parsing goes through the lossless `notekit-syntax` tree and keeps only
//! elements and text; comments, declarations and stray end tags are
//! dropped. Serialization writes cards as empty roots carrying their
//! reserved attributes, so a value never contains rendered card internals.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use notekit_syntax::ast::{self, Content};

use super::tree::{NodeId, NodeKind, Tree, byte_offset};
use super::{
    BOOKMARK_ANCHOR, BOOKMARK_CURSOR, BOOKMARK_FOCUS, CARD_ID, CARD_KEY, CARD_TYPE, CARD_VALUE,
    DATA_ELEMENT,
};
use crate::range::{Point, Range};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Emit bookmark markers instead of skipping them.
    pub bookmarks: bool,
}

/// Parse `html` into a detached fragment of `tree`.
pub fn parse_fragment(tree: &mut Tree, html: &str) -> NodeId {
    let syntax = notekit_syntax::parse(html);
    let fragment = tree.create_fragment();
    build(tree, fragment, ast::content(&syntax));
    tree.normalize(fragment);
    fragment
}

fn build(tree: &mut Tree, parent: NodeId, items: Vec<Content>) {
    let mut stack = vec![(parent, items.into_iter())];
    while let Some((parent, items)) = stack.last_mut() {
        let parent = *parent;
        let Some(item) = items.next() else {
            stack.pop();
            continue;
        };
        match item {
            Content::Element(element) => {
                let id = tree.create_element(&element.name());
                for attr in element.attributes() {
                    let value = attr.value().unwrap_or_default();
                    tree.set_attr(id, &attr.name(), &decode_html_entities(&value));
                }
                tree.append(parent, id);
                stack.push((id, element.content().into_iter()));
            }
            Content::Text(token) => {
                let text = tree.create_text(&decode_html_entities(token.text()));
                tree.append(parent, text);
            }
            Content::Comment(_) | Content::Declaration(_) | Content::Error(_) => {}
        }
    }
}

/// Serialize the children of `id`.
pub fn inner_html(tree: &Tree, id: NodeId, options: SerializeOptions) -> String {
    Writer::new(tree, options, &[]).inner(id)
}

/// Serialize `id` itself.
pub fn outer_html(tree: &Tree, id: NodeId, options: SerializeOptions) -> String {
    Writer::new(tree, options, &[]).outer(id)
}

/// Serialize the children of `id` with bookmark markers written where
/// `range` starts and ends, without touching the tree.
pub fn marked_inner_html(tree: &Tree, id: NodeId, range: &Range) -> String {
    let marks = if range.is_collapsed() {
        vec![(range.start, BOOKMARK_CURSOR)]
    } else {
        vec![(range.start, BOOKMARK_ANCHOR), (range.end, BOOKMARK_FOCUS)]
    };
    Writer::new(tree, SerializeOptions { bookmarks: true }, &marks).inner(id)
}

enum Step {
    Node(NodeId),
    /// Child `index` of a container, preceded by any mark sitting there.
    Child(NodeId, usize),
    /// End of a container: trailing marks, then the end tag if `tag`.
    Close(NodeId, bool),
}

struct Writer<'a> {
    tree: &'a Tree,
    options: SerializeOptions,
    marks: &'a [(Point, &'static str)],
    out: String,
}

impl<'a> Writer<'a> {
    fn new(tree: &'a Tree, options: SerializeOptions, marks: &'a [(Point, &'static str)]) -> Self {
        Self {
            tree,
            options,
            marks,
            out: String::new(),
        }
    }

    fn inner(self, id: NodeId) -> String {
        let mut stack = vec![Step::Close(id, false)];
        self.push_children(&mut stack, id);
        self.run(stack)
    }

    fn outer(self, id: NodeId) -> String {
        self.run(vec![Step::Node(id)])
    }

    fn push_children(&self, stack: &mut Vec<Step>, id: NodeId) {
        let count = self.tree.child_count(id);
        stack.extend((0..count).rev().map(|i| Step::Child(id, i)));
    }

    fn run(mut self, mut stack: Vec<Step>) -> String {
        while let Some(step) = stack.pop() {
            match step {
                Step::Child(parent, index) => {
                    self.marks_at(parent, index);
                    if let Some(child) = self.tree.child(parent, index) {
                        stack.push(Step::Node(child));
                    }
                }
                Step::Close(id, tag) => {
                    self.marks_at(id, self.tree.child_count(id));
                    if tag && let Some(name) = self.tree.name(id) {
                        self.out.push_str("</");
                        self.out.push_str(name);
                        self.out.push('>');
                    }
                }
                Step::Node(id) => self.open(id, &mut stack),
            }
        }
        self.out
    }

    fn open(&mut self, id: NodeId, stack: &mut Vec<Step>) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Text(text) => self.text(id, text),
            NodeKind::Document | NodeKind::Fragment => {
                stack.push(Step::Close(id, false));
                self.push_children(stack, id);
            }
            NodeKind::Element(element) => {
                let node = tree.node(id);
                if node.is_bookmark() && !self.options.bookmarks {
                    return;
                }

                self.out.push('<');
                self.out.push_str(&element.name);
                let card = node.is_card();
                for (name, value) in &element.attrs {
                    if card && ![CARD_TYPE, CARD_KEY, CARD_VALUE, CARD_ID].contains(&name.as_str()) {
                        continue;
                    }
                    self.out.push(' ');
                    self.out.push_str(name);
                    self.out.push_str("=\"");
                    self.out.push_str(&encode_double_quoted_attribute(value));
                    self.out.push('"');
                }
                self.out.push('>');

                if node.is_void() {
                    return;
                }
                stack.push(Step::Close(id, true));
                if !card {
                    self.push_children(stack, id);
                }
            }
        }
    }

    fn text(&mut self, id: NodeId, text: &str) {
        let mut from = 0;
        for (point, kind) in self.marks.iter().filter(|(p, _)| p.node == id) {
            let at = byte_offset(text, point.offset).max(from);
            self.out.push_str(&encode_text(&text[from..at]));
            push_marker(&mut self.out, kind);
            from = at;
        }
        self.out.push_str(&encode_text(&text[from..]));
    }

    fn marks_at(&mut self, parent: NodeId, index: usize) {
        for (point, kind) in self.marks {
            if point.node == parent && point.offset == index && !self.tree.is_text(parent) {
                push_marker(&mut self.out, kind);
            }
        }
    }
}

fn push_marker(out: &mut String, kind: &str) {
    out.push_str("<span ");
    out.push_str(DATA_ELEMENT);
    out.push_str("=\"");
    out.push_str(kind);
    out.push_str("\"></span>");
}
