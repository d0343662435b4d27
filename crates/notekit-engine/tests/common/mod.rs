#![allow(dead_code)]

use notekit_config::Config;
use notekit_engine::dom::html::{SerializeOptions, inner_html, parse_fragment};
use notekit_engine::card::HrCard;
use notekit_engine::{Editor, NodeId, Point, Range, Tree};

/// A detached editable root holding `html`.
pub fn doc(html: &str) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.create_element_with("div", &[("data-element", "root"), ("contenteditable", "true")]);
    let document = tree.document();
    tree.append(document, root);
    let frag = parse_fragment(&mut tree, html);
    tree.append(root, frag);
    (tree, root)
}

pub fn html(tree: &Tree, root: NodeId) -> String {
    inner_html(tree, root, SerializeOptions::default())
}

pub fn text_node(tree: &Tree, root: NodeId, text: &str) -> NodeId {
    tree.descendants(root)
        .into_iter()
        .find(|id| tree.text(*id) == Some(text))
        .unwrap_or_else(|| panic!("no text node {text:?}"))
}

/// An editor with the `hr` card registered, loaded with `html`.
pub fn editor(html: &str) -> Editor {
    let mut editor = Editor::new(&Config::default());
    editor.cards_mut().register("hr", |_| Box::new(HrCard));
    editor.set_value(html);
    editor
}

pub fn caret(editor: &mut Editor, text: &str, offset: usize) {
    let t = text_node(editor.tree(), editor.root(), text);
    editor.select(Range::collapsed(Point::new(t, offset)));
}
