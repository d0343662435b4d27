//! Joining adjacent nodes after a deletion or a fragment boundary.

use crate::dom::{NodeId, Tree};
use crate::range::Point;

/// Join the two text nodes on either side of `point` when both exist,
/// returning the position between the old contents.
pub(crate) fn join_texts(tree: &mut Tree, point: Point) -> Point {
    if tree.is_text(point.node) || point.offset == 0 {
        return point;
    }
    let (Some(left), Some(right)) = (
        tree.child(point.node, point.offset - 1),
        tree.child(point.node, point.offset),
    ) else {
        return point;
    };
    let Some(tail) = tree.text(right).map(str::to_string) else {
        return point;
    };
    if !tree.is_text(left) {
        return point;
    }
    let len = tree.text_len(left);
    tree.insert_text(left, len, &tail);
    tree.detach(right);
    Point::new(left, len)
}

/// Drop inline font sizes from `node` and its subtree; spans left with no
/// attributes are unwrapped.
fn strip_font_size(tree: &mut Tree, node: NodeId) {
    let mut targets = tree.descendants(node);
    targets.insert(0, node);
    for id in targets {
        if tree.node(id).css("font-size").is_none() {
            continue;
        }
        tree.node_mut(id).remove_css("font-size");
        let bare = tree
            .element(id)
            .is_some_and(|e| e.name == "span" && e.attrs.is_empty());
        if bare && tree.parent(id).is_some() {
            tree.unwrap(id);
        }
    }
}

/// Merge `b` into `a` and return the join point inside `a`.
///
/// Texts are concatenated. A list meeting a non-list is retargeted to the
/// list's last (when `a` is the list) or first (when `b` is) item so content
/// lands at item level; two lists just pool their items. A trailing `br`
/// placeholder in `a` is dropped first, and a title receiving content
/// strips inline font sizes from it. With `remove_b` the emptied donor is
/// removed.
pub fn merge_node(tree: &mut Tree, a: NodeId, b: NodeId, remove_b: bool) -> Point {
    if tree.is_text(a) && tree.is_text(b) {
        let len = tree.text_len(a);
        let tail = tree.text(b).unwrap_or_default().to_string();
        tree.insert_text(a, len, &tail);
        tree.detach(b);
        return Point::new(a, len);
    }

    let (a_list, b_list) = (tree.node(a).is_list(), tree.node(b).is_list());
    if a_list && b_list {
        let join = Point::new(a, tree.child_count(a));
        for child in tree.take_children(b) {
            tree.append(a, child);
        }
        if remove_b {
            tree.detach(b);
        }
        return join;
    }

    let target = if a_list {
        tree.last_child(a).filter(|c| tree.node(*c).is_list_item()).unwrap_or(a)
    } else {
        a
    };
    let source = if b_list {
        tree.first_child(b).filter(|c| tree.node(*c).is_list_item()).unwrap_or(b)
    } else {
        b
    };
    log::debug!("merge {source} into {target}");

    if let Some(last) = tree.last_child(target)
        && tree.name(last) == Some("br")
    {
        tree.detach(last);
    }

    let title = tree.node(target).is_title();
    let join = Point::new(target, tree.child_count(target));
    for child in tree.take_children(source) {
        tree.append(target, child);
        if title {
            strip_font_size(tree, child);
        }
    }
    let join = join_texts(tree, join);

    if remove_b {
        tree.detach(source);
        if source != b && tree.child_count(b) == 0 {
            tree.detach(b);
        }
    }
    join
}

/// A block the deep merge may descend into.
fn is_mergeable_block(tree: &Tree, node: NodeId) -> bool {
    let n = tree.node(node);
    n.is_element() && n.is_block() && !n.is_card() && !n.is_void() && !n.is_table()
}

/// Merge `b` into `a`, recursing into their facing children while both are
/// blocks, so `<ul><li>a</li></ul>` + `<ul><li>b</li></ul>` joins the items
/// rather than just the lists. Stops at cards and at empty sides; what is
/// left of `b` moves in after the joined part.
pub fn deep_merge_node(tree: &mut Tree, a: NodeId, b: NodeId) -> Point {
    if tree.node(a).is_card() {
        return Point::after(tree, a).unwrap_or(Point::new(b, 0));
    }
    if tree.node(b).is_card() {
        return Point::new(a, tree.node_len(a));
    }
    if tree.node(b).is_empty() {
        tree.detach(b);
        return Point::new(a, tree.node_len(a));
    }
    if tree.node(a).is_empty() {
        return merge_node(tree, a, b, true);
    }

    let a_last = tree.last_child(a).filter(|c| is_mergeable_block(tree, *c));
    let b_first = tree.first_child(b).filter(|c| is_mergeable_block(tree, *c));
    match (a_last, b_first) {
        (Some(al), Some(bf)) => {
            let join = deep_merge_node(tree, al, bf);
            for child in tree.take_children(b) {
                tree.append(a, child);
            }
            tree.detach(b);
            join
        }
        (Some(al), None) if !tree.node(b).is_list() => deep_merge_node(tree, al, b),
        (None, Some(bf)) if !tree.node(a).is_list() => {
            let join = deep_merge_node(tree, a, bf);
            if tree.child_count(b) == 0 {
                tree.detach(b);
            }
            join
        }
        _ => merge_node(tree, a, b, true),
    }
}
