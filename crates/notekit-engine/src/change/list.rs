//! List and blockquote structure maintenance.
//!
//! Lists are flat: nesting is expressed by the indent attribute on sibling
//! `ul`/`ol` elements, not by lists inside items. Numbering therefore runs
//! across sibling lists of the same indent, skipping deeper ones.

use crate::dom::{NodeId, Tree};

fn start_of(tree: &Tree, list: NodeId) -> usize {
    tree.attr(list, "start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1)
}

fn item_count(tree: &Tree, list: NodeId) -> usize {
    tree.children(list)
        .iter()
        .filter(|c| tree.node(**c).is_list_item())
        .count()
}

fn stamp(tree: &mut Tree, list: NodeId, start: usize) {
    if start <= 1 {
        tree.remove_attr(list, "start");
    } else {
        tree.set_attr(list, "start", &start.to_string());
    }
}

fn is_ordered(tree: &Tree, node: NodeId) -> bool {
    tree.node(node).is_list() && tree.name(node) == Some("ol")
}

/// Recompute `start` on `node` and the ordered lists that continue it.
///
/// The start comes from the nearest preceding ordered list of the same
/// indent in the same run of sibling lists (deeper lists are skipped, a
/// shallower list or any non-list ends the run). Without one, the node keeps
/// its own start. Following same-indent ordered lists in the run are then
/// re-stamped; a start of 1 is written as no attribute.
pub fn add_list_start_number(tree: &mut Tree, node: NodeId) {
    if !is_ordered(tree, node) {
        return;
    }
    let indent = tree.node(node).indent();

    let mut start = start_of(tree, node);
    let mut prev = tree.node(node).prev_element().map(|n| n.id());
    while let Some(p) = prev {
        let n = tree.node(p);
        if !n.is_list() || n.indent() < indent {
            break;
        }
        if n.indent() == indent {
            if is_ordered(tree, p) {
                start = start_of(tree, p) + item_count(tree, p);
            }
            break;
        }
        prev = n.prev_element().map(|n| n.id());
    }

    let mut current = node;
    loop {
        stamp(tree, current, start);
        start += item_count(tree, current);

        let mut next = tree.node(current).next_element().map(|n| n.id());
        let mut found = None;
        while let Some(s) = next {
            let n = tree.node(s);
            if !n.is_list() || n.indent() < indent {
                break;
            }
            if n.indent() == indent {
                if is_ordered(tree, s) {
                    found = Some(s);
                }
                break;
            }
            next = n.next_element().map(|n| n.id());
        }
        match found {
            Some(s) => current = s,
            None => break,
        }
    }
    log::debug!("renumbered lists from {node}");
}

/// An item holding nothing a caret could stand next to.
pub fn is_empty_list_item(tree: &Tree, node: NodeId) -> bool {
    let n = tree.node(node);
    n.is_list_item() && n.is_empty()
}

/// Drop empty items from `list`, then the list itself if no items remain.
/// Returns whether the list was removed.
pub fn clear_list(tree: &mut Tree, list: NodeId) -> bool {
    if !tree.node(list).is_list() {
        return false;
    }
    let empty: Vec<NodeId> = tree
        .children(list)
        .iter()
        .copied()
        .filter(|c| is_empty_list_item(tree, *c))
        .collect();
    for item in empty {
        tree.detach(item);
    }
    if item_count(tree, list) == 0 {
        tree.detach(list);
        return true;
    }
    false
}

/// Remove `node`, then every ancestor left without children, stopping at
/// the root or the first ancestor that still has content.
pub fn remove_empty_node(tree: &mut Tree, node: NodeId) {
    let mut current = node;
    loop {
        let parent = tree.parent(current);
        tree.detach(current);
        match parent {
            Some(p) if tree.child_count(p) == 0 && !tree.node(p).is_root() && tree.parent(p).is_some() => {
                current = p;
            }
            _ => break,
        }
    }
}

/// Whether `a` and `b` are lists that render as one when adjacent.
pub fn same_list(tree: &Tree, a: NodeId, b: NodeId) -> bool {
    let (na, nb) = (tree.node(a), tree.node(b));
    na.is_list() && nb.is_list() && na.name() == nb.name() && na.indent() == nb.indent()
}

/// Move the children of `b` to the end of `a` and drop `b`.
pub(crate) fn absorb(tree: &mut Tree, a: NodeId, b: NodeId) {
    for child in tree.take_children(b) {
        tree.append(a, child);
    }
    tree.detach(b);
}

fn merge_adjacent(tree: &mut Tree, parent: NodeId, same: impl Fn(&Tree, NodeId, NodeId) -> bool) -> Vec<NodeId> {
    let mut merged_into = Vec::new();
    let mut i = 0;
    while let Some(child) = tree.child(parent, i) {
        match tree.node(child).next_element().map(|n| n.id()) {
            Some(next)
                if same(tree, child, next)
                    && tree.index(next) == Some(i + 1) =>
            {
                absorb(tree, child, next);
                if !merged_into.contains(&child) {
                    merged_into.push(child);
                }
            }
            _ => i += 1,
        }
    }
    merged_into
}

/// Concatenate directly adjacent lists of the same tag and indent under
/// `parent`, then renumber the merged ordered lists.
pub fn merge_adjacent_list(tree: &mut Tree, parent: NodeId) {
    let merged = merge_adjacent(tree, parent, same_list);
    for list in merged {
        add_list_start_number(tree, list);
    }
}

/// Concatenate directly adjacent blockquotes under `parent`.
pub fn merge_adjacent_blockquote(tree: &mut Tree, parent: NodeId) {
    merge_adjacent(tree, parent, |tree, a, b| {
        tree.name(a) == Some("blockquote") && tree.name(b) == Some("blockquote")
    });
}
