//! Boundary adjustment: moving range ends up and down the tree without
//! changing what they select.

use std::cmp::Ordering;

use super::{Point, Range, compare_points};
use crate::dom::{NodeId, Tree};

/// Whether a point may descend into `node`.
fn enterable(tree: &Tree, node: NodeId) -> bool {
    let n = tree.node(node);
    n.is_text() || (n.is_element() && !n.is_void() && !n.is_card() && !n.is_bookmark())
}

fn shrink_start(tree: &Tree, mut point: Point) -> Point {
    while !tree.is_text(point.node) {
        let len = tree.node_len(point.node);
        let next = if point.offset < len {
            tree.child(point.node, point.offset)
                .filter(|c| enterable(tree, *c))
                .map(|c| Point::new(c, 0))
        } else if point.offset > 0 {
            tree.child(point.node, point.offset - 1)
                .filter(|c| enterable(tree, *c))
                .map(|c| Point::new(c, tree.node_len(c)))
        } else {
            None
        };
        match next {
            Some(p) => point = p,
            None => break,
        }
    }
    point
}

fn shrink_end(tree: &Tree, mut point: Point) -> Point {
    while !tree.is_text(point.node) {
        let next = if point.offset > 0 {
            tree.child(point.node, point.offset - 1)
                .filter(|c| enterable(tree, *c))
                .map(|c| Point::new(c, tree.node_len(c)))
        } else {
            tree.child(point.node, 0)
                .filter(|c| enterable(tree, *c))
                .map(|c| Point::new(c, 0))
        };
        match next {
            Some(p) => point = p,
            None => break,
        }
    }
    point
}

/// Push element-anchored boundaries inward onto the deepest position,
/// preferring text. Cards, voids and markers are never entered.
pub fn shrink_range(tree: &Tree, range: &mut Range) {
    if range.is_collapsed() {
        let point = shrink_start(tree, range.start);
        *range = Range::collapsed(point);
        return;
    }
    let start = shrink_start(tree, range.start);
    let end = shrink_end(tree, range.end);
    if compare_points(tree, start, end) != Ordering::Greater {
        *range = Range::new(start, end);
    }
}

/// Widen a range outward to the nearest block boundaries. Boundaries only
/// climb while they sit at the edge of their container.
pub fn enlarge_range(tree: &Tree, range: &mut Range) {
    range.start = enlarge_point(tree, range.start, true);
    range.end = enlarge_point(tree, range.end, false);
}

fn enlarge_point(tree: &Tree, mut point: Point, is_start: bool) -> Point {
    loop {
        let node = tree.node(point.node);
        if node.is_root() || node.is_block() {
            return point;
        }
        let at_edge = if is_start {
            point.offset == 0
        } else {
            point.offset >= node.len()
        };
        if !at_edge {
            return point;
        }
        let Some(next) = (if is_start {
            Point::before(tree, point.node)
        } else {
            Point::after(tree, point.node)
        }) else {
            return point;
        };
        point = next;
    }
}

/// Keep both boundaries out of non-editable regions and inside `root`.
///
/// A boundary inside a card is moved beside the card unless it sits in the
/// card's editable center. The side is chosen by comparing the boundary to
/// the center: before it (the left caret) goes before the card, after it
/// goes after. Inside a non-editable center the start goes before the card
/// and the end after, so the card is selected whole.
pub fn repair_range(tree: &Tree, root: NodeId, range: &mut Range) {
    if !tree.contains(root, range.start.node) {
        range.start = Point::new(root, 0);
    }
    if !tree.contains(root, range.end.node) {
        range.end = Point::new(root, tree.node_len(root));
    }

    range.start = repair_point(tree, root, range.start, true);
    range.end = repair_point(tree, root, range.end, false);
    if compare_points(tree, range.start, range.end) == Ordering::Greater {
        range.end = range.start;
    }
}

fn repair_point(tree: &Tree, root: NodeId, mut point: Point, is_start: bool) -> Point {
    // Outermost card first: a nested card inside a non-editable region is
    // unreachable anyway.
    while let Some(card) = outermost_card(tree, root, point.node) {
        let center = tree
            .descendants(card)
            .into_iter()
            .find(|id| tree.node(*id).card_element() == Some("center"));
        let Some(center) = center else {
            return beside(tree, card, is_start).unwrap_or(point);
        };
        if tree.contains(center, point.node) {
            if tree.node(center).is_editable() {
                return point;
            }
            return beside(tree, card, is_start).unwrap_or(point);
        }
        let before_center =
            compare_points(tree, point, Point::new(center, 0)) == Ordering::Less;
        match beside(tree, card, before_center) {
            Some(p) => point = p,
            None => return point,
        }
    }
    point
}

fn outermost_card(tree: &Tree, root: NodeId, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .take_while(|id| *id != root)
        .filter(|id| tree.node(*id).is_card())
        .last()
}

fn beside(tree: &Tree, card: NodeId, before: bool) -> Option<Point> {
    if before {
        Point::before(tree, card)
    } else {
        Point::after(tree, card)
    }
}

fn up_point(tree: &Tree, point: Point) -> Point {
    let len = tree.node_len(point.node);
    let moved = if point.offset == 0 {
        Point::before(tree, point.node)
    } else if point.offset >= len {
        Point::after(tree, point.node)
    } else {
        None
    };
    moved.unwrap_or(point)
}

fn down_point(tree: &Tree, point: Point, is_start: bool) -> Point {
    if tree.is_text(point.node) {
        return point;
    }
    let ahead = tree
        .child(point.node, point.offset)
        .filter(|c| enterable(tree, *c))
        .map(|c| Point::new(c, 0));
    let behind = point
        .offset
        .checked_sub(1)
        .and_then(|i| tree.child(point.node, i))
        .filter(|c| enterable(tree, *c))
        .map(|c| Point::new(c, tree.node_len(c)));
    let moved = if is_start {
        ahead.or(behind)
    } else {
        behind.or(ahead)
    };
    moved.unwrap_or(point)
}

/// Move each boundary sitting at the edge of its container one level up,
/// e.g. from the end of a link to just after it.
pub fn up_range(tree: &Tree, range: &mut Range) {
    let collapsed = range.is_collapsed();
    range.start = up_point(tree, range.start);
    range.end = if collapsed {
        range.start
    } else {
        up_point(tree, range.end)
    };
}

/// Move each element-anchored boundary one level down into the adjacent
/// child.
pub fn down_range(tree: &Tree, range: &mut Range) {
    let collapsed = range.is_collapsed();
    range.start = down_point(tree, range.start, true);
    range.end = if collapsed {
        range.start
    } else {
        down_point(tree, range.end, false)
    };
}
