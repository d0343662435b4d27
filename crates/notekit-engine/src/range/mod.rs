/*!
 * Selection model.
 *
 * A [`Range`] is a pair of tree coordinates. It is a plain value: it does
 * not follow the tree when nodes move, which is why every structural
 * algorithm that must keep the caret goes through [`bookmark`] markers.
 *
 * Offsets count chars inside text nodes and children inside elements.
 *
 * - `bookmark`: marker placement, restore, and the scoped guard
 * - `adjust`: shrink/enlarge/repair/up/down boundary adjustment
 */

pub mod adjust;
pub mod bookmark;

use std::cmp::Ordering;

use crate::dom::{NodeId, Tree};

pub use adjust::{down_range, enlarge_range, repair_range, shrink_range, up_range};
pub use bookmark::{Bookmark, BookmarkScope, create_bookmark, find_markers, move_to_bookmark, with_bookmark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// The position just before `node` in its parent.
    pub fn before(tree: &Tree, node: NodeId) -> Option<Self> {
        Some(Self::new(tree.parent(node)?, tree.index(node)?))
    }

    /// The position just after `node` in its parent.
    pub fn after(tree: &Tree, node: NodeId) -> Option<Self> {
        Some(Self::new(tree.parent(node)?, tree.index(node)? + 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    pub fn set_start(&mut self, node: NodeId, offset: usize) {
        self.start = Point::new(node, offset);
    }

    pub fn set_end(&mut self, node: NodeId, offset: usize) {
        self.end = Point::new(node, offset);
    }

    pub fn set_start_before(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = Point::before(tree, node) {
            self.start = point;
        }
    }

    pub fn set_start_after(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = Point::after(tree, node) {
            self.start = point;
        }
    }

    pub fn set_end_before(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = Point::before(tree, node) {
            self.end = point;
        }
    }

    pub fn set_end_after(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = Point::after(tree, node) {
            self.end = point;
        }
    }

    /// Select `node` itself, from just before it to just after it.
    pub fn select_node(&mut self, tree: &Tree, node: NodeId) {
        self.set_start_before(tree, node);
        self.set_end_after(tree, node);
    }

    pub fn select_node_contents(&mut self, tree: &Tree, node: NodeId) {
        self.start = Point::new(node, 0);
        self.end = Point::new(node, tree.node_len(node));
    }

    pub fn common_ancestor(&self, tree: &Tree) -> NodeId {
        tree.common_ancestor(self.start.node, self.end.node)
            .unwrap_or(self.start.node)
    }

    /// Whether both boundaries sit inside `root`.
    pub fn is_within(&self, tree: &Tree, root: NodeId) -> bool {
        tree.contains(root, self.start.node) && tree.contains(root, self.end.node)
    }
}

/// Order two boundary points in the same tree.
pub fn compare_points(tree: &Tree, a: Point, b: Point) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    if tree.contains(a.node, b.node) {
        let child = child_towards(tree, a.node, b.node);
        return match tree.index(child) {
            Some(i) if i < a.offset => Ordering::Greater,
            _ => Ordering::Less,
        };
    }
    if tree.contains(b.node, a.node) {
        return compare_points(tree, b, a).reverse();
    }
    tree.path(a.node).cmp(&tree.path(b.node))
}

/// The child of `ancestor` that contains `node`.
pub(crate) fn child_towards(tree: &Tree, ancestor: NodeId, node: NodeId) -> NodeId {
    let mut child = node;
    while let Some(parent) = tree.parent(child) {
        if parent == ancestor {
            break;
        }
        child = parent;
    }
    child
}

/// A node lies inside the range when its whole extent does.
fn is_contained(tree: &Tree, range: &Range, node: NodeId) -> bool {
    compare_points(tree, Point::new(node, 0), range.start) == Ordering::Greater
        && compare_points(tree, Point::new(node, tree.node_len(node)), range.end) == Ordering::Less
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Extract,
    Clone,
}

/// Move the selected content into a new fragment. Partially selected
/// elements are split: their shells stay in the tree and clones carry the
/// selected part. The range collapses to where the content was.
pub fn extract_contents(tree: &mut Tree, range: &mut Range) -> NodeId {
    let (fragment, point) = process(tree, *range, Mode::Extract);
    *range = Range::collapsed(point);
    fragment
}

/// Copy the selected content into a new fragment without touching the tree.
pub fn clone_contents(tree: &mut Tree, range: &Range) -> NodeId {
    process(tree, *range, Mode::Clone).0
}

/// Returns the fragment and the point the range collapses to.
fn process(tree: &mut Tree, range: Range, mode: Mode) -> (NodeId, Point) {
    let fragment = tree.create_fragment();
    let Range { start, end } = range;
    if range.is_collapsed() || compare_points(tree, start, end) != Ordering::Less {
        return (fragment, start);
    }

    if start.node == end.node && tree.is_text(start.node) {
        let text = match mode {
            Mode::Extract => tree.delete_text(start.node, start.offset, end.offset),
            Mode::Clone => tree.substring(start.node, start.offset, end.offset),
        };
        let clone = tree.create_text(&text);
        tree.append(fragment, clone);
        return (fragment, start);
    }

    let common = range.common_ancestor(tree);
    let first_partial = (!tree.contains(start.node, end.node))
        .then(|| child_towards(tree, common, start.node));
    let last_partial = (!tree.contains(end.node, start.node))
        .then(|| child_towards(tree, common, end.node));
    let contained: Vec<NodeId> = tree
        .children(common)
        .iter()
        .copied()
        .filter(|c| is_contained(tree, &range, *c))
        .collect();

    let new_point = if tree.contains(start.node, end.node) {
        start
    } else {
        let mut reference = start.node;
        while let Some(parent) = tree.parent(reference) {
            if tree.contains(parent, end.node) {
                break;
            }
            reference = parent;
        }
        Point::after(tree, reference).unwrap_or(start)
    };

    if let Some(first) = first_partial {
        if tree.is_text(first) {
            let len = tree.text_len(first);
            let text = match mode {
                Mode::Extract => tree.delete_text(first, start.offset, len),
                Mode::Clone => tree.substring(first, start.offset, len),
            };
            let clone = tree.create_text(&text);
            tree.append(fragment, clone);
        } else {
            let clone = tree.clone_node(first, false);
            tree.append(fragment, clone);
            let sub = Range::new(start, Point::new(first, tree.node_len(first)));
            let (inner, _) = process(tree, sub, mode);
            tree.append(clone, inner);
        }
    }

    for child in contained {
        match mode {
            Mode::Extract => tree.append(fragment, child),
            Mode::Clone => {
                let clone = tree.clone_node(child, true);
                tree.append(fragment, clone);
            }
        }
    }

    if let Some(last) = last_partial {
        if tree.is_text(last) {
            let text = match mode {
                Mode::Extract => tree.delete_text(last, 0, end.offset),
                Mode::Clone => tree.substring(last, 0, end.offset),
            };
            let clone = tree.create_text(&text);
            tree.append(fragment, clone);
        } else {
            let clone = tree.clone_node(last, false);
            tree.append(fragment, clone);
            let sub = Range::new(Point::new(last, 0), end);
            let (inner, _) = process(tree, sub, mode);
            tree.append(clone, inner);
        }
    }

    (fragment, new_point)
}

/// Insert `node` at `point`, splitting a text node when the point falls
/// inside one. Returns the new node's position (just before it).
pub fn insert_at_point(tree: &mut Tree, point: Point, node: NodeId) -> Option<Point> {
    let Point { node: container, offset } = point;
    if tree.is_text(container) {
        let len = tree.text_len(container);
        if offset == 0 {
            tree.insert_before(container, node);
        } else if offset >= len {
            tree.insert_after(container, node);
        } else {
            tree.split_text(container, offset);
            tree.insert_after(container, node);
        }
    } else {
        let index = offset.min(tree.child_count(container));
        tree.insert_at(container, index, node);
    }
    Point::before(tree, node)
}

/// Insert `node` at the range start. A collapsed range ends up right
/// after the inserted content.
pub fn insert_node(tree: &mut Tree, range: &mut Range, node: NodeId) {
    let collapsed = range.is_collapsed();
    let count = if tree.is_fragment(node) {
        tree.child_count(node)
    } else {
        1
    };
    let split_end = (!collapsed
        && tree.is_text(range.start.node)
        && range.end.node == range.start.node)
        .then_some(range.end.offset.saturating_sub(range.start.offset));

    let Some(at) = insert_at_point(tree, range.start, node) else {
        return;
    };
    if collapsed {
        range.start = at;
        range.end = Point::new(at.node, at.offset + count);
    } else if let Some(offset) = split_end
        && let Some(right) = tree.child(at.node, at.offset + count)
        && tree.is_text(right)
    {
        range.end = Point::new(right, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::{SerializeOptions, inner_html, parse_fragment};
    use pretty_assertions::assert_eq;

    fn doc(html: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create_element("div");
        let frag = parse_fragment(&mut tree, html);
        tree.append(root, frag);
        (tree, root)
    }

    fn html(tree: &Tree, root: NodeId) -> String {
        inner_html(tree, root, SerializeOptions::default())
    }

    /// Text node `n` (document order) under `root`.
    fn text(tree: &Tree, root: NodeId, n: usize) -> NodeId {
        tree.descendants(root)
            .into_iter()
            .filter(|id| tree.is_text(*id))
            .nth(n)
            .unwrap()
    }

    // ============ Point comparison ============

    #[test]
    fn test_compare_same_node() {
        let (tree, root) = doc("<p>abc</p>");
        let t = text(&tree, root, 0);
        assert_eq!(compare_points(&tree, Point::new(t, 1), Point::new(t, 2)), Ordering::Less);
    }

    #[test]
    fn test_compare_ancestor_and_descendant() {
        let (tree, root) = doc("<p>a</p><p>b</p>");
        let b = text(&tree, root, 1);
        // (root, 1) is before the second paragraph's contents
        assert_eq!(compare_points(&tree, Point::new(root, 1), Point::new(b, 0)), Ordering::Less);
        assert_eq!(compare_points(&tree, Point::new(root, 2), Point::new(b, 0)), Ordering::Greater);
        assert_eq!(compare_points(&tree, Point::new(b, 0), Point::new(root, 2)), Ordering::Less);
    }

    #[test]
    fn test_compare_siblings_by_tree_order() {
        let (tree, root) = doc("<p>a</p><p>b</p>");
        let a = text(&tree, root, 0);
        let b = text(&tree, root, 1);
        assert_eq!(compare_points(&tree, Point::new(a, 1), Point::new(b, 0)), Ordering::Less);
    }

    // ============ Extraction ============

    #[test]
    fn test_extract_within_text() {
        let (mut tree, root) = doc("<p>Hello World</p>");
        let t = text(&tree, root, 0);
        let mut range = Range::new(Point::new(t, 2), Point::new(t, 7));

        let frag = extract_contents(&mut tree, &mut range);

        assert_eq!(inner_html(&tree, frag, SerializeOptions::default()), "llo W");
        assert_eq!(html(&tree, root), "<p>Heorld</p>");
        assert_eq!(range, Range::collapsed(Point::new(t, 2)));
    }

    #[test]
    fn test_extract_across_blocks_splits_shells() {
        let (mut tree, root) = doc("<p>abc</p><p>mid</p><p>def</p>");
        let a = text(&tree, root, 0);
        let d = text(&tree, root, 2);
        let mut range = Range::new(Point::new(a, 1), Point::new(d, 2));

        let frag = extract_contents(&mut tree, &mut range);

        assert_eq!(
            inner_html(&tree, frag, SerializeOptions::default()),
            "<p>bc</p><p>mid</p><p>de</p>"
        );
        assert_eq!(html(&tree, root), "<p>a</p><p>f</p>");
        assert_eq!(range, Range::collapsed(Point::new(root, 1)));
    }

    #[test]
    fn test_clone_leaves_tree_untouched() {
        let (mut tree, root) = doc("<p>a<b>bold</b>c</p>");
        let bold = text(&tree, root, 1);
        let c = text(&tree, root, 2);
        let range = Range::new(Point::new(bold, 2), Point::new(c, 1));

        let frag = clone_contents(&mut tree, &range);

        assert_eq!(inner_html(&tree, frag, SerializeOptions::default()), "<b>ld</b>c");
        assert_eq!(html(&tree, root), "<p>a<b>bold</b>c</p>");
    }

    #[test]
    fn test_extract_collapsed_is_empty() {
        let (mut tree, root) = doc("<p>abc</p>");
        let t = text(&tree, root, 0);
        let mut range = Range::collapsed(Point::new(t, 1));

        let frag = extract_contents(&mut tree, &mut range);

        assert_eq!(tree.child_count(frag), 0);
        assert_eq!(range, Range::collapsed(Point::new(t, 1)));
    }

    // ============ Insertion ============

    #[test]
    fn test_insert_node_splits_text() {
        let (mut tree, root) = doc("<p>abcd</p>");
        let t = text(&tree, root, 0);
        let p = tree.parent(t).unwrap();
        let br = tree.create_element("br");
        let mut range = Range::collapsed(Point::new(t, 2));

        insert_node(&mut tree, &mut range, br);

        assert_eq!(html(&tree, root), "<p>ab<br>cd</p>");
        assert_eq!(range.start, Point::new(p, 1));
        assert_eq!(range.end, Point::new(p, 2));
    }

    #[test]
    fn test_insert_at_text_edges_does_not_split() {
        let (mut tree, root) = doc("<p>ab</p>");
        let t = text(&tree, root, 0);
        let p = tree.parent(t).unwrap();

        let x = tree.create_element("img");
        insert_at_point(&mut tree, Point::new(t, 2), x);
        let y = tree.create_element("br");
        insert_at_point(&mut tree, Point::new(t, 0), y);

        assert_eq!(tree.child_count(p), 3);
        assert_eq!(html(&tree, root), "<p><br>ab<img></p>");
    }
}
