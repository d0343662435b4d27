/*!
 * # Change engine
 *
 * Structural edits on the document tree. Every entry point takes the
 * current [`Range`], mutates the tree through the node facade, and leaves
 * the range collapsed where the caret belongs afterwards.
 *
 * ## Failure policy
 *
 * These run inside input handlers. A range outside the editable root, or a
 * missing sibling or ancestor, turns the call into a no-op that leaves the
 * range as it was; nothing here returns an error.
 *
 * ## Invariants kept
 *
 * - a block emptied by an edit gets a `br` placeholder; an emptied root
 *   gets `<p><br></p>`
 * - card subtrees are moved whole and never split, merged or entered
 * - splitting an ordered list numbers the trailing part so it continues
 *   the leading part
 *
 * ## Module structure
 *
 * - `merge`: `merge_node` and the recursive `deep_merge_node`
 * - `list`: list numbering and list/blockquote cleanup
 * - `fragment`: `insert_fragment` for paste and programmatic inserts
 */

pub mod fragment;
pub mod list;
pub mod merge;

use crate::dom::{BOOKMARK_CURSOR, DATA_ELEMENT, NodeId, Tree, schema};
use crate::range::{
    self, BookmarkScope, Point, Range, enlarge_range, extract_contents, insert_at_point,
    repair_range, shrink_range,
};

pub use list::{
    add_list_start_number, clear_list, is_empty_list_item, merge_adjacent_blockquote,
    merge_adjacent_list, remove_empty_node,
};
pub use merge::{deep_merge_node, merge_node};

/// Edit session over one editable root.
pub struct Change<'a> {
    tree: &'a mut Tree,
    root: NodeId,
}

impl<'a> Change<'a> {
    pub fn new(tree: &'a mut Tree, root: NodeId) -> Self {
        Self { tree, root }
    }

    pub fn tree(&self) -> &Tree {
        self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Repair and shrink `range`; `false` when it is not inside the root.
    fn prepare(&mut self, range: &mut Range) -> bool {
        repair_range(self.tree, self.root, range);
        if !range.is_within(self.tree, self.root) {
            return false;
        }
        shrink_range(self.tree, range);
        true
    }

    /// Nearest block holding `node`, or the root.
    fn block_of(&self, node: NodeId) -> NodeId {
        self.tree
            .node(node)
            .closest_where(|n| n.is_root() || (n.is_block() && !n.is_card()))
            .map(|n| n.id())
            .filter(|b| self.tree.contains(self.root, *b))
            .unwrap_or(self.root)
    }

    // ============ Text and inline ============

    /// Type `text` at the caret, replacing any selection.
    pub fn insert_text(&mut self, range: &mut Range, text: &str) {
        if text.is_empty() {
            return;
        }
        if !range.is_collapsed() {
            self.delete_content(range, false);
        }
        if !self.prepare(range) {
            return;
        }

        let Point { node, offset } = range.start;
        if self.tree.is_text(node) {
            let block = self.block_of(node);
            let placeholders = placeholders(self.tree, block);
            self.tree.insert_text(node, offset, text);
            remove_all(self.tree, placeholders);
            *range = Range::collapsed(Point::new(node, offset + text.chars().count()));
            return;
        }

        let text_node = self.tree.create_text(text);
        self.insert_inline(range, text_node);
        if self.tree.parent(text_node).is_some() {
            *range = Range::collapsed(Point::new(text_node, self.tree.text_len(text_node)));
        }
    }

    /// Insert an inline node (text, mark, `br`, inline card) at the caret,
    /// replacing any selection, and collapse after it.
    pub fn insert_inline(&mut self, range: &mut Range, node: NodeId) {
        if !range.is_collapsed() {
            self.delete_content(range, false);
        }
        if !self.prepare(range) {
            return;
        }

        let mut point = range.start;
        if point.node == self.root {
            let p = self.tree.create_element("p");
            insert_at_point(self.tree, point, p);
            point = Point::new(p, 0);
        }
        let block = self.block_of(point.node);
        let is_br = self.tree.name(node) == Some("br");
        let placeholders = if is_br {
            Vec::new()
        } else {
            placeholders(self.tree, block)
        };

        if insert_at_point(self.tree, point, node).is_none() {
            return;
        }
        remove_all(self.tree, placeholders);

        let n = self.tree.node(node);
        let needs_trailing_br = !is_br
            && (n.is_inline_card() || n.name() == Some("img"))
            && n.next().is_none()
            && self.tree.parent(node) == Some(block);
        if needs_trailing_br {
            let br = self.tree.create_element("br");
            self.tree.insert_after(node, br);
        }

        if let Some(after) = Point::after(self.tree, node) {
            *range = Range::collapsed(after);
        }
    }

    // ============ Blocks ============

    /// Insert a block at the caret, splitting the enclosing block.
    ///
    /// The split climbs to the first ancestor whose parent may contain the
    /// new block, then `[left, block, right]` replaces it. Empty shells are
    /// dropped when `no_empty_block` is set (empty lists always are) and
    /// otherwise get a `br`.
    ///
    /// Inserting an empty block with the same tag as the split target is a
    /// line break: the target just splits in two and the caret goes to the
    /// start of the second half.
    pub fn insert_block(&mut self, range: &mut Range, block: NodeId, no_empty_block: bool) {
        if !range.is_collapsed() {
            self.delete_content(range, false);
        }
        if !self.prepare(range) {
            return;
        }

        let caret = range.start;
        let enclosing = self.block_of(caret.node);
        if enclosing == self.root || self.tree.node(enclosing).is_card() {
            let at = if caret.node == self.root {
                caret
            } else {
                let top = range::child_towards(self.tree, self.root, caret.node);
                Point::after(self.tree, top).unwrap_or(caret)
            };
            insert_at_point(self.tree, at, block);
            self.finish_block(range, block);
            return;
        }

        let block_tag = self
            .tree
            .name(block)
            .unwrap_or("p")
            .to_string();
        let mut target = enclosing;
        while let Some(parent) = self.tree.parent(target)
            && parent != self.root
            && !self.tree.node(parent).is_root()
            && !schema::accepts_block(self.tree.name(parent).unwrap_or(""), &block_tag)
        {
            target = parent;
        }
        log::debug!("insert_block <{block_tag}> splits {target}");

        let line_break = !self.tree.node(block).is_card()
            && self.tree.node(block).is_empty()
            && self.tree.name(block) == self.tree.name(target);

        let marker = cursor_marker(self.tree);
        insert_at_point(self.tree, caret, marker);
        let left = target;
        let right = split_at(self.tree, left, marker);
        self.tree.insert_after(left, right);
        self.tree.detach(marker);
        prune_empty_marks(self.tree, left);
        prune_empty_marks(self.tree, right);

        if line_break {
            for side in [left, right] {
                if self.tree.node(side).is_empty() {
                    fill_placeholder(self.tree, side);
                }
            }
            *range = Range::collapsed(Point::new(right, 0));
            shrink_range(self.tree, range);
            return;
        }

        let left_start = self.tree.attr(left, "start").map(str::to_string);
        self.tree.insert_after(left, block);

        for (side, at_end) in [(left, true), (right, false)] {
            if self.tree.node(side).is_list() {
                let item = if at_end {
                    self.tree.last_child(side)
                } else {
                    self.tree.first_child(side)
                };
                if let Some(item) = item
                    && is_empty_list_item(self.tree, item)
                {
                    self.tree.detach(item);
                }
            }
            if self.tree.node(side).is_empty() {
                if no_empty_block || self.tree.node(side).is_list() {
                    self.tree.detach(side);
                } else {
                    fill_placeholder(self.tree, side);
                }
            }
        }

        if self.tree.name(right) == Some("ol") && self.tree.parent(right).is_some() {
            if self.tree.parent(left).is_some() {
                let start = self
                    .tree
                    .attr(left, "start")
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(1);
                let count = self.tree.child_count(left);
                self.tree.set_attr(right, "start", &(start + count).to_string());
            } else if let Some(start) = left_start {
                self.tree.set_attr(right, "start", &start);
            } else {
                self.tree.remove_attr(right, "start");
            }
            add_list_start_number(self.tree, right);
        }

        self.finish_block(range, block);
    }

    /// Give an empty inserted block its placeholder and put the caret at
    /// its end, or after it for voids and cards.
    fn finish_block(&mut self, range: &mut Range, block: NodeId) {
        let n = self.tree.node(block);
        if n.is_void() || n.is_card() {
            if let Some(after) = Point::after(self.tree, block) {
                *range = Range::collapsed(after);
            }
            return;
        }
        if n.is_empty() && !n.is_list() {
            fill_placeholder(self.tree, block);
        }
        let len = self.tree.node_len(block);
        *range = Range::collapsed(Point::new(block, len));
        shrink_range(self.tree, range);
        if let Some(last) = range
            .start
            .offset
            .checked_sub(1)
            .and_then(|i| self.tree.child(range.start.node, i))
            && self.tree.name(last) == Some("br")
        {
            range.start.offset -= 1;
            range.end = range.start;
        }
    }

    // ============ Deletion ============

    /// Delete the selected content.
    ///
    /// A collapsed range is left untouched. Otherwise the range is widened
    /// to block edges, the content extracted, and the blocks on either side
    /// of the cut deep-merged unless `is_only_one`. When the cut took whole
    /// blocks only, nothing is deep-merged; same-kind lists brought together
    /// pool their items instead. Whatever is left empty gets a placeholder.
    pub fn delete_content(&mut self, range: &mut Range, is_only_one: bool) {
        if range.is_collapsed() {
            return;
        }
        repair_range(self.tree, self.root, range);
        if range.is_collapsed() || !range.is_within(self.tree, self.root) {
            return;
        }
        enlarge_range(self.tree, range);
        let whole_blocks = range.start.node == range.end.node && !self.tree.is_text(range.start.node);
        let removed = extract_contents(self.tree, range);
        self.tree.discard(removed);

        let Point {
            node: container,
            offset,
        } = range.start;
        if self.tree.is_text(container) {
            return;
        }

        let prev = offset.checked_sub(1).and_then(|i| self.tree.child(container, i));
        let next = self.tree.child(container, offset);
        let mut caret = range.start;
        if let (Some(a), Some(b)) = (prev, next)
            && !is_only_one
            && self.tree.node(a).is_block()
            && self.tree.node(b).is_block()
        {
            caret = if whole_blocks {
                self.join_lists_at_cut(container, a)
            } else {
                deep_merge_node(self.tree, a, b)
            };
        }

        let block = self.block_of(caret.node);
        let mut caret_range = Range::collapsed(caret);
        {
            let mut scope = BookmarkScope::new(self.tree, &caret_range);
            prune_empty_marks(&mut scope, block);
            scope.restore(&mut caret_range);
        }

        if block == self.root {
            if self.tree.child_count(self.root) == 0 {
                let p = self.tree.create_element("p");
                let br = self.tree.create_element("br");
                self.tree.append(p, br);
                self.tree.append(self.root, p);
                caret_range = Range::collapsed(Point::new(p, 0));
            } else {
                shrink_range(self.tree, &mut caret_range);
            }
        } else if self.tree.node(block).is_empty()
            && self.tree.select(block, "br").is_empty()
            && !self.tree.node(block).is_list()
        {
            let br = self.tree.create_element("br");
            if let Some(at) = insert_at_point(self.tree, caret_range.start, br) {
                caret_range = Range::collapsed(at);
            }
        }

        self.renumber_around(caret_range.start.node);
        *range = caret_range;
    }

    /// Pool the lists that a whole-block cut left side by side in
    /// `container`. Returns the caret: the end of `before`, the block just
    /// ahead of the cut.
    fn join_lists_at_cut(&mut self, container: NodeId, before: NodeId) -> Point {
        let mut caret = Range::collapsed(Point::new(before, self.tree.node_len(before)));
        shrink_range(self.tree, &mut caret);
        merge_adjacent_list(self.tree, container);
        caret.start
    }

    /// Renumber the ordered list at or right after the top-level block
    /// holding `node`.
    fn renumber_around(&mut self, node: NodeId) {
        if !self.tree.contains(self.root, node) || node == self.root {
            return;
        }
        let top = range::child_towards(self.tree, self.root, node);
        let next = self.tree.node(top).next_element().map(|n| n.id());
        for candidate in std::iter::once(top).chain(next) {
            add_list_start_number(self.tree, candidate);
        }
    }

    // ============ Normalization ============

    /// Keep the root well-formed: loose inline runs are wrapped in `<p>`,
    /// whitespace between blocks is dropped, empty top-level blocks get a
    /// `br`, and an empty root gets `<p><br></p>`.
    pub fn normalize_root(&mut self) {
        let root = self.root;
        let mut run: Vec<NodeId> = Vec::new();
        for child in self.tree.children(root).to_vec() {
            let n = self.tree.node(child);
            if n.is_block() {
                wrap_run(self.tree, &mut run);
            } else if n.text().is_some_and(is_blank) && run.is_empty() {
                self.tree.detach(child);
            } else if !(n.is_bookmark() && run.is_empty()) {
                run.push(child);
            }
        }
        wrap_run(self.tree, &mut run);

        for child in self.tree.children(root).to_vec() {
            let n = self.tree.node(child);
            if self.tree.child_count(child) == 0
                && !n.is_card()
                && !n.is_void()
                && !n.is_solid()
                && n.is_element()
            {
                fill_placeholder(self.tree, child);
            }
        }

        if self.tree.child_count(root) == 0 {
            let p = self.tree.create_element("p");
            fill_placeholder(self.tree, p);
            self.tree.append(root, p);
        }
    }

    pub fn add_list_start_number(&mut self, list: NodeId) {
        add_list_start_number(self.tree, list);
    }

    pub fn merge_node(&mut self, a: NodeId, b: NodeId, remove_b: bool) -> Point {
        merge_node(self.tree, a, b, remove_b)
    }

    pub fn deep_merge_node(&mut self, a: NodeId, b: NodeId) -> Point {
        deep_merge_node(self.tree, a, b)
    }

    pub fn merge_adjacent_list(&mut self, parent: NodeId) {
        merge_adjacent_list(self.tree, parent);
    }

    pub fn merge_adjacent_blockquote(&mut self, parent: NodeId) {
        merge_adjacent_blockquote(self.tree, parent);
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

fn wrap_run(tree: &mut Tree, run: &mut Vec<NodeId>) {
    if run.iter().all(|id| tree.text(*id).is_some_and(is_blank)) {
        for id in run.drain(..) {
            tree.detach(id);
        }
        return;
    }
    let p = tree.create_element("p");
    tree.insert_before(run[0], p);
    for id in run.drain(..) {
        tree.append(p, id);
    }
}

pub(crate) fn cursor_marker(tree: &mut Tree) -> NodeId {
    tree.create_element_with("span", &[(DATA_ELEMENT, BOOKMARK_CURSOR)])
}

/// Split `top` at `marker`, a descendant. `top` keeps everything before the
/// marker; the returned detached clone gets the marker and everything after,
/// with the marker at its deepest start.
pub(crate) fn split_at(tree: &mut Tree, top: NodeId, marker: NodeId) -> NodeId {
    let right = tree.clone_node(top, false);
    let on_path = range::child_towards(tree, top, marker);
    let index = tree.index(on_path).unwrap_or(0);
    let tail: Vec<NodeId> = tree.children(top).iter().skip(index + 1).copied().collect();

    if on_path == marker {
        tree.append(right, marker);
    } else {
        let inner = split_at(tree, on_path, marker);
        tree.append(right, inner);
    }
    for child in tail {
        tree.append(right, child);
    }
    right
}

/// `br` placeholders to drop once `block` gets real content.
fn placeholders(tree: &Tree, block: NodeId) -> Vec<NodeId> {
    if !tree.node(block).is_empty() {
        return Vec::new();
    }
    tree.select(block, "br")
}

fn remove_all(tree: &mut Tree, nodes: Vec<NodeId>) {
    for node in nodes {
        tree.detach(node);
    }
}

pub(crate) fn fill_placeholder(tree: &mut Tree, block: NodeId) {
    let br = tree.create_element("br");
    tree.append(block, br);
}

/// Drop empty texts and childless marks under `node`, innermost first.
pub(crate) fn prune_empty_marks(tree: &mut Tree, node: NodeId) {
    for id in tree.descendants(node).into_iter().rev() {
        let n = tree.node(id);
        let empty_text = n.text().is_some_and(str::is_empty);
        let empty_mark = n.is_mark() && tree.child_count(id) == 0;
        if empty_text || empty_mark {
            tree.detach(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::{SerializeOptions, inner_html, parse_fragment};
    use pretty_assertions::assert_eq;

    pub(crate) fn doc(html: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create_element_with(
            "div",
            &[("data-element", "root"), ("contenteditable", "true")],
        );
        let document = tree.document();
        tree.append(document, root);
        let frag = parse_fragment(&mut tree, html);
        tree.append(root, frag);
        (tree, root)
    }

    pub(crate) fn html(tree: &Tree, root: NodeId) -> String {
        inner_html(tree, root, SerializeOptions::default())
    }

    fn text_node(tree: &Tree, root: NodeId, text: &str) -> NodeId {
        tree.descendants(root)
            .into_iter()
            .find(|id| tree.text(*id) == Some(text))
            .unwrap()
    }

    // ============ insert_text ============

    #[test]
    fn test_insert_text_in_text() {
        let (mut tree, root) = doc("<p>Hllo</p>");
        let t = text_node(&tree, root, "Hllo");
        let mut range = Range::collapsed(Point::new(t, 1));

        Change::new(&mut tree, root).insert_text(&mut range, "e");

        assert_eq!(html(&tree, root), "<p>Hello</p>");
        assert_eq!(range, Range::collapsed(Point::new(t, 2)));
    }

    #[test]
    fn test_insert_text_replaces_placeholder() {
        let (mut tree, root) = doc("<p><br></p>");
        let p = tree.children(root)[0];
        let mut range = Range::collapsed(Point::new(p, 0));

        Change::new(&mut tree, root).insert_text(&mut range, "a");

        assert_eq!(html(&tree, root), "<p>a</p>");
        assert_eq!(tree.text(range.start.node), Some("a"));
        assert_eq!(range.start.offset, 1);
    }

    #[test]
    fn test_insert_text_replaces_selection() {
        let (mut tree, root) = doc("<p>Hello World</p>");
        let t = text_node(&tree, root, "Hello World");
        let mut range = Range::new(Point::new(t, 6), Point::new(t, 11));

        Change::new(&mut tree, root).insert_text(&mut range, "there");

        assert_eq!(html(&tree, root), "<p>Hello there</p>");
    }

    // ============ insert_inline ============

    #[test]
    fn test_insert_inline_at_root_wraps_paragraph() {
        let (mut tree, root) = doc("");
        let b = tree.create_element("b");
        let mut range = Range::collapsed(Point::new(root, 0));

        Change::new(&mut tree, root).insert_inline(&mut range, b);

        assert_eq!(html(&tree, root), "<p><b></b></p>");
        assert_eq!(range, Range::collapsed(Point::new(tree.children(root)[0], 1)));
    }

    #[test]
    fn test_insert_br_keeps_placeholder() {
        let (mut tree, root) = doc("<p><br></p>");
        let p = tree.children(root)[0];
        let br = tree.create_element("br");
        let mut range = Range::collapsed(Point::new(p, 0));

        Change::new(&mut tree, root).insert_inline(&mut range, br);

        assert_eq!(html(&tree, root), "<p><br><br></p>");
    }

    #[test]
    fn test_insert_image_at_block_end_adds_trailing_br() {
        let (mut tree, root) = doc("<p>ab</p>");
        let t = text_node(&tree, root, "ab");
        let img = tree.create_element_with("img", &[("src", "x.png")]);
        let mut range = Range::collapsed(Point::new(t, 2));

        Change::new(&mut tree, root).insert_inline(&mut range, img);

        assert_eq!(html(&tree, root), "<p>ab<img src=\"x.png\"><br></p>");
        assert_eq!(range, Range::collapsed(Point::after(&tree, img).unwrap()));
    }

    // ============ insert_block ============

    #[test]
    fn test_enter_splits_paragraph() {
        let (mut tree, root) = doc("<p>HelloWorld</p>");
        let t = text_node(&tree, root, "HelloWorld");
        let p = tree.create_element("p");
        let mut range = Range::collapsed(Point::new(t, 5));

        Change::new(&mut tree, root).insert_block(&mut range, p, false);

        assert_eq!(html(&tree, root), "<p>Hello</p><p>World</p>");
        assert_eq!(tree.text(range.start.node), Some("World"));
        assert_eq!(range.start.offset, 0);
        assert!(range.is_collapsed());
    }

    #[test]
    fn test_enter_at_end_leaves_placeholder() {
        let (mut tree, root) = doc("<p><b>ab</b></p>");
        let t = text_node(&tree, root, "ab");
        let p = tree.create_element("p");
        let mut range = Range::collapsed(Point::new(t, 2));

        Change::new(&mut tree, root).insert_block(&mut range, p, false);

        assert_eq!(html(&tree, root), "<p><b>ab</b></p><p><br></p>");
        assert_eq!(range.start.node, tree.children(root)[1]);
    }

    #[test]
    fn test_insert_block_between_halves() {
        let (mut tree, root) = doc("<p>ab</p>");
        let t = text_node(&tree, root, "ab");
        let frag = parse_fragment(&mut tree, "<h2>T</h2>");
        let h2 = tree.children(frag)[0];
        let mut range = Range::collapsed(Point::new(t, 1));

        Change::new(&mut tree, root).insert_block(&mut range, h2, true);

        assert_eq!(html(&tree, root), "<p>a</p><h2>T</h2><p>b</p>");
        assert_eq!(range, Range::collapsed(Point::new(tree.first_child(h2).unwrap(), 1)));
    }

    #[test]
    fn test_insert_block_drops_empty_side() {
        let (mut tree, root) = doc("<p>ab</p>");
        let t = text_node(&tree, root, "ab");
        let hr = tree.create_element("hr");
        let mut range = Range::collapsed(Point::new(t, 2));

        Change::new(&mut tree, root).insert_block(&mut range, hr, true);

        assert_eq!(html(&tree, root), "<p>ab</p><hr>");
        assert_eq!(range, Range::collapsed(Point::new(root, 2)));
    }

    #[test]
    fn test_insert_block_splits_ordered_list_and_renumbers() {
        let (mut tree, root) = doc("<ol><li>a</li><li>b</li><li>c</li></ol>");
        let b = text_node(&tree, root, "b");
        let p = tree.create_element("p");
        let x = tree.create_text("x");
        tree.append(p, x);
        let mut range = Range::collapsed(Point::new(b, 1));

        Change::new(&mut tree, root).insert_block(&mut range, p, true);

        assert_eq!(
            html(&tree, root),
            "<ol><li>a</li><li>b</li></ol><p>x</p><ol start=\"3\"><li>c</li></ol>"
        );
    }

    #[test]
    fn test_enter_in_list_item_splits_item() {
        let (mut tree, root) = doc("<ul><li>ab</li></ul>");
        let t = text_node(&tree, root, "ab");
        let li = tree.create_element("li");
        let mut range = Range::collapsed(Point::new(t, 1));

        Change::new(&mut tree, root).insert_block(&mut range, li, false);

        assert_eq!(html(&tree, root), "<ul><li>a</li><li>b</li></ul>");
    }

    // ============ delete_content ============

    #[test]
    fn test_delete_collapsed_is_noop() {
        let (mut tree, root) = doc("<p>abc</p>");
        let t = text_node(&tree, root, "abc");
        let mut range = Range::collapsed(Point::new(t, 1));
        let before = range;

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(range, before);
        assert_eq!(html(&tree, root), "<p>abc</p>");
    }

    #[test]
    fn test_delete_whole_paragraph_leaves_placeholder() {
        let (mut tree, root) = doc("<p>Hello World</p>");
        let t = text_node(&tree, root, "Hello World");
        let p = tree.children(root)[0];
        let mut range = Range::new(Point::new(t, 0), Point::new(t, 11));

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(html(&tree, root), "<p><br></p>");
        assert_eq!(range, Range::collapsed(Point::new(p, 0)));
    }

    #[test]
    fn test_delete_across_blocks_merges() {
        let (mut tree, root) = doc("<p>abc</p><p>mid</p><p>def</p>");
        let a = text_node(&tree, root, "abc");
        let d = text_node(&tree, root, "def");
        let mut range = Range::new(Point::new(a, 1), Point::new(d, 2));

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(html(&tree, root), "<p>af</p>");
        assert_eq!(range, Range::collapsed(Point::new(a, 1)));
    }

    #[test]
    fn test_delete_only_one_keeps_blocks_apart() {
        let (mut tree, root) = doc("<p>abc</p><p>def</p>");
        let a = text_node(&tree, root, "abc");
        let d = text_node(&tree, root, "def");
        let mut range = Range::new(Point::new(a, 1), Point::new(d, 2));

        Change::new(&mut tree, root).delete_content(&mut range, true);

        assert_eq!(html(&tree, root), "<p>a</p><p>f</p>");
    }

    #[test]
    fn test_delete_everything_restores_paragraph() {
        let (mut tree, root) = doc("<p>a</p><p>b</p>");
        let mut range = Range::new(Point::new(root, 0), Point::new(root, 2));

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(html(&tree, root), "<p><br></p>");
        assert_eq!(range, Range::collapsed(Point::new(tree.children(root)[0], 0)));
    }

    #[test]
    fn test_delete_across_list_items_joins_items() {
        let (mut tree, root) = doc("<ol><li>ab</li><li>cd</li><li>ef</li></ol>");
        let ab = text_node(&tree, root, "ab");
        let cd = text_node(&tree, root, "cd");
        let mut range = Range::new(Point::new(ab, 1), Point::new(cd, 1));

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(html(&tree, root), "<ol><li>ad</li><li>ef</li></ol>");
    }

    #[test]
    fn test_delete_separator_pools_lists() {
        let (mut tree, root) = doc("<ol start=\"1\"><li>a</li></ol><p>x</p><ol><li>b</li></ol>");
        let a = text_node(&tree, root, "a");
        let mut range = Range::new(Point::new(root, 1), Point::new(root, 2));

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(html(&tree, root), "<ol><li>a</li><li>b</li></ol>");
        assert_eq!(range, Range::collapsed(Point::new(a, 1)));
    }

    #[test]
    fn test_delete_whole_block_keeps_neighbours_apart() {
        let (mut tree, root) = doc("<p>a</p><p>x</p><ul><li>b</li></ul>");
        let mut range = Range::new(Point::new(root, 1), Point::new(root, 2));

        Change::new(&mut tree, root).delete_content(&mut range, false);

        assert_eq!(html(&tree, root), "<p>a</p><ul><li>b</li></ul>");
    }

    // ============ normalize_root ============

    #[test]
    fn test_normalize_root() {
        let (mut tree, root) = doc("a<b>b</b>\n<p>x</p>\n<h1></h1>");

        Change::new(&mut tree, root).normalize_root();

        assert_eq!(html(&tree, root), "<p>a<b>b</b>\n</p><p>x</p><h1><br></h1>");
    }

    #[test]
    fn test_normalize_empty_root() {
        let (mut tree, root) = doc("  ");

        Change::new(&mut tree, root).normalize_root();

        assert_eq!(html(&tree, root), "<p><br></p>");
    }
}
