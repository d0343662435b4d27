//! Fragment insertion, used by paste and programmatic inserts.
//!
//! A fragment is split into a leading inline run, inserted at the caret
//! like typed content, and the blocks that follow, which split the
//! enclosing block at the caret and go in between the halves. Card
//! placeholders in the fragment are rendered first so cards arrive live.

use super::list::{absorb, add_list_start_number, is_empty_list_item, same_list};
use super::{Change, cursor_marker, placeholders, prune_empty_marks, remove_all, split_at};
use crate::card::CardManager;
use crate::dom::{NodeId, Tree};
use crate::range::{self, BookmarkScope, Point, Range, insert_at_point, shrink_range, with_bookmark};

fn is_blank_text(tree: &Tree, node: NodeId) -> bool {
    tree.text(node)
        .is_some_and(|t| t.chars().all(char::is_whitespace))
}

fn is_blockquote(tree: &Tree, node: NodeId) -> bool {
    tree.name(node) == Some("blockquote")
}

/// Whether `a` and `b` render as one structure when adjacent.
fn joinable(tree: &Tree, a: NodeId, b: NodeId) -> bool {
    same_list(tree, a, b) || (is_blockquote(tree, a) && is_blockquote(tree, b))
}

impl Change<'_> {
    /// Insert the children of `fragment` at the caret, replacing any
    /// selection. The fragment is left empty.
    pub fn insert_fragment(&mut self, range: &mut Range, cards: &mut CardManager, fragment: NodeId) {
        cards.render_all(self.tree, fragment);
        if self.tree.child_count(fragment) == 0 {
            return;
        }
        if !range.is_collapsed() {
            self.delete_content(range, false);
        }
        if !self.prepare(range) {
            return;
        }

        let children = self.tree.take_children(fragment);
        let split = children
            .iter()
            .position(|c| self.tree.node(*c).is_block())
            .unwrap_or(children.len());
        let (inline, blocks) = children.split_at(split);
        log::debug!(
            "insert_fragment: {} inline, {} block nodes",
            inline.len(),
            blocks.len()
        );

        if !inline.iter().all(|c| is_blank_text(self.tree, *c)) {
            self.insert_inline_run(range, inline);
        }
        if blocks.is_empty() {
            return;
        }
        let blocks = wrap_loose_inlines(self.tree, blocks);
        self.insert_blocks(range, &blocks);
    }

    fn insert_inline_run(&mut self, range: &mut Range, nodes: &[NodeId]) {
        let mut at = range.start;
        if at.node == self.root {
            let p = self.tree.create_element("p");
            insert_at_point(self.tree, at, p);
            at = Point::new(p, 0);
        }
        let block = self.block_of(at.node);
        let placeholders = placeholders(self.tree, block);

        let mut last = None;
        for node in nodes {
            if insert_at_point(self.tree, at, *node).is_none() {
                return;
            }
            match Point::after(self.tree, *node) {
                Some(next) => at = next,
                None => return,
            }
            last = Some(*node);
        }
        remove_all(self.tree, placeholders);

        let Some(last) = last else {
            return;
        };
        if let Some(after) = Point::after(self.tree, last) {
            *range = Range::collapsed(after);
        }
        with_bookmark(self.tree, range, |tree, _| tree.normalize(block));
    }

    /// Nearest ancestor a block insert must not split through.
    fn cut_limit(&self, node: NodeId) -> NodeId {
        self.tree
            .node(node)
            .closest_where(|n| {
                n.is_root()
                    || matches!(n.name(), Some("td" | "th"))
                    || (n.card_element() == Some("center") && n.is_editable())
            })
            .map(|n| n.id())
            .unwrap_or(self.root)
    }

    fn insert_blocks(&mut self, range: &mut Range, blocks: &[NodeId]) {
        let caret = range.start;
        let limit = self.cut_limit(caret.node);
        let marker = cursor_marker(self.tree);
        if insert_at_point(self.tree, caret, marker).is_none() {
            return;
        }

        let (left, right) = if self.tree.parent(marker) == Some(limit) {
            let index = self.tree.index(marker).unwrap_or(0);
            self.tree.detach(marker);
            for (i, block) in blocks.iter().enumerate() {
                self.tree.insert_at(limit, index + i, *block);
            }
            (None, None)
        } else {
            let top = range::child_towards(self.tree, limit, marker);
            let right = split_at(self.tree, top, marker);
            self.tree.insert_after(top, right);
            self.tree.detach(marker);
            prune_empty_marks(self.tree, top);
            prune_empty_marks(self.tree, right);
            let mut prev = top;
            for block in blocks {
                self.tree.insert_after(prev, *block);
                prev = *block;
            }
            (Some(top), Some(right))
        };

        let mut placed = blocks.to_vec();
        if let Some(left) = left
            && is_blockquote(self.tree, left)
        {
            placed = rewrap_in_shell(self.tree, left, &placed);
        }
        let (Some(&first), Some(&last)) = (placed.first(), placed.last()) else {
            return;
        };

        let mut caret_range = {
            let n = self.tree.node(last);
            if n.is_void() || n.is_card() {
                Point::after(self.tree, last).map(Range::collapsed)
            } else {
                let mut r = Range::collapsed(Point::new(last, self.tree.node_len(last)));
                shrink_range(self.tree, &mut r);
                Some(r)
            }
        }
        .unwrap_or(*range);

        {
            let mut scope = BookmarkScope::new(self.tree, &caret_range);
            let tree: &mut Tree = &mut scope;
            if let Some(left) = left {
                trim_side(tree, left, true);
            }
            if let Some(right) = right {
                trim_side(tree, right, false);
            }

            let mut first_ref = first;
            if let Some(prev) = tree.prev_sibling(first)
                && joinable(tree, prev, first)
            {
                absorb(tree, prev, first);
                first_ref = prev;
            }
            let last_ref = if last == first { first_ref } else { last };
            let next = tree.next_sibling(last_ref);
            if let Some(next) = next
                && joinable(tree, last_ref, next)
            {
                absorb(tree, last_ref, next);
            }

            for list in [Some(first_ref), Some(last_ref), tree.next_sibling(last_ref)]
                .into_iter()
                .flatten()
            {
                add_list_start_number(tree, list);
            }
            scope.restore(&mut caret_range);
        }
        shrink_range(self.tree, &mut caret_range);
        *range = caret_range;
    }
}

/// Wrap inline nodes sitting between or after blocks in paragraphs;
/// whitespace-only runs are dropped.
fn wrap_loose_inlines(tree: &mut Tree, nodes: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut run: Vec<NodeId> = Vec::new();
    let flush = |tree: &mut Tree, run: &mut Vec<NodeId>, out: &mut Vec<NodeId>| {
        if run.iter().all(|n| is_blank_text(tree, *n)) {
            run.clear();
            return;
        }
        let p = tree.create_element("p");
        for node in run.drain(..) {
            tree.append(p, node);
        }
        out.push(p);
    };
    for node in nodes {
        if tree.node(*node).is_block() {
            flush(tree, &mut run, &mut out);
            out.push(*node);
        } else {
            run.push(*node);
        }
    }
    flush(tree, &mut run, &mut out);
    out
}

/// Move runs of non-blockquote blocks into shallow copies of `quote` so
/// content pasted inside a quote stays quoted.
fn rewrap_in_shell(tree: &mut Tree, quote: NodeId, placed: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut shell: Option<NodeId> = None;
    for node in placed {
        if is_blockquote(tree, *node) {
            shell = None;
            out.push(*node);
            continue;
        }
        let target = match shell {
            Some(s) => s,
            None => {
                let s = tree.clone_node(quote, false);
                tree.insert_before(*node, s);
                out.push(s);
                shell = Some(s);
                s
            }
        };
        tree.append(target, *node);
    }
    out
}

/// Drop what splitting left empty at one side of the cut: the facing list
/// item, then the whole side when nothing remains.
fn trim_side(tree: &mut Tree, side: NodeId, at_end: bool) {
    if tree.parent(side).is_none() {
        return;
    }
    if tree.node(side).is_list() {
        let item = if at_end {
            tree.last_child(side)
        } else {
            tree.first_child(side)
        };
        if let Some(item) = item
            && is_empty_list_item(tree, item)
        {
            tree.detach(item);
        }
    }
    if tree.node(side).is_empty() {
        tree.detach(side);
    }
}
