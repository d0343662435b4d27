//! # Undo/redo history
//!
//! Snapshot based. Each entry stores the serialized value twice: clean,
//! for comparing content, and marked, with bookmark markers where the
//! selection was, so restoring an entry restores the caret as well.
//!
//! ## Batches
//!
//! Edits are bracketed by [`History::save_before`] and
//! [`History::save_after`]. Brackets nest: only the outermost pair
//! commits, so an edit composed of other edits becomes one undo step.
//! [`History::stop`] abandons an open batch and [`History::abort`] also
//! puts back the content it started from, for an edit that failed partway.
//!
//! ## Stack shape
//!
//! The top of the undo stack is always the current state; undoing moves it
//! to the redo stack and restores the entry below. With a depth cap of `n`
//! the stack keeps `n + 1` entries, the oldest being the base the first
//! remaining edit is undone to.

use crate::dom::html::{SerializeOptions, inner_html, marked_inner_html, parse_fragment};
use crate::dom::{NodeId, Tree};
use crate::range::{Point, Range, find_markers, move_to_bookmark, shrink_range};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: String,
    pub marked: String,
}

/// Capture the value under `root` and the selection. The tree is only
/// read; markers are written straight into the serialized string.
pub fn snapshot(tree: &Tree, root: NodeId, range: &Range) -> Snapshot {
    let content = inner_html(tree, root, SerializeOptions::default());
    let marked = if range.is_within(tree, root) {
        marked_inner_html(tree, root, range)
    } else {
        content.clone()
    };
    Snapshot { content, marked }
}

/// Replace the content of `root` with `snapshot` and return the selection
/// it recorded, if any. The replaced nodes are queued for
/// [`Tree::collect_garbage`].
pub fn restore(tree: &mut Tree, root: NodeId, snapshot: &Snapshot) -> Option<Range> {
    tree.discard_children(root);
    let fragment = parse_fragment(tree, &snapshot.marked);
    tree.append(root, fragment);
    tree.discard(fragment);
    let bookmark = find_markers(tree, root)?;
    let mut range = Range::collapsed(Point::new(root, 0));
    if !move_to_bookmark(tree, &mut range, bookmark) {
        return None;
    }
    shrink_range(tree, &mut range);
    Some(range)
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Undo depth; 0 = unlimited.
    max_levels: usize,
    depth: usize,
    /// State captured when the outermost open batch began.
    pending: Option<Snapshot>,
}

impl History {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            depth: 0,
            pending: None,
        }
    }

    /// Drop everything and make the current state the base.
    pub fn reset(&mut self, tree: &Tree, root: NodeId, range: &Range) {
        self.clear();
        self.undo_stack.push(snapshot(tree, root, range));
    }

    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Open (or nest into) a batch.
    pub fn save_before(&mut self, tree: &Tree, root: NodeId, range: &Range) {
        if self.depth == 0 {
            self.pending = Some(snapshot(tree, root, range));
        }
        self.depth += 1;
    }

    /// Close one level; the outermost close commits. Returns whether an
    /// entry was pushed.
    pub fn save_after(&mut self, tree: &Tree, root: NodeId, range: &Range) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return false;
        }
        let before = self.pending.take();
        let after = snapshot(tree, root, range);

        if self.undo_stack.is_empty()
            && let Some(before) = before
        {
            self.undo_stack.push(before);
        }
        if self
            .undo_stack
            .last()
            .is_some_and(|top| top.content == after.content)
        {
            return false;
        }
        self.undo_stack.push(after);
        self.redo_stack.clear();
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels + 1 {
            self.undo_stack.remove(0);
        }
        log::debug!("history commit, {} undo levels", self.undo_stack.len() - 1);
        true
    }

    /// Refresh the selection stored in the current entry.
    pub fn update(&mut self, tree: &Tree, root: NodeId, range: &Range) {
        if self.is_open() {
            return;
        }
        let current = snapshot(tree, root, range);
        if let Some(top) = self.undo_stack.last_mut()
            && top.content == current.content
        {
            *top = current;
        }
    }

    /// Abandon the open batch without committing it.
    pub fn stop(&mut self) {
        if self.depth > 0 {
            log::debug!("history batch abandoned");
        }
        self.depth = 0;
        self.pending = None;
    }

    /// Abandon the open batch and put back the content it started from.
    /// Returns the selection to use when anything had to be restored.
    pub fn abort(&mut self, tree: &mut Tree, root: NodeId) -> Option<Range> {
        let before = self.pending.take();
        self.stop();
        let before = before?;
        if inner_html(tree, root, SerializeOptions::default()) == before.content {
            return None;
        }
        log::debug!("history batch rolled back");
        Some(restore(tree, root, &before).unwrap_or(Range::collapsed(Point::new(root, 0))))
    }

    pub fn has_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back one entry. Returns the restored selection, or `None` when
    /// there is nothing to undo (or a batch is open).
    pub fn undo(&mut self, tree: &mut Tree, root: NodeId) -> Option<Range> {
        if self.is_open() || !self.has_undo() {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        let previous = self.undo_stack.last()?;
        let range = restore(tree, root, previous).unwrap_or(Range::collapsed(Point::new(root, 0)));
        Some(range)
    }

    pub fn redo(&mut self, tree: &mut Tree, root: NodeId) -> Option<Range> {
        if self.is_open() {
            return None;
        }
        let next = self.redo_stack.pop()?;
        let range = restore(tree, root, &next)
            .unwrap_or(Range::collapsed(Point::new(root, 0)));
        self.undo_stack.push(next);
        Some(range)
    }

    /// Empty both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.stop();
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len().saturating_sub(1)
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(html: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create_element_with("div", &[("data-element", "root")]);
        let document = tree.document();
        tree.append(document, root);
        let frag = parse_fragment(&mut tree, html);
        tree.append(root, frag);
        (tree, root)
    }

    fn value(tree: &Tree, root: NodeId) -> String {
        inner_html(tree, root, SerializeOptions::default())
    }

    fn first_text(tree: &Tree, root: NodeId) -> NodeId {
        tree.descendants(root)
            .into_iter()
            .find(|id| tree.is_text(*id))
            .unwrap()
    }

    /// One committed edit: replace the first text with `text`.
    fn edit(history: &mut History, tree: &mut Tree, root: NodeId, text: &str) -> Range {
        let t = first_text(tree, root);
        let before = Range::collapsed(Point::new(t, 0));
        history.save_before(tree, root, &before);
        tree.set_text(t, text);
        let after = Range::collapsed(Point::new(t, text.chars().count()));
        history.save_after(tree, root, &after);
        after
    }

    #[test]
    fn test_snapshot_marks_selection() {
        let (mut tree, root) = doc("<p>abc</p>");
        let t = first_text(&tree, root);
        let range = Range::new(Point::new(t, 1), Point::new(t, 2));

        let snap = snapshot(&mut tree, root, &range);

        assert_eq!(snap.content, "<p>abc</p>");
        assert_eq!(
            snap.marked,
            "<p>a<span data-element=\"anchor\"></span>b<span data-element=\"focus\"></span>c</p>"
        );
        assert_eq!(value(&tree, root), "<p>abc</p>");
        assert_eq!(tree.child_count(tree.children(root)[0]), 1);
    }

    #[test]
    fn test_restore_resolves_selection() {
        let (mut tree, root) = doc("<p>x</p>");
        let snap = Snapshot {
            content: "<p>abc</p>".to_string(),
            marked: "<p>ab<span data-element=\"cursor\"></span>c</p>".to_string(),
        };

        let range = restore(&mut tree, root, &snap).unwrap();

        assert_eq!(value(&tree, root), "<p>abc</p>");
        assert_eq!(tree.text(range.start.node), Some("abc"));
        assert_eq!(range.start.offset, 2);
        assert!(range.is_collapsed());
    }

    #[test]
    fn test_undo_redo_inverse() {
        let (mut tree, root) = doc("<p>a</p>");
        let mut history = History::new(10);
        history.reset(&mut tree, root, &Range::collapsed(Point::new(root, 0)));

        edit(&mut history, &mut tree, root, "ab");
        assert_eq!(value(&tree, root), "<p>ab</p>");

        let undone = history.undo(&mut tree, root).unwrap();
        assert_eq!(value(&tree, root), "<p>a</p>");
        assert_eq!(tree.text(undone.start.node), Some("a"));
        assert_eq!(undone.start.offset, 0);

        let redone = history.redo(&mut tree, root).unwrap();
        assert_eq!(value(&tree, root), "<p>ab</p>");
        assert_eq!(tree.text(redone.start.node), Some("ab"));
        assert_eq!(redone.start.offset, 2);
        assert!(!history.has_redo());
    }

    #[test]
    fn test_nested_batch_commits_once() {
        let (mut tree, root) = doc("<p>a</p>");
        let mut history = History::new(0);
        let range = Range::collapsed(Point::new(root, 0));

        history.save_before(&mut tree, root, &range);
        history.save_before(&mut tree, root, &range);
        tree.set_text(first_text(&tree, root), "b");
        assert!(!history.save_after(&mut tree, root, &range));
        assert!(history.save_after(&mut tree, root, &range));

        assert_eq!(history.undo_len(), 1);
        history.undo(&mut tree, root);
        assert_eq!(value(&tree, root), "<p>a</p>");
    }

    #[test]
    fn test_unchanged_content_is_not_an_entry() {
        let (mut tree, root) = doc("<p>a</p>");
        let mut history = History::new(0);
        let range = Range::collapsed(Point::new(root, 0));

        history.save_before(&mut tree, root, &range);
        assert!(!history.save_after(&mut tree, root, &range));
        assert!(!history.has_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let (mut tree, root) = doc("<p>a</p>");
        let mut history = History::new(0);
        edit(&mut history, &mut tree, root, "b");
        edit(&mut history, &mut tree, root, "c");
        history.undo(&mut tree, root);
        assert!(history.has_redo());

        edit(&mut history, &mut tree, root, "d");

        assert!(!history.has_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_depth_cap_keeps_base() {
        let (mut tree, root) = doc("<p>0</p>");
        let mut history = History::new(2);
        for text in ["1", "2", "3", "4"] {
            edit(&mut history, &mut tree, root, text);
        }

        assert_eq!(history.undo_len(), 2);
        history.undo(&mut tree, root);
        history.undo(&mut tree, root);
        assert_eq!(value(&tree, root), "<p>2</p>");
        assert!(history.undo(&mut tree, root).is_none());
    }

    #[test]
    fn test_stop_discards_batch() {
        let (mut tree, root) = doc("<p>a</p>");
        let mut history = History::new(0);
        let range = Range::collapsed(Point::new(root, 0));

        history.save_before(&mut tree, root, &range);
        tree.set_text(first_text(&tree, root), "half");
        history.stop();

        assert!(!history.is_open());
        assert!(!history.save_after(&mut tree, root, &range));
        assert!(!history.has_undo());
    }

    #[test]
    fn test_update_refreshes_selection() {
        let (mut tree, root) = doc("<p>abc</p>");
        let mut history = History::new(0);
        edit(&mut history, &mut tree, root, "abcd");
        let t = first_text(&tree, root);

        history.update(&mut tree, root, &Range::collapsed(Point::new(t, 1)));
        edit(&mut history, &mut tree, root, "z");
        let range = history.undo(&mut tree, root).unwrap();

        assert_eq!(value(&tree, root), "<p>abcd</p>");
        assert_eq!(range.start.offset, 1);
    }

    #[test]
    fn test_update_allocates_nothing() {
        let (mut tree, root) = doc("<p>abc</p>");
        let mut history = History::new(0);
        edit(&mut history, &mut tree, root, "abcd");
        let t = first_text(&tree, root);
        let slots = tree.slot_count();

        for offset in 0..1000 {
            let range = Range::new(Point::new(t, offset % 4), Point::new(t, 4));
            history.update(&tree, root, &range);
        }

        assert_eq!(tree.slot_count(), slots);
        assert_eq!(value(&tree, root), "<p>abcd</p>");
    }

    #[test]
    fn test_undo_cycles_reuse_slots() {
        let (mut tree, root) = doc("<p>a</p><p>b</p>");
        let mut history = History::new(0);
        edit(&mut history, &mut tree, root, "c");

        history.undo(&mut tree, root);
        tree.collect_garbage();
        let slots = tree.slot_count();
        for _ in 0..100 {
            history.redo(&mut tree, root);
            tree.collect_garbage();
            history.undo(&mut tree, root);
            tree.collect_garbage();
        }

        assert_eq!(tree.slot_count(), slots);
        assert_eq!(value(&tree, root), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_abort_restores_batch_start() {
        let (mut tree, root) = doc("<p>abc</p>");
        let mut history = History::new(0);
        history.reset(&tree, root, &Range::collapsed(Point::new(root, 0)));
        let t = first_text(&tree, root);

        history.save_before(&tree, root, &Range::collapsed(Point::new(t, 2)));
        tree.set_text(t, "half");
        let range = history.abort(&mut tree, root).unwrap();

        assert!(!history.is_open());
        assert!(!history.has_undo());
        assert_eq!(value(&tree, root), "<p>abc</p>");
        assert_eq!(tree.text(range.start.node), Some("abc"));
        assert_eq!(range.start.offset, 2);
    }

    #[test]
    fn test_abort_leaves_untouched_content() {
        let (mut tree, root) = doc("<p>abc</p>");
        let mut history = History::new(0);
        let t = first_text(&tree, root);

        history.save_before(&tree, root, &Range::collapsed(Point::new(t, 1)));
        assert!(history.abort(&mut tree, root).is_none());

        assert_eq!(first_text(&tree, root), t);
        assert!(history.abort(&mut tree, root).is_none());
    }

    #[test]
    fn test_clear_empties_stacks() {
        let (mut tree, root) = doc("<p>a</p>");
        let mut history = History::new(0);
        edit(&mut history, &mut tree, root, "b");

        history.clear();

        assert!(!history.has_undo());
        assert!(history.undo(&mut tree, root).is_none());
    }
}
