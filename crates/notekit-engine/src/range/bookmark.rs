//! Bookmarks: marker nodes that carry a selection across tree surgery.
//!
//! Markers are empty `span[data-element=anchor|focus|cursor]` elements. They
//! live only for the duration of one algorithm: [`BookmarkScope`] removes
//! them on every exit path, including early returns and unwinding.

use std::ops::{Deref, DerefMut};

use super::{Point, Range, insert_at_point};
use crate::dom::{BOOKMARK_ANCHOR, BOOKMARK_CURSOR, BOOKMARK_FOCUS, DATA_ELEMENT, NodeId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmark {
    /// Start marker, or the single cursor marker of a collapsed range.
    pub anchor: NodeId,
    /// End marker; `None` when the range was collapsed.
    pub focus: Option<NodeId>,
}

impl Bookmark {
    pub fn markers(&self) -> impl Iterator<Item = NodeId> + use<> {
        std::iter::once(self.anchor).chain(self.focus)
    }
}

fn marker(tree: &mut Tree, kind: &str) -> NodeId {
    tree.create_element_with("span", &[(DATA_ELEMENT, kind)])
}

/// Splice markers into the tree at the range boundaries.
///
/// The end marker goes in first so inserting it cannot shift the start
/// position.
pub fn create_bookmark(tree: &mut Tree, range: &Range) -> Bookmark {
    if range.is_collapsed() {
        let cursor = marker(tree, BOOKMARK_CURSOR);
        insert_at_point(tree, range.start, cursor);
        log::trace!("bookmark cursor {cursor} at {}:{}", range.start.node, range.start.offset);
        return Bookmark {
            anchor: cursor,
            focus: None,
        };
    }

    let focus = marker(tree, BOOKMARK_FOCUS);
    insert_at_point(tree, range.end, focus);
    let anchor = marker(tree, BOOKMARK_ANCHOR);
    insert_at_point(tree, range.start, anchor);
    log::trace!("bookmark anchor {anchor} focus {focus}");
    Bookmark {
        anchor,
        focus: Some(focus),
    }
}

/// Read the markers' current positions into `range` and remove them.
///
/// Text split apart by the markers is joined back together. Returns
/// `false`, leaving `range` alone, when the markers were removed from the
/// tree in the meantime.
pub fn move_to_bookmark(tree: &mut Tree, range: &mut Range, bookmark: Bookmark) -> bool {
    let Some(mut start) = Point::before(tree, bookmark.anchor) else {
        remove_markers(tree, bookmark);
        return false;
    };
    tree.discard(bookmark.anchor);

    let mut end = match bookmark.focus {
        Some(focus) => match Point::before(tree, focus) {
            Some(point) => {
                tree.discard(focus);
                point
            }
            None => start,
        },
        None => start,
    };

    let collapsed = start == end;
    if let Some((left, right, left_len)) = join_texts_at(tree, end) {
        if start.node == end.node && start.offset == end.offset {
            start = Point::new(left, left_len);
        } else if start.node == right {
            start = Point::new(left, left_len + start.offset);
        }
        end = Point::new(left, left_len);
    }
    if !collapsed && let Some((left, right, left_len)) = join_texts_at(tree, start) {
        if end.node == right {
            end = Point::new(left, left_len + end.offset);
        } else if end.node == start.node && end.offset > start.offset {
            end.offset -= 1;
        }
        start = Point::new(left, left_len);
    }
    if collapsed {
        end = start;
    }

    *range = Range::new(start, end);
    true
}

/// Merge the two text nodes on either side of an element position.
/// Returns `(left, removed_right, left_len_before)`.
fn join_texts_at(tree: &mut Tree, point: Point) -> Option<(NodeId, NodeId, usize)> {
    if tree.is_text(point.node) || point.offset == 0 {
        return None;
    }
    let left = tree.child(point.node, point.offset - 1)?;
    let right = tree.child(point.node, point.offset)?;
    let tail = tree.text(right)?.to_string();
    if !tree.is_text(left) {
        return None;
    }
    let left_len = tree.text_len(left);
    tree.insert_text(left, left_len, &tail);
    tree.discard(right);
    Some((left, right, left_len))
}

fn remove_markers(tree: &mut Tree, bookmark: Bookmark) {
    for id in bookmark.markers() {
        tree.discard(id);
    }
}

/// Locate bookmark markers under `root`, as left by a marked
/// serialization.
pub fn find_markers(tree: &Tree, root: NodeId) -> Option<Bookmark> {
    let mut anchor = None;
    let mut focus = None;
    for id in tree.descendants(root) {
        match tree.attr(id, DATA_ELEMENT) {
            Some(BOOKMARK_CURSOR) | Some(BOOKMARK_ANCHOR) if anchor.is_none() => anchor = Some(id),
            Some(BOOKMARK_FOCUS) if focus.is_none() => focus = Some(id),
            _ => {}
        }
    }
    match (anchor, focus) {
        (Some(anchor), focus) => Some(Bookmark { anchor, focus }),
        (None, Some(focus)) => Some(Bookmark {
            anchor: focus,
            focus: None,
        }),
        (None, None) => None,
    }
}

/// A tree borrowed together with a live bookmark.
///
/// Dereferences to the tree so algorithms mutate through it. Dropping the
/// scope without calling [`restore`](Self::restore) still removes the
/// markers.
pub struct BookmarkScope<'t> {
    tree: &'t mut Tree,
    bookmark: Bookmark,
    released: bool,
}

impl<'t> BookmarkScope<'t> {
    pub fn new(tree: &'t mut Tree, range: &Range) -> Self {
        let bookmark = create_bookmark(tree, range);
        Self {
            tree,
            bookmark,
            released: false,
        }
    }

    pub fn bookmark(&self) -> Bookmark {
        self.bookmark
    }

    /// Move `range` to the markers and remove them.
    pub fn restore(mut self, range: &mut Range) -> bool {
        self.released = true;
        move_to_bookmark(self.tree, range, self.bookmark)
    }
}

impl Deref for BookmarkScope<'_> {
    type Target = Tree;

    fn deref(&self) -> &Tree {
        self.tree
    }
}

impl DerefMut for BookmarkScope<'_> {
    fn deref_mut(&mut self) -> &mut Tree {
        self.tree
    }
}

impl Drop for BookmarkScope<'_> {
    fn drop(&mut self) {
        if !self.released {
            remove_markers(self.tree, self.bookmark);
        }
    }
}

/// Run `f` with markers placed at `range`, then move `range` to wherever
/// the markers ended up.
pub fn with_bookmark<T>(
    tree: &mut Tree,
    range: &mut Range,
    f: impl FnOnce(&mut Tree, Bookmark) -> T,
) -> T {
    let mut scope = BookmarkScope::new(tree, range);
    let bookmark = scope.bookmark();
    let out = f(&mut scope, bookmark);
    scope.restore(range);
    out
}
