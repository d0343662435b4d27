//! Grammar rules: document content and elements.
//!
//! Open elements are kept on an explicit stack of tag names so an end tag
//! can close the nearest matching element and everything opened inside it.

mod tag;

use super::{OpenNode, Parser};
use crate::syntax_kind::SyntaxKind;

/// Elements that never have content.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Open elements allowed at once. Deeper start tags become empty elements
/// where they stand.
pub const MAX_DEPTH: usize = 512;

/// Returns true for HTML void element names (case-insensitive).
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Parse a whole document.
pub(super) fn root(p: &mut Parser<'_, '_>) {
    let root = p.open(SyntaxKind::ROOT);
    let mut open: Vec<(String, OpenNode)> = Vec::new();

    while !p.at_end() {
        match p.current() {
            SyntaxKind::TAG_OPEN => {
                let name = tag_name(p.current_text(), "<");
                let element = p.open(SyntaxKind::ELEMENT);
                let self_closing = tag::start_tag(p);
                if self_closing || is_void_element(&name) || open.len() >= MAX_DEPTH {
                    element.close(p);
                } else {
                    open.push((name, element));
                }
            }
            SyntaxKind::END_TAG_OPEN => {
                let name = tag_name(p.current_text(), "</");
                match open.iter().rposition(|(n, _)| *n == name) {
                    Some(depth) => {
                        // Everything opened inside the match closes implicitly
                        for (_, inner) in open.drain(depth + 1..).rev() {
                            inner.close(p);
                        }
                        tag::end_tag(p);
                        if let Some((_, element)) = open.pop() {
                            element.close(p);
                        }
                    }
                    None => {
                        let error = p.open(SyntaxKind::ERROR);
                        tag::end_tag(p);
                        error.close(p);
                    }
                }
            }
            _ => p.bump(),
        }
    }

    for (_, element) in open.into_iter().rev() {
        element.close(p);
    }
    root.close(p);
}

/// Lowercased tag name from a `<name` or `</name` token.
pub(crate) fn tag_name(text: &str, prefix: &str) -> String {
    text.strip_prefix(prefix).unwrap_or(text).to_ascii_lowercase()
}
