//! Start tags, end tags and attributes.

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse `<name attrs...>` or `<name attrs.../>` into a START_TAG node.
/// Returns whether it was self-closing.
pub(super) fn start_tag(p: &mut Parser<'_, '_>) -> bool {
    let tag = p.open(SyntaxKind::START_TAG);
    p.bump(); // TAG_OPEN

    let mut self_closing = false;
    while !p.at_end() {
        match p.current() {
            SyntaxKind::GT => {
                p.bump();
                break;
            }
            SyntaxKind::SLASH_GT => {
                p.bump();
                self_closing = true;
                break;
            }
            SyntaxKind::WHITESPACE => p.bump(),
            SyntaxKind::NAME => attribute(p),
            // A new tag starting before this one closed
            SyntaxKind::TAG_OPEN | SyntaxKind::END_TAG_OPEN => break,
            _ => {
                let error = p.open(SyntaxKind::ERROR);
                p.bump();
                error.close(p);
            }
        }
    }

    tag.close(p);
    self_closing
}

/// Parse `</name ...>`. Anything between the name and `>` is kept inside.
pub(super) fn end_tag(p: &mut Parser<'_, '_>) {
    let tag = p.open(SyntaxKind::END_TAG);
    p.bump(); // END_TAG_OPEN
    while !p.at_end() {
        let kind = p.current();
        if matches!(kind, SyntaxKind::TAG_OPEN | SyntaxKind::END_TAG_OPEN) {
            break;
        }
        p.bump();
        if kind.is_tag_close() {
            break;
        }
    }
    tag.close(p);
}

/// Parse `name`, `name=value`, `name = "value"`.
fn attribute(p: &mut Parser<'_, '_>) {
    let attr = p.open(SyntaxKind::ATTRIBUTE);
    p.bump(); // NAME

    let has_value = p.at(SyntaxKind::EQ)
        || (p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::EQ);
    if has_value {
        p.eat(SyntaxKind::WHITESPACE);
        p.bump(); // EQ
        p.eat(SyntaxKind::WHITESPACE);
        if !p.eat(SyntaxKind::QUOTED) {
            // Unquoted values may contain `/`
            while matches!(p.current(), SyntaxKind::NAME | SyntaxKind::SLASH) {
                p.bump();
            }
        }
    }

    attr.close(p);
}
