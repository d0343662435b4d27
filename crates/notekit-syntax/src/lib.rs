//! # notekit-syntax
//!
//! A lossless HTML syntax tree using [Rowan] + [Logos], following the
//! [rust-analyzer] architecture model. It parses the editor's serialized
//! document value and pasted clipboard HTML.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! - [`lexer`]: two-mode Logos tokenizer (content vs. inside a tag)
//! - [`parser`]: iterative event parser with tolerant, depth-capped nesting
//! - [`ast`]: typed views (`Element`, `Attribute`, `Content`) for consumers
//!
//! ## Module Structure
//!
//! ```text
//! notekit-syntax/
//! ├── lib.rs           # Public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum and Rowan integration
//! ├── lexer.rs         # Logos-based tokenizer
//! ├── ast.rs           # Typed views over the tree
//! └── parser/
//!     ├── mod.rs       # Parser, OpenNode, parse()
//!     ├── event.rs     # Open/Token/Close events
//!     ├── sink.rs      # Events to Rowan GreenNode
//!     └── grammar/
//!         ├── mod.rs   # Document content and element nesting
//!         └── tag.rs   # Start/end tags and attributes
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use notekit_syntax::{ast, parse, SyntaxKind};
//!
//! let tree = parse("<p class=\"x\">Hello<br></p>");
//! assert_eq!(tree.text().to_string(), "<p class=\"x\">Hello<br></p>");
//! assert_eq!(tree.kind(), SyntaxKind::ROOT);
//!
//! let p = tree.children().find_map(ast::Element::cast).unwrap();
//! assert_eq!(p.name(), "p");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use parser::{MAX_DEPTH, VOID_ELEMENTS, is_void_element, parse};
pub use syntax_kind::{HtmlLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Format a syntax tree one node or token per line.
    fn format_tree(node: &SyntaxNode, indent: usize) -> String {
        let mut result = String::new();
        let prefix = "  ".repeat(indent);

        result.push_str(&format!(
            "{}{:?}@{:?}\n",
            prefix,
            node.kind(),
            node.text_range()
        ));

        for child in node.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Node(n) => {
                    result.push_str(&format_tree(&n, indent + 1));
                }
                rowan::NodeOrToken::Token(t) => {
                    result.push_str(&format!(
                        "{}  {:?}@{:?} {:?}\n",
                        prefix,
                        t.kind(),
                        t.text_range(),
                        t.text()
                    ));
                }
            }
        }

        result
    }

    fn element_names(node: &SyntaxNode) -> Vec<String> {
        node.descendants()
            .filter_map(ast::Element::cast)
            .map(|e| e.name())
            .collect()
    }

    #[test]
    fn tree_shape_of_paragraph_with_void() {
        let tree = parse("<p>a<br></p>");
        assert_snapshot!(format_tree(&tree, 0), @r#"
        ROOT@0..12
          ELEMENT@0..12
            START_TAG@0..3
              TAG_OPEN@0..2 "<p"
              GT@2..3 ">"
            TEXT@3..4 "a"
            ELEMENT@4..8
              START_TAG@4..8
                TAG_OPEN@4..7 "<br"
                GT@7..8 ">"
            END_TAG@8..12
              END_TAG_OPEN@8..11 "</p"
              GT@11..12 ">"
        "#);
    }

    #[test]
    fn tree_shape_of_stray_end_tag_and_attribute() {
        let tree = parse("<a x=1></b>");
        assert_snapshot!(format_tree(&tree, 0), @r#"
        ROOT@0..11
          ELEMENT@0..11
            START_TAG@0..7
              TAG_OPEN@0..2 "<a"
              WHITESPACE@2..3 " "
              ATTRIBUTE@3..6
                NAME@3..4 "x"
                EQ@4..5 "="
                NAME@5..6 "1"
              GT@6..7 ">"
            ERROR@7..11
              END_TAG@7..11
                END_TAG_OPEN@7..10 "</b"
                GT@10..11 ">"
        "#);
    }

    #[test]
    fn unclosed_elements_close_at_end() {
        let tree = parse("<ul><li>a<li>b");
        let ul = tree.children().find_map(ast::Element::cast).unwrap();
        assert!(!ul.has_end_tag());
        // Second li nests inside the first: no implied end tags
        assert_eq!(element_names(&tree), vec!["ul", "li", "li"]);
    }

    #[test]
    fn end_tag_closes_ancestor() {
        let tree = parse("<div><p><b>x</div>after");
        let div = tree.children().find_map(ast::Element::cast).unwrap();
        assert!(div.has_end_tag());
        let trailing: Vec<_> = ast::content(&tree)
            .into_iter()
            .filter_map(|c| match c {
                ast::Content::Text(t) => Some(t.text().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(trailing, vec!["after"]);
    }

    #[test]
    fn stray_end_tag_is_error() {
        let tree = parse("a</span>b");
        let errors = tree
            .children()
            .filter(|n| n.kind() == SyntaxKind::ERROR)
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn self_closing_non_void_has_no_children() {
        let tree = parse("<span/>x");
        let span = tree.children().find_map(ast::Element::cast).unwrap();
        assert!(span.content().is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("plain text")]
    #[case("<p>Hello <b>World</b></p>")]
    #[case("<ol start=\"3\"><li>a</li><li>b</li></ol>")]
    #[case("<div data-card-key=\"hr\" data-card-value=\"data:%7B%7D\"></div>")]
    #[case("<p>unclosed <i>italic")]
    #[case("<p a=\"1\" b='2' c=3 d>x</p>")]
    #[case("</p></p><br/><!-- c --><!DOCTYPE html>")]
    #[case("1 < 2 && 3 > 2")]
    fn roundtrip_preserves_text(#[case] input: &str) {
        let tree = parse(input);
        assert_eq!(tree.text().to_string(), input);
    }
}
