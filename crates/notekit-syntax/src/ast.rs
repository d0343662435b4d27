//! Typed views over the untyped Rowan tree.
//!
//! Thin wrappers in the rust-analyzer style: each view holds a
//! [`SyntaxNode`] and exposes accessors. Values are returned exactly as
//! written in the source; entity decoding is left to the caller.

use rowan::NodeOrToken;

use crate::parser::tag_name;
use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

/// An `ELEMENT` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element(SyntaxNode);

impl Element {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ELEMENT).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    fn start_tag(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::START_TAG)
    }

    /// Lowercased tag name.
    pub fn name(&self) -> String {
        self.start_tag()
            .and_then(|tag| tag.first_token())
            .map(|t| tag_name(t.text(), "<"))
            .unwrap_or_default()
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + use<> {
        self.start_tag()
            .into_iter()
            .flat_map(|tag| tag.children())
            .filter_map(Attribute::cast)
    }

    /// True when the source carried a matching end tag.
    pub fn has_end_tag(&self) -> bool {
        self.0.children().any(|n| n.kind() == SyntaxKind::END_TAG)
    }

    /// Child content, tags excluded.
    pub fn content(&self) -> Vec<Content> {
        content(&self.0)
    }
}

/// An `ATTRIBUTE` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute(SyntaxNode);

impl Attribute {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ATTRIBUTE).then_some(Self(node))
    }

    /// Lowercased attribute name.
    pub fn name(&self) -> String {
        self.0
            .first_token()
            .map(|t| t.text().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Raw value with surrounding quotes removed; `None` for bare attributes.
    pub fn value(&self) -> Option<String> {
        let mut tokens = self
            .0
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .skip_while(|t| t.kind() != SyntaxKind::EQ)
            .skip(1)
            .filter(|t| !t.kind().is_trivia())
            .peekable();
        tokens.peek()?;

        let mut value = String::new();
        for token in tokens {
            if token.kind() == SyntaxKind::QUOTED {
                value.push_str(unquote(token.text()));
            } else {
                value.push_str(token.text());
            }
        }
        Some(value)
    }
}

fn unquote(text: &str) -> &str {
    let quote = match text.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return text,
    };
    let inner = &text[1..];
    inner.strip_suffix(quote).unwrap_or(inner)
}

/// One item of element or document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Element),
    Text(SyntaxToken),
    Comment(SyntaxToken),
    Declaration(SyntaxToken),
    /// Unmatched end tags and other junk kept for losslessness.
    Error(SyntaxNode),
}

/// Content items of a `ROOT` or `ELEMENT` node, in source order.
pub fn content(node: &SyntaxNode) -> Vec<Content> {
    node.children_with_tokens()
        .filter_map(|child| match child {
            NodeOrToken::Node(n) => match n.kind() {
                SyntaxKind::ELEMENT => Element::cast(n).map(Content::Element),
                SyntaxKind::ERROR => Some(Content::Error(n)),
                _ => None,
            },
            NodeOrToken::Token(t) => match t.kind() {
                SyntaxKind::TEXT => Some(Content::Text(t)),
                SyntaxKind::COMMENT => Some(Content::Comment(t)),
                SyntaxKind::DECLARATION => Some(Content::Declaration(t)),
                _ => None,
            },
        })
        .collect()
}
