//! # Parser
//!
//! Turns the token stream into a Rowan tree in two passes. The grammar walks
//! the tokens once and records [`Event`]s; [`sink::build`] replays them
//! into a green tree. Nothing recurses: open elements live on an explicit
//! stack, so input nesting depth costs heap, never call stack.
//!
//! ## Tolerance
//!
//! Clipboard HTML is messy and parsing never fails:
//!
//! - unclosed elements are closed at end of input
//! - an end tag closes the nearest open element with the same name, closing
//!   everything opened inside it implicitly
//! - an end tag with no matching open element becomes an `ERROR` node
//! - void elements (`br`, `img`, ...) and `/>` never take children
//! - past [`MAX_DEPTH`] open elements, start tags stop nesting and become
//!   empty elements in place
//!
//! ```
//! use notekit_syntax::parse;
//!
//! let tree = parse("<p>Hello</p>");
//! assert_eq!(tree.text().to_string(), "<p>Hello</p>");
//! ```

mod event;
mod grammar;
mod sink;

pub use grammar::{MAX_DEPTH, VOID_ELEMENTS, is_void_element};
pub(crate) use grammar::tag_name;

use crate::lexer::{Token, lex};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;

/// Cursor over the tokens plus the events recorded so far.
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    events: Vec<Event>,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
        }
    }

    pub fn parse(mut self) -> SyntaxNode {
        grammar::root(&mut self);
        sink::build(self.tokens, &self.events)
    }

    /// Open a node; every token bumped until [`OpenNode::close`] lands in it.
    pub fn open(&mut self, kind: SyntaxKind) -> OpenNode {
        self.events.push(Event::Open(kind));
        OpenNode { kind }
    }

    /// Kind of the current token, `EOF` past the end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        let hit = self.at(kind);
        if hit {
            self.bump();
        }
        hit
    }

    /// Move the current token into the innermost open node.
    pub fn bump(&mut self) {
        if !self.at_end() {
            self.events.push(Event::Token);
            self.pos += 1;
        }
    }

    pub fn current_text(&self) -> &'input str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }
}

/// A node the grammar has opened. Close nodes innermost first.
#[must_use = "an opened node has to be closed"]
#[derive(Debug)]
pub struct OpenNode {
    kind: SyntaxKind,
}

impl OpenNode {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn close(self, p: &mut Parser<'_, '_>) {
        p.events.push(Event::Close);
    }
}

/// Parse HTML source into a syntax tree.
pub fn parse(source: &str) -> SyntaxNode {
    let tokens = lex(source);
    Parser::new(&tokens).parse()
}
