//! Parser events.
//!
//! The grammar does not touch Rowan. It records what it saw as a flat list
//! and [`build`](super::sink::build) replays the list afterwards:
//!
//! ```text
//! Open(ELEMENT)
//!   Open(START_TAG)
//!     Token            "<p"
//!     Token            ">"
//!   Close
//!   Token              "hi"
//! Close
//! ```
//!
//! Opens and closes balance. Each `Token` takes the next lexer token, so
//! the tree covers the input byte for byte.

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Open(SyntaxKind),
    /// The next lexer token, under its own kind.
    Token,
    Close,
}
