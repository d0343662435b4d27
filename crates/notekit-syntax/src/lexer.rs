//! # Lexer - Tokenizing HTML Source
//!
//! This module provides the first stage of parsing: breaking source text into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! **Every byte in the input appears in exactly one token**. We never skip or
//! discard characters, even for malformed markup:
//!
//! ```
//! use notekit_syntax::lexer::lex;
//!
//! let input = "<p class=\"a\">Hello <b>world</b></p>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Two Lexing Modes
//!
//! HTML is context sensitive: `=` or `"` are plain text between tags but
//! structural inside them. The lexer runs two Logos token sets and switches
//! between them with [`logos::Lexer::morph`]:
//!
//! - [`ContentToken`] between tags: text runs, `<name`, `</name`, comments,
//!   declarations
//! - [`TagToken`] inside a tag, after `<name` or `</name` and up to the
//!   closing `>` or `/>`: names, `=`, quoted values, whitespace
//!
//! A `<` that does not start a tag stays character data.
//!
//! ## Public API
//!
//! - [`lex`] - Tokenize input, returning `Vec<Token>`
//! - [`lex_with_spans`] - Tokenize with byte offset spans
//! - [`Token`] - A token with its kind and text slice

use logos::{Lexer, Logos};

use crate::syntax_kind::SyntaxKind;

/// Tokens recognised between tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentToken {
    /// Character data up to the next `<`
    #[regex(r"[^<]+")]
    Text,

    /// `<name`
    #[regex(r"<[a-zA-Z][a-zA-Z0-9:_-]*")]
    TagOpen,

    /// `</name`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_-]*")]
    EndTagOpen,

    /// `<!-- ... -->`, running to end of input when unterminated
    #[token("<!--", comment)]
    Comment,

    /// `<!DOCTYPE ...>`
    #[regex(r"<![a-zA-Z][^>]*>")]
    /// `<?xml ...?>`
    #[regex(r"<\?[^>]*>")]
    Declaration,
}

fn comment(lex: &mut Lexer<ContentToken>) -> bool {
    let rest = lex.remainder();
    let len = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
    lex.bump(len);
    true
}

impl ContentToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            ContentToken::Text => SyntaxKind::TEXT,
            ContentToken::TagOpen => SyntaxKind::TAG_OPEN,
            ContentToken::EndTagOpen => SyntaxKind::END_TAG_OPEN,
            ContentToken::Comment => SyntaxKind::COMMENT,
            ContentToken::Declaration => SyntaxKind::DECLARATION,
        }
    }
}

/// Tokens recognised inside a start or end tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagToken {
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    /// Attribute name or unquoted value
    #[regex(r#"[^ \t\r\n\x0C"'<>/=]+"#)]
    Name,

    #[token("=")]
    Eq,

    /// Quoted value; an unterminated quote runs to end of input
    #[regex(r#""[^"]*"?"#)]
    #[regex(r"'[^']*'?")]
    Quoted,

    #[token(">")]
    Gt,

    #[token("/>")]
    SlashGt,

    #[token("/")]
    Slash,
}

impl TagToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Name => SyntaxKind::NAME,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::Quoted => SyntaxKind::QUOTED,
            TagToken::Gt => SyntaxKind::GT,
            TagToken::SlashGt => SyntaxKind::SLASH_GT,
            TagToken::Slash => SyntaxKind::SLASH,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(input);

    while let Some(result) = content.next() {
        // Logos error means an unrecognized `<` - treat as TEXT
        let kind = result
            .map(ContentToken::to_syntax_kind)
            .unwrap_or(SyntaxKind::TEXT);
        tokens.push((
            Token {
                kind,
                text: content.slice(),
            },
            content.span(),
        ));

        if matches!(kind, SyntaxKind::TAG_OPEN | SyntaxKind::END_TAG_OPEN) {
            let mut tag = content.morph::<TagToken>();
            while let Some(result) = tag.next() {
                let kind = result
                    .map(TagToken::to_syntax_kind)
                    .unwrap_or(SyntaxKind::TEXT);
                tokens.push((
                    Token {
                        kind,
                        text: tag.slice(),
                    },
                    tag.span(),
                ));
                if kind.is_tag_close() {
                    break;
                }
            }
            content = tag.morph();
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn token(kind: SyntaxKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_text() {
        assert_eq!(lex("hello = \"x\""), vec![token(SyntaxKind::TEXT, "hello = \"x\"")]);
    }

    #[test]
    fn lex_simple_element() {
        assert_eq!(
            lex("<p>hi</p>"),
            vec![
                token(SyntaxKind::TAG_OPEN, "<p"),
                token(SyntaxKind::GT, ">"),
                token(SyntaxKind::TEXT, "hi"),
                token(SyntaxKind::END_TAG_OPEN, "</p"),
                token(SyntaxKind::GT, ">"),
            ]
        );
    }

    #[test]
    fn lex_attributes() {
        assert_eq!(
            lex("<a href='x' data-id=b1 hidden>"),
            vec![
                token(SyntaxKind::TAG_OPEN, "<a"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::NAME, "href"),
                token(SyntaxKind::EQ, "="),
                token(SyntaxKind::QUOTED, "'x'"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::NAME, "data-id"),
                token(SyntaxKind::EQ, "="),
                token(SyntaxKind::NAME, "b1"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::NAME, "hidden"),
                token(SyntaxKind::GT, ">"),
            ]
        );
    }

    #[test]
    fn lex_self_closing() {
        assert_eq!(
            lex("<br/>x"),
            vec![
                token(SyntaxKind::TAG_OPEN, "<br"),
                token(SyntaxKind::SLASH_GT, "/>"),
                token(SyntaxKind::TEXT, "x"),
            ]
        );
    }

    #[test]
    fn lex_comment_and_doctype() {
        assert_eq!(
            lex("<!DOCTYPE html><!-- a <b> -->t"),
            vec![
                token(SyntaxKind::DECLARATION, "<!DOCTYPE html>"),
                token(SyntaxKind::COMMENT, "<!-- a <b> -->"),
                token(SyntaxKind::TEXT, "t"),
            ]
        );
    }

    #[test]
    fn lex_stray_angle_bracket_is_text() {
        let kinds: Vec<_> = lex("1 < 2").into_iter().map(|t| t.kind).collect();
        assert!(kinds.iter().all(|k| *k == SyntaxKind::TEXT));
    }

    #[rstest]
    #[case("<p class=\"unterminated>text")]
    #[case("<!-- never closed")]
    #[case("<div <b>x</b>")]
    #[case("</>")]
    #[case("a < b > c")]
    fn lex_is_lossless_on_malformed_input(#[case] input: &str) {
        let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
        assert_eq!(reconstructed, input);
    }

    #[test]
    fn lex_spans_cover_input() {
        let input = "<i>a</i>";
        let spans: Vec<_> = lex_with_spans(input).into_iter().map(|(_, s)| s).collect();
        assert_eq!(spans, vec![0..2, 2..3, 3..4, 4..7, 7..8]);
    }
}
