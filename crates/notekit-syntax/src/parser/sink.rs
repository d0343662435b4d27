//! Replays parser events into a Rowan green tree.

use rowan::GreenNodeBuilder;

use crate::lexer::Token;
use crate::parser::event::Event;
use crate::syntax_kind::SyntaxNode;

pub fn build(tokens: &[Token<'_>], events: &[Event]) -> SyntaxNode {
    let mut builder = GreenNodeBuilder::new();
    let mut tokens = tokens.iter();
    for event in events {
        match event {
            Event::Open(kind) => builder.start_node((*kind).into()),
            Event::Token => {
                if let Some(token) = tokens.next() {
                    builder.token(token.kind.into(), token.text);
                }
            }
            Event::Close => builder.finish_node(),
        }
    }
    SyntaxNode::new_root(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::syntax_kind::SyntaxKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokens_keep_lexer_kinds() {
        let tokens = lex("<br>");
        let events = [
            Event::Open(SyntaxKind::ROOT),
            Event::Open(SyntaxKind::ELEMENT),
            Event::Token,
            Event::Token,
            Event::Close,
            Event::Close,
        ];

        let tree = build(&tokens, &events);

        let element = tree.first_child().unwrap();
        assert_eq!(element.kind(), SyntaxKind::ELEMENT);
        let kinds: Vec<_> = element
            .children_with_tokens()
            .map(|t| t.kind())
            .collect();
        assert_eq!(kinds, vec![SyntaxKind::TAG_OPEN, SyntaxKind::GT]);
        assert_eq!(tree.text().to_string(), "<br>");
    }
}
