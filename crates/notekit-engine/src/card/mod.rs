/*!
 * # Cards
 *
 * A card is an opaque widget occupying one atomic node of the document.
 * The document only ever stores the card root with its reserved
 * attributes; the rendered internals are rebuilt by [`CardManager`] from
 * the encoded value.
 *
 * Rendered layout:
 *
 * ```text
 * root[data-card-type, data-card-key, data-card-value, data-id]
 * └── body
 *     ├── left      (focusable cards: caret anchor)
 *     ├── center    (the card's own content)
 *     ├── right     (focusable cards: caret anchor)
 *     └── toolbar   (cards with the Toolbar capability)
 * ```
 *
 * Behaviour is declared through [`Capability`] flags, which the manager
 * checks before each operation. Most hooks on [`Card`] have a no-op default.
 */

pub mod builtin;
pub mod manager;
pub mod toolbar;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde_json::Value;

use crate::dom::{NodeId, Tree};
use crate::error::EngineError;

pub use builtin::{HrCard, ImageCard, ImageValue};
pub use manager::{ActivateKind, Activation, CardManager, CardState, IdCache};
pub use toolbar::{ToolbarItem, ToolbarOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardType {
    Inline,
    Block,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Inline => "inline",
            CardType::Block => "block",
        }
    }

    /// Tag used for the root and its parts.
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            CardType::Inline => "span",
            CardType::Block => "div",
        }
    }
}

impl FromStr for CardType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(CardType::Inline),
            "block" => Ok(CardType::Block),
            other => Err(EngineError::InvalidCardType(other.to_string())),
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Reacts to activation (click or keyboard focus).
    Activatable,
    /// Can be selected as a whole.
    Selectable,
    /// Takes a new width through [`CardManager::resize`].
    Resizable,
    /// Shows a toolbar while active.
    Toolbar,
    /// Wants native focus: gets left/right caret anchors.
    Focusable,
    /// Center content is editable.
    Editable,
    /// Honors the `Maximize` and `Expand` toolbar actions.
    Maximizable,
    /// Honors the `Collapse` and `Expand` toolbar actions.
    Collapsible,
}

/// A card component. One instance backs one rendered card.
pub trait Card {
    fn card_type(&self) -> CardType;

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Current value, written to `data-card-value` on serialization.
    fn value(&self) -> Value;

    /// Take a new value. The manager re-encodes and re-renders afterwards.
    fn set_value(&mut self, value: Value);

    /// Build the card's content under `center`.
    fn render(&mut self, tree: &mut Tree, center: NodeId);

    fn toolbar(&self) -> Vec<ToolbarItem> {
        vec![ToolbarItem::Dnd, ToolbarItem::Copy, ToolbarItem::Delete]
    }

    fn activate(&mut self, _tree: &mut Tree, _root: NodeId) {}

    fn deactivate(&mut self, _tree: &mut Tree, _root: NodeId) {}

    fn select(&mut self, _tree: &mut Tree, _root: NodeId, _selected: bool) {}

    fn focus(&mut self, _tree: &mut Tree, _root: NodeId, _focused: bool) {}

    /// Only called on [`Capability::Resizable`] cards.
    fn resize(&mut self, _width: u32) {}

    fn maximize(&mut self, _tree: &mut Tree, _root: NodeId) {}

    fn collapse(&mut self, _tree: &mut Tree, _root: NodeId) {}

    fn expand(&mut self, _tree: &mut Tree, _root: NodeId) {}

    /// A `Custom` toolbar action.
    fn action(&mut self, _tree: &mut Tree, _root: NodeId, _name: &str) {}

    fn destroy(&mut self) {}
}

/// Builds a card instance from its decoded value.
pub type CardFactory = Rc<dyn Fn(Value) -> Box<dyn Card>>;

const VALUE_PREFIX: &str = "data:";

/// `data:` followed by the percent-encoded JSON of `value`.
pub fn encode_value(value: &Value) -> String {
    format!("{VALUE_PREFIX}{}", urlencoding::encode(&value.to_string()))
}

/// Inverse of [`encode_value`]. Lenient: a missing prefix, bad escapes or
/// non-JSON payloads decode to a JSON string of whatever was there.
pub fn decode_value(encoded: &str) -> Value {
    let payload = encoded.strip_prefix(VALUE_PREFIX).unwrap_or(encoded);
    let decoded = urlencoding::decode(payload)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| payload.to_string());
    if decoded.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&decoded).unwrap_or(Value::String(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("inline", CardType::Inline)]
    #[case("block", CardType::Block)]
    fn test_card_type_parse(#[case] input: &str, #[case] expected: CardType) {
        assert_eq!(input.parse::<CardType>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn test_invalid_card_type() {
        let err = "float".parse::<CardType>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidCardType(ref t) if t == "float"));
        assert_eq!(err.to_string(), "Invalid card type: float");
    }

    #[test]
    fn test_value_encoding() {
        let value = json!({"src": "a b.png", "n": 1});
        let encoded = encode_value(&value);

        assert!(encoded.starts_with("data:%7B"));
        assert!(!encoded.contains(' '));
        assert_eq!(decode_value(&encoded), value);
    }

    #[rstest]
    #[case("data:not%20json", json!("not json"))]
    #[case("plain", json!("plain"))]
    #[case("%7B%22a%22%3A1%7D", json!({"a": 1}))]
    #[case("data:", Value::Null)]
    fn test_lenient_decoding(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(decode_value(input), expected);
    }
}
