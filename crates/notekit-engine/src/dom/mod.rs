/*!
 * Document tree and the node facade every editing algorithm goes through.
 *
 * - `tree`: arena storage and raw structural primitives
 * - `node`: `NodeRef`/`NodeMut`/`NodesMut` handles with classification
 *   predicates and chainable mutation
 * - `schema`: tag tables (block, inline, mark, void, ...)
 * - `selector`: the `closest`/`find` selector language
 * - `style`: inline style parsing and color normalization
 * - `html`: HTML value parsing and serialization
 */

pub mod html;
pub mod node;
pub mod schema;
pub mod selector;
pub mod style;
pub mod tree;

pub use node::{NodeMut, NodeRef, NodesMut};
pub use tree::{ElementData, NodeId, NodeKind, Tree};

/// Marks structural engine elements: the editable root and bookmark markers.
pub const DATA_ELEMENT: &str = "data-element";
pub const ROOT_ELEMENT: &str = "root";

pub const CARD_TYPE: &str = "data-card-type";
pub const CARD_KEY: &str = "data-card-key";
pub const CARD_VALUE: &str = "data-card-value";
pub const CARD_ID: &str = "data-id";
/// Tags the inner parts of a rendered card: `body|left|right|center|toolbar`.
pub const CARD_ELEMENT: &str = "data-card-element";

/// Nesting level of a flat list.
pub const INDENT: &str = "data-indent";
pub const CONTENT_EDITABLE: &str = "contenteditable";

/// `data-element` values of transient bookmark markers.
pub const BOOKMARK_ANCHOR: &str = "anchor";
pub const BOOKMARK_FOCUS: &str = "focus";
pub const BOOKMARK_CURSOR: &str = "cursor";

/// Zero-width space used as caret filler next to cards.
pub const ZWSP: &str = "\u{200B}";
pub const ZWSP_CHAR: char = '\u{200B}';
