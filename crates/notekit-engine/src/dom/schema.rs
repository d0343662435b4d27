//! Tag classification tables.
//!
//! Names are matched lowercase. Cards are classified by their reserved
//! attributes in [`crate::dom::node`], not here.

pub const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre",
    "table", "thead", "tbody", "tfoot", "tr", "td", "th", "hr", "section", "article", "header",
    "footer", "nav", "aside", "figure", "dl", "dt", "dd",
];

pub const INLINE_TAGS: &[&str] = &["a", "br", "img", "input", "wbr"];

pub const MARK_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "strike", "del", "ins", "span", "code", "sup", "sub",
    "mark", "font", "small", "big", "kbd", "q", "cite", "abbr",
];

pub const TABLE_TAGS: &[&str] = &[
    "table", "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "colgroup", "col",
];

/// Blocks whose children are structural (items, rows) rather than content.
pub const SOLID_TAGS: &[&str] = &["ul", "ol", "table", "thead", "tbody", "tfoot", "tr"];

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

pub const LIST_TAGS: &[&str] = &["ul", "ol"];

fn one_of(table: &[&str], name: &str) -> bool {
    table.contains(&name)
}

pub fn is_block_tag(name: &str) -> bool {
    one_of(BLOCK_TAGS, name)
}

pub fn is_inline_tag(name: &str) -> bool {
    one_of(INLINE_TAGS, name)
}

pub fn is_mark_tag(name: &str) -> bool {
    one_of(MARK_TAGS, name)
}

pub fn is_void_tag(name: &str) -> bool {
    notekit_syntax::is_void_element(name)
}

pub fn is_table_tag(name: &str) -> bool {
    one_of(TABLE_TAGS, name)
}

pub fn is_solid_tag(name: &str) -> bool {
    one_of(SOLID_TAGS, name)
}

pub fn is_heading_tag(name: &str) -> bool {
    one_of(HEADING_TAGS, name)
}

pub fn is_list_tag(name: &str) -> bool {
    one_of(LIST_TAGS, name)
}

/// Whether a `parent` block may directly contain a `child` block.
///
/// Lists take only items; items, paragraphs and headings take no blocks.
/// Containers (`div`, `blockquote`, table cells) take anything.
pub fn accepts_block(parent: &str, child: &str) -> bool {
    match parent {
        "ul" | "ol" => child == "li",
        "table" => matches!(child, "thead" | "tbody" | "tfoot" | "tr" | "caption" | "colgroup"),
        "thead" | "tbody" | "tfoot" => child == "tr",
        "tr" => matches!(child, "td" | "th"),
        "div" | "blockquote" | "td" | "th" | "section" | "article" | "header" | "footer"
        | "nav" | "aside" | "figure" => child != "li",
        _ => false,
    }
}
