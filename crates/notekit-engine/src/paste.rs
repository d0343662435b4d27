/*!
 * Clipboard payload normalization.
 *
 * Pasted HTML comes from arbitrary sources. A [`Schema`] strips what the
 * document may not contain; the [`Normalizer`] then reshapes the rest into
 * the structures the change engine expects:
 *
 * 1. inline styles that repeat the editor defaults are removed, and bare
 *    `span`s left behind are unwrapped
 * 2. empty `span`s are removed
 * 3. wrappers copied out of another editor's root are unwrapped
 * 4. runs of two or more `br` split a block into paragraphs
 * 5. lists are repaired: loose `li` get a `ul`, nested lists become flat
 *    lists carrying an indent
 * 6. ordered list starts are recomputed
 */

use notekit_config::PasteConfig;

use crate::change::add_list_start_number;
use crate::dom::html::parse_fragment;
use crate::dom::style::same_value;
use crate::dom::{DATA_ELEMENT, INDENT, NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteFile {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteEvent {
    pub html: Option<String>,
    pub text: Option<String>,
    pub files: Vec<PasteFile>,
    /// Paste as plain text even when HTML is available.
    pub is_paste_text: bool,
}

/// Whitelist enforcement for parsed clipboard HTML.
pub trait Schema {
    fn sanitize(&self, tree: &mut Tree, fragment: NodeId);
}

/// Drops active content: scripts, styles, document metadata, event
/// handler attributes and `javascript:` links.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicSchema;

const DROPPED_TAGS: &[&str] = &[
    "script", "style", "meta", "link", "title", "head", "iframe", "object", "embed",
];

impl Schema for BasicSchema {
    fn sanitize(&self, tree: &mut Tree, fragment: NodeId) {
        for id in tree.descendants(fragment) {
            let Some(name) = tree.name(id) else {
                continue;
            };
            if DROPPED_TAGS.contains(&name) {
                tree.detach(id);
                continue;
            }
            let Some(element) = tree.element_mut(id) else {
                continue;
            };
            element.attrs.retain(|(name, value)| {
                let name = name.to_ascii_lowercase();
                let scripted = (name == "href" || name == "src")
                    && value.trim_start().to_ascii_lowercase().starts_with("javascript:");
                !name.starts_with("on") && !scripted
            });
        }
    }
}

/// Build a fragment from plain text: one line stays inline, several lines
/// become paragraphs (blank lines become empty paragraphs).
pub fn text_fragment(tree: &mut Tree, text: &str) -> NodeId {
    let fragment = tree.create_fragment();
    let text = text.replace("\r\n", "\n");
    let lines: Vec<&str> = text.trim_end_matches('\n').split('\n').collect();
    if lines.len() == 1 {
        if !lines[0].is_empty() {
            let node = tree.create_text(lines[0]);
            tree.append(fragment, node);
        }
        return fragment;
    }
    for line in lines {
        let p = tree.create_element("p");
        let child = if line.is_empty() {
            tree.create_element("br")
        } else {
            tree.create_text(line)
        };
        tree.append(p, child);
        tree.append(fragment, p);
    }
    fragment
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: PasteConfig,
}

impl Normalizer {
    pub fn new(config: PasteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PasteConfig {
        &self.config
    }

    /// Turn a paste payload into a normalized detached fragment. `None`
    /// when it carries neither HTML nor text.
    pub fn fragment(
        &self,
        tree: &mut Tree,
        event: &PasteEvent,
        schema: &dyn Schema,
    ) -> Option<NodeId> {
        let html = event.html.as_deref().filter(|h| !h.trim().is_empty());
        match (html, event.text.as_deref()) {
            (Some(html), _) if !event.is_paste_text => {
                let fragment = parse_fragment(tree, html);
                schema.sanitize(tree, fragment);
                self.normalize(tree, fragment);
                Some(fragment)
            }
            (_, Some(text)) => Some(text_fragment(tree, text)),
            (Some(html), None) => {
                let parsed = parse_fragment(tree, html);
                let text = tree.text_content(parsed);
                Some(text_fragment(tree, &text))
            }
            (None, None) => None,
        }
    }

    pub fn normalize(&self, tree: &mut Tree, fragment: NodeId) {
        self.strip_default_styles(tree, fragment);
        remove_empty_spans(tree, fragment);
        self.unwrap_foreign_roots(tree, fragment);
        split_br_runs(tree, fragment);
        wrap_loose_items(tree, fragment);
        flatten_lists(tree, fragment);
        renumber(tree, fragment);
        tree.normalize(fragment);
    }

    fn defaults(&self) -> [(&'static str, &str); 4] {
        [
            ("color", self.config.default_color.as_str()),
            ("background-color", self.config.default_background.as_str()),
            ("background", self.config.default_background.as_str()),
            ("font-size", self.config.default_font_size.as_str()),
        ]
    }

    fn strip_default_styles(&self, tree: &mut Tree, fragment: NodeId) {
        // Children first, so an unwrapped span's parent is still visited.
        for id in tree.descendants(fragment).into_iter().rev() {
            if tree.attr(id, "style").is_none() {
                continue;
            }
            for (prop, default) in self.defaults() {
                if let Some(value) = tree.node(id).css(prop)
                    && same_value(prop, &value, default)
                {
                    tree.node_mut(id).remove_css(prop);
                }
            }
            if tree.attr(id, "style").is_some_and(|s| s.trim().is_empty()) {
                tree.remove_attr(id, "style");
            }
            if is_bare_span(tree, id) {
                tree.unwrap(id);
            }
        }
    }

    fn unwrap_foreign_roots(&self, tree: &mut Tree, fragment: NodeId) {
        let prefix = self.config.foreign_root_prefix.as_str();
        for id in tree.descendants(fragment) {
            let foreign = !prefix.is_empty()
                && tree.attr(id, "id").is_some_and(|v| v.starts_with(prefix));
            if foreign || tree.node(id).is_root() {
                log::debug!("unwrapping pasted editor root {id}");
                tree.unwrap(id);
            }
        }
    }
}

fn is_plain_span(tree: &Tree, id: NodeId) -> bool {
    let node = tree.node(id);
    node.name() == Some("span") && !node.is_card() && tree.attr(id, DATA_ELEMENT).is_none()
}

fn is_bare_span(tree: &Tree, id: NodeId) -> bool {
    is_plain_span(tree, id) && tree.element(id).is_some_and(|e| e.attrs.is_empty())
}

fn remove_empty_spans(tree: &mut Tree, fragment: NodeId) {
    for id in tree.descendants(fragment).into_iter().rev() {
        if is_plain_span(tree, id) && tree.text_content(id).is_empty() && tree.child_count(id) == 0 {
            tree.detach(id);
        }
    }
}

fn is_blank(tree: &Tree, id: NodeId) -> bool {
    tree.text(id).is_some_and(|t| t.trim().is_empty())
}

/// Children of `container` grouped into the lines separated by runs of two
/// or more `br`. `None` when there is no such run.
fn br_segments(tree: &Tree, container: NodeId) -> Option<Vec<Vec<NodeId>>> {
    let children = tree.children(container);
    let mut segments = vec![Vec::new()];
    let mut split = false;
    let mut i = 0;
    while i < children.len() {
        let run = children[i..]
            .iter()
            .take_while(|c| tree.name(**c) == Some("br"))
            .count();
        if run >= 2 {
            segments.push(Vec::new());
            split = true;
            i += run;
        } else {
            if let Some(segment) = segments.last_mut() {
                segment.push(children[i]);
            }
            i += 1;
        }
    }
    if !split {
        return None;
    }
    segments.retain(|s| !s.iter().all(|c| is_blank(tree, *c)));
    Some(segments)
}

fn splittable(tree: &Tree, id: NodeId) -> bool {
    let node = tree.node(id);
    node.is_block() && !node.is_list() && !node.is_table() && !node.is_card()
}

fn split_br_runs(tree: &mut Tree, fragment: NodeId) {
    let top_inline = !tree.children(fragment).iter().any(|c| tree.node(*c).is_block());
    if top_inline && let Some(segments) = br_segments(tree, fragment) {
        tree.empty(fragment);
        for segment in segments {
            let p = tree.create_element("p");
            for child in segment {
                tree.append(p, child);
            }
            tree.append(fragment, p);
        }
    }

    for id in tree.descendants(fragment) {
        if !splittable(tree, id) {
            continue;
        }
        let Some(segments) = br_segments(tree, id) else {
            continue;
        };
        tree.empty(id);
        let mut segments = segments.into_iter();
        if let Some(first) = segments.next() {
            for child in first {
                tree.append(id, child);
            }
        } else {
            let br = tree.create_element("br");
            tree.append(id, br);
        }
        let mut prev = id;
        for segment in segments {
            let block = tree.clone_node(id, false);
            tree.remove_attr(block, "id");
            for child in segment {
                tree.append(block, child);
            }
            tree.insert_after(prev, block);
            prev = block;
        }
    }
}

/// Give runs of `li` outside any list a `ul`.
fn wrap_loose_items(tree: &mut Tree, fragment: NodeId) {
    let mut scopes = vec![fragment];
    scopes.extend(tree.descendants(fragment));
    for scope in scopes {
        if tree.node(scope).is_list() {
            continue;
        }
        let mut run: Option<NodeId> = None;
        for child in tree.children(scope).to_vec() {
            if tree.node(child).is_list_item() {
                let list = match run {
                    Some(list) => list,
                    None => {
                        let list = tree.create_element("ul");
                        tree.insert_before(child, list);
                        run = Some(list);
                        list
                    }
                };
                tree.append(list, child);
            } else if !is_blank(tree, child) {
                run = None;
            }
        }
    }
}

fn flatten_lists(tree: &mut Tree, fragment: NodeId) {
    let tops: Vec<NodeId> = tree
        .descendants(fragment)
        .into_iter()
        .filter(|id| {
            tree.node(*id).is_list()
                && !tree.parent(*id).is_some_and(|p| tree.node(p).is_list_item())
        })
        .collect();
    for list in tops {
        flatten(tree, list);
    }
}

/// Lift lists nested in items of `list` out to follow it, one indent level
/// deeper, splitting `list` around them. Returns the last list of the
/// resulting run.
fn flatten(tree: &mut Tree, list: NodeId) -> NodeId {
    let indent = tree.node(list).indent();
    let mut current = list;
    let mut last = list;
    for item in tree.children(list).to_vec() {
        if current != list {
            tree.append(current, item);
        }
        let nested: Vec<NodeId> = tree
            .children(item)
            .iter()
            .copied()
            .filter(|c| tree.node(*c).is_list())
            .collect();
        if nested.is_empty() {
            continue;
        }

        let mut anchor = current;
        for child in nested {
            tree.insert_after(anchor, child);
            tree.set_attr(child, INDENT, &(indent + 1).to_string());
            anchor = flatten(tree, child);
        }
        if tree.children(item).iter().all(|c| is_blank(tree, *c)) {
            tree.detach(item);
        }
        if tree.child_count(current) == 0 {
            tree.detach(current);
        }

        let rest = tree.clone_node(list, false);
        tree.remove_attr(rest, "start");
        tree.insert_after(anchor, rest);
        current = rest;
        last = anchor;
    }
    if tree.child_count(current) == 0 {
        tree.detach(current);
        last
    } else {
        current
    }
}

fn renumber(tree: &mut Tree, fragment: NodeId) {
    for id in tree.descendants(fragment) {
        if tree.name(id) == Some("ol") {
            add_list_start_number(tree, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::{SerializeOptions, inner_html};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn normalized(html: &str) -> String {
        let mut tree = Tree::new();
        let fragment = parse_fragment(&mut tree, html);
        Normalizer::default().normalize(&mut tree, fragment);
        inner_html(&tree, fragment, SerializeOptions::default())
    }

    // ============ Styles and spans ============

    #[rstest]
    #[case("<span style=\"color:#000000\">text</span>", "text")]
    #[case("<span style=\"color: rgb(0, 0, 0); font-size: 14px\">text</span>", "text")]
    #[case("<p><span style=\"color:#000\">a</span>b</p>", "<p>ab</p>")]
    #[case(
        "<span style=\"color:#000000; font-weight: bold\">text</span>",
        "<span style=\"font-weight: bold;\">text</span>"
    )]
    #[case(
        "<span class=\"x\" style=\"color:#000000\">text</span>",
        "<span class=\"x\">text</span>"
    )]
    #[case(
        "<span style=\"color:#ff0000\">text</span>",
        "<span style=\"color:#ff0000\">text</span>"
    )]
    fn test_default_styles(#[case] html: &str, #[case] expected: &str) {
        assert_eq!(normalized(html), expected);
    }

    #[test]
    fn test_empty_spans_removed() {
        assert_eq!(normalized("<p>a<span class=\"x\"></span>b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_markers_and_cards_survive() {
        let html = "<p>a<span data-card-type=\"inline\" data-card-key=\"image\"></span></p>";
        assert_eq!(normalized(html), html);
    }

    // ============ Foreign roots ============

    #[test]
    fn test_foreign_root_unwrapped() {
        assert_eq!(
            normalized("<div id=\"am-engine-12\"><p>a</p></div><div data-element=\"root\"><p>b</p></div>"),
            "<p>a</p><p>b</p>"
        );
    }

    // ============ Line breaks ============

    #[test]
    fn test_br_run_splits_paragraph() {
        assert_snapshot!(
            normalized("<p class=\"c\">a<br>b<br><br>c<br><br></p>"),
            @r#"<p class="c">a<br>b</p><p class="c">c</p>"#
        );
    }

    #[test]
    fn test_top_level_br_run_makes_paragraphs() {
        assert_eq!(normalized("a<br><br>b"), "<p>a</p><p>b</p>");
    }

    // ============ Lists ============

    #[test]
    fn test_loose_items_wrapped() {
        assert_eq!(
            normalized("<li>a</li><li>b</li><p>c</p>"),
            "<ul><li>a</li><li>b</li></ul><p>c</p>"
        );
    }

    #[test]
    fn test_nested_list_flattened() {
        assert_snapshot!(
            normalized("<ul><li>a<ul><li>b</li><li>c</li></ul></li><li>d</li></ul>"),
            @r#"<ul><li>a</li></ul><ul data-indent="1"><li>b</li><li>c</li></ul><ul><li>d</li></ul>"#
        );
    }

    #[test]
    fn test_deep_nesting_flattened() {
        assert_snapshot!(
            normalized("<ul><li>a<ul><li>b<ul><li>c</li></ul></li></ul></li></ul>"),
            @r#"<ul><li>a</li></ul><ul data-indent="1"><li>b</li></ul><ul data-indent="2"><li>c</li></ul>"#
        );
    }

    #[test]
    fn test_split_ordered_list_keeps_numbering() {
        assert_snapshot!(
            normalized("<ol><li>a</li><li>b<ol><li>x</li></ol></li><li>c</li></ol>"),
            @r#"<ol><li>a</li><li>b</li></ol><ol data-indent="1"><li>x</li></ol><ol start="3"><li>c</li></ol>"#
        );
    }

    #[test]
    fn test_item_holding_only_a_list_is_dropped() {
        assert_eq!(
            normalized("<ul><li><ul><li>x</li></ul></li></ul>"),
            "<ul data-indent=\"1\"><li>x</li></ul>"
        );
    }

    // ============ Schema ============

    #[test]
    fn test_basic_schema() {
        let mut tree = Tree::new();
        let fragment = parse_fragment(
            &mut tree,
            "<p onclick=\"x()\">a<script>bad()</script><a href=\"javascript:x\">l</a></p><style>p{}</style>",
        );
        BasicSchema.sanitize(&mut tree, fragment);
        assert_eq!(
            inner_html(&tree, fragment, SerializeOptions::default()),
            "<p>a<a>l</a></p>"
        );
    }

    // ============ Payloads ============

    #[test]
    fn test_text_fragment() {
        let mut tree = Tree::new();
        let one = text_fragment(&mut tree, "just text\n");
        assert_eq!(inner_html(&tree, one, SerializeOptions::default()), "just text");

        let many = text_fragment(&mut tree, "a\r\n\r\nb");
        assert_eq!(
            inner_html(&tree, many, SerializeOptions::default()),
            "<p>a</p><p><br></p><p>b</p>"
        );
    }

    #[test]
    fn test_fragment_prefers_html() {
        let mut tree = Tree::new();
        let normalizer = Normalizer::default();
        let event = PasteEvent {
            html: Some("<b>bold</b>".to_string()),
            text: Some("bold".to_string()),
            ..Default::default()
        };

        let html = normalizer.fragment(&mut tree, &event, &BasicSchema).unwrap();
        assert_eq!(inner_html(&tree, html, SerializeOptions::default()), "<b>bold</b>");

        let as_text = PasteEvent {
            is_paste_text: true,
            ..event
        };
        let text = normalizer.fragment(&mut tree, &as_text, &BasicSchema).unwrap();
        assert_eq!(inner_html(&tree, text, SerializeOptions::default()), "bold");

        assert!(normalizer.fragment(&mut tree, &PasteEvent::default(), &BasicSchema).is_none());
    }
}
