//! A small selector language for `closest` and `find`.
//!
//! Supported: `tag`, `*`, `.class`, `[attr]`, `[attr=value]` (value may be
//! quoted), compounds of those (`ol.todo[data-indent=1]`) and comma lists.
//! Combinators are not supported.

use super::tree::{NodeId, Tree};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse a selector. Unparseable parts make the whole alternative match
    /// nothing rather than everything.
    pub fn parse(input: &str) -> Self {
        let alternatives = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(parse_compound)
            .collect();
        Self { alternatives }
    }

    pub fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        let Some(element) = tree.element(id) else {
            return false;
        };
        self.alternatives.iter().any(|c| {
            c.tag.as_ref().is_none_or(|t| *t == element.name)
                && c.classes.iter().all(|class| {
                    element
                        .get("class")
                        .is_some_and(|list| list.split_whitespace().any(|c| c == class))
                })
                && c.attrs.iter().all(|(name, value)| match value {
                    Some(v) => element.get(name) == Some(v.as_str()),
                    None => element.get(name).is_some(),
                })
        })
    }
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = input;

    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '*'))
        .unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if tag != "*" {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_len..];
    }

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let len = after
                .find(|c: char| c == '.' || c == '[')
                .unwrap_or(after.len());
            if len == 0 {
                return None;
            }
            compound.classes.push(after[..len].to_string());
            rest = &after[len..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']')?;
            let body = &after[..close];
            let attr = match body.split_once('=') {
                Some((name, value)) => (
                    name.trim().to_ascii_lowercase(),
                    Some(value.trim().trim_matches(['"', '\'']).to_string()),
                ),
                None => (body.trim().to_ascii_lowercase(), None),
            };
            compound.attrs.push(attr);
            rest = &after[close + 1..];
        } else {
            return None;
        }
    }

    Some(compound)
}
