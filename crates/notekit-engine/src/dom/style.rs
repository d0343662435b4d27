//! Inline `style` attribute helpers.

use regex::Regex;
use std::sync::OnceLock;

static RGB_REGEX: OnceLock<Regex> = OnceLock::new();

fn rgb_regex() -> &'static Regex {
    RGB_REGEX.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9.]+)\s*)?\)$")
            .expect("Invalid rgb regex")
    })
}

/// Parse `a: b; c: d` into ordered pairs. Property names are lowercased,
/// values trimmed; malformed entries are dropped.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            (!prop.is_empty() && !value.is_empty()).then(|| (prop, value.to_string()))
        })
        .collect()
}

pub fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(p, v)| format!("{p}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical `#rrggbb` form of a CSS color, when it has one. Fully
/// transparent colors and unknown keywords give `None`.
pub fn normalize_color(color: &str) -> Option<String> {
    let color = color.trim().to_ascii_lowercase();
    if let Some(hex) = color.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => Some(hex.chars().flat_map(|c| [c, c]).collect::<String>()),
            6 => Some(hex.to_string()),
            _ => None,
        }
        .map(|h| format!("#{h}"));
    }
    if let Some(caps) = rgb_regex().captures(&color) {
        if let Some(alpha) = caps.get(4)
            && alpha.as_str().parse::<f32>().ok()? <= 0.0
        {
            return None;
        }
        let channel = |i: usize| -> Option<u8> { caps.get(i)?.as_str().parse::<u8>().ok() };
        return Some(format!(
            "#{:02x}{:02x}{:02x}",
            channel(1)?,
            channel(2)?,
            channel(3)?
        ));
    }
    match color.as_str() {
        "black" => Some("#000000".to_string()),
        "white" => Some("#ffffff".to_string()),
        "red" => Some("#ff0000".to_string()),
        _ => None,
    }
}

/// Whether two CSS values mean the same thing for the given property.
pub fn same_value(prop: &str, a: &str, b: &str) -> bool {
    let is_color = prop == "color" || prop.starts_with("background");
    if is_color && let (Some(a), Some(b)) = (normalize_color(a), normalize_color(b)) {
        return a == b;
    }
    a.trim().eq_ignore_ascii_case(b.trim())
}
