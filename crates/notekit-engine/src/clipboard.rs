//! Clipboard adapter. The host owns the real clipboard; the engine only
//! hands it serialized content.

pub trait Clipboard {
    /// Offer `html` with a `text` fallback. Returns `false` when the host
    /// refused the write.
    fn write(&mut self, html: &str, text: &str) -> bool;
}

/// In-process clipboard, for tests and headless hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub html: Option<String>,
    pub text: Option<String>,
    /// Refuse every write when set.
    pub deny: bool,
}

impl Clipboard for MemoryClipboard {
    fn write(&mut self, html: &str, text: &str) -> bool {
        if self.deny {
            return false;
        }
        self.html = Some(html.to_string());
        self.text = Some(text.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        assert!(clipboard.write("<p>a</p>", "a"));
        assert_eq!(clipboard.html.as_deref(), Some("<p>a</p>"));

        clipboard.deny = true;
        assert!(!clipboard.write("<p>b</p>", "b"));
        assert_eq!(clipboard.text.as_deref(), Some("a"));
    }
}
