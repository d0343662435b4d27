//! SyntaxKind enum for all tokens and nodes in the HTML CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the HTML CST.
///
/// This enum represents both tokens (lexer output) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Character data between tags
    TEXT,
    /// Whitespace inside a tag
    WHITESPACE,
    /// `<name` opening a start tag
    TAG_OPEN,
    /// `</name` opening an end tag
    END_TAG_OPEN,
    /// `<!-- ... -->`
    COMMENT,
    /// `<!DOCTYPE ...>` or `<?...>`
    DECLARATION,
    /// Attribute name or unquoted attribute value
    NAME,
    /// `=` between attribute name and value
    EQ,
    /// Quoted attribute value, quotes included
    QUOTED,
    /// `>` closing a tag
    GT,
    /// `/>` closing a self-closing tag
    SLASH_GT,
    /// Stray `/` inside a tag
    SLASH,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// An element: start tag, children, optional end tag
    ELEMENT,
    /// `<name attr="value">`
    START_TAG,
    /// `</name>`
    END_TAG,
    /// `name="value"` inside a start tag
    ATTRIBUTE,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace inside tags).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE)
    }

    /// Returns true if this token closes a start tag.
    pub fn is_tag_close(self) -> bool {
        matches!(self, Self::GT | Self::SLASH_GT)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HtmlLang {}

impl rowan::Language for HtmlLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<HtmlLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<HtmlLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<HtmlLang>;
