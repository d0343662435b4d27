/// Errors for misuse of the engine API.
///
/// Editing primitives never return these: a range outside editable scope
/// degrades to a no-op. These are configuration and programming mistakes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Card not registered: {0}")]
    UnknownCard(String),
    #[error("Invalid card type: {0}")]
    InvalidCardType(String),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Card {id} is not {capability:?}")]
    MissingCapability {
        id: String,
        capability: crate::card::Capability,
    },
    #[error("Command not found: {0}")]
    UnknownCommand(String),
    #[error("Plugin already installed: {0}")]
    DuplicatePlugin(String),
    #[error("Plugin not found: {0}")]
    UnknownPlugin(String),
    #[error("No transaction is open")]
    NoTransaction,
    #[error("Editor is read-only")]
    Readonly,
    #[error("Invalid card value: {0}")]
    InvalidValue(#[from] serde_json::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
