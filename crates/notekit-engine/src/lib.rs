pub mod card;
pub mod change;
pub mod clipboard;
pub mod command;
pub mod dom;
pub mod editor;
pub mod error;
pub mod event;
pub mod history;
pub mod paste;
pub mod plugin;
pub mod range;
pub mod scheduler;

// Re-export key types for easier usage
pub use card::{ActivateKind, Activation, Capability, Card, CardManager, CardState, CardType, IdCache};
pub use change::Change;
pub use clipboard::{Clipboard, MemoryClipboard};
pub use command::{Command, CommandRegistry};
pub use dom::{NodeId, NodeMut, NodeRef, Tree};
pub use editor::Editor;
pub use error::{EngineError, Result};
pub use event::{EditorEvent, EventBus, EventKind, ListenerId};
pub use history::{History, Snapshot};
pub use paste::{BasicSchema, Normalizer, PasteEvent, PasteFile, Schema};
pub use plugin::{HrPlugin, Plugin, PluginRegistry};
pub use range::{Bookmark, BookmarkScope, Point, Range};
