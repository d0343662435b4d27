//! Named editor commands.
//!
//! A command is looked up by name and run against the whole [`Editor`].
//! While it runs it is taken out of the registry, so a command may itself
//! call [`Editor::command`] for other commands.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::editor::Editor;
use crate::error::{EngineError, Result};

pub trait Command {
    fn execute(&mut self, editor: &mut Editor, args: &[Value]) -> Result<Value>;

    /// Whether the command's effect is on at the current selection (e.g. a
    /// toggled mark).
    fn query_state(&self, _editor: &Editor) -> bool {
        false
    }

    fn query_enabled(&self, editor: &Editor) -> bool {
        !editor.is_readonly()
    }

    fn description(&self) -> &'static str {
        ""
    }

    fn hotkey(&self) -> Option<&'static str> {
        None
    }
}

pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Registry holding the built-in commands.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("undo", Box::new(UndoCommand));
        registry.register("redo", Box::new(RedoCommand));
        registry.register("delete", Box::new(DeleteCommand));
        registry.register("copy", Box::new(CopyCommand));
        registry.register("insert-card", Box::new(InsertCardCommand));
        registry
    }

    pub fn empty() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Add or replace a command.
    pub fn register(&mut self, name: &str, command: Box<dyn Command>) {
        if self.commands.insert(name.to_string(), command).is_some() {
            log::debug!("command {name} replaced");
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Take a command out for the duration of a run.
    pub(crate) fn take(&mut self, name: &str) -> Result<Box<dyn Command>> {
        self.commands
            .remove(name)
            .ok_or_else(|| EngineError::UnknownCommand(name.to_string()))
    }

    /// Put a taken command back, unless it was re-registered meanwhile.
    pub(crate) fn put_back(&mut self, name: &str, command: Box<dyn Command>) {
        self.commands.entry(name.to_string()).or_insert(command);
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============ Built-in commands ============

pub struct UndoCommand;

impl Command for UndoCommand {
    fn execute(&mut self, editor: &mut Editor, _args: &[Value]) -> Result<Value> {
        Ok(Value::Bool(editor.undo()))
    }

    fn query_enabled(&self, editor: &Editor) -> bool {
        !editor.is_readonly() && editor.can_undo()
    }

    fn description(&self) -> &'static str {
        "Undo the last edit"
    }

    fn hotkey(&self) -> Option<&'static str> {
        Some("mod+z")
    }
}

pub struct RedoCommand;

impl Command for RedoCommand {
    fn execute(&mut self, editor: &mut Editor, _args: &[Value]) -> Result<Value> {
        Ok(Value::Bool(editor.redo()))
    }

    fn query_enabled(&self, editor: &Editor) -> bool {
        !editor.is_readonly() && editor.can_redo()
    }

    fn description(&self) -> &'static str {
        "Redo the last undone edit"
    }

    fn hotkey(&self) -> Option<&'static str> {
        Some("mod+shift+z")
    }
}

pub struct DeleteCommand;

impl Command for DeleteCommand {
    fn execute(&mut self, editor: &mut Editor, _args: &[Value]) -> Result<Value> {
        editor.delete_content()?;
        Ok(Value::Null)
    }

    fn query_enabled(&self, editor: &Editor) -> bool {
        !editor.is_readonly() && !editor.range().is_collapsed()
    }

    fn description(&self) -> &'static str {
        "Delete the selection"
    }
}

/// Copy the selection. Evaluates to `false` when there is no clipboard or
/// the host refused the write.
pub struct CopyCommand;

impl Command for CopyCommand {
    fn execute(&mut self, editor: &mut Editor, _args: &[Value]) -> Result<Value> {
        Ok(Value::Bool(editor.copy()))
    }

    fn query_enabled(&self, editor: &Editor) -> bool {
        !editor.range().is_collapsed()
    }

    fn description(&self) -> &'static str {
        "Copy the selection"
    }

    fn hotkey(&self) -> Option<&'static str> {
        Some("mod+c")
    }
}

/// `insert-card <key> [value]`: evaluates to the new card's id.
pub struct InsertCardCommand;

impl Command for InsertCardCommand {
    fn execute(&mut self, editor: &mut Editor, args: &[Value]) -> Result<Value> {
        let key = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::UnknownCard(String::new()))?;
        let value = args.get(1).cloned().unwrap_or(Value::Null);
        editor.insert_card(key, value).map(Value::String)
    }

    fn description(&self) -> &'static str {
        "Insert a card"
    }
}
