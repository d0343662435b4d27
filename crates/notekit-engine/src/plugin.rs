//! Editor plugins.
//!
//! A plugin bundles setup (cards, commands, listeners) behind a name. The
//! editor drives its lifecycle: `on_install`, `initialize`, `on_enable`,
//! then `on_ready` once the host finishes setup; `on_disable`/`on_enable`
//! as it is toggled; `destroy` and `on_destroy` on uninstall or teardown.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::card::HrCard;
use crate::command::Command;
use crate::editor::Editor;
use crate::error::{EngineError, Result};

pub trait Plugin {
    fn name(&self) -> &'static str;

    fn default_options(&self) -> Value {
        Value::Null
    }

    fn initialize(&mut self, _editor: &mut Editor, _options: &Value) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self, _editor: &mut Editor, _args: &[Value]) -> Result<Value> {
        Ok(Value::Null)
    }

    fn query_state(&self, _editor: &Editor) -> bool {
        false
    }

    fn query_value(&self, _editor: &Editor) -> Value {
        Value::Null
    }

    fn destroy(&mut self, _editor: &mut Editor) {}

    fn on_install(&mut self, _editor: &mut Editor) {}
    fn on_enable(&mut self, _editor: &mut Editor) {}
    fn on_disable(&mut self, _editor: &mut Editor) {}
    fn on_ready(&mut self, _editor: &mut Editor) {}
    fn on_destroy(&mut self, _editor: &mut Editor) {}
}

/// Options given at install time layered over the plugin's defaults. Only
/// objects merge; any other value replaces the defaults outright.
pub fn merge_options(defaults: Value, options: Option<Value>) -> Value {
    match (defaults, options) {
        (Value::Object(mut base), Some(Value::Object(extra))) => {
            for (key, value) in extra {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (defaults, None) => defaults,
        (_, Some(options)) => options,
    }
}

pub(crate) struct PluginSlot {
    pub plugin: Box<dyn Plugin>,
    pub options: Value,
    pub enabled: bool,
}

#[derive(Default)]
pub struct PluginRegistry {
    slots: BTreeMap<String, PluginSlot>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(|s| s.enabled)
    }

    pub fn options(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).map(|s| &s.options)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.slots.get(name).map(|s| s.plugin.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn take(&mut self, name: &str) -> Result<PluginSlot> {
        self.slots
            .remove(name)
            .ok_or_else(|| EngineError::UnknownPlugin(name.to_string()))
    }

    pub(crate) fn put_back(&mut self, name: &str, slot: PluginSlot) {
        self.slots.entry(name.to_string()).or_insert(slot);
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============ Horizontal rule plugin ============

/// Hook names in the order they ran.
pub type HookLog = Rc<RefCell<Vec<&'static str>>>;

/// Registers the `hr` card and an `hr` command that inserts one.
#[derive(Debug, Default)]
pub struct HrPlugin {
    log: HookLog,
}

impl HrPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every hook call into `log`.
    pub fn with_log(log: HookLog) -> Self {
        Self { log }
    }

    fn record(&self, hook: &'static str) {
        self.log.borrow_mut().push(hook);
    }
}

struct HrCommand;

impl Command for HrCommand {
    fn execute(&mut self, editor: &mut Editor, _args: &[Value]) -> Result<Value> {
        editor.insert_card("hr", Value::Null).map(Value::String)
    }

    fn query_state(&self, editor: &Editor) -> bool {
        active_hr(editor)
    }

    fn description(&self) -> &'static str {
        "Insert a horizontal rule"
    }

    fn hotkey(&self) -> Option<&'static str> {
        Some("mod+shift+e")
    }
}

fn active_hr(editor: &Editor) -> bool {
    let cards = editor.cards();
    cards.active().and_then(|id| cards.key(id)) == Some("hr")
}

impl Plugin for HrPlugin {
    fn name(&self) -> &'static str {
        "hr"
    }

    fn default_options(&self) -> Value {
        serde_json::json!({ "hotkey": "mod+shift+e" })
    }

    fn initialize(&mut self, editor: &mut Editor, _options: &Value) -> Result<()> {
        self.record("initialize");
        editor.cards_mut().register("hr", |_| Box::new(HrCard));
        editor.register_command("hr", Box::new(HrCommand));
        Ok(())
    }

    fn execute(&mut self, editor: &mut Editor, args: &[Value]) -> Result<Value> {
        self.record("execute");
        editor.command("hr", args)
    }

    fn query_state(&self, editor: &Editor) -> bool {
        active_hr(editor)
    }

    fn query_value(&self, editor: &Editor) -> Value {
        let cards = editor.cards();
        cards
            .active()
            .filter(|id| cards.key(id) == Some("hr"))
            .map(|id| Value::String(id.to_string()))
            .unwrap_or(Value::Null)
    }

    fn destroy(&mut self, editor: &mut Editor) {
        self.record("destroy");
        editor.cards_mut().unregister("hr");
        editor.unregister_command("hr");
    }

    fn on_install(&mut self, _editor: &mut Editor) {
        self.record("on_install");
    }

    fn on_enable(&mut self, _editor: &mut Editor) {
        self.record("on_enable");
    }

    fn on_disable(&mut self, _editor: &mut Editor) {
        self.record("on_disable");
    }

    fn on_ready(&mut self, _editor: &mut Editor) {
        self.record("on_ready");
    }

    fn on_destroy(&mut self, _editor: &mut Editor) {
        self.record("on_destroy");
    }
}
