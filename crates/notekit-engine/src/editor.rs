/*!
 * The editor: one owning context for a document and everything that acts
 * on it.
 *
 * `Editor` holds the tree, the editable root, the current selection, the
 * card manager, history, command and plugin registries, the event bus and
 * the clipboard adapter. Subsystems never point back at it; commands and
 * plugins receive it by `&mut` for the length of a call.
 *
 * ## Edits
 *
 * Every mutating entry point runs inside a history batch: the state before
 * is captured, the change engine runs, and the batch commits. A commit
 * sweeps detached cards and emits [`EditorEvent::Change`]. Typing is the
 * exception: keystrokes extend one open batch that commits after a quiet
 * period (see [`Editor::tick`]) or when any other edit starts.
 *
 * ## Readonly
 *
 * The editor is readonly when the host says so or while a block card holds
 * the activation lock. Edits then fail with [`EngineError::Readonly`].
 */

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use notekit_config::Config;
use serde_json::Value;

use crate::card::{ActivateKind, Activation, CardManager, CardType, IdCache, ToolbarItem, ToolbarOutcome};
use crate::change::Change;
use crate::clipboard::Clipboard;
use crate::command::{Command, CommandRegistry};
use crate::dom::html::{SerializeOptions, inner_html, parse_fragment};
use crate::dom::{CARD_ID, CONTENT_EDITABLE, DATA_ELEMENT, NodeId, ROOT_ELEMENT, Tree};
use crate::error::{EngineError, Result};
use crate::event::{EditorEvent, EventBus, EventKind, ListenerId};
use crate::history::{self, History, Snapshot};
use crate::paste::{BasicSchema, Normalizer, PasteEvent, Schema};
use crate::plugin::{Plugin, PluginRegistry, PluginSlot, merge_options};
use crate::range::{Point, Range, clone_contents, repair_range, shrink_range};
use crate::scheduler::Debouncer;

/// State captured by [`Editor::begin_transaction`].
#[derive(Debug)]
struct Transaction {
    snapshot: Snapshot,
    depth: usize,
}

pub struct Editor {
    tree: Tree,
    root: NodeId,
    range: Range,
    cards: CardManager,
    history: History,
    commands: CommandRegistry,
    plugins: PluginRegistry,
    events: EventBus,
    clipboard: Option<Box<dyn Clipboard>>,
    schema: Box<dyn Schema>,
    normalizer: Normalizer,
    typing: Debouncer,
    typing_open: bool,
    composing: bool,
    readonly: bool,
    card_lock: bool,
    transaction: Option<Transaction>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("value", &self.get_value())
            .field("range", &self.range)
            .field("cards", &self.cards)
            .field("readonly", &self.readonly)
            .field("card_lock", &self.card_lock)
            .finish()
    }
}

impl Editor {
    pub fn new(config: &Config) -> Self {
        Self::with_id_cache(config, IdCache::new())
    }

    /// An editor whose card ids are unique across every editor sharing
    /// `ids`.
    pub fn with_id_cache(config: &Config, ids: IdCache) -> Self {
        let mut tree = Tree::new();
        let root = tree.create_element_with(
            "div",
            &[(DATA_ELEMENT, ROOT_ELEMENT), (CONTENT_EDITABLE, "true")],
        );
        let document = tree.document();
        tree.append(document, root);

        let mut editor = Self {
            tree,
            root,
            range: Range::collapsed(Point::new(root, 0)),
            cards: CardManager::new(ids, config.cards.id_length),
            history: History::new(config.history.max_levels),
            commands: CommandRegistry::new(),
            plugins: PluginRegistry::new(),
            events: EventBus::new(),
            clipboard: None,
            schema: Box::new(BasicSchema),
            normalizer: Normalizer::new(config.paste.clone()),
            typing: Debouncer::from_millis(config.history.commit_delay_ms),
            typing_open: false,
            composing: false,
            readonly: false,
            card_lock: false,
            transaction: None,
        };
        editor.set_value("");
        editor
    }

    /// Build an editor from the config file at `path`, or defaults when it
    /// does not exist.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = Config::load_from_path(path)
            .with_context(|| format!("loading editor config from {}", path.display()))?
            .unwrap_or_default();
        Ok(Self::new(&config))
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Some(Box::new(clipboard));
        self
    }

    pub fn with_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Box::new(schema);
        self
    }

    // ============ Accessors ============

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Raw tree access for building nodes to insert. Mutations made here
    /// bypass history.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn cards(&self) -> &CardManager {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut CardManager {
        &mut self.cards
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    // ============ Value ============

    pub fn get_value(&self) -> String {
        inner_html(&self.tree, self.root, SerializeOptions::default())
    }

    /// Replace the document. Cards are hydrated, history starts over and
    /// the caret goes to the start. Does not emit a change.
    pub fn set_value(&mut self, html: &str) {
        self.typing.cancel();
        self.typing_open = false;
        self.transaction = None;
        let before = self.is_readonly();
        let activation = self
            .cards
            .activate_block(&mut self.tree, None, ActivateKind::Other, self.readonly);
        self.apply_activation(before, &activation);

        self.tree.discard_children(self.root);
        let fragment = parse_fragment(&mut self.tree, html);
        self.tree.append(self.root, fragment);
        self.tree.discard(fragment);
        self.cards.gc(&self.tree);
        self.cards.render_all(&mut self.tree, self.root);
        Change::new(&mut self.tree, self.root).normalize_root();

        self.range = Range::collapsed(Point::new(self.root, 0));
        shrink_range(&self.tree, &mut self.range);
        self.tree.collect_garbage();
        self.history.reset(&self.tree, self.root, &self.range);
        log::debug!("value set, {} live cards", self.cards.len());
    }

    // ============ Events ============

    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        self.events.on(kind, handler)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Call `handler` with the committed value after every edit.
    pub fn on_change(&mut self, mut handler: impl FnMut(&str) + 'static) -> ListenerId {
        self.events.on(EventKind::Change, move |event| {
            if let EditorEvent::Change(value) = event {
                handler(value);
            }
        })
    }

    pub fn on_select(&mut self, mut handler: impl FnMut(Range) + 'static) -> ListenerId {
        self.events.on(EventKind::Select, move |event| {
            if let EditorEvent::Select(range) = event {
                handler(*range);
            }
        })
    }

    // ============ Selection ============

    /// Move the selection. Ranges outside the root are ignored; ranges
    /// reaching into cards are moved beside them.
    pub fn select(&mut self, mut range: Range) {
        if !range.is_within(&self.tree, self.root) {
            log::debug!("ignoring selection outside the editor");
            return;
        }
        repair_range(&self.tree, self.root, &mut range);
        self.range = range;
        self.history.update(&self.tree, self.root, &self.range);
        self.events.emit(&EditorEvent::Select(range));
    }

    fn settle_range(&mut self) {
        if !self.range.is_within(&self.tree, self.root) {
            self.range = Range::collapsed(Point::new(self.root, 0));
            shrink_range(&self.tree, &mut self.range);
        }
    }

    // ============ Readonly ============

    pub fn is_readonly(&self) -> bool {
        self.readonly || self.card_lock
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        let before = self.is_readonly();
        self.readonly = readonly;
        self.cards.set_readonly(&mut self.tree, readonly);
        if before != self.is_readonly() {
            self.events.emit(&EditorEvent::ReadonlyChange(self.is_readonly()));
        }
    }

    // ============ Edit plumbing ============

    fn commit(&mut self) {
        if self.history.save_after(&self.tree, self.root, &self.range) {
            self.cards.gc(&self.tree);
            self.settle_range();
            self.tree.collect_garbage();
            let value = self.get_value();
            self.events.emit(&EditorEvent::Change(value));
        }
    }

    /// Run `f` as one history batch. A failure abandons the batch and puts
    /// back the content it started from.
    fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.close_typing();
        self.history.save_before(&self.tree, self.root, &self.range);
        match f(self) {
            Ok(out) => {
                self.commit();
                Ok(out)
            }
            Err(err) => {
                if let Some(range) = self.history.abort(&mut self.tree, self.root) {
                    self.range = range;
                    self.refresh_cards();
                    self.settle_range();
                    self.tree.collect_garbage();
                }
                if self.transaction.take().is_some() {
                    log::warn!("transaction abandoned: {err}");
                }
                Err(err)
            }
        }
    }

    fn edit<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.is_readonly() {
            return Err(EngineError::Readonly);
        }
        self.batch(f)
    }

    fn close_typing(&mut self) {
        if self.typing_open {
            self.typing_open = false;
            self.typing.cancel();
            self.commit();
        }
    }

    /// Commit a typing burst whose quiet period has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.typing.poll(now) {
            self.close_typing();
        }
    }

    /// Commit pending typing now.
    pub fn flush(&mut self) {
        self.close_typing();
    }

    // ============ Editing ============

    /// Type `text` at the caret. Ignored during IME composition.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        if self.is_readonly() {
            return Err(EngineError::Readonly);
        }
        if self.composing {
            return Ok(());
        }
        if !self.typing_open {
            self.history.save_before(&self.tree, self.root, &self.range);
            self.typing_open = true;
        }
        Change::new(&mut self.tree, self.root).insert_text(&mut self.range, text);
        self.typing.schedule(Instant::now());
        Ok(())
    }

    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    /// End composition and insert the composed `text` as one edit.
    pub fn composition_end(&mut self, text: &str) -> Result<()> {
        self.composing = false;
        self.insert_text(text)?;
        self.close_typing();
        Ok(())
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Insert a detached inline node built in [`tree_mut`](Self::tree_mut).
    pub fn insert_inline(&mut self, node: NodeId) -> Result<()> {
        self.edit(|e| {
            Change::new(&mut e.tree, e.root).insert_inline(&mut e.range, node);
            Ok(())
        })
    }

    pub fn insert_block(&mut self, block: NodeId) -> Result<()> {
        self.edit(|e| {
            Change::new(&mut e.tree, e.root).insert_block(&mut e.range, block, false);
            Ok(())
        })
    }

    pub fn insert_fragment(&mut self, fragment: NodeId) -> Result<()> {
        self.edit(|e| {
            Change::new(&mut e.tree, e.root).insert_fragment(&mut e.range, &mut e.cards, fragment);
            Ok(())
        })
    }

    /// Parse `html` and insert it as a fragment, without paste cleanup.
    pub fn insert_html(&mut self, html: &str) -> Result<()> {
        let fragment = parse_fragment(&mut self.tree, html);
        self.insert_fragment(fragment)
    }

    pub fn delete_content(&mut self) -> Result<()> {
        if self.range.is_collapsed() {
            return Ok(());
        }
        self.edit(|e| {
            Change::new(&mut e.tree, e.root).delete_content(&mut e.range, false);
            Ok(())
        })
    }

    /// Handle a clipboard paste. Files are announced through
    /// [`EditorEvent::PasteFiles`] for the host to upload; HTML or text is
    /// normalized and inserted at the caret.
    pub fn paste(&mut self, event: PasteEvent) -> Result<()> {
        if self.is_readonly() {
            return Err(EngineError::Readonly);
        }
        if !event.files.is_empty() {
            self.events.emit(&EditorEvent::PasteFiles(event.files.clone()));
        }
        let Some(fragment) = self
            .normalizer
            .fragment(&mut self.tree, &event, self.schema.as_ref())
        else {
            return Ok(());
        };
        self.insert_fragment(fragment)
    }

    /// Copy the selection to the clipboard. `false` when there is nothing
    /// selected, no clipboard, or the host refused.
    pub fn copy(&mut self) -> bool {
        if self.range.is_collapsed() {
            return false;
        }
        let fragment = clone_contents(&mut self.tree, &self.range);
        let html = inner_html(&self.tree, fragment, SerializeOptions::default());
        let text = self.tree.text_content(fragment);
        match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.write(&html, &text),
            None => {
                log::warn!("copy without a clipboard adapter");
                false
            }
        }
    }

    // ============ Cards ============

    /// Create a registered card and insert it at the caret. Returns its id.
    pub fn insert_card(&mut self, key: &str, value: Value) -> Result<String> {
        self.edit(|e| {
            let root = e.cards.create(&mut e.tree, key, value)?;
            let id = e.tree.attr(root, CARD_ID).unwrap_or_default().to_string();
            let block = e.cards.card(&id).map(|c| c.card_type()) == Some(CardType::Block);
            let mut change = Change::new(&mut e.tree, e.root);
            if block {
                change.insert_block(&mut e.range, root, true);
            } else {
                change.insert_inline(&mut e.range, root);
            }
            Ok(id)
        })
    }

    /// Move card activation to whatever card contains `node` (nothing when
    /// `None` or outside any card).
    pub fn activate(&mut self, node: Option<NodeId>, kind: ActivateKind) -> Activation {
        let before = self.is_readonly();
        let activation = self
            .cards
            .activate_block(&mut self.tree, node, kind, self.readonly);
        self.apply_activation(before, &activation);
        activation
    }

    fn apply_activation(&mut self, readonly_before: bool, activation: &Activation) {
        if let Some(lock) = activation.readonly {
            self.card_lock = lock;
        }
        if let Some(id) = &activation.deactivated {
            self.events.emit(&EditorEvent::CardDeactivated(id.clone()));
        }
        if let Some(id) = &activation.activated {
            self.events.emit(&EditorEvent::CardActivated(id.clone()));
        }
        if readonly_before != self.is_readonly() {
            self.events.emit(&EditorEvent::ReadonlyChange(self.is_readonly()));
        }
    }

    /// Run a card toolbar action. Works under the card lock, since the
    /// active card is the one being operated.
    pub fn run_card_toolbar(&mut self, id: &str, item: &ToolbarItem) -> Result<ToolbarOutcome> {
        if *item == ToolbarItem::Delete {
            if self.readonly {
                return Err(EngineError::Readonly);
            }
            return self.batch(|e| {
                let before = e.is_readonly();
                let outcome = e.cards.run_toolbar(&mut e.tree, id, item)?;
                if let ToolbarOutcome::Removed(activation) = &outcome {
                    e.apply_activation(before, activation);
                }
                Change::new(&mut e.tree, e.root).normalize_root();
                e.settle_range();
                Ok(outcome)
            });
        }

        let outcome = self.cards.run_toolbar(&mut self.tree, id, item)?;
        match &outcome {
            ToolbarOutcome::Copied(html) => {
                if let Some(clipboard) = self.clipboard.as_mut()
                    && !clipboard.write(html, "")
                {
                    log::warn!("clipboard refused card {id}");
                }
            }
            ToolbarOutcome::ModeSwitched => {
                self.close_typing();
                self.history.reset(&self.tree, self.root, &self.range);
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Give card `id` a new value, as one undo step.
    pub fn set_card_value(&mut self, id: &str, value: Value) -> Result<()> {
        if self.readonly {
            return Err(EngineError::Readonly);
        }
        self.batch(|e| e.cards.set_value(&mut e.tree, id, value))
    }

    /// Resize card `id`, as one undo step.
    pub fn resize_card(&mut self, id: &str, width: u32) -> Result<()> {
        if self.readonly {
            return Err(EngineError::Readonly);
        }
        self.batch(|e| e.cards.resize(&mut e.tree, id, width))
    }

    /// Drop cards that left the document and hydrate ones that entered it.
    fn refresh_cards(&mut self) {
        self.cards.gc(&self.tree);
        self.cards.render_all(&mut self.tree, self.root);
    }

    // ============ History ============

    pub fn can_undo(&self) -> bool {
        self.history.has_undo() || self.typing_open
    }

    pub fn can_redo(&self) -> bool {
        self.history.has_redo()
    }

    pub fn undo(&mut self) -> bool {
        if self.is_readonly() || self.transaction.is_some() {
            return false;
        }
        self.close_typing();
        let Some(range) = self.history.undo(&mut self.tree, self.root) else {
            return false;
        };
        self.after_restore(range);
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.is_readonly() || self.transaction.is_some() {
            return false;
        }
        self.close_typing();
        let Some(range) = self.history.redo(&mut self.tree, self.root) else {
            return false;
        };
        self.after_restore(range);
        true
    }

    fn after_restore(&mut self, range: Range) {
        self.range = range;
        self.refresh_cards();
        self.settle_range();
        self.tree.collect_garbage();
        let value = self.get_value();
        self.events.emit(&EditorEvent::Change(value));
    }

    // ============ Commands ============

    pub fn register_command(&mut self, name: &str, command: Box<dyn Command>) {
        self.commands.register(name, command);
    }

    pub fn unregister_command(&mut self, name: &str) -> bool {
        self.commands.unregister(name)
    }

    /// Run the command registered as `name`.
    pub fn command(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let mut command = self.commands.take(name)?;
        log::debug!("running command {name}");
        let result = command.execute(self, args);
        self.commands.put_back(name, command);
        result
    }

    pub fn query_command_state(&self, name: &str) -> Result<bool> {
        self.commands
            .get(name)
            .map(|c| c.query_state(self))
            .ok_or_else(|| EngineError::UnknownCommand(name.to_string()))
    }

    pub fn query_command_enabled(&self, name: &str) -> Result<bool> {
        self.commands
            .get(name)
            .map(|c| c.query_enabled(self))
            .ok_or_else(|| EngineError::UnknownCommand(name.to_string()))
    }

    // ============ Transactions ============

    /// Group the following edits into one undo step that can also be
    /// rolled back. Transactions nest; the outermost decides.
    pub fn begin_transaction(&mut self) {
        self.close_typing();
        match self.transaction.as_mut() {
            Some(transaction) => transaction.depth += 1,
            None => {
                let snapshot = history::snapshot(&self.tree, self.root, &self.range);
                self.transaction = Some(Transaction { snapshot, depth: 1 });
            }
        }
        self.history.save_before(&self.tree, self.root, &self.range);
    }

    pub fn commit_transaction(&mut self) -> Result<()> {
        let transaction = self.transaction.as_mut().ok_or(EngineError::NoTransaction)?;
        transaction.depth -= 1;
        if transaction.depth == 0 {
            self.transaction = None;
        }
        self.close_typing();
        self.commit();
        Ok(())
    }

    /// Restore the state from before the outermost open transaction.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let transaction = self.transaction.take().ok_or(EngineError::NoTransaction)?;
        self.typing.cancel();
        self.typing_open = false;
        self.history.stop();
        let range = history::restore(&mut self.tree, self.root, &transaction.snapshot)
            .unwrap_or(Range::collapsed(Point::new(self.root, 0)));
        self.range = range;
        self.refresh_cards();
        self.settle_range();
        self.tree.collect_garbage();
        log::debug!("transaction rolled back");
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    // ============ Plugins ============

    pub fn install_plugin(&mut self, mut plugin: Box<dyn Plugin>, options: Option<Value>) -> Result<()> {
        let name = plugin.name();
        if self.plugins.contains(name) {
            return Err(EngineError::DuplicatePlugin(name.to_string()));
        }
        let options = merge_options(plugin.default_options(), options);
        plugin.on_install(self);
        plugin.initialize(self, &options)?;
        plugin.on_enable(self);
        self.plugins.put_back(
            name,
            PluginSlot {
                plugin,
                options,
                enabled: true,
            },
        );
        log::debug!("installed plugin {name}");
        Ok(())
    }

    pub fn uninstall_plugin(&mut self, name: &str) -> Result<()> {
        let mut slot = self.plugins.take(name)?;
        slot.plugin.destroy(self);
        slot.plugin.on_destroy(self);
        Ok(())
    }

    /// Tell every plugin the host has finished setting up.
    pub fn ready(&mut self) {
        for name in self.plugins.names() {
            if let Ok(mut slot) = self.plugins.take(&name) {
                slot.plugin.on_ready(self);
                self.plugins.put_back(&name, slot);
            }
        }
    }

    pub fn set_plugin_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let mut slot = self.plugins.take(name)?;
        if slot.enabled != enabled {
            slot.enabled = enabled;
            if enabled {
                slot.plugin.on_enable(self);
            } else {
                slot.plugin.on_disable(self);
            }
        }
        self.plugins.put_back(name, slot);
        Ok(())
    }

    /// Run a plugin's own action. Disabled plugins evaluate to null.
    pub fn plugin_execute(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let mut slot = self.plugins.take(name)?;
        let result = if slot.enabled {
            slot.plugin.execute(self, args)
        } else {
            Ok(Value::Null)
        };
        self.plugins.put_back(name, slot);
        result
    }

    pub fn plugin_query_state(&self, name: &str) -> Result<bool> {
        self.plugins
            .get(name)
            .map(|p| p.query_state(self))
            .ok_or_else(|| EngineError::UnknownPlugin(name.to_string()))
    }

    pub fn plugin_query_value(&self, name: &str) -> Result<Value> {
        self.plugins
            .get(name)
            .map(|p| p.query_value(self))
            .ok_or_else(|| EngineError::UnknownPlugin(name.to_string()))
    }

    // ============ Teardown ============

    /// Tear everything down: pending commits are dropped, plugins and
    /// cards destroyed, listeners removed.
    pub fn destroy(&mut self) {
        self.typing.cancel();
        self.typing_open = false;
        self.history.stop();
        for name in self.plugins.names() {
            if let Err(err) = self.uninstall_plugin(&name) {
                log::warn!("plugin teardown failed: {err}");
            }
        }
        self.cards.destroy();
        self.events.clear();
        log::debug!("editor destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{HrCard, ImageCard};
    use crate::clipboard::MemoryClipboard;
    use crate::paste::PasteFile;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn editor(html: &str) -> Editor {
        let mut editor = Editor::new(&Config::default());
        editor.cards_mut().register("hr", |_| Box::new(HrCard));
        editor.cards_mut().register("image", |v| Box::new(ImageCard::new(v)));
        editor.set_value(html);
        editor
    }

    fn text_node(editor: &Editor, text: &str) -> NodeId {
        let tree = editor.tree();
        tree.descendants(editor.root())
            .into_iter()
            .find(|id| tree.text(*id) == Some(text))
            .unwrap()
    }

    fn caret(editor: &mut Editor, text: &str, offset: usize) {
        let t = text_node(editor, text);
        editor.select(Range::collapsed(Point::new(t, offset)));
    }

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    // ============ Value ============

    #[test]
    fn test_empty_editor() {
        let editor = Editor::new(&Config::default());
        assert_eq!(editor.get_value(), "<p><br></p>");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_set_value_roundtrip() {
        let mut editor = editor("<p>a<strong>b</strong></p><ul><li>c</li></ul>");
        let value = editor.get_value();
        editor.set_value(&value);
        assert_eq!(editor.get_value(), value);
    }

    #[test]
    fn test_set_value_hydrates_cards() {
        let editor = editor("<p>x</p><card type=\"block\" name=\"hr\"></card>");
        assert_eq!(editor.cards().len(), 1);
        assert!(editor.get_value().contains("data-card-key=\"hr\""));
    }

    #[test]
    fn test_deep_nesting_loads() {
        let depth = 10_000;
        let html = format!("<p>{}x{}</p>", "<span>".repeat(depth), "</span>".repeat(depth));
        let mut editor = editor(&html);

        let value = editor.get_value();
        assert!(value.starts_with("<p><span>"));
        assert!(value.contains('x'));

        caret(&mut editor, "x", 1);
        editor.insert_text("y").unwrap();
        editor.flush();
        assert!(editor.get_value().contains("xy"));
    }

    // ============ Slot reuse ============

    #[test]
    fn test_selection_changes_allocate_nothing() {
        let mut editor = editor("<p>hello</p><p>world</p>");
        let t = text_node(&editor, "hello");
        let slots = editor.tree().slot_count();

        for i in 0..1000 {
            editor.select(Range::new(Point::new(t, i % 3), Point::new(t, 5)));
        }

        assert_eq!(editor.tree().slot_count(), slots);
    }

    #[test]
    fn test_undo_redo_cycles_reuse_slots() {
        let mut editor = editor("<p>ab</p><p>cd</p>");
        caret(&mut editor, "ab", 1);
        editor.insert_html("<b>x</b>").unwrap();
        assert!(editor.undo());
        assert!(editor.redo());
        let slots = editor.tree().slot_count();

        for _ in 0..200 {
            assert!(editor.undo());
            assert!(editor.redo());
        }

        assert_eq!(editor.tree().slot_count(), slots);
        assert_eq!(editor.get_value(), "<p>a<b>x</b>b</p><p>cd</p>");
    }

    #[test]
    fn test_set_value_reuses_slots() {
        let mut editor = editor("<p>a</p>");
        let value = "<p>one <b>two</b></p><ul><li>three</li></ul>";
        editor.set_value(value);
        let slots = editor.tree().slot_count();

        for _ in 0..100 {
            editor.set_value(value);
        }

        assert_eq!(editor.tree().slot_count(), slots);
    }

    // ============ Typing ============

    #[test]
    fn test_typing_commits_after_quiet_period() {
        let mut editor = editor("<p>ab</p>");
        let changes = Rc::new(RefCell::new(Vec::new()));
        let seen = changes.clone();
        editor.on_change(move |value| seen.borrow_mut().push(value.to_string()));
        caret(&mut editor, "ab", 2);

        editor.insert_text("c").unwrap();
        editor.insert_text("d").unwrap();
        assert!(changes.borrow().is_empty());

        editor.tick(later());
        assert_eq!(*changes.borrow(), vec!["<p>abcd</p>".to_string()]);

        assert!(editor.undo());
        assert_eq!(editor.get_value(), "<p>ab</p>");
    }

    #[test]
    fn test_composition_ignores_intermediate_input() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);

        editor.composition_start();
        editor.insert_text("n").unwrap();
        editor.insert_text("ni").unwrap();
        assert_eq!(editor.get_value(), "<p>a</p>");
        editor.composition_end("你").unwrap();

        assert_eq!(editor.get_value(), "<p>a你</p>");
        assert!(editor.history().has_undo());
    }

    // ============ Edits ============

    #[test]
    fn test_delete_collapsed_is_noop() {
        let mut editor = editor("<p>abc</p>");
        caret(&mut editor, "abc", 1);
        let before = editor.range();

        editor.delete_content().unwrap();

        assert_eq!(editor.range(), before);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_insert_html_and_undo() {
        let mut editor = editor("<p>ab</p>");
        caret(&mut editor, "ab", 1);

        editor.insert_html("<b>x</b>").unwrap();
        assert_eq!(editor.get_value(), "<p>a<b>x</b>b</p>");

        assert!(editor.undo());
        assert_eq!(editor.get_value(), "<p>ab</p>");
        assert!(editor.redo());
        assert_eq!(editor.get_value(), "<p>a<b>x</b>b</p>");
    }

    #[test]
    fn test_readonly_rejects_edits() {
        let mut editor = editor("<p>a</p>");
        editor.set_readonly(true);

        assert!(matches!(editor.insert_text("x"), Err(EngineError::Readonly)));
        assert!(matches!(editor.insert_html("<p>y</p>"), Err(EngineError::Readonly)));
        assert!(!editor.undo());
        assert_eq!(editor.get_value(), "<p>a</p>");
    }

    #[test]
    fn test_select_outside_root_ignored() {
        let mut editor = editor("<p>a</p>");
        let stray = editor.tree_mut().create_text("stray");
        let before = editor.range();

        editor.select(Range::collapsed(Point::new(stray, 0)));

        assert_eq!(editor.range(), before);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut editor = editor("<p>ab</p>");
        caret(&mut editor, "ab", 1);

        let result = editor.batch(|e| {
            Change::new(&mut e.tree, e.root).insert_text(&mut e.range, "zz");
            Err::<(), _>(EngineError::NoTransaction)
        });

        assert!(matches!(result, Err(EngineError::NoTransaction)));
        assert_eq!(editor.get_value(), "<p>ab</p>");
        assert!(!editor.can_undo());
        let range = editor.range();
        assert_eq!(editor.tree().text(range.start.node), Some("ab"));
        assert_eq!(range.start.offset, 1);
    }

    #[test]
    fn test_failed_batch_without_changes_keeps_nodes() {
        let mut editor = editor("<p>ab</p>");
        caret(&mut editor, "ab", 1);
        let t = text_node(&editor, "ab");

        let result = editor.batch(|_| Err::<(), _>(EngineError::NoTransaction));

        assert!(result.is_err());
        assert_eq!(text_node(&editor, "ab"), t);
        assert_eq!(editor.range(), Range::collapsed(Point::new(t, 1)));
    }

    // ============ Paste ============

    #[test]
    fn test_paste_strips_default_color() {
        let mut editor = editor("<p>ab</p>");
        caret(&mut editor, "ab", 1);

        editor
            .paste(PasteEvent {
                html: Some("<span style=\"color:#000000\">text</span>".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(editor.get_value(), "<p>atextb</p>");
    }

    #[test]
    fn test_paste_files_announced() {
        let mut editor = editor("<p>a</p>");
        let files = Rc::new(RefCell::new(Vec::new()));
        let seen = files.clone();
        editor.on(EventKind::PasteFiles, move |event| {
            if let EditorEvent::PasteFiles(f) = event {
                seen.borrow_mut().extend(f.iter().map(|f| f.name.clone()));
            }
        });

        editor
            .paste(PasteEvent {
                files: vec![PasteFile {
                    name: "cat.png".to_string(),
                    mime: "image/png".to_string(),
                    size: 3,
                }],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(*files.borrow(), vec!["cat.png".to_string()]);
        assert_eq!(editor.get_value(), "<p>a</p>");
    }

    // ============ Cards ============

    #[test]
    fn test_block_card_locks_editor() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let id = editor.insert_card("hr", Value::Null).unwrap();
        let root = editor.cards().root(&id).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = events.clone();
        editor.on(EventKind::ReadonlyChange, move |event| seen.borrow_mut().push(event.clone()));

        let hr = editor
            .tree()
            .descendants(root)
            .into_iter()
            .find(|n| editor.tree().name(*n) == Some("hr"))
            .unwrap();
        editor.activate(Some(hr), ActivateKind::Click);
        assert!(editor.cards().state(&id).unwrap().activated);
        assert!(editor.is_readonly());

        let a = text_node(&editor, "a");
        editor.activate(Some(a), ActivateKind::Click);
        assert!(!editor.cards().state(&id).unwrap().activated);
        assert!(!editor.is_readonly());
        assert_eq!(
            *events.borrow(),
            vec![EditorEvent::ReadonlyChange(true), EditorEvent::ReadonlyChange(false)]
        );
    }

    #[test]
    fn test_toolbar_delete_under_lock() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let id = editor.insert_card("hr", Value::Null).unwrap();
        let root = editor.cards().root(&id).unwrap();
        editor.activate(Some(root), ActivateKind::Click);
        assert!(editor.is_readonly());

        let outcome = editor.run_card_toolbar(&id, &ToolbarItem::Delete).unwrap();

        assert!(matches!(outcome, ToolbarOutcome::Removed(_)));
        assert!(!editor.is_readonly());
        assert!(!editor.get_value().contains("data-card"));
        assert!(editor.cards().is_empty());
    }

    #[test]
    fn test_mode_switch_clears_history() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let id = editor.insert_card("image", json!({"src": "x.png"})).unwrap();
        assert!(editor.can_undo());

        let outcome = editor.run_card_toolbar(&id, &ToolbarItem::Maximize).unwrap();

        assert_eq!(outcome, ToolbarOutcome::ModeSwitched);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_toolbar_copy_uses_clipboard() {
        let mut editor = Editor::new(&Config::default()).with_clipboard(MemoryClipboard::default());
        editor.cards_mut().register("hr", |_| Box::new(HrCard));
        let id = editor.insert_card("hr", Value::Null).unwrap();

        let outcome = editor.run_card_toolbar(&id, &ToolbarItem::Copy).unwrap();

        assert!(matches!(outcome, ToolbarOutcome::Copied(html) if html.contains(&id)));
    }

    #[test]
    fn test_undo_restores_card() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let id = editor.insert_card("image", json!({"src": "x.png"})).unwrap();
        let with_card = editor.get_value();
        let root = editor.root();
        let len = editor.tree().child_count(root);
        editor.select(Range::new(Point::new(root, 0), Point::new(root, len)));
        editor.delete_content().unwrap();
        assert!(editor.cards().root(&id).is_none());

        assert!(editor.undo());

        assert_eq!(editor.get_value(), with_card);
        assert!(editor.cards().root(&id).is_some());
    }

    #[test]
    fn test_set_card_value_rewrites_value() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let id = editor.insert_card("image", json!({"src": "x.png"})).unwrap();

        editor.set_card_value(&id, json!({"src": "y.png"})).unwrap();

        let value = editor.get_value();
        assert!(value.contains("y.png"), "{value}");
        assert!(!value.contains("x.png"), "{value}");
        assert_eq!(editor.cards().value(&id), Some(json!({"src": "y.png"})));

        assert!(editor.undo());
        assert!(editor.get_value().contains("x.png"));
    }

    #[test]
    fn test_resize_card_needs_resizable() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let image = editor.insert_card("image", json!({"src": "x.png"})).unwrap();
        let hr = editor.insert_card("hr", Value::Null).unwrap();

        editor.resize_card(&image, 120).unwrap();
        let err = editor.resize_card(&hr, 120).unwrap_err();

        assert_eq!(editor.cards().value(&image), Some(json!({"src": "x.png", "width": 120})));
        assert!(matches!(err, EngineError::MissingCapability { .. }));
    }

    #[test]
    fn test_card_edits_refused_when_readonly() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);
        let id = editor.insert_card("image", json!({"src": "x.png"})).unwrap();

        editor.set_readonly(true);

        assert!(editor.cards().state(&id).unwrap().readonly);
        assert!(matches!(editor.set_card_value(&id, Value::Null), Err(EngineError::Readonly)));
        editor.set_readonly(false);
        assert!(!editor.cards().state(&id).unwrap().readonly);
    }

    // ============ Transactions ============

    #[test]
    fn test_transaction_is_one_step() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);

        editor.begin_transaction();
        editor.insert_html("<b>1</b>").unwrap();
        caret(&mut editor, "a", 0);
        editor.insert_html("<i>2</i>").unwrap();
        editor.commit_transaction().unwrap();

        assert_eq!(editor.get_value(), "<p><i>2</i>a<b>1</b></p>");
        assert!(editor.undo());
        assert_eq!(editor.get_value(), "<p>a</p>");
    }

    #[test]
    fn test_rollback_restores() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);

        editor.begin_transaction();
        editor.insert_html("<b>1</b>").unwrap();
        editor.rollback_transaction().unwrap();

        assert_eq!(editor.get_value(), "<p>a</p>");
        assert!(!editor.can_undo());
        assert!(matches!(editor.commit_transaction(), Err(EngineError::NoTransaction)));
    }

    #[test]
    fn test_failed_edit_abandons_transaction() {
        let mut editor = editor("<p>a</p>");
        caret(&mut editor, "a", 1);

        editor.begin_transaction();
        editor.insert_html("<b>1</b>").unwrap();
        let result = editor.batch(|e| {
            Change::new(&mut e.tree, e.root).insert_text(&mut e.range, "2");
            Err::<(), _>(EngineError::NoTransaction)
        });

        assert!(result.is_err());
        assert!(!editor.in_transaction());
        assert_eq!(editor.get_value(), "<p>a</p>");
        assert!(!editor.can_undo());
    }

    // ============ Setup ============

    #[test]
    fn test_open_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[history]\nmax_levels = 1\n").unwrap();

        let mut editor = Editor::open(&path).unwrap();
        editor.insert_html("<p>1</p>").unwrap();
        editor.insert_html("<p>2</p>").unwrap();

        assert!(editor.undo());
        assert!(!editor.undo());
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "history = [").unwrap();

        let err = Editor::open(&path).unwrap_err();
        assert!(err.to_string().contains("loading editor config"));
    }

    #[test]
    fn test_destroy_tears_down() {
        let mut editor = editor("<card type=\"block\" name=\"hr\"></card>");
        editor.on_change(|_| {});

        editor.destroy();

        assert!(editor.cards().is_empty());
        assert_eq!(editor.events.listener_count(EventKind::Change), 0);
    }
}
