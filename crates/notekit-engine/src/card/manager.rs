//! Card registry and live card bookkeeping.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use serde_json::Value;

use super::toolbar::{self, ToolbarItem, ToolbarOutcome};
use super::{Capability, Card, CardFactory, CardType, decode_value, encode_value};
use crate::dom::html::{SerializeOptions, outer_html};
use crate::dom::{
    CARD_ELEMENT, CARD_ID, CARD_KEY, CARD_TYPE, CARD_VALUE, CONTENT_EDITABLE, NodeId, Tree, ZWSP,
};
use crate::error::{EngineError, Result};

/// Class put on the root of the active card.
pub const ACTIVE_CLASS: &str = "card-activated";
/// Class put on the root of a selected card.
pub const SELECTED_CLASS: &str = "card-selected";

/// Failed rerolls tolerated at one id length before ids grow a char.
const MAX_REROLLS: usize = 64;
/// Hex chars in a simple uuid.
const MAX_ID_LENGTH: usize = 32;

/// Ids handed out to live cards. Clones share one set, so managers given
/// the same cache never produce colliding ids.
#[derive(Debug, Clone, Default)]
pub struct IdCache(Rc<RefCell<HashSet<String>>>);

impl IdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.borrow().contains(id)
    }

    /// Claim `id`; `false` when it is already taken.
    pub fn claim(&self, id: &str) -> bool {
        self.0.borrow_mut().insert(id.to_string())
    }

    pub fn release(&self, id: &str) {
        self.0.borrow_mut().remove(id);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardState {
    pub activated: bool,
    /// Activated as a side effect rather than by a click or key.
    pub activated_by_other: bool,
    pub selected: bool,
    pub focused: bool,
    pub maximized: bool,
    pub collapsed: bool,
    /// Mirrors the host's readonly flag.
    pub readonly: bool,
}

/// How an activation was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivateKind {
    Click,
    Keyboard,
    /// Activated as a side effect of something else (e.g. a selection
    /// change); never auto-selects.
    Other,
}

/// Result of an activation change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    pub deactivated: Option<String>,
    pub activated: Option<String>,
    /// New value of the block-card write lock, when it changed.
    pub readonly: Option<bool>,
}

impl Activation {
    pub fn is_empty(&self) -> bool {
        self.deactivated.is_none() && self.activated.is_none()
    }
}

struct CardEntry {
    key: String,
    root: NodeId,
    card: Box<dyn Card>,
    state: CardState,
}

pub struct CardManager {
    registry: BTreeMap<String, CardFactory>,
    entries: BTreeMap<String, CardEntry>,
    active: Option<String>,
    ids: IdCache,
    id_length: usize,
    readonly: bool,
}

impl std::fmt::Debug for CardManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardManager")
            .field("registered", &self.registry.keys().collect::<Vec<_>>())
            .field("live", &self.entries.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .finish()
    }
}

impl CardManager {
    pub fn new(ids: IdCache, id_length: usize) -> Self {
        Self {
            registry: BTreeMap::new(),
            entries: BTreeMap::new(),
            active: None,
            ids,
            id_length: id_length.clamp(1, MAX_ID_LENGTH),
            readonly: false,
        }
    }

    pub fn register(&mut self, key: &str, factory: impl Fn(Value) -> Box<dyn Card> + 'static) {
        self.registry.insert(key.to_string(), Rc::new(factory));
    }

    pub fn unregister(&mut self, key: &str) -> bool {
        self.registry.remove(key).is_some()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.registry.contains_key(key)
    }

    fn factory(&self, key: &str) -> Result<CardFactory> {
        self.registry
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCard(key.to_string()))
    }

    // ============ Ids ============

    /// A fresh random id, rerolled until no live card holds it.
    ///
    /// When the space at the configured length is crowded the id grows one
    /// char at a time instead, so a full cache never stalls the caller.
    pub fn get_id(&self) -> String {
        let mut length = self.id_length;
        let mut misses = 0;
        loop {
            let id: String = uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(length)
                .collect();
            if self.ids.claim(&id) {
                return id;
            }
            misses += 1;
            if misses >= MAX_REROLLS && length < MAX_ID_LENGTH {
                log::debug!("card ids of length {length} crowded, growing");
                length += 1;
                misses = 0;
            } else {
                log::trace!("card id {id} taken, rerolling");
            }
        }
    }

    /// Give `root` a unique id: its current one when that is still free,
    /// otherwise a fresh one.
    pub fn set_id(&self, tree: &mut Tree, root: NodeId) -> String {
        let id = match tree.attr(root, CARD_ID) {
            Some(existing) if !existing.is_empty() && self.ids.claim(existing) => {
                existing.to_string()
            }
            _ => self.get_id(),
        };
        tree.set_attr(root, CARD_ID, &id);
        id
    }

    // ============ Creation ============

    /// Build and render a registered card. The returned root is detached.
    pub fn create(&mut self, tree: &mut Tree, key: &str, value: Value) -> Result<NodeId> {
        let factory = self.factory(key)?;
        let card = factory(value);
        let root = tree.create_element(card.card_type().tag());
        self.mount(tree, root, key, card)?;
        Ok(root)
    }

    /// Rebuild a card from a serialized root or a `<card>` placeholder,
    /// returning the new root that replaced it.
    pub fn create_from(&mut self, tree: &mut Tree, node: NodeId) -> Result<NodeId> {
        let placeholder = tree.name(node) == Some("card");
        let (type_attr, key_attr, value_attr) = if placeholder {
            ("type", "name", "value")
        } else {
            (CARD_TYPE, CARD_KEY, CARD_VALUE)
        };
        let key = tree.attr(node, key_attr).unwrap_or_default().to_string();
        let declared: CardType = tree.attr(node, type_attr).unwrap_or_default().parse()?;
        let value = tree.attr(node, value_attr).map(decode_value).unwrap_or(Value::Null);

        let factory = self.factory(&key)?;
        let card = factory(value);
        if card.card_type() != declared {
            log::warn!("card {key} declared {declared}, renders as {}", card.card_type());
        }
        let root = tree.create_element(card.card_type().tag());
        if let Some(id) = tree.attr(node, CARD_ID).map(str::to_string) {
            tree.set_attr(root, CARD_ID, &id);
        }
        self.mount(tree, root, &key, card)?;
        tree.replace(node, root);
        Ok(root)
    }

    fn mount(&mut self, tree: &mut Tree, root: NodeId, key: &str, mut card: Box<dyn Card>) -> Result<()> {
        let card_type = card.card_type();
        let tag = card_type.tag();
        let value = card.value();

        let existing_id = tree.attr(root, CARD_ID).map(str::to_string);
        tree.discard_children(root);
        if let Some(element) = tree.element_mut(root) {
            element.attrs.clear();
        }
        tree.set_attr(root, CARD_TYPE, card_type.as_str());
        tree.set_attr(root, CARD_KEY, key);
        if !value.is_null() {
            tree.set_attr(root, CARD_VALUE, &encode_value(&value));
        }
        if let Some(id) = existing_id {
            tree.set_attr(root, CARD_ID, &id);
        }
        let id = self.set_id(tree, root);
        tree.set_attr(root, CONTENT_EDITABLE, "false");

        let body = tree.create_element_with(tag, &[(CARD_ELEMENT, "body")]);
        tree.append(root, body);
        if card.has(Capability::Focusable) {
            let left = caret_anchor(tree, "left");
            tree.append(body, left);
        }
        let editable = if card.has(Capability::Editable) && !self.readonly { "true" } else { "false" };
        let center = tree.create_element_with(
            tag,
            &[(CARD_ELEMENT, "center"), (CONTENT_EDITABLE, editable)],
        );
        tree.append(body, center);
        if card.has(Capability::Focusable) {
            let right = caret_anchor(tree, "right");
            tree.append(body, right);
        }
        if card.has(Capability::Toolbar) {
            toolbar::build(tree, body, &card.toolbar());
        }

        card.render(tree, center);
        log::debug!("mounted card {key}#{id}");

        if let Some(old) = self.entries.insert(
            id.clone(),
            CardEntry {
                key: key.to_string(),
                root,
                card,
                state: CardState {
                    readonly: self.readonly,
                    ..CardState::default()
                },
            },
        ) {
            log::warn!("card {}#{id} replaced while live", old.key);
        }
        Ok(())
    }

    /// Hydrate every card root and `<card>` placeholder under `scope` (and
    /// `scope` itself). Already-live roots are left alone; unknown or
    /// malformed cards stay as inert placeholders. Returns how many cards
    /// were rendered.
    pub fn render_all(&mut self, tree: &mut Tree, scope: NodeId) -> usize {
        let mut rendered = 0;
        for node in self.pending(tree, scope) {
            match self.create_from(tree, node) {
                Ok(_) => rendered += 1,
                Err(err) => log::warn!("skipping card: {err}"),
            }
        }
        rendered
    }

    /// Render every live card under `scope` again from its current value,
    /// then hydrate anything not yet live.
    pub fn re_render_all(&mut self, tree: &mut Tree, scope: NodeId) -> usize {
        let mut rendered = 0;
        for entry in self.entries.values_mut() {
            if !tree.contains(scope, entry.root) {
                continue;
            }
            let Some(center) = center_of(tree, entry.root) else {
                continue;
            };
            tree.discard_children(center);
            entry.card.render(tree, center);
            rendered += 1;
        }
        rendered + self.render_all(tree, scope)
    }

    /// Card nodes under `scope` that are not live, outermost only.
    fn pending(&self, tree: &Tree, scope: NodeId) -> Vec<NodeId> {
        let mut found: Vec<NodeId> = Vec::new();
        for id in std::iter::once(scope).chain(tree.descendants(scope)) {
            if found.iter().any(|f| tree.contains(*f, id)) {
                continue;
            }
            let is_placeholder = tree.name(id) == Some("card");
            if !is_placeholder && !tree.node(id).is_card() {
                continue;
            }
            if !is_placeholder && self.live_id(tree, id).is_some() {
                continue;
            }
            found.push(id);
        }
        found
    }

    // ============ Lookup ============

    /// Id of the live card rooted at `root`.
    fn live_id(&self, tree: &Tree, root: NodeId) -> Option<String> {
        let id = tree.attr(root, CARD_ID)?;
        self.entries
            .get(id)
            .filter(|e| e.root == root)
            .map(|_| id.to_string())
    }

    /// The live card whose root contains `node`.
    pub fn find(&self, tree: &Tree, node: NodeId) -> Option<String> {
        let root = tree.node(node).card_root()?;
        self.live_id(tree, root.id())
    }

    pub fn root(&self, id: &str) -> Option<NodeId> {
        self.entries.get(id).map(|e| e.root)
    }

    pub fn key(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|e| e.key.as_str())
    }

    pub fn state(&self, id: &str) -> Option<CardState> {
        self.entries.get(id).map(|e| e.state)
    }

    pub fn value(&self, id: &str) -> Option<Value> {
        self.entries.get(id).map(|e| e.card.value())
    }

    pub fn card(&self, id: &str) -> Option<&dyn Card> {
        self.entries.get(id).map(|e| e.card.as_ref())
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut CardEntry> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| EngineError::CardNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ============ Value ============

    /// Give a live card a new value: the instance takes it, the root's
    /// `data-card-value` is rewritten and the center rendered again.
    pub fn set_value(&mut self, tree: &mut Tree, id: &str, value: Value) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.card.set_value(value);
        refresh(tree, entry);
        log::debug!("card {id} value replaced");
        Ok(())
    }

    pub fn resize(&mut self, tree: &mut Tree, id: &str, width: u32) -> Result<()> {
        let entry = self.entry_mut(id)?;
        require(id, entry.card.as_ref(), Capability::Resizable)?;
        entry.card.resize(width);
        refresh(tree, entry);
        Ok(())
    }

    /// Propagate the host's readonly flag: every card records it and
    /// editable centers stop being editable while it is set.
    pub fn set_readonly(&mut self, tree: &mut Tree, readonly: bool) {
        self.readonly = readonly;
        for entry in self.entries.values_mut() {
            entry.state.readonly = readonly;
            if entry.card.has(Capability::Editable)
                && let Some(center) = center_of(tree, entry.root)
            {
                tree.set_attr(center, CONTENT_EDITABLE, if readonly { "false" } else { "true" });
            }
        }
    }

    // ============ Activation ============

    /// Move activation to the card containing `node`, or to nothing.
    ///
    /// Hits on a card's caret anchors do not count as being inside it, and
    /// cards without [`Capability::Activatable`] are never activated.
    /// Block cards lock the editor while active: the returned activation
    /// carries the new lock value whenever a block card gains or loses it.
    /// `readonly` is the editor's own readonly flag, which suppresses
    /// auto-selection.
    pub fn activate_block(
        &mut self,
        tree: &mut Tree,
        node: Option<NodeId>,
        kind: ActivateKind,
        readonly: bool,
    ) -> Activation {
        let target = node.and_then(|n| {
            let hit = tree.node(n);
            let on_anchor = hit
                .closest_where(|a| matches!(a.card_element(), Some("left" | "right")))
                .is_some();
            if on_anchor {
                return None;
            }
            self.find(tree, n).filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|e| e.card.has(Capability::Activatable))
            })
        });
        if target == self.active {
            return Activation::default();
        }

        let mut out = Activation::default();
        if let Some(prev) = self.active.take()
            && let Some(entry) = self.entries.get_mut(&prev)
        {
            entry.state.activated = false;
            entry.state.activated_by_other = false;
            if entry.state.focused {
                entry.state.focused = false;
                entry.card.focus(tree, entry.root, false);
            }
            tree.node_mut(entry.root).remove_class(ACTIVE_CLASS);
            toolbar::show(tree, entry.root, false);
            entry.card.deactivate(tree, entry.root);
            if entry.card.card_type() == CardType::Block {
                out.readonly = Some(false);
            }
            log::debug!("deactivated card {prev}");
            out.deactivated = Some(prev);
        }

        if let Some(id) = target
            && let Some(entry) = self.entries.get_mut(&id)
        {
            toolbar::show(tree, entry.root, true);
            let by_user = kind != ActivateKind::Other;
            let auto_select = entry.card.card_type() == CardType::Inline
                && entry.card.has(Capability::Selectable)
                && by_user
                && !readonly;
            if auto_select {
                entry.state.selected = true;
                tree.node_mut(entry.root).add_class(SELECTED_CLASS);
                entry.card.select(tree, entry.root, true);
            }
            entry.card.activate(tree, entry.root);
            entry.state.activated = true;
            entry.state.activated_by_other = !by_user;
            if by_user && entry.card.has(Capability::Focusable) {
                entry.state.focused = true;
                entry.card.focus(tree, entry.root, true);
            }
            tree.node_mut(entry.root).add_class(ACTIVE_CLASS);
            if entry.card.card_type() == CardType::Block {
                out.readonly = Some(true);
            }
            log::debug!("activated card {id}");
            self.active = Some(id.clone());
            out.activated = Some(id);
        }
        out
    }

    /// Mark a card selected or not. Only [`Capability::Selectable`] cards
    /// can be selected.
    pub fn select(&mut self, tree: &mut Tree, id: &str, selected: bool) -> Result<()> {
        let entry = self.entry_mut(id)?;
        if selected {
            require(id, entry.card.as_ref(), Capability::Selectable)?;
        }
        entry.state.selected = selected;
        if selected {
            tree.node_mut(entry.root).add_class(SELECTED_CLASS);
        } else {
            tree.node_mut(entry.root).remove_class(SELECTED_CLASS);
        }
        entry.card.select(tree, entry.root, selected);
        Ok(())
    }

    /// Give or take native focus. Only [`Capability::Focusable`] cards can
    /// hold it.
    pub fn focus(&mut self, tree: &mut Tree, id: &str, focused: bool) -> Result<()> {
        let entry = self.entry_mut(id)?;
        if focused {
            require(id, entry.card.as_ref(), Capability::Focusable)?;
        }
        if entry.state.focused != focused {
            entry.state.focused = focused;
            entry.card.focus(tree, entry.root, focused);
        }
        Ok(())
    }

    // ============ Removal ============

    /// Remove a live card from the document and drop its bookkeeping.
    pub fn remove_node(&mut self, tree: &mut Tree, id: &str) -> Result<Activation> {
        if !self.entries.contains_key(id) {
            return Err(EngineError::CardNotFound(id.to_string()));
        }
        let activation = if self.active.as_deref() == Some(id) {
            self.activate_block(tree, None, ActivateKind::Other, false)
        } else {
            Activation::default()
        };
        if let Some(mut entry) = self.entries.remove(id) {
            entry.card.destroy();
            tree.detach(entry.root);
            self.ids.release(id);
        }
        Ok(activation)
    }

    /// Destroy every live card no longer attached to the document.
    /// Returns the number reclaimed.
    pub fn gc(&mut self, tree: &Tree) -> usize {
        let document = tree.document();
        let dead: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| !tree.is_attached_to(e.root, document))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &dead {
            if let Some(mut entry) = self.entries.remove(id) {
                entry.card.destroy();
            }
            self.ids.release(id);
            if self.active.as_deref() == Some(id.as_str()) {
                self.active = None;
            }
        }
        if !dead.is_empty() {
            log::debug!("card gc reclaimed {}", dead.len());
        }
        dead.len()
    }

    /// Destroy every live card.
    pub fn destroy(&mut self) {
        for (id, mut entry) in std::mem::take(&mut self.entries) {
            entry.card.destroy();
            self.ids.release(&id);
        }
        self.active = None;
    }

    // ============ Toolbar ============

    /// Run one toolbar action. Mode switches need the matching capability:
    /// `Expand` undoes either mode, so it accepts either one.
    pub fn run_toolbar(&mut self, tree: &mut Tree, id: &str, item: &ToolbarItem) -> Result<ToolbarOutcome> {
        let entry = self.entry_mut(id)?;
        let root = entry.root;
        let outcome = match item {
            ToolbarItem::Dnd => ToolbarOutcome::Dragging,
            ToolbarItem::Copy => ToolbarOutcome::Copied(outer_html(tree, root, SerializeOptions::default())),
            ToolbarItem::Delete => return self.remove_node(tree, id).map(ToolbarOutcome::Removed),
            ToolbarItem::Maximize => {
                require(id, entry.card.as_ref(), Capability::Maximizable)?;
                entry.state.maximized = true;
                entry.card.maximize(tree, root);
                ToolbarOutcome::ModeSwitched
            }
            ToolbarItem::Collapse => {
                require(id, entry.card.as_ref(), Capability::Collapsible)?;
                entry.state.collapsed = true;
                entry.card.collapse(tree, root);
                ToolbarOutcome::ModeSwitched
            }
            ToolbarItem::Expand => {
                if !entry.card.has(Capability::Maximizable) {
                    require(id, entry.card.as_ref(), Capability::Collapsible)?;
                }
                entry.state.collapsed = false;
                entry.state.maximized = false;
                entry.card.expand(tree, root);
                ToolbarOutcome::ModeSwitched
            }
            ToolbarItem::Custom(name) => {
                entry.card.action(tree, root, name);
                ToolbarOutcome::Custom
            }
        };
        log::debug!("card {id} ran {}", item.name());
        Ok(outcome)
    }
}

fn require(id: &str, card: &dyn Card, capability: Capability) -> Result<()> {
    if card.has(capability) {
        Ok(())
    } else {
        Err(EngineError::MissingCapability {
            id: id.to_string(),
            capability,
        })
    }
}

/// Write the card's current value back onto its root and render again.
fn refresh(tree: &mut Tree, entry: &mut CardEntry) {
    let value = entry.card.value();
    if value.is_null() {
        tree.remove_attr(entry.root, CARD_VALUE);
    } else {
        tree.set_attr(entry.root, CARD_VALUE, &encode_value(&value));
    }
    if let Some(center) = center_of(tree, entry.root) {
        tree.discard_children(center);
        entry.card.render(tree, center);
    }
}

fn caret_anchor(tree: &mut Tree, side: &str) -> NodeId {
    let anchor = tree.create_element_with("span", &[(CARD_ELEMENT, side)]);
    let filler = tree.create_text(ZWSP);
    tree.append(anchor, filler);
    anchor
}

pub(crate) fn center_of(tree: &Tree, root: NodeId) -> Option<NodeId> {
    tree.descendants(root)
        .into_iter()
        .find(|id| tree.node(*id).card_element() == Some("center"))
}
