//! Per-editor event bus.
//!
//! Every [`Editor`](crate::Editor) owns one bus; nothing is global.
//! Listeners are called synchronously in registration order.

use std::collections::BTreeMap;

use crate::paste::PasteFile;
use crate::range::Range;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Committed value after an edit.
    Change(String),
    Select(Range),
    ReadonlyChange(bool),
    CardActivated(String),
    CardDeactivated(String),
    PasteFiles(Vec<PasteFile>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Select,
    ReadonlyChange,
    CardActivated,
    CardDeactivated,
    PasteFiles,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::Change(_) => EventKind::Change,
            EditorEvent::Select(_) => EventKind::Select,
            EditorEvent::ReadonlyChange(_) => EventKind::ReadonlyChange,
            EditorEvent::CardActivated(_) => EventKind::CardActivated,
            EditorEvent::CardDeactivated(_) => EventKind::CardDeactivated,
            EditorEvent::PasteFiles(_) => EventKind::PasteFiles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Handler = Box<dyn FnMut(&EditorEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<ListenerId, (EventKind, Handler)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, (kind, Box::new(handler)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Call every listener for the event's kind. Returns how many ran.
    pub fn emit(&mut self, event: &EditorEvent) -> usize {
        let kind = event.kind();
        let mut count = 0;
        for (listener_kind, handler) in self.listeners.values_mut() {
            if *listener_kind == kind {
                handler(event);
                count += 1;
            }
        }
        count
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.values().filter(|(k, _)| *k == kind).count()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
