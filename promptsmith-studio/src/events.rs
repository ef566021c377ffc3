//! State-change notifications from the editor
//!
//! The editor publishes an event after every successful mutation; the
//! draft autosave task (and any UI) subscribes instead of polling.

use promptsmith_config::Config;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something happened to the live document
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// The document changed through a mutation
    Edited(Arc<Config>),
    /// The document was swapped wholesale (import, reset, accepted draft)
    Replaced(Arc<Config>),
    /// A saved config from the library became the live document
    Loaded(Arc<Config>),
    /// The document was explicitly saved to the library
    Saved,
}

impl EditorEvent {
    /// Whether this event invalidates a pending draft write
    pub fn clears_draft(&self) -> bool {
        matches!(self, EditorEvent::Loaded(_) | EditorEvent::Saved)
    }

    /// Document to autosave, for events that leave unsaved work behind
    pub fn unsaved(&self) -> Option<&Arc<Config>> {
        match self {
            EditorEvent::Edited(config) | EditorEvent::Replaced(config) => Some(config),
            EditorEvent::Loaded(_) | EditorEvent::Saved => None,
        }
    }
}

/// Event broadcaster for distributing editor events to subscribers
#[derive(Clone)]
pub struct EditorEvents {
    sender: broadcast::Sender<Arc<EditorEvent>>,
}

impl EditorEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<EditorEvent>> {
        self.sender.subscribe()
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast(&self, event: EditorEvent) {
        // Ignore send errors (no subscribers is fine)
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn emit_edited(&self, config: Arc<Config>) {
        self.broadcast(EditorEvent::Edited(config));
    }

    pub fn emit_replaced(&self, config: Arc<Config>) {
        self.broadcast(EditorEvent::Replaced(config));
    }

    pub fn emit_loaded(&self, config: Arc<Config>) {
        self.broadcast(EditorEvent::Loaded(config));
    }

    pub fn emit_saved(&self) {
        self.broadcast(EditorEvent::Saved);
    }
}

impl Default for EditorEvents {
    fn default() -> Self {
        Self::new()
    }
}
