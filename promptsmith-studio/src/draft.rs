//! Draft autosave
//!
//! A background task listens to editor events and writes the latest document
//! to the store once edits have been quiet for the debounce window. A burst
//! of edits collapses to a single write. Saving the document, or opening a
//! saved config, drops any pending write and clears the stored draft.
//!
//! Autosave is implicit, so its failures are logged and never surfaced.

use crate::error::StoreError;
use crate::events::{EditorEvent, EditorEvents};
use crate::store::KvStore;
use chrono::{DateTime, Utc};
use promptsmith_config::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Store key holding the draft
pub const DRAFT_KEY: &str = "draft";

/// Unsaved work captured by autosave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub config: Config,
    pub saved_at: DateTime<Utc>,
}

/// Read the stored draft, if any
///
/// A draft that no longer decodes, or holds no blocks, is treated as absent.
pub async fn pending_draft(store: &dyn KvStore) -> Result<Option<Draft>, StoreError> {
    let Some(bytes) = store.get(DRAFT_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_slice::<Draft>(&bytes) {
        Ok(draft) if draft.config.blocks.is_empty() => {
            warn!("Ignoring draft without blocks");
            Ok(None)
        }
        Ok(draft) => Ok(Some(draft)),
        Err(e) => {
            warn!("Ignoring unreadable draft: {}", e);
            Ok(None)
        }
    }
}

pub async fn discard_draft(store: &dyn KvStore) -> Result<(), StoreError> {
    store.delete(DRAFT_KEY).await
}

/// Handle to the running autosave task; dropping it stops the task
pub struct DraftAutosave {
    handle: JoinHandle<()>,
}

impl DraftAutosave {
    /// Start autosaving events from `events` into `store`
    pub fn spawn(store: Arc<dyn KvStore>, events: &EditorEvents, debounce: Duration) -> Self {
        let rx = events.subscribe();
        let handle = tokio::spawn(run(store, rx, debounce));
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for DraftAutosave {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    store: Arc<dyn KvStore>,
    mut rx: broadcast::Receiver<Arc<EditorEvent>>,
    debounce: Duration,
) {
    let mut pending: Option<Arc<Config>> = None;
    let deadline = tokio::time::sleep(debounce);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => {
                    if let Some(config) = event.unsaved() {
                        pending = Some(Arc::clone(config));
                        deadline.as_mut().reset(Instant::now() + debounce);
                    } else if event.clears_draft() {
                        pending = None;
                        clear(store.as_ref()).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Autosave fell behind, skipped {} editor events", skipped);
                }
                Err(RecvError::Closed) => {
                    // Editor is gone; keep whatever was still waiting
                    if let Some(config) = pending.take() {
                        write(store.as_ref(), &config).await;
                    }
                    debug!("Autosave stopped");
                    break;
                }
            },
            () = &mut deadline, if pending.is_some() => {
                if let Some(config) = pending.take() {
                    write(store.as_ref(), &config).await;
                }
            }
        }
    }
}

async fn write(store: &dyn KvStore, config: &Config) {
    let draft = Draft {
        config: config.clone(),
        saved_at: Utc::now(),
    };
    let bytes = match serde_json::to_vec(&draft) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to encode draft: {}", e);
            return;
        }
    };
    match store.set(DRAFT_KEY, bytes).await {
        Ok(()) => info!("Draft saved at {}", draft.saved_at.to_rfc3339()),
        Err(e) => warn!("Failed to save draft: {}", e),
    }
}

async fn clear(store: &dyn KvStore) {
    if let Err(e) = store.delete(DRAFT_KEY).await {
        warn!("Failed to clear draft: {}", e);
    }
}
