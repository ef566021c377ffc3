//! Editing session: editor, saved configs and draft autosave together

use crate::draft::{self, Draft, DraftAutosave};
use crate::editor::Editor;
use crate::error::{LibraryError, Result};
use crate::events::EditorEvents;
use crate::library::{SavedConfig, SnapshotLibrary};
use crate::settings::StudioSettings;
use crate::store::KvStore;
use promptsmith_config::IdGenerator;
use std::sync::Arc;
use tracing::info;

pub struct Studio {
    editor: Editor,
    library: SnapshotLibrary,
    store: Arc<dyn KvStore>,
    settings: StudioSettings,
    /// Saved config the live document came from
    current: Option<String>,
    _autosave: DraftAutosave,
}

impl Studio {
    /// Open a session on the default theme
    ///
    /// An existing draft is not applied; check [`Studio::pending_draft`].
    pub async fn open(
        store: Arc<dyn KvStore>,
        settings: StudioSettings,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let events = EditorEvents::new();
        let autosave =
            DraftAutosave::spawn(Arc::clone(&store), &events, settings.autosave_debounce());
        let library = SnapshotLibrary::open(Arc::clone(&store)).await?;
        info!("Studio opened with {} saved config(s)", library.len());

        Ok(Self {
            editor: Editor::new(ids, events),
            library,
            store,
            settings,
            current: None,
            _autosave: autosave,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn library(&self) -> &SnapshotLibrary {
        &self.library
    }

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    pub fn current_saved_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Export the live document in the configured default format
    pub fn export_default(&self) -> Result<String> {
        Ok(self.editor.export(self.settings.default_export_format)?)
    }

    /// Save the live document as a new saved config
    pub async fn save_as(
        &mut self,
        name: &str,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Result<SavedConfig> {
        let saved = self
            .library
            .create(name, description, tags, self.editor.config())
            .await?;
        self.current = Some(saved.id.clone());
        self.editor.events().emit_saved();
        Ok(saved)
    }

    /// Write the live document over an existing saved config
    pub async fn update_saved(&mut self, id: &str) -> Result<SavedConfig> {
        let saved = self.library.update(id, self.editor.config()).await?;
        self.current = Some(saved.id.clone());
        self.editor.events().emit_saved();
        Ok(saved)
    }

    /// Replace the live document with a saved config
    pub fn load_saved(&mut self, id: &str) -> Result<()> {
        let saved = self
            .library
            .get(id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let config = saved.config.clone();
        if !self.editor.open_saved(config) {
            return Err(LibraryError::NoBlocks(id.to_string()).into());
        }
        self.current = Some(id.to_string());
        Ok(())
    }

    /// Mutable access for rename, duplicate, delete and bundles
    pub fn library_mut(&mut self) -> &mut SnapshotLibrary {
        &mut self.library
    }

    pub async fn pending_draft(&self) -> Result<Option<Draft>> {
        Ok(draft::pending_draft(self.store.as_ref()).await?)
    }

    /// Load the stored draft into the editor; false when there is none
    ///
    /// The draft stays stored until the document is saved or a saved config
    /// is opened.
    pub async fn accept_draft(&mut self) -> Result<bool> {
        match self.pending_draft().await? {
            Some(draft) => {
                info!("Restoring draft from {}", draft.saved_at.to_rfc3339());
                if !self.editor.load(draft.config) {
                    return Ok(false);
                }
                self.current = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn discard_draft(&self) -> Result<()> {
        Ok(draft::discard_draft(self.store.as_ref()).await?)
    }
}
