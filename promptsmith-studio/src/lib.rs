//! Promptsmith editing studio
//!
//! Everything around the live theme document that needs state or I/O:
//!
//! - [`editor`] - Mutation engine with selection and palette preview
//! - [`events`] - State-change notifications published by the editor
//! - [`store`] - Async key-value storage (memory and directory backed)
//! - [`draft`] - Debounced draft autosave
//! - [`library`] - Saved configs and bundle import/export
//! - [`settings`] - `~/.promptsmith/settings.toml`
//! - [`studio`] - Session façade tying the pieces together

pub mod draft;
pub mod editor;
pub mod error;
pub mod events;
pub mod library;
pub mod settings;
pub mod store;
pub mod studio;

pub use draft::{Draft, DraftAutosave};
pub use editor::{Editor, Selection};
pub use error::{LibraryError, Result, SettingsError, StoreError, StudioError};
pub use events::{EditorEvent, EditorEvents};
pub use library::{ConflictStrategy, ImportReport, SavedConfig, SnapshotLibrary};
pub use settings::StudioSettings;
pub use store::{FileStore, KvStore, MemoryStore};
pub use studio::Studio;
