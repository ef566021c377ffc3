//! Promptsmith Theme Document Engine
//!
//! A standalone library for prompt theme documents with support for:
//! - Importing hand-authored JSON, YAML and TOML themes (including legacy field names)
//! - Deterministic export back to any of the three formats
//! - Color reference resolution against palettes and palette variants
//! - Structural diagnostics (alias rules, unresolved palette references)
//!
//! # Architecture
//!
//! This crate performs no I/O and is independent of the editing session.
//!
//! - [`types`] - Document model (config, blocks, segments, tooltips, prompts)
//! - [`parser`] - Normalizer: raw text to canonical [`Config`]
//! - [`writer`] - Serializer: canonical [`Config`] to text
//! - [`color`] - Color token classification and palette resolution
//! - [`codec`] - `\uXXXX` escape conversion
//! - [`diagnostics`] - Non-fatal document checks
//! - [`ids`] - Injectable identifier generation

pub mod codec;
pub mod color;
pub mod defaults;
pub mod diagnostics;
pub mod format;
pub mod ids;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use color::{ColorKind, ResolvedColor};
pub use diagnostics::Diagnostic;
pub use format::Format;
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use parser::import;
pub use types::{
    Block, BlockType, Config, ExtraPrompt, ExtraPromptKind, Palette, PaletteSet, Segment,
    SegmentStyle, Tooltip,
};
pub use writer::export;

/// Errors that can occur during import or export
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{format} parsing error: {message}")]
    Parse { format: Format, message: String },

    #[error("invalid theme at {path}: {message}")]
    Validation { path: String, message: String },

    #[error("{format} serialization error: {message}")]
    Serialize { format: Format, message: String },
}

impl ConfigError {
    pub(crate) fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
