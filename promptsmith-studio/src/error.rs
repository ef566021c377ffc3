//! Error types for promptsmith-studio

use promptsmith_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a key-value store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid store key: {0}")]
    InvalidKey(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in saved config operations
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("saved config limit reached ({0})")]
    Capacity(usize),

    #[error("too many tags: {count} (max {max})")]
    TagLimit { count: usize, max: usize },

    #[error("a saved config named '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("saved config not found: {0}")]
    NotFound(String),

    #[error("saved config {0} has no blocks")]
    NoBlocks(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode saved configs: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode saved configs: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur loading or saving studio settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level studio error type
#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;
