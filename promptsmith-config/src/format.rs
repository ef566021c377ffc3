//! On-disk theme formats and detection from filename hints

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text formats a theme can be imported from or exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// All formats, in export menu order
    pub fn all() -> &'static [Format] {
        &[Format::Json, Format::Yaml, Format::Toml]
    }

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        }
    }

    /// Preferred file extension for exports
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "omp.json",
            Format::Yaml => "omp.yaml",
            Format::Toml => "omp.toml",
        }
    }

    #[allow(clippy::should_implement_trait)]
    /// Parse a bare format name ("json", "yml", ...)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "jsonc" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Detect a format from a filename or an explicit format name
    ///
    /// Returns None when neither the hint itself nor its extension names a
    /// known format; callers then fall back to content sniffing.
    pub fn from_hint(hint: &str) -> Option<Self> {
        if let Some(format) = Self::from_str(hint) {
            return Some(format);
        }
        let (_, extension) = hint.rsplit_once('.')?;
        Self::from_str(extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
        })
    }
}
