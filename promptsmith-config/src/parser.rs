//! Theme import: raw text to canonical [`Config`]
//!
//! Import runs in three stages:
//! 1. parse the text into an untyped tree (format from the hint, or JSON then YAML)
//! 2. validate the tree's shape, failing on the first violation with its path
//! 3. fill defaults, migrate legacy fields and assign identifiers

use crate::format::Format;
use crate::ids::{IdGenerator, UuidIds};
use crate::types::{Block, Config, Segment, Tooltip};
use crate::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Root keys understood by the document model; anything else is dropped
const KNOWN_ROOT_KEYS: &[&str] = &[
    "$schema",
    "version",
    "final_space",
    "shell_integration",
    "enable_cursor_positioning",
    "pwd",
    "console_title_template",
    "terminal_background",
    "accent_color",
    "tooltips_action",
    "async",
    "disable_notice",
    "patch_pwsh_bleed",
    "iterm_features",
    "blocks",
    "tooltips",
    "transient_prompt",
    "secondary_prompt",
    "valid_line",
    "error_line",
    "debug_prompt",
    "palette",
    "palettes",
    "cycle",
    "var",
    "maps",
];

/// Import a theme, generating UUID identifiers
///
/// `hint` is a filename or a bare format name. See [`import_with_ids`].
pub fn import(text: &str, hint: &str) -> Result<Config> {
    import_with_ids(text, hint, &UuidIds)
}

/// Import a theme using the given identifier source
pub fn import_with_ids(text: &str, hint: &str, ids: &dyn IdGenerator) -> Result<Config> {
    let (format, value) = parse_value(text, hint)?;
    let config = normalize(value, ids)?;
    debug!(
        "Imported {} theme: {} block(s), {} tooltip(s)",
        format,
        config.blocks.len(),
        config.tooltips.len()
    );
    Ok(config)
}

/// Parse text into an untyped tree, returning the format that succeeded
///
/// An unknown hint tries JSON, then YAML; a failure reports the YAML error.
/// TOML is only used when the hint names it.
pub fn parse_value(text: &str, hint: &str) -> Result<(Format, Value)> {
    match Format::from_hint(hint) {
        Some(format) => parse_as(format, text).map(|value| (format, value)),
        None => match parse_as(Format::Json, text) {
            Ok(value) => Ok((Format::Json, value)),
            Err(_) => parse_as(Format::Yaml, text).map(|value| (Format::Yaml, value)),
        },
    }
}

/// Parse text in a specific format
pub fn parse_as(format: Format, text: &str) -> Result<Value> {
    let parse_error = |message: String| ConfigError::Parse { format, message };
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str::<toml::Table>(text)
            .map(|table| toml_to_json(toml::Value::Table(table)))
            .map_err(|e| parse_error(e.message().to_string())),
    }
}

/// Validate and normalize an untyped tree into a [`Config`]
pub fn normalize(value: Value, ids: &dyn IdGenerator) -> Result<Config> {
    let Value::Object(mut root) = value else {
        return Err(ConfigError::validation("root", "theme must be an object"));
    };

    let blocks = match root.remove("blocks") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ConfigError::validation("blocks", "blocks must be an array")),
        None => return Err(ConfigError::validation("blocks", "blocks is required")),
    };
    if blocks.is_empty() {
        return Err(ConfigError::validation(
            "blocks",
            "theme must contain at least one block",
        ));
    }
    let blocks = blocks
        .into_iter()
        .enumerate()
        .map(|(bi, value)| normalize_block(value, &format!("blocks[{}]", bi)))
        .collect::<Result<Vec<_>>>()?;

    let tooltips = match root.remove("tooltips") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(ti, value)| normalize_tooltip(value, &format!("tooltips[{}]", ti)))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(ConfigError::validation(
                "tooltips",
                "tooltips must be an array",
            ))
        }
    };

    let dropped: Vec<&str> = root
        .keys()
        .map(String::as_str)
        .filter(|key| !KNOWN_ROOT_KEYS.contains(key))
        .collect();
    if !dropped.is_empty() {
        debug!("Dropping unrecognized theme fields: {}", dropped.join(", "));
    }

    let mut config: Config = from_map(root, "root")?;
    config.blocks = blocks;
    config.tooltips = tooltips;
    config.assign_missing_ids(ids);
    Ok(config)
}

fn normalize_block(value: Value, path: &str) -> Result<Block> {
    let Value::Object(mut map) = value else {
        return Err(ConfigError::validation(path, "block must be an object"));
    };

    let segments = match map.remove("segments") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ConfigError::validation(
                format!("{}.segments", path),
                "segments must be an array",
            ))
        }
    };
    let segments = segments
        .into_iter()
        .enumerate()
        .map(|(si, value)| normalize_segment(value, &format!("{}.segments[{}]", path, si)))
        .collect::<Result<Vec<_>>>()?;

    let mut block: Block = from_map(map, path)?;
    block.segments = segments;
    Ok(block)
}

fn normalize_segment(value: Value, path: &str) -> Result<Segment> {
    let map = segment_fields(value, path, "segment")?;
    from_map(map, path)
}

fn normalize_tooltip(value: Value, path: &str) -> Result<Tooltip> {
    let mut map = segment_fields(value, path, "tooltip")?;
    match map.get("tips") {
        None | Some(Value::Null) => {
            map.insert("tips".to_string(), Value::Array(Vec::new()));
        }
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(ConfigError::validation(
                format!("{}.tips", path),
                "tips must be an array",
            ))
        }
    }
    from_map(map, path)
}

/// Shared segment/tooltip checks: object shape, non-empty type, legacy options
fn segment_fields(value: Value, path: &str, what: &str) -> Result<Map<String, Value>> {
    let Value::Object(mut map) = value else {
        return Err(ConfigError::validation(
            path,
            format!("{} must be an object", what),
        ));
    };

    match map.get("type") {
        Some(Value::String(kind)) if !kind.trim().is_empty() => {}
        _ => {
            return Err(ConfigError::validation(
                format!("{}.type", path),
                format!("{} must have a non-empty type", what),
            ))
        }
    }

    // Legacy name for options; an explicit options field wins
    if let Some(properties) = map.remove("properties") {
        if !map.contains_key("options") {
            map.insert("options".to_string(), properties);
        }
    }

    Ok(map)
}

fn from_map<T: DeserializeOwned>(map: Map<String, Value>, path: &str) -> Result<T> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ConfigError::validation(path, e.to_string()))
}

/// Convert a parsed TOML value into the JSON interchange tree
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
