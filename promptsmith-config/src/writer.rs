//! Theme export: canonical [`Config`] to text
//!
//! Export never writes identifiers, fills in `$schema` and `version` when
//! missing, and emits keys in model declaration order so two exports of the
//! same document are byte-identical.

use crate::codec;
use crate::format::Format;
use crate::types::{Config, DEFAULT_SCHEMA, DEFAULT_VERSION};
use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table};
use tracing::debug;

/// Render a theme in the given format
pub fn export(config: &Config, format: Format) -> Result<String> {
    let value = export_value(config, format)?;
    let text = match format {
        Format::Json => to_json(&value)?,
        Format::Yaml => serde_yaml::to_string(&value).map_err(|e| ConfigError::Serialize {
            format,
            message: e.to_string(),
        })?,
        Format::Toml => to_toml(&value),
    };
    debug!("Exported theme as {} ({} bytes)", format, text.len());
    Ok(text)
}

/// Export-ready interchange tree: ids stripped, schema and version defaulted
pub fn export_value(config: &Config, format: Format) -> Result<Value> {
    let mut config = config.clone();
    config
        .schema
        .get_or_insert_with(|| DEFAULT_SCHEMA.to_string());
    config.version.get_or_insert(DEFAULT_VERSION);

    serde_json::to_value(&config).map_err(|e| ConfigError::Serialize {
        format,
        message: e.to_string(),
    })
}

/// Two-space indented JSON with every non-ASCII character escaped
fn to_json(value: &Value) -> Result<String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ConfigError::Serialize {
        format: Format::Json,
        message: e.to_string(),
    })?;
    // serde_json only emits non-ASCII inside string literals
    Ok(codec::escape_non_ascii(&text))
}

/// TOML document with nulls pruned and lists of objects as arrays of tables
fn to_toml(value: &Value) -> String {
    let mut doc = DocumentMut::new();
    if let Value::Object(map) = value {
        fill_table(doc.as_table_mut(), map);
    }
    doc.to_string()
}

fn fill_table(table: &mut Table, map: &Map<String, Value>) {
    for (key, value) in map {
        if let Some(item) = to_item(value) {
            table.insert(key, item);
        }
    }
}

fn to_item(value: &Value) -> Option<Item> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let mut table = Table::new();
            fill_table(&mut table, map);
            // Tables holding only sub-tables don't need their own header
            if !table.is_empty() && table.iter().all(|(_, item)| !item.is_value()) {
                table.set_implicit(true);
            }
            Some(Item::Table(table))
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let mut tables = ArrayOfTables::new();
            for item in items {
                if let Value::Object(map) = item {
                    let mut table = Table::new();
                    fill_table(&mut table, map);
                    tables.push(table);
                }
            }
            Some(Item::ArrayOfTables(tables))
        }
        other => to_inline(other).map(Item::Value),
    }
}

fn to_inline(value: &Value) -> Option<toml_edit::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(toml_edit::Value::from)
            .or_else(|| n.as_f64().map(toml_edit::Value::from)),
        Value::String(s) => Some(s.as_str().into()),
        Value::Array(items) => {
            let mut array = Array::new();
            for item in items.iter().filter_map(to_inline) {
                array.push(item);
            }
            Some(toml_edit::Value::Array(array))
        }
        Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, value) in map {
                if let Some(value) = to_inline(value) {
                    table.insert(key.as_str(), value);
                }
            }
            Some(toml_edit::Value::InlineTable(table))
        }
    }
}
