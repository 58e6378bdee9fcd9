//! Loading schema descriptions and component registries.
//!
//! Handles loading from files and strings.

use std::path::Path;

use serde_json::Value;

use crate::description::parse_root;
use crate::error::LoadError;
use crate::registry::Components;
use crate::schema::Schema;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_json_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load and parse a schema description file.
///
/// # Errors
///
/// Returns the errors of [`load_json`], or `LoadError::Translate` if the
/// document is not a valid schema description.
pub fn load_description(path: &Path) -> Result<Schema, LoadError> {
    let value = load_json(path)?;
    Ok(parse_root(&value)?)
}

/// Parse a schema description from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` or `LoadError::Translate`.
pub fn load_description_str(content: &str) -> Result<Schema, LoadError> {
    let value = load_json_str(content)?;
    Ok(parse_root(&value)?)
}

/// Load an existing component registry, e.g. the output of an earlier run.
///
/// Accepts either the bare registry (`{"schemas": {..}}`) or a full
/// translation result with a `components` key.
///
/// # Errors
///
/// Returns the errors of [`load_json`], or `LoadError::Translate` if the
/// document is not shaped like a registry.
pub fn load_components(path: &Path) -> Result<Components, LoadError> {
    let value = load_json(path)?;
    let registry = match value.get("components") {
        Some(inner) if value.get("schemas").is_none() => inner,
        _ => &value,
    };
    Ok(Components::from_value(registry)?)
}
