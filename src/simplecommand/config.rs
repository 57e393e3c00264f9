//! # Config Files
//!
//! Reads a config file into a flat table of flag values. The format comes from the file
//! extension:
//!
//! | Extension | Parser |
//! |-----------|--------|
//! | `.json` | `serde_json` |
//! | `.toml` | `toml` |
//! | `.yaml`, `.yml` | `serde_yaml` |
//!
//! Every format is read into a `serde_json::Value` first so the flattening rules are shared:
//! nested tables become dotted keys (`server.port`), arrays become multiple values, `null` is
//! dropped, and keys are lower-cased so they match flag names regardless of case.

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BindError, Result};

/// Flag values read from a config file, keyed by lower-cased flag name.
pub type ConfigValues = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Loads `path`, returning `Ok(None)` when the file is missing and `optional` is set.
pub fn load(path: &Path, optional: bool) -> Result<Option<ConfigValues>> {
    let format =
        ConfigFormat::from_path(path).ok_or_else(|| BindError::UnsupportedFormat(path.into()))?;

    if !path.exists() {
        if optional {
            tracing::debug!(path = %path.display(), "optional config file not found");
            return Ok(None);
        }
        return Err(BindError::ConfigNotFound(path.into()));
    }

    let content = fs::read_to_string(path).map_err(|source| BindError::ConfigRead {
        path: path.into(),
        source,
    })?;
    let parsed = parse(format, &content).map_err(|message| BindError::ConfigParse {
        path: path.into(),
        message,
    })?;
    tracing::debug!(path = %path.display(), keys = parsed.len(), "config file loaded");
    Ok(Some(parsed))
}

/// Parses config text in the given format into flag values.
pub fn parse(format: ConfigFormat, content: &str) -> std::result::Result<ConfigValues, String> {
    if content.trim().is_empty() {
        return Ok(ConfigValues::new());
    }

    let value: Value = format.parse(content)?;
    let Value::Object(_) = value else {
        return Err("top level must be a table of keys".to_string());
    };

    let mut values = ConfigValues::new();
    flatten("", &value, &mut values);
    Ok(values)
}

fn flatten(prefix: &str, value: &Value, out: &mut ConfigValues) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let key = key.to_lowercase();
                let key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, inner, out);
            }
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            out.insert(prefix.to_string(), items);
        }
        Value::Null => {}
        other => {
            if let Some(s) = scalar(other) {
                out.insert(prefix.to_string(), vec![s]);
            }
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `<OS config dir>/<file>` for an application, e.g. `~/.config/<app>/config.toml` on Linux.
pub fn user_config_file(app: &str, file: &str) -> Option<PathBuf> {
    ProjectDirs::from("", "", app).map(|dirs| dirs.config_dir().join(file))
}
