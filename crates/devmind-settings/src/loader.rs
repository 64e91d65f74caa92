//! Settings loading: defaults → JSON file → `DEVMIND_*` env overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::DevMindSettings;

/// Environment variables recognized as overrides, with the settings path
/// each one targets.
const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("DEVMIND_HOST", &["server", "host"]),
    ("DEVMIND_PORT", &["server", "port"]),
    ("DEVMIND_ALLOWED_ORIGINS", &["cors", "allowed_origins"]),
    ("DEVMIND_WS_CHANNEL_CAPACITY", &["websocket", "channel_capacity"]),
    ("DEVMIND_WS_SEND_TIMEOUT_SECS", &["websocket", "send_timeout_secs"]),
];

/// Default settings file location: `~/.devmind/settings.json`.
#[must_use]
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".devmind").join("settings.json")
}

/// Load settings from the default path with env overrides applied.
///
/// A missing file is not an error (defaults are used); a present but
/// unreadable or malformed file is.
pub fn load_settings() -> Result<DevMindSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file with env overrides applied.
pub fn load_settings_from_path(path: &Path) -> Result<DevMindSettings> {
    let mut merged = serde_json::to_value(DevMindSettings::default())
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_value: Value =
            serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        deep_merge(&mut merged, file_value);
    }

    apply_env_overrides(&mut merged, |name| std::env::var(name).ok());

    serde_json::from_value(merged).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key-by-key; any other value replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        let _ = base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

/// Apply `DEVMIND_*` env overrides onto a merged settings value.
///
/// The lookup function is injected so tests do not mutate process
/// environment. Numeric targets parse as numbers; the origins list
/// splits on commas.
fn apply_env_overrides(merged: &mut Value, lookup: impl Fn(&str) -> Option<String>) {
    for &(name, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(name) else { continue };
        let value = coerce_override(path, &raw);
        set_path(merged, path, value);
    }
}

fn coerce_override(path: &[&str], raw: &str) -> Value {
    match *path.last().unwrap_or(&"") {
        "port" | "channel_capacity" | "send_timeout_secs" => raw
            .parse::<u64>()
            .map_or_else(|_| Value::String(raw.to_owned()), Value::from),
        "allowed_origins" => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| Value::String(origin.to_owned()))
                .collect(),
        ),
        _ => Value::String(raw.to_owned()),
    }
}

fn set_path(target: &mut Value, path: &[&str], value: Value) {
    let mut cursor = target;
    for key in &path[..path.len() - 1] {
        if !cursor.is_object() {
            *cursor = Value::Object(serde_json::Map::new());
        }
        cursor = cursor
            .as_object_mut()
            .expect("cursor coerced to object above")
            .entry((*key).to_owned())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    if let Some(last) = path.last() {
        if !cursor.is_object() {
            *cursor = Value::Object(serde_json::Map::new());
        }
        if let Some(map) = cursor.as_object_mut() {
            let _ = map.insert((*last).to_owned(), value);
        }
    }
}
