//! Settings loading: file, deep merge, env overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::RelaySettings;

/// Default settings file location: `~/.relay/settings.json`.
///
/// Falls back to a relative path when `HOME` is unset (containers).
#[must_use]
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".relay/settings.json"),
        |home| PathBuf::from(home).join(".relay/settings.json"),
    )
}

/// Deep-merge `overlay` into `base`. Objects merge recursively; any other
/// overlay value replaces the base value.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides applied.
///
/// A missing file is not an error — defaults are used.
pub fn load_settings() -> Result<RelaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file with env overrides applied.
pub fn load_settings_from_path(path: &Path) -> Result<RelaySettings> {
    let defaults = serde_json::to_value(RelaySettings::default())
        .expect("default settings serialize");

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_value: Value =
            serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        debug!(?path, "settings file loaded");
        deep_merge(defaults, file_value)
    } else {
        debug!(?path, "no settings file, using defaults");
        defaults
    };

    let mut settings: RelaySettings =
        serde_json::from_value(merged).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Apply `RELAY_*` environment overrides (highest priority layer).
///
/// Unparseable values are ignored with a warning rather than rejected.
fn apply_env_overrides(settings: &mut RelaySettings) {
    fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
        let raw = std::env::var(name).ok()?;
        match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring unparseable {name}={raw}");
                None
            }
        }
    }

    if let Some(port) = parse_env("RELAY_PORT") {
        settings.server.port = port;
    }
    if let Some(port) = parse_env("RELAY_TOOLHOST_PORT") {
        settings.server.toolhost_port = port;
    }
    if let Ok(url) = std::env::var("RELAY_REASONING_BASE_URL") {
        settings.reasoning.base_url = url;
    }
    if let Ok(model) = std::env::var("RELAY_REASONING_MODEL") {
        settings.reasoning.model = model;
    }
    if let Ok(url) = std::env::var("RELAY_TOOLS_BASE_URL") {
        settings.tools.base_url = url;
    }
    if let Some(max) = parse_env("RELAY_MAX_SESSIONS") {
        settings.sessions.max_concurrent = max;
    }
}
