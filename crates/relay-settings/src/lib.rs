//! # relay-settings
//!
//! Configuration for the relay gateway and toolhost.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`RelaySettings::default()`]
//! 2. **Settings file** — `~/.relay/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `RELAY_*` overrides (highest priority)
//!
//! The file may be partial: every section carries `#[serde(default)]`, so
//! missing fields fall back to compiled defaults. Secrets (API keys) are
//! never stored in the file — settings name the environment variable that
//! holds them.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
