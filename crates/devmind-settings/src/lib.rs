//! # devmind-settings
//!
//! Configuration management with layered sources for DevMind Live.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`DevMindSettings::default()`]
//! 2. **Settings file** — `~/.devmind/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `DEVMIND_*` overrides (highest priority)
//!
//! The process-wide cached value is initialized once at startup (the
//! binary calls [`init_settings`] after applying CLI overrides) and read
//! cheaply everywhere else via [`get_settings`].

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::Arc;

use parking_lot::RwLock;

/// Process-wide settings cache.
static SETTINGS: RwLock<Option<Arc<DevMindSettings>>> = RwLock::new(None);

/// Get the cached settings instance.
///
/// On first call, loads from `~/.devmind/settings.json` with env
/// overrides; if loading fails, falls back to compiled defaults with a
/// warning. Returns an `Arc` so callers hold a consistent snapshot.
pub fn get_settings() -> Arc<DevMindSettings> {
    {
        let guard = SETTINGS.read();
        if let Some(settings) = guard.as_ref() {
            return Arc::clone(settings);
        }
    }

    let mut guard = SETTINGS.write();
    // Another thread may have initialized between the locks.
    if let Some(settings) = guard.as_ref() {
        return Arc::clone(settings);
    }

    let settings = Arc::new(match load_settings() {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            DevMindSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Initialize the cache with a specific value, replacing any previous one.
///
/// Used by the binary after CLI overrides, and by tests.
pub fn init_settings(settings: DevMindSettings) {
    let mut guard = SETTINGS.write();
    *guard = Some(Arc::new(settings));
}
