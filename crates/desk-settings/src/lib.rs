//! # desk-settings
//!
//! Configuration management with layered sources for the desk dashboard.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`DeskSettings::default()`]
//! 2. **User file** — `~/.desk/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `DESK_*` overrides (highest priority)
//!
//! The global singleton is reloadable: callers hold an `Arc` snapshot, so a
//! reload never changes values out from under a component mid-operation.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::{Arc, RwLock};

/// Process-wide settings cache.
///
/// A plain `OnceLock` cannot serve here because the cached value must be
/// replaceable at runtime (reload). `None` means nothing has been loaded
/// yet; each accessor receives its own `Arc` snapshot, so a swap never
/// mutates settings a component is already holding.
static SETTINGS: RwLock<Option<Arc<DeskSettings>>> = RwLock::new(None);

/// The current settings snapshot, loading lazily on first access.
///
/// The first caller triggers the full layered load (defaults → user file →
/// `DESK_*` env). A load failure is logged and degrades to compiled
/// defaults rather than aborting, because the dashboard is usable without
/// a settings file.
pub fn get_settings() -> Arc<DeskSettings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    // Re-check under the write lock; a racing first caller may have won.
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            DeskSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Seed the cache with an already-built value, replacing whatever is there.
///
/// The startup path uses this when the CLI names an explicit settings file;
/// tests use it to pin known values.
pub fn init_settings(settings: DeskSettings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Re-run the layered load against `path` and publish the result.
///
/// Components holding an earlier `Arc` keep it; only subsequent
/// [`get_settings`] calls observe the new values.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            DeskSettings::default()
        }
    });
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(new);
    tracing::info!(?path, "settings reloaded from disk");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Serializes the tests below: they all write the one `SETTINGS`
    /// static, and the default parallel test runner would interleave them.
    static SETTINGS_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn init_then_get_returns_same_values() {
        let _guard = SETTINGS_MUTEX.lock().unwrap();
        let mut custom = DeskSettings::default();
        custom.bootstrap.username = "alice".into();
        init_settings(custom);
        assert_eq!(get_settings().bootstrap.username, "alice");
    }

    #[test]
    fn reload_swaps_cached_value() {
        let _guard = SETTINGS_MUTEX.lock().unwrap();
        init_settings(DeskSettings::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api": {"page_size": 50}}"#).unwrap();
        reload_settings_from_path(&path);

        assert_eq!(get_settings().api.page_size, 50);
    }

    #[test]
    fn reload_from_bad_path_falls_back_to_defaults() {
        let _guard = SETTINGS_MUTEX.lock().unwrap();
        let mut custom = DeskSettings::default();
        custom.api.page_size = 99;
        init_settings(custom);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{broken").unwrap();
        reload_settings_from_path(&path);

        assert_eq!(get_settings().api.page_size, 20);
    }
}
