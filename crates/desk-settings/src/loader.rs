//! Settings loading: defaults → user file → environment overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::DeskSettings;

/// Path of the user settings file (`~/.desk/settings.json`).
#[must_use]
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".desk")
        .join("settings.json")
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge recursively; any other value in `overlay` replaces the
/// corresponding value in `base`.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<DeskSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file path.
///
/// A missing file is not an error — compiled defaults apply. A present but
/// unreadable or unparsable file is an error so typos do not silently
/// revert the user to defaults.
pub fn load_settings_from_path(path: &Path) -> Result<DeskSettings> {
    let defaults =
        serde_json::to_value(DeskSettings::default()).expect("defaults always serialize");

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "merged user settings file");
        deep_merge(defaults, user)
    } else {
        defaults
    };

    let mut settings: DeskSettings = serde_json::from_value(merged).map_err(|source| {
        SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Apply `DESK_*` environment variable overrides (highest priority).
fn apply_env_overrides(settings: &mut DeskSettings) {
    if let Ok(origin) = std::env::var("DESK_ORIGIN") {
        settings.server.origin = origin;
    }
    override_parsed("DESK_LOCAL_PORT", &mut settings.server.local_port);
    override_parsed(
        "DESK_RECONNECT_DELAY_MS",
        &mut settings.connection.reconnect.delay_ms,
    );
    if let Ok(username) = std::env::var("DESK_USERNAME") {
        settings.bootstrap.username = username;
    }
    override_parsed(
        "DESK_INITIAL_CAPITAL",
        &mut settings.bootstrap.initial_capital,
    );
    if let Ok(base_url) = std::env::var("DESK_API_BASE_URL") {
        settings.api.base_url = base_url;
    }
    if let Ok(level) = std::env::var("DESK_LOG_LEVEL") {
        settings.logging.level = level;
    }
}

/// Override `target` from an env var, warning on unparsable values.
fn override_parsed<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value = %raw, "ignoring unparsable env override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_nested_objects() {
        let base = json!({"server": {"origin": "a", "local_port": 8000}, "name": "desk"});
        let overlay = json!({"server": {"local_port": 9000}});
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["server"]["local_port"], 9000);
        assert_eq!(merged["server"]["origin"], "a");
        assert_eq!(merged["name"], "desk");
    }

    #[test]
    fn deep_merge_scalar_replaces() {
        let merged = deep_merge(json!({"x": 1}), json!({"x": [1, 2]}));
        assert_eq!(merged["x"], json!([1, 2]));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.server.local_port, 8000);
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"connection": {"reconnect": {"delay_ms": 500}}, "bootstrap": {"username": "alice"}}"#,
        )
        .unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.connection.reconnect.delay_ms, 500);
        assert_eq!(settings.bootstrap.username, "alice");
        // Untouched values keep defaults
        assert_eq!(settings.api.page_size, 20);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{broken").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    #[test]
    fn settings_path_under_home() {
        let path = settings_path();
        assert!(path.ends_with(".desk/settings.json"));
    }
}
