//! Settings type definitions.
//!
//! All field names are snake_case to match the rest of the desk wire
//! format. Each type implements [`Default`] with production default values;
//! `#[serde(default)]` allows partial JSON, with missing fields filled from
//! the defaults during deserialization.

use desk_core::reconnect::ReconnectPolicy;
use serde::{Deserialize, Serialize};

/// Root settings type for the desk dashboard.
///
/// Loaded from `~/.desk/settings.json` with defaults applied for missing
/// fields. `DESK_*` environment variables override specific values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Trading server network settings.
    pub server: ServerSettings,
    /// Connection supervision settings.
    pub connection: ConnectionSettings,
    /// Bootstrap handshake parameters.
    pub bootstrap: BootstrapSettings,
    /// REST read-endpoint settings.
    pub api: ApiSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "desk".to_string(),
            server: ServerSettings::default(),
            connection: ConnectionSettings::default(),
            bootstrap: BootstrapSettings::default(),
            api: ApiSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl DeskSettings {
    /// Clamp out-of-range values rather than rejecting them, so users get
    /// corrected behavior instead of a confusing startup error.
    pub fn validate(&mut self) {
        let jitter = &mut self.connection.reconnect.jitter_factor;
        if !(0.0..=1.0).contains(jitter) {
            let clamped = jitter.clamp(0.0, 1.0);
            tracing::warn!("reconnect jitter_factor out of range ({jitter}), clamped to {clamped}");
            *jitter = clamped;
        }
        if self.api.page_size == 0 {
            tracing::warn!("api page_size of 0 corrected to 1");
            self.api.page_size = 1;
        }
    }
}

/// Trading server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Dashboard origin the client runs under. Loopback origins always
    /// target the fixed local development port; anything else targets the
    /// same host over the ws/wss variant matching this origin's scheme.
    pub origin: String,
    /// Fixed port the trading server listens on in local development.
    pub local_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:5173".to_string(),
            local_port: 8000,
        }
    }
}

/// Connection supervision settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Reconnect policy (fixed delay, optional jitter).
    pub reconnect: ReconnectPolicy,
}

/// Bootstrap handshake parameters sent when the connection opens.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Username to authenticate as.
    pub username: String,
    /// Starting capital for a fresh account.
    pub initial_capital: f64,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            username: "default".to_string(),
            initial_capital: 10_000.0,
        }
    }
}

/// REST read-endpoint settings for the list tables and the chart.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the paginated read endpoints.
    pub base_url: String,
    /// Default page size for list tables.
    pub page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            page_size: 20,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_production_values() {
        let settings = DeskSettings::default();
        assert_eq!(settings.name, "desk");
        assert_eq!(settings.server.local_port, 8000);
        assert_eq!(settings.connection.reconnect.delay_ms, 3000);
        assert_eq!(settings.bootstrap.username, "default");
        assert_eq!(settings.api.page_size, 20);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: DeskSettings =
            serde_json::from_str(r#"{"server": {"local_port": 9000}}"#).unwrap();
        assert_eq!(settings.server.local_port, 9000);
        // Untouched sections keep their defaults
        assert_eq!(settings.bootstrap.initial_capital, 10_000.0);
        assert_eq!(settings.connection.reconnect.delay_ms, 3000);
    }

    #[test]
    fn validate_clamps_jitter() {
        let mut settings = DeskSettings::default();
        settings.connection.reconnect.jitter_factor = 2.5;
        settings.validate();
        assert_eq!(settings.connection.reconnect.jitter_factor, 1.0);
    }

    #[test]
    fn validate_corrects_zero_page_size() {
        let mut settings = DeskSettings::default();
        settings.api.page_size = 0;
        settings.validate();
        assert_eq!(settings.api.page_size, 1);
    }
}
