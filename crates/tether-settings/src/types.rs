//! Settings types.

use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TetherSettings {
    /// Connection endpoints and reconnection tuning.
    pub connection: ConnectionSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Connection endpoints and reconnection tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// Base WebSocket URL.
    pub ws_url: String,
    /// Base HTTP API URL.
    pub api_url: String,
    /// Maximum automatic reconnection attempts after an abnormal close.
    pub max_reconnect_attempts: u32,
    /// Reconnection backoff unit in milliseconds; attempt `k` waits
    /// `k × reconnect_base_delay_ms`.
    pub reconnect_base_delay_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000".to_string(),
            api_url: "http://localhost:8000".to_string(),
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 2000,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive (overridable via `RUST_LOG`).
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
