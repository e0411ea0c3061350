//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a settings file may contain any subset of fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "api": { "baseUrl": "https://api.winminer.com" },
///   "live": { "pingIntervalMs": 60000 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WinminerSettings {
    /// REST API settings.
    pub api: ApiSettings,
    /// Live (SignalR) session settings.
    pub live: LiveSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// REST API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL all REST endpoints are relative to.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Client type tag sent on login and hub authentication.
    pub client_type: i64,
}

impl ApiSettings {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.winminer.com".to_string(),
            request_timeout_ms: 30_000,
            client_type: 200,
        }
    }
}

/// Cadence of the two keep-alive activities of a live session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveSettings {
    /// Interval between HTTP-level `/signalr/ping` calls.
    pub ping_interval_ms: u64,
    /// Interval between websocket `KeepAlive` frames.
    pub keep_alive_interval_ms: u64,
}

impl LiveSettings {
    /// Ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// Keep-alive interval as a [`Duration`].
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            ping_interval_ms: 60_000,
            keep_alive_interval_ms: 60_000,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
