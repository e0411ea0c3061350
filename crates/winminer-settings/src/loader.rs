//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`WinminerSettings::default()`]
//! 2. If `~/.winminer/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Reject values the client cannot run with (zero intervals)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::WinminerSettings;

/// Resolve the path to the settings file (`~/.winminer/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".winminer").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WinminerSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<WinminerSettings> {
    let defaults = serde_json::to_value(WinminerSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: WinminerSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (falling back to file/default).
pub fn apply_env_overrides(settings: &mut WinminerSettings) {
    // ── API settings ────────────────────────────────────────────────
    if let Some(v) = read_env_string("WINMINER_API_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = read_env_u64("WINMINER_REQUEST_TIMEOUT_MS", 1000, 600_000) {
        settings.api.request_timeout_ms = v;
    }

    // ── Live settings ───────────────────────────────────────────────
    if let Some(v) = read_env_u64("WINMINER_PING_INTERVAL_MS", 10, 3_600_000) {
        settings.live.ping_interval_ms = v;
    }
    if let Some(v) = read_env_u64("WINMINER_KEEPALIVE_INTERVAL_MS", 10, 3_600_000) {
        settings.live.keep_alive_interval_ms = v;
    }

    // ── Logging settings ────────────────────────────────────────────
    if let Some(v) = read_env_string("WINMINER_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("WINMINER_LOG_JSON") {
        settings.logging.json = v;
    }
}

fn validate(settings: &WinminerSettings) -> Result<()> {
    if settings.live.ping_interval_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "live.pingIntervalMs must be positive".to_string(),
        ));
    }
    if settings.live.keep_alive_interval_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "live.keepAliveIntervalMs must be positive".to_string(),
        ));
    }
    if settings.api.base_url.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "api.baseUrl must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
