//! # winminer-settings
//!
//! Configuration for the WinMiner API client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WinminerSettings::default()`]
//! 2. **User file**: `~/.winminer/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WINMINER_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use winminer_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("API: {}", settings.api.base_url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, parse_bool,
    parse_u64_range, settings_path,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
