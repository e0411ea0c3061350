//! # winminer
//!
//! Client for the WinMiner mining-pool API.
//!
//! - [`ApiClient`]: REST endpoints (stats, machines, withdrawals) and live
//!   session management
//! - [`live`]: the SignalR push API. [`LiveSession`] handshakes and keeps
//!   the connection alive, [`Envelope`]s decode into [`LiveEvent`]s, and
//!   [`LiveState`] reconciles them into a machine snapshot
//! - [`types`]: JSON shapes of both APIs
//!
//! # Usage
//!
//! ```no_run
//! use winminer::{ApiClient, LiveState};
//! use winminer_settings::WinminerSettings;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::login("me@example.com", "secret", WinminerSettings::default()).await?;
//! let mut session = client.connect_live().await?;
//! let state = LiveState::new();
//! loop {
//!     let envelope = session.read_next_relevant().await?;
//!     for event in envelope.events().flatten() {
//!         if state.apply_event(&event).is_err() {
//!             session = client.reconnect_live().await?;
//!             break;
//!         }
//!     }
//! }
//! # }
//! ```

#![deny(unsafe_code)]

pub mod api;
pub mod errors;
pub mod http;
pub mod live;
pub mod types;

pub use api::ApiClient;
pub use errors::{ApiError, DecodeError, HandshakeStep, LiveError, StateError};
pub use http::{ApiRequest, HttpClient};
pub use live::{Envelope, LiveEvent, LiveSession, LiveSnapshot, LiveState};
pub use types::{StatusCode, parse_date};
