//! Live push API over SignalR.
//!
//! [`LiveSession`] performs the handshake, keeps the connection alive and
//! yields [`Envelope`]s. Each envelope decodes into [`LiveEvent`]s that
//! [`LiveState`] reconciles into a machine snapshot.

pub mod envelope;
pub mod events;
pub mod handshake;
pub mod keepalive;
pub mod nonce;
pub mod session;
pub mod state;

pub use envelope::{Envelope, MethodInvocation, decode_envelope, is_relevant, is_relevant_frame};
pub use events::{
    AddMessage, AppClosed, ClientConnected, HubEvent, LiveEvent, MiningStarted, MiningStopped,
    RemoveMessage, StateChanged, StatusChanged, SystemInfo,
};
pub use handshake::{Handshake, HubClient};
pub use keepalive::KeepAliveFrame;
pub use nonce::Nonce;
pub use session::LiveSession;
pub use state::{LiveSnapshot, LiveState};
