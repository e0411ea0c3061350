//! Error types for the REST client and the live session.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Errors returned by the HTTP helper.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something other than 200.
    #[error("server returned status {status}, body {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("unable to decode response (raw: {body}): {source}")]
    Decode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Raw response body.
        body: String,
    },

    /// The request body could not be encoded.
    #[error("unable to encode request data: {0}")]
    Encode(#[source] serde_json::Error),

    /// A URL could not be constructed from the configured base.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// An authenticated call was made before logging in.
    #[error("not logged in")]
    NotLoggedIn,
}

/// Errors produced while decoding live frames and hub invocations.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is below the minimum plausible length.
    #[error("message too short ({len} bytes, need at least {min})")]
    TooShort {
        /// Length of the frame.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// The frame is not well-formed JSON of the envelope shape.
    #[error("unable to parse message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The invocation names a different method than the decoder expects.
    #[error("not a {expected} message (got {actual})")]
    WrongMethod {
        /// Method the decoder handles.
        expected: &'static str,
        /// Method found on the invocation.
        actual: String,
    },

    /// The invocation carries the wrong number of arguments.
    #[error("{method} message: expected {expected} arguments, got {actual}")]
    WrongArity {
        /// Method being decoded.
        method: &'static str,
        /// Required argument count.
        expected: usize,
        /// Argument count found.
        actual: usize,
    },

    /// An argument could not be decoded as the required shape.
    #[error("argument {index} is not a valid {expected}: {source}")]
    WrongShape {
        /// Zero-based argument position.
        index: usize,
        /// Name of the expected shape.
        expected: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// No decoder exists for the method name.
    #[error("unknown hub method: {0}")]
    UnknownMethod(String),
}

/// The reconciled snapshot no longer matches the server.
///
/// Neither variant can be repaired locally: discard the live session and
/// run a fresh handshake to rebuild state from the next system-info push.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// No machine with this SID is in the snapshot.
    #[error("machine not found: {machine_id}")]
    MachineNotFound {
        /// Machine SID from the event.
        machine_id: String,
    },

    /// The machine exists but has no device with this ID.
    #[error("device not found: {device_id} (machine {machine_id})")]
    DeviceNotFound {
        /// Machine SID from the event.
        machine_id: String,
        /// Device ID from the event.
        device_id: String,
    },
}

impl StateError {
    /// Whether the error means the snapshot drifted from server truth.
    ///
    /// Always `true` today; kept as a method so callers can write their
    /// reconnect policy against it.
    pub fn is_drift(&self) -> bool {
        matches!(
            self,
            Self::MachineNotFound { .. } | Self::DeviceNotFound { .. }
        )
    }
}

/// The steps of the live handshake, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    /// Exchange the user token for a live-auth token and hub host.
    Auth,
    /// Obtain a connection token.
    Negotiate,
    /// Open the websocket transport.
    Connect,
    /// Send the start signal.
    Start,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auth => "auth",
            Self::Negotiate => "negotiate",
            Self::Connect => "connect",
            Self::Start => "start",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by a live session.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// Exchanging the user token for a live-auth token failed.
    #[error("unable to auth2: {0}")]
    Auth(#[source] ApiError),

    /// The negotiate call failed.
    #[error("unable to negotiate: {0}")]
    Negotiate(#[source] ApiError),

    /// The websocket could not be opened.
    #[error("unable to open WebSockets connection: {0}")]
    Connect(#[source] Box<tungstenite::Error>),

    /// The start call failed.
    #[error("unable to start: {0}")]
    Start(#[source] ApiError),

    /// `/signalr/start` or `/signalr/ping` answered with an unexpected body.
    #[error("did not receive a {expected} response from {endpoint} (got {actual:?})")]
    Acknowledgement {
        /// Endpoint that was called (`start` or `ping`).
        endpoint: &'static str,
        /// Literal acknowledgment required.
        expected: &'static str,
        /// Value actually received.
        actual: String,
    },

    /// The protocol ping call failed.
    #[error("unable to ping signalr: {0}")]
    Ping(#[source] ApiError),

    /// Sending a transport keep-alive frame failed.
    #[error("unable to ping WSS: {0}")]
    KeepAlive(#[source] Box<tungstenite::Error>),

    /// Reading from the transport failed.
    #[error("websocket read failed: {0}")]
    Transport(#[source] Box<tungstenite::Error>),

    /// The hub host returned by auth cannot be turned into a websocket URL.
    #[error("invalid hub host: {0}")]
    InvalidHost(String),

    /// A relevant frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A background activity reported a failure since the last read.
    #[error("connection broken: {0}")]
    ConnectionBroken(#[source] Box<LiveError>),

    /// The session was closed locally.
    #[error("live session closed")]
    Closed,

    /// The hub closed the websocket.
    #[error("live session closed by host")]
    ClosedByHost,

    /// No live session is open.
    #[error("live session not connected")]
    NotConnected,
}

impl LiveError {
    /// The handshake step this error aborted, if it is a handshake error.
    pub fn handshake_step(&self) -> Option<HandshakeStep> {
        match self {
            Self::Auth(_) => Some(HandshakeStep::Auth),
            Self::Negotiate(_) => Some(HandshakeStep::Negotiate),
            Self::Connect(_) | Self::InvalidHost(_) => Some(HandshakeStep::Connect),
            Self::Start(_) | Self::Acknowledgement { endpoint: "start", .. } => {
                Some(HandshakeStep::Start)
            }
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
