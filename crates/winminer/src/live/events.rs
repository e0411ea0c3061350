//! Typed decoders for hub method invocations.
//!
//! Each event type names its method and exact arity. Both are checked before
//! any argument is touched, so a malformed invocation never yields a partial
//! record.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::errors::DecodeError;
use crate::types::{DeviceStatus, MachineEntry};

use super::envelope::MethodInvocation;

/// Hub method names.
pub mod methods {
    /// Args: client ID, machine SID, machine record.
    pub const SET_SYSTEM_INFO: &str = "SetSystemInfo";
    /// Args: machine SID, device ID, device status.
    pub const STATUS_CHANGED: &str = "StatusChanged";
    /// Args: machine SID, device ID, enabled flag.
    pub const STATE_CHANGED: &str = "StateChanged";
    /// Args: machine SID, client ID.
    pub const APP_CLOSED: &str = "AppClosed";
    /// Args: client ID.
    pub const CLIENT_CONNECTED: &str = "ClientConnected";
    /// Args: machine SID, message.
    pub const REMOVE_MESSAGE: &str = "RemoveMessage";
    /// Args: machine SID, message.
    pub const ADD_MESSAGE: &str = "AddMessage";
    /// Args: client ID.
    pub const MINING_STARTED: &str = "MiningStarted";
    /// Args: client ID.
    pub const MINING_STOPPED: &str = "MiningStopped";
}

/// A typed record decoded from one hub method.
pub trait HubEvent: Sized {
    /// Method name this record decodes.
    const METHOD: &'static str;
    /// Exact number of arguments.
    const ARITY: usize;

    /// Build the record from arguments whose count is already checked.
    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError>;

    /// Validate method and arity, then decode.
    fn decode(invocation: &MethodInvocation) -> Result<Self, DecodeError> {
        check_method_and_arity(invocation, Self::METHOD, Self::ARITY)?;
        Self::from_arguments(&invocation.arguments)
    }
}

fn check_method_and_arity(
    invocation: &MethodInvocation,
    method: &'static str,
    arity: usize,
) -> Result<(), DecodeError> {
    if invocation.method != method {
        return Err(DecodeError::WrongMethod {
            expected: method,
            actual: invocation.method.clone(),
        });
    }
    if invocation.arguments.len() != arity {
        warn!(
            args = ?invocation.arguments,
            "{method} message didn't have {arity} args"
        );
        return Err(DecodeError::WrongArity {
            method,
            expected: arity,
            actual: invocation.arguments.len(),
        });
    }
    Ok(())
}

fn argument<E: HubEvent, T: DeserializeOwned>(
    arguments: &[Value],
    index: usize,
    expected: &'static str,
) -> Result<T, DecodeError> {
    let value = arguments.get(index).ok_or(DecodeError::WrongArity {
        method: E::METHOD,
        expected: E::ARITY,
        actual: arguments.len(),
    })?;
    T::deserialize(value).map_err(|source| DecodeError::WrongShape {
        index,
        expected,
        source,
    })
}

/// A client connected to the hub.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConnected {
    /// Client ID.
    pub client_id: String,
}

impl HubEvent for ClientConnected {
    const METHOD: &'static str = methods::CLIENT_CONNECTED;
    const ARITY: usize = 1;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            client_id: argument::<Self, _>(arguments, 0, "string")?,
        })
    }
}

/// The mining application on a machine was closed.
#[derive(Clone, Debug, PartialEq)]
pub struct AppClosed {
    /// Machine SID.
    pub machine_id: String,
    /// Client ID.
    pub client_id: String,
}

impl HubEvent for AppClosed {
    const METHOD: &'static str = methods::APP_CLOSED;
    const ARITY: usize = 2;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            machine_id: argument::<Self, _>(arguments, 0, "string")?,
            client_id: argument::<Self, _>(arguments, 1, "string")?,
        })
    }
}

/// A device was enabled or disabled.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChanged {
    /// Machine SID.
    pub machine_id: String,
    /// Device ID.
    pub device_id: String,
    /// New enabled flag.
    pub enabled: bool,
}

impl HubEvent for StateChanged {
    const METHOD: &'static str = methods::STATE_CHANGED;
    const ARITY: usize = 3;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            machine_id: argument::<Self, _>(arguments, 0, "string")?,
            device_id: argument::<Self, _>(arguments, 1, "string")?,
            enabled: argument::<Self, _>(arguments, 2, "bool")?,
        })
    }
}

/// A device reported a new status.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusChanged {
    /// Machine SID.
    pub machine_id: String,
    /// Device ID.
    pub device_id: String,
    /// Full replacement status.
    pub status: DeviceStatus,
}

impl HubEvent for StatusChanged {
    const METHOD: &'static str = methods::STATUS_CHANGED;
    const ARITY: usize = 3;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            machine_id: argument::<Self, _>(arguments, 0, "string")?,
            device_id: argument::<Self, _>(arguments, 1, "string")?,
            status: argument::<Self, _>(arguments, 2, "device status")?,
        })
    }
}

/// Full system information for one machine.
///
/// The first two arguments (client ID, machine SID) are redundant with the
/// embedded record and are not decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemInfo {
    /// The machine record.
    pub machine: MachineEntry,
}

impl SystemInfo {
    /// The machines this push installs, as a snapshot replacement.
    pub fn into_machines(self) -> Vec<MachineEntry> {
        vec![self.machine]
    }
}

impl HubEvent for SystemInfo {
    const METHOD: &'static str = methods::SET_SYSTEM_INFO;
    const ARITY: usize = 3;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            machine: argument::<Self, _>(arguments, 2, "machine record")?,
        })
    }
}

/// Mining started on a client.
#[derive(Clone, Debug, PartialEq)]
pub struct MiningStarted {
    /// Client ID.
    pub client_id: String,
}

impl HubEvent for MiningStarted {
    const METHOD: &'static str = methods::MINING_STARTED;
    const ARITY: usize = 1;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            client_id: argument::<Self, _>(arguments, 0, "string")?,
        })
    }
}

/// Mining stopped on a client.
#[derive(Clone, Debug, PartialEq)]
pub struct MiningStopped {
    /// Client ID.
    pub client_id: String,
}

impl HubEvent for MiningStopped {
    const METHOD: &'static str = methods::MINING_STOPPED;
    const ARITY: usize = 1;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            client_id: argument::<Self, _>(arguments, 0, "string")?,
        })
    }
}

/// A notification was added to a machine. The message shape is not known,
/// so it is kept as raw JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct AddMessage {
    /// Machine SID.
    pub machine_id: String,
    /// Raw message payload.
    pub message: Value,
}

impl HubEvent for AddMessage {
    const METHOD: &'static str = methods::ADD_MESSAGE;
    const ARITY: usize = 2;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            machine_id: argument::<Self, _>(arguments, 0, "string")?,
            message: argument::<Self, _>(arguments, 1, "any JSON value")?,
        })
    }
}

/// A notification was removed from a machine.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveMessage {
    /// Machine SID.
    pub machine_id: String,
    /// Raw message payload.
    pub message: Value,
}

impl HubEvent for RemoveMessage {
    const METHOD: &'static str = methods::REMOVE_MESSAGE;
    const ARITY: usize = 2;

    fn from_arguments(arguments: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            machine_id: argument::<Self, _>(arguments, 0, "string")?,
            message: argument::<Self, _>(arguments, 1, "any JSON value")?,
        })
    }
}

/// Any known live event.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveEvent {
    /// `ClientConnected`.
    ClientConnected(ClientConnected),
    /// `AppClosed`.
    AppClosed(AppClosed),
    /// `StateChanged`.
    StateChanged(StateChanged),
    /// `StatusChanged`.
    StatusChanged(StatusChanged),
    /// `SetSystemInfo`.
    SystemInfo(SystemInfo),
    /// `MiningStarted`.
    MiningStarted(MiningStarted),
    /// `MiningStopped`.
    MiningStopped(MiningStopped),
    /// `AddMessage`.
    AddMessage(AddMessage),
    /// `RemoveMessage`.
    RemoveMessage(RemoveMessage),
}

impl LiveEvent {
    /// Select the decoder by method name and decode.
    pub fn decode(invocation: &MethodInvocation) -> Result<Self, DecodeError> {
        match invocation.method.as_str() {
            methods::CLIENT_CONNECTED => {
                ClientConnected::decode(invocation).map(Self::ClientConnected)
            }
            methods::APP_CLOSED => AppClosed::decode(invocation).map(Self::AppClosed),
            methods::STATE_CHANGED => StateChanged::decode(invocation).map(Self::StateChanged),
            methods::STATUS_CHANGED => StatusChanged::decode(invocation).map(Self::StatusChanged),
            methods::SET_SYSTEM_INFO => SystemInfo::decode(invocation).map(Self::SystemInfo),
            methods::MINING_STARTED => MiningStarted::decode(invocation).map(Self::MiningStarted),
            methods::MINING_STOPPED => MiningStopped::decode(invocation).map(Self::MiningStopped),
            methods::ADD_MESSAGE => AddMessage::decode(invocation).map(Self::AddMessage),
            methods::REMOVE_MESSAGE => {
                RemoveMessage::decode(invocation).map(Self::RemoveMessage)
            }
            other => Err(DecodeError::UnknownMethod(other.to_string())),
        }
    }

    /// The hub method name of this event.
    pub fn method(&self) -> &'static str {
        match self {
            Self::ClientConnected(_) => methods::CLIENT_CONNECTED,
            Self::AppClosed(_) => methods::APP_CLOSED,
            Self::StateChanged(_) => methods::STATE_CHANGED,
            Self::StatusChanged(_) => methods::STATUS_CHANGED,
            Self::SystemInfo(_) => methods::SET_SYSTEM_INFO,
            Self::MiningStarted(_) => methods::MINING_STARTED,
            Self::MiningStopped(_) => methods::MINING_STOPPED,
            Self::AddMessage(_) => methods::ADD_MESSAGE,
            Self::RemoveMessage(_) => methods::REMOVE_MESSAGE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
