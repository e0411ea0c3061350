//! Machines, devices and device status.
//!
//! The same shapes are served by `GET /hub/machines` and pushed over the
//! live API (`SetSystemInfo`, `StatusChanged`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response to `GET /hub/machines`.
pub type MachinesResponse = Vec<MachineEntry>;

/// One machine running the mining client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineEntry {
    /// Display name.
    pub machine_name: String,
    /// Stable server-assigned identifier.
    pub sid: String,
    /// Version of the mining client installed on the machine.
    pub client_version: String,
    /// Whether the client runs with administrative rights.
    pub is_admin: bool,
    /// Whether the client is a portable install.
    pub is_portable: bool,
    /// Devices in server order.
    pub devices: Vec<DeviceEntry>,
    /// Opaque machine key.
    pub key: String,
}

impl MachineEntry {
    /// Find a device by ID.
    pub fn device(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|d| d.id == device_id)
    }
}

/// One mining device (CPU or GPU) of a machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceEntry {
    /// Identifier, unique within the parent machine.
    pub id: String,
    /// Enabled flag as reported by the server.
    ///
    /// Informational only: the REST API reports `true` even for devices
    /// that are disabled, so never treat this as ground truth.
    pub enabled: bool,
    /// Display name.
    pub name: String,
    /// Device type label.
    #[serde(rename = "type")]
    pub kind: String,
    /// Current status, replaced wholesale on every status change.
    pub status: DeviceStatus,
}

/// Status of one device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStatus {
    /// Raw status code; see [`StatusCode`].
    pub status: i32,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Hash rate per mined currency.
    pub hashrates: Vec<Decimal>,
    /// Profit per mined currency, parallel to `hashrates`.
    pub profits: Vec<Decimal>,
    /// Currency label.
    pub currency: String,
    /// Never observed populated.
    pub extra_data: String,
}

impl DeviceStatus {
    /// Interpret the raw code, if it is a known one.
    pub fn code(&self) -> Option<StatusCode> {
        StatusCode::from_code(self.status)
    }

    /// Whether the device reports that it is mining.
    pub fn is_mining(&self) -> bool {
        self.code() == Some(StatusCode::Mining)
    }
}

/// Known device status codes.
///
/// The meaning of several codes is inferred from observation. `Stopping`
/// in particular is uncertain, and the four starting codes are distinct
/// sub-phases whose order is unknown. Unknown codes are kept verbatim in
/// [`DeviceStatus::status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Code 8.
    Mining,
    /// Code 10.
    StoppingToo,
    /// Code 0 (uncertain).
    Stopping,
    /// Code 2.
    Starting1,
    /// Code 1.
    Starting2,
    /// Code 5.
    Starting3,
    /// Code 6.
    Starting4,
}

impl StatusCode {
    /// Map a raw code to a known status.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            8 => Some(Self::Mining),
            10 => Some(Self::StoppingToo),
            0 => Some(Self::Stopping),
            2 => Some(Self::Starting1),
            1 => Some(Self::Starting2),
            5 => Some(Self::Starting3),
            6 => Some(Self::Starting4),
            _ => None,
        }
    }

    /// The raw code.
    pub fn code(self) -> i32 {
        match self {
            Self::Mining => 8,
            Self::StoppingToo => 10,
            Self::Stopping => 0,
            Self::Starting1 => 2,
            Self::Starting2 => 1,
            Self::Starting3 => 5,
            Self::Starting4 => 6,
        }
    }

    /// Whether this is one of the starting sub-phases.
    pub fn is_starting(self) -> bool {
        matches!(
            self,
            Self::Starting1 | Self::Starting2 | Self::Starting3 | Self::Starting4
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
