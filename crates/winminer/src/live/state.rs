//! Live state reconciler.
//!
//! Holds the in-memory snapshot of machines and devices and applies live
//! events to it. A single lock serializes writers and gives readers a
//! consistent view. The lock is never held across I/O.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::errors::StateError;
use crate::types::{DeviceEntry, DeviceStatus, MachineEntry};

use super::events::LiveEvent;

/// A consistent copy of the reconciled state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveSnapshot {
    /// Machines in the order they were installed.
    pub machines: Vec<MachineEntry>,
    /// Time of the last successful status change, keyed by device ID.
    pub devices_last_updated: HashMap<String, DateTime<Utc>>,
}

/// Thread-safe reconciler for live machine state.
#[derive(Debug, Default)]
pub struct LiveState {
    inner: RwLock<LiveSnapshot>,
}

impl LiveState {
    /// An empty reconciler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `machines` as the whole snapshot and clear all device
    /// timestamps.
    pub fn replace_snapshot(&self, machines: Vec<MachineEntry>) {
        let mut inner = self.inner.write();
        debug!(machines = machines.len(), "replacing live snapshot");
        inner.machines = machines;
        inner.devices_last_updated.clear();
    }

    /// Insert `machine`, or replace the machine with the same SID.
    pub fn upsert_machine(&self, machine: MachineEntry) {
        let mut inner = self.inner.write();
        match inner.machines.iter().position(|m| m.sid == machine.sid) {
            Some(index) => inner.machines[index] = machine,
            None => inner.machines.push(machine),
        }
    }

    /// Replace one device's status wholesale and stamp it with the current
    /// time.
    ///
    /// On error nothing is modified. Either error means the snapshot has
    /// drifted and the session should be rebuilt.
    pub fn apply_status_change(
        &self,
        machine_id: &str,
        device_id: &str,
        status: DeviceStatus,
    ) -> Result<(), StateError> {
        let mut inner = self.inner.write();
        let machine = inner
            .machines
            .iter_mut()
            .find(|m| m.sid == machine_id)
            .ok_or_else(|| StateError::MachineNotFound {
                machine_id: machine_id.to_string(),
            })?;
        let device = machine
            .devices
            .iter_mut()
            .find(|d| d.id == device_id)
            .ok_or_else(|| StateError::DeviceNotFound {
                machine_id: machine_id.to_string(),
                device_id: device_id.to_string(),
            })?;
        device.status = status;
        let _ = inner
            .devices_last_updated
            .insert(device_id.to_string(), Utc::now());
        Ok(())
    }

    /// Route a decoded event to the matching write.
    ///
    /// `SetSystemInfo` replaces the snapshot with its single machine and
    /// `StatusChanged` updates one device. Every other event is ignored.
    pub fn apply_event(&self, event: &LiveEvent) -> Result<(), StateError> {
        match event {
            LiveEvent::SystemInfo(info) => {
                self.replace_snapshot(info.clone().into_machines());
                Ok(())
            }
            LiveEvent::StatusChanged(change) => self.apply_status_change(
                &change.machine_id,
                &change.device_id,
                change.status.clone(),
            ),
            _ => Ok(()),
        }
    }

    /// A consistent copy of the whole state.
    pub fn snapshot(&self) -> LiveSnapshot {
        self.inner.read().clone()
    }

    /// A copy of all machines.
    pub fn machines(&self) -> Vec<MachineEntry> {
        self.inner.read().machines.clone()
    }

    /// A copy of the machine with `sid`.
    pub fn machine(&self, sid: &str) -> Option<MachineEntry> {
        self.inner.read().machines.iter().find(|m| m.sid == sid).cloned()
    }

    /// A copy of one device.
    pub fn device(&self, sid: &str, device_id: &str) -> Option<DeviceEntry> {
        self.inner
            .read()
            .machines
            .iter()
            .find(|m| m.sid == sid)
            .and_then(|m| m.device(device_id))
            .cloned()
    }

    /// When `device_id` last had a status change applied.
    pub fn last_updated(&self, device_id: &str) -> Option<DateTime<Utc>> {
        self.inner.read().devices_last_updated.get(device_id).copied()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
