// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor-shaped lock payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw state flags as reported by the vendor.
///
/// Every flag defaults to `false` when omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStateFlags {
    /// The bolt is thrown.
    pub locked: bool,
    /// The bolt is retracted.
    pub unlocked: bool,
    /// The bolt is moving towards locked.
    pub locking: bool,
    /// The bolt is moving towards unlocked.
    pub unlocking: bool,
    /// The door sensor reports open.
    pub open: bool,
    /// The door sensor reports closed.
    pub closed: bool,
}

impl RawStateFlags {
    /// Derives flags from a textual lock status such as `kAugLockState_Locked`.
    ///
    /// Returns `None` if the text names no known lock status.
    ///
    /// # Examples
    ///
    /// ```
    /// use august_homekit::snapshot::RawStateFlags;
    ///
    /// let flags = RawStateFlags::from_status("kAugLockState_Unlocking").unwrap();
    /// assert!(flags.unlocking);
    /// assert!(!flags.locking);
    /// ```
    #[must_use]
    pub fn from_status(status: &str) -> Option<Self> {
        let lower = status.to_lowercase();
        let mut flags = Self::default();
        // "unlocked" contains "locked" and "unlocking" contains "locking"
        if lower.contains("unlocking") {
            flags.unlocking = true;
        } else if lower.contains("locking") {
            flags.locking = true;
        } else if lower.contains("unlocked") {
            flags.unlocked = true;
        } else if lower.contains("locked") {
            flags.locked = true;
        } else {
            return None;
        }
        Some(flags)
    }

    /// Returns `true` if the bolt is mid-travel.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.locking || self.unlocking
    }
}

/// One vendor-reported lock state, from a poll or a push event.
///
/// All fields are optional: push events usually omit battery and firmware,
/// and a malformed payload may omit the state entirely.
///
/// # Examples
///
/// ```
/// use august_homekit::snapshot::RawSnapshot;
///
/// let json = r#"{"state":{"locked":true},"doorState":"kAugDoorState_Closed"}"#;
/// let snapshot: RawSnapshot = serde_json::from_str(json).unwrap();
///
/// assert!(snapshot.flags().unwrap().locked);
/// assert_eq!(snapshot.battery, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    /// Normalized state flags.
    #[serde(default)]
    pub state: Option<RawStateFlags>,

    /// Textual lock status, used when `state` is absent.
    #[serde(default)]
    pub status: Option<String>,

    /// Textual door state (e.g. `kAugDoorState_Open`).
    #[serde(default)]
    pub door_state: Option<String>,

    /// Battery charge as a fraction (nominally 0.0-1.0).
    #[serde(default)]
    pub battery: Option<f64>,

    /// Firmware version reported by the lock.
    #[serde(default)]
    pub current_firmware_version: Option<String>,
}

impl RawSnapshot {
    /// Creates a snapshot carrying only state flags.
    #[must_use]
    pub fn with_flags(flags: RawStateFlags) -> Self {
        Self {
            state: Some(flags),
            ..Self::default()
        }
    }

    /// Sets the battery fraction.
    #[must_use]
    pub fn with_battery(mut self, fraction: f64) -> Self {
        self.battery = Some(fraction);
        self
    }

    /// Sets the textual door state.
    #[must_use]
    pub fn with_door_state(mut self, door_state: impl Into<String>) -> Self {
        self.door_state = Some(door_state.into());
        self
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_firmware(mut self, version: impl Into<String>) -> Self {
        self.current_firmware_version = Some(version.into());
        self
    }

    /// Returns the state flags, derived from `status` when `state` is absent.
    #[must_use]
    pub fn flags(&self) -> Option<RawStateFlags> {
        self.state
            .or_else(|| self.status.as_deref().and_then(RawStateFlags::from_status))
    }
}

/// Lock details returned by a poll.
///
/// Field names follow the vendor REST API. Battery and firmware live at the
/// top level and are folded into the snapshot by [`into_snapshot`](Self::into_snapshot).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockDetails {
    /// Display name.
    #[serde(rename = "LockName", default)]
    pub lock_name: Option<String>,

    /// Hardware serial number.
    #[serde(rename = "SerialNumber", default)]
    pub serial_number: Option<String>,

    /// House the lock belongs to.
    #[serde(rename = "HouseName", default)]
    pub house_name: Option<String>,

    /// Whether the lock is already natively paired with HomeKit.
    #[serde(rename = "HomeKitEnabled", default)]
    pub homekit_enabled: bool,

    /// Battery charge as a fraction.
    #[serde(default)]
    pub battery: Option<f64>,

    /// Firmware version.
    #[serde(rename = "currentFirmwareVersion", default)]
    pub current_firmware_version: Option<String>,

    /// Current lock status.
    #[serde(rename = "LockStatus", alias = "lockStatus", default)]
    pub lock_status: Option<RawSnapshot>,
}

impl LockDetails {
    /// Folds the top-level battery and firmware into the status snapshot.
    ///
    /// Values inside the status take precedence over top-level ones.
    #[must_use]
    pub fn into_snapshot(self) -> RawSnapshot {
        let mut snapshot = self.lock_status.unwrap_or_default();
        snapshot.battery = snapshot.battery.or(self.battery);
        snapshot.current_firmware_version = snapshot
            .current_firmware_version
            .or(self.current_firmware_version);
        snapshot
    }
}

/// A snapshot delivered by the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    /// The reported state.
    pub snapshot: RawSnapshot,
    /// When the vendor emitted the event.
    pub timestamp: DateTime<Utc>,
}

impl PushEvent {
    /// Creates a push event stamped with the current time.
    #[must_use]
    pub fn now(snapshot: RawSnapshot) -> Self {
        Self {
            snapshot,
            timestamp: Utc::now(),
        }
    }
}
