// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted accessory context.

use serde::{Deserialize, Serialize};

use crate::state::CanonicalLockState;
use crate::types::{BatteryLevel, DoorContact, LockId, LockIdentity, LockPhase};

/// Per-accessory data the host stores across restarts.
///
/// It is a write-through cache of canonical state: every accepted change is
/// recorded here, and a restarted platform seeds its state from it before
/// the first poll completes.
///
/// # Examples
///
/// ```
/// use august_homekit::homekit::AccessoryContext;
/// use august_homekit::types::{LockIdentity, LockPhase};
///
/// let identity = LockIdentity::new("front", "Front Door").with_firmware_version("2.1");
/// let context = AccessoryContext::from_identity(&identity);
///
/// let state = context.seed_state(true);
/// assert_eq!(state.lock_phase(), LockPhase::Locked);
/// assert_eq!(state.firmware_version(), Some("2.1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryContext {
    /// Vendor lock id.
    pub lock_id: LockId,
    /// Display name.
    pub name: String,
    /// Hardware serial number.
    #[serde(default)]
    pub serial_number: String,
    /// Last known firmware version.
    #[serde(default)]
    pub firmware_version: Option<String>,
    /// Last reconciled phase.
    #[serde(default)]
    pub lock_phase: Option<LockPhase>,
    /// Last reconciled door contact.
    #[serde(default)]
    pub door_contact: Option<DoorContact>,
    /// Last reconciled battery level.
    #[serde(default)]
    pub battery: Option<BatteryLevel>,
}

impl AccessoryContext {
    /// Creates a context for a freshly discovered lock.
    #[must_use]
    pub fn from_identity(identity: &LockIdentity) -> Self {
        Self {
            lock_id: identity.id.clone(),
            name: identity.name.clone(),
            serial_number: identity.serial_number.clone(),
            firmware_version: non_empty(&identity.firmware_version),
            lock_phase: None,
            door_contact: None,
            battery: None,
        }
    }

    /// Refreshes the descriptive fields after rediscovery.
    ///
    /// A firmware version already reconciled from a snapshot is kept.
    pub fn refresh_identity(&mut self, identity: &LockIdentity) {
        self.name.clone_from(&identity.name);
        self.serial_number.clone_from(&identity.serial_number);
        if self.firmware_version.is_none() {
            self.firmware_version = non_empty(&identity.firmware_version);
        }
    }

    /// Builds the initial canonical state from the stored values.
    ///
    /// Missing values fall back to the safe defaults of
    /// [`CanonicalLockState::new`].
    #[must_use]
    pub fn seed_state(&self, contact_sensor: bool) -> CanonicalLockState {
        CanonicalLockState::seeded(
            self.lock_phase.unwrap_or_default(),
            contact_sensor.then(|| self.door_contact.unwrap_or_default()),
            self.battery.unwrap_or_default(),
            self.firmware_version.clone(),
        )
    }

    /// Mirrors canonical state into the context.
    ///
    /// Returns `true` if anything changed.
    pub fn record(&mut self, state: &CanonicalLockState) -> bool {
        let before = self.clone();
        self.lock_phase = Some(state.lock_phase());
        if let Some(door) = state.door_contact() {
            self.door_contact = Some(door);
        }
        self.battery = Some(state.battery());
        if let Some(version) = state.firmware_version() {
            self.firmware_version = Some(version.to_string());
        }
        *self != before
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_defaults_without_history() {
        let context = AccessoryContext::from_identity(&LockIdentity::new("a", "A"));
        let state = context.seed_state(true);
        assert_eq!(state, CanonicalLockState::new());

        let state = context.seed_state(false);
        assert_eq!(state.door_contact(), None);
    }

    #[test]
    fn record_then_seed_restores_state() {
        let mut context = AccessoryContext::from_identity(&LockIdentity::new("a", "A"));
        let state = CanonicalLockState::seeded(
            LockPhase::Unlocked,
            Some(DoorContact::Open),
            BatteryLevel::new(40).unwrap(),
            Some("3.0".into()),
        );
        assert!(context.record(&state));
        assert!(!context.record(&state));

        let restored = context.seed_state(true);
        assert_eq!(restored, state);
    }

    #[test]
    fn context_serializes_camel_case() {
        let mut context =
            AccessoryContext::from_identity(&LockIdentity::new("a", "A").with_serial_number("S1"));
        context.lock_phase = Some(LockPhase::Jammed);
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["lockId"], "a");
        assert_eq!(json["serialNumber"], "S1");
        assert_eq!(json["lockPhase"], "jammed");

        let back: AccessoryContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, context);
    }

    #[test]
    fn rediscovery_keeps_reconciled_firmware() {
        let mut context = AccessoryContext::from_identity(&LockIdentity::new("a", "A"));
        context.firmware_version = Some("2.0".into());
        context.refresh_identity(&LockIdentity::new("a", "Renamed").with_firmware_version("1.0"));
        assert_eq!(context.name, "Renamed");
        assert_eq!(context.firmware_version.as_deref(), Some("2.0"));
    }
}
