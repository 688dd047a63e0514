// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical lock state tracking.

use chrono::{DateTime, Utc};

use crate::types::{BatteryLevel, DoorContact, LockPhase};

use super::StateChange;

/// The reconciled, host-facing state of one lock.
///
/// A fresh state starts from safe defaults (Locked, door Closed, battery
/// full) and is then seeded from the persisted accessory context. Only the
/// reconciliation engine mutates it.
///
/// # Examples
///
/// ```
/// use august_homekit::state::CanonicalLockState;
/// use august_homekit::types::{DoorContact, LockPhase};
///
/// let state = CanonicalLockState::new();
/// assert_eq!(state.lock_phase(), LockPhase::Locked);
/// assert_eq!(state.door_contact(), Some(DoorContact::Closed));
/// assert_eq!(state.battery().value(), 100);
/// assert!(!state.low_battery());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLockState {
    lock_phase: LockPhase,
    /// `None` when the contact sensor is hidden.
    door_contact: Option<DoorContact>,
    battery: BatteryLevel,
    firmware_version: Option<String>,
    last_reconciled_at: Option<DateTime<Utc>>,
}

impl CanonicalLockState {
    /// Creates a state with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lock_phase: LockPhase::Locked,
            door_contact: Some(DoorContact::Closed),
            battery: BatteryLevel::FULL,
            firmware_version: None,
            last_reconciled_at: None,
        }
    }

    /// Creates a state for a lock whose contact sensor is hidden.
    #[must_use]
    pub fn without_contact_sensor() -> Self {
        Self {
            door_contact: None,
            ..Self::new()
        }
    }

    /// Rebuilds a state from persisted values.
    pub(crate) fn seeded(
        lock_phase: LockPhase,
        door_contact: Option<DoorContact>,
        battery: BatteryLevel,
        firmware_version: Option<String>,
    ) -> Self {
        Self {
            lock_phase,
            door_contact,
            battery,
            firmware_version,
            last_reconciled_at: None,
        }
    }

    /// Returns the lock phase.
    #[must_use]
    pub fn lock_phase(&self) -> LockPhase {
        self.lock_phase
    }

    /// Returns the door contact, or `None` when the sensor is hidden.
    #[must_use]
    pub fn door_contact(&self) -> Option<DoorContact> {
        self.door_contact
    }

    /// Returns the battery level.
    #[must_use]
    pub fn battery(&self) -> BatteryLevel {
        self.battery
    }

    /// Returns `true` when the battery is below the low threshold.
    #[must_use]
    pub fn low_battery(&self) -> bool {
        self.battery.is_low()
    }

    /// Returns the last known firmware version.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Returns when a snapshot was last merged.
    #[must_use]
    pub fn last_reconciled_at(&self) -> Option<DateTime<Utc>> {
        self.last_reconciled_at
    }

    /// Records that a snapshot was merged at `at`.
    pub(crate) fn mark_reconciled(&mut self, at: DateTime<Utc>) {
        self.last_reconciled_at = Some(at);
    }

    /// Applies a state change and returns whether the state actually changed.
    ///
    /// Door changes are ignored when the contact sensor is hidden.
    pub(crate) fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::Phase(phase) => {
                if self.lock_phase == *phase {
                    false
                } else {
                    self.lock_phase = *phase;
                    true
                }
            }
            StateChange::Door(door) => match self.door_contact {
                Some(current) if current != *door => {
                    self.door_contact = Some(*door);
                    true
                }
                _ => false,
            },
            StateChange::Battery(level) => {
                if self.battery == *level {
                    false
                } else {
                    self.battery = *level;
                    true
                }
            }
            StateChange::Firmware(version) => {
                if self.firmware_version.as_ref() == Some(version) {
                    false
                } else {
                    self.firmware_version = Some(version.clone());
                    true
                }
            }
            StateChange::Batch(changes) => {
                let mut any_changed = false;
                for c in changes {
                    if self.apply(c) {
                        any_changed = true;
                    }
                }
                any_changed
            }
        }
    }
}

impl Default for CanonicalLockState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_phase_change() {
        let mut state = CanonicalLockState::new();
        let change = StateChange::Phase(LockPhase::Unlocked);
        assert!(state.apply(&change));
        assert_eq!(state.lock_phase(), LockPhase::Unlocked);
        assert!(!state.apply(&change));
    }

    #[test]
    fn door_changes_ignored_without_sensor() {
        let mut state = CanonicalLockState::without_contact_sensor();
        assert!(!state.apply(&StateChange::Door(DoorContact::Open)));
        assert_eq!(state.door_contact(), None);
    }

    #[test]
    fn battery_drives_low_flag() {
        let mut state = CanonicalLockState::new();
        state.apply(&StateChange::Battery(BatteryLevel::new(15).unwrap()));
        assert!(!state.low_battery());
        state.apply(&StateChange::Battery(BatteryLevel::new(14).unwrap()));
        assert!(state.low_battery());
    }

    #[test]
    fn firmware_only_changes_on_new_value() {
        let mut state = CanonicalLockState::new();
        assert!(state.apply(&StateChange::Firmware("1.0".to_string())));
        assert!(!state.apply(&StateChange::Firmware("1.0".to_string())));
        assert!(state.apply(&StateChange::Firmware("1.1".to_string())));
        assert_eq!(state.firmware_version(), Some("1.1"));
    }

    #[test]
    fn apply_batch_changes() {
        let mut state = CanonicalLockState::new();
        let batch = StateChange::batch(vec![
            StateChange::Phase(LockPhase::Locked),
            StateChange::Door(DoorContact::Open),
        ]);
        // Phase already Locked; the door change alone makes the batch count
        assert!(state.apply(&batch));
        assert_eq!(state.door_contact(), Some(DoorContact::Open));
    }
}
