// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping between lock state and HomeKit characteristic values.

use crate::error::ValueError;
use crate::types::{DoorContact, LockPhase, TargetState};

/// Maps a phase to `LockCurrentState`.
#[must_use]
pub const fn lock_current_state(phase: LockPhase) -> u8 {
    match phase {
        LockPhase::Unlocked => 0,
        LockPhase::Locked => 1,
        LockPhase::Jammed => 2,
        LockPhase::Unknown => 3,
    }
}

/// Maps a target to `LockTargetState`.
#[must_use]
pub const fn lock_target_state(target: TargetState) -> u8 {
    match target {
        TargetState::Unlocked => 0,
        TargetState::Locked => 1,
    }
}

/// Decodes a `LockTargetState` written by the host.
///
/// # Errors
///
/// Returns [`ValueError::InvalidCharacteristicValue`] for anything but 0 or 1.
pub const fn target_from_value(value: u8) -> Result<TargetState, ValueError> {
    match value {
        0 => Ok(TargetState::Unlocked),
        1 => Ok(TargetState::Locked),
        _ => Err(ValueError::InvalidCharacteristicValue {
            characteristic: "LockTargetState",
            value,
        }),
    }
}

/// Maps a door contact to `ContactSensorState`.
///
/// `Unknown` has no HomeKit encoding and yields `None`.
#[must_use]
pub const fn contact_sensor_state(door: DoorContact) -> Option<u8> {
    match door {
        DoorContact::Closed => Some(0),
        DoorContact::Open => Some(1),
        DoorContact::Unknown => None,
    }
}

/// Maps the low-battery flag to `StatusLowBattery`.
#[must_use]
pub fn status_low_battery(low: bool) -> u8 {
    u8::from(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_state_values() {
        assert_eq!(lock_current_state(LockPhase::Unlocked), 0);
        assert_eq!(lock_current_state(LockPhase::Locked), 1);
        assert_eq!(lock_current_state(LockPhase::Jammed), 2);
        assert_eq!(lock_current_state(LockPhase::Unknown), 3);
    }

    #[test]
    fn target_state_round_trip() {
        for target in [TargetState::Locked, TargetState::Unlocked] {
            assert_eq!(target_from_value(lock_target_state(target)).unwrap(), target);
        }
        assert!(target_from_value(2).is_err());
    }

    #[test]
    fn contact_values() {
        assert_eq!(contact_sensor_state(DoorContact::Closed), Some(0));
        assert_eq!(contact_sensor_state(DoorContact::Open), Some(1));
        assert_eq!(contact_sensor_state(DoorContact::Unknown), None);
    }
}
