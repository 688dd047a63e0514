// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are the units in which the reconciliation engine mutates a
//! [`CanonicalLockState`](super::CanonicalLockState). Every accepted change
//! is mirrored to the persisted accessory context and forwarded to HomeKit.
//!
//! # Examples
//!
//! ```
//! use august_homekit::state::StateChange;
//! use august_homekit::types::{DoorContact, LockPhase};
//!
//! let change = StateChange::batch(vec![
//!     StateChange::Phase(LockPhase::Unlocked),
//!     StateChange::Door(DoorContact::Open),
//! ]);
//! assert_eq!(change.change_count(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{BatteryLevel, DoorContact, LockPhase};

/// A change in canonical lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    /// The lock phase changed.
    Phase(LockPhase),

    /// The door contact changed.
    Door(DoorContact),

    /// The battery level changed.
    Battery(BatteryLevel),

    /// The firmware version changed.
    Firmware(String),

    /// Multiple changes at once.
    Batch(Vec<StateChange>),
}

impl StateChange {
    /// Creates a batch of changes.
    #[must_use]
    pub fn batch(changes: Vec<StateChange>) -> Self {
        Self::Batch(changes)
    }

    /// Returns `true` if this is a phase change.
    #[must_use]
    pub fn is_phase(&self) -> bool {
        matches!(self, Self::Phase(_))
    }

    /// Returns `true` if this is a door contact change.
    #[must_use]
    pub fn is_door(&self) -> bool {
        matches!(self, Self::Door(_))
    }

    /// Returns `true` if this is a battery change.
    #[must_use]
    pub fn is_battery(&self) -> bool {
        matches!(self, Self::Battery(_))
    }

    /// Returns the number of individual changes.
    ///
    /// For batch changes, returns the total count of nested changes.
    #[must_use]
    pub fn change_count(&self) -> usize {
        match self {
            Self::Batch(changes) => changes.iter().map(Self::change_count).sum(),
            _ => 1,
        }
    }

    /// Flattens nested batches into individual changes.
    #[must_use]
    pub fn flatten(self) -> Vec<StateChange> {
        match self {
            Self::Batch(changes) => changes.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_predicates() {
        assert!(StateChange::Phase(LockPhase::Locked).is_phase());
        assert!(StateChange::Door(DoorContact::Open).is_door());
        assert!(StateChange::Battery(BatteryLevel::FULL).is_battery());
        assert!(!StateChange::Firmware("1.0".to_string()).is_phase());
    }

    #[test]
    fn change_count_and_flatten() {
        let batch = StateChange::batch(vec![
            StateChange::Phase(LockPhase::Locked),
            StateChange::Door(DoorContact::Closed),
        ]);
        assert_eq!(batch.change_count(), 2);

        let nested = StateChange::batch(vec![batch, StateChange::Battery(BatteryLevel::EMPTY)]);
        assert_eq!(nested.change_count(), 3);
        assert_eq!(nested.flatten().len(), 3);
    }
}
