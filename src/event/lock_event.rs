// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock event types.

use std::fmt;

use crate::engine::SnapshotSource;
use crate::error::StatusClass;
use crate::state::StateChange;
use crate::types::{LockId, TargetState};

/// A user-visible state transition.
///
/// Transitions are only raised for confirmed, non-redundant changes, so a
/// lock that reports "unlocked" on three consecutive polls produces one
/// [`Transition::Unlocked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// The bolt reached Locked.
    Locked,
    /// The bolt reached Unlocked.
    Unlocked,
    /// The door opened.
    Opened,
    /// The door closed.
    Closed,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::Locked => "Locked",
            Self::Unlocked => "Unlocked",
            Self::Opened => "Opened",
            Self::Closed => "Closed",
        };
        write!(f, "was {word}")
    }
}

/// Events emitted by the lock platform.
///
/// # Examples
///
/// ```
/// use august_homekit::event::{LockEvent, Transition};
/// use august_homekit::types::LockId;
///
/// let event = LockEvent::Transition {
///     lock_id: LockId::new("front"),
///     transition: Transition::Unlocked,
/// };
/// assert_eq!(event.lock_id().as_str(), "front");
/// assert_eq!(Transition::Unlocked.to_string(), "was Unlocked");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum LockEvent {
    /// A lock accessory was registered.
    AccessoryAdded {
        /// The lock.
        lock_id: LockId,
    },

    /// A lock accessory was removed.
    AccessoryRemoved {
        /// The lock.
        lock_id: LockId,
    },

    /// Canonical state changed.
    StateChanged {
        /// The lock.
        lock_id: LockId,
        /// The accepted change.
        change: StateChange,
        /// Which path delivered the snapshot.
        source: SnapshotSource,
    },

    /// A confirmed lock or door transition.
    Transition {
        /// The lock.
        lock_id: LockId,
        /// What happened.
        transition: Transition,
    },

    /// Canonical state now matches the user's requested target.
    IntentConfirmed {
        /// The lock.
        lock_id: LockId,
        /// The confirmed target.
        target: TargetState,
    },

    /// The lock reported new firmware.
    FirmwareChanged {
        /// The lock.
        lock_id: LockId,
        /// The new version.
        version: String,
    },

    /// A lock or unlock command failed.
    CommandFailed {
        /// The lock.
        lock_id: LockId,
        /// The target the command tried to reach.
        target: TargetState,
        /// Classification of the failure.
        class: StatusClass,
        /// Failure description.
        message: String,
    },
}

impl LockEvent {
    /// Returns the lock the event is about.
    #[must_use]
    pub fn lock_id(&self) -> &LockId {
        match self {
            Self::AccessoryAdded { lock_id }
            | Self::AccessoryRemoved { lock_id }
            | Self::StateChanged { lock_id, .. }
            | Self::Transition { lock_id, .. }
            | Self::IntentConfirmed { lock_id, .. }
            | Self::FirmwareChanged { lock_id, .. }
            | Self::CommandFailed { lock_id, .. } => lock_id,
        }
    }

    /// Returns `true` for added/removed events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AccessoryAdded { .. } | Self::AccessoryRemoved { .. }
        )
    }

    /// Returns `true` for state change events.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Creates an accessory added event.
    #[must_use]
    pub fn accessory_added(lock_id: LockId) -> Self {
        Self::AccessoryAdded { lock_id }
    }

    /// Creates an accessory removed event.
    #[must_use]
    pub fn accessory_removed(lock_id: LockId) -> Self {
        Self::AccessoryRemoved { lock_id }
    }
}
