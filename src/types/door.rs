// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door contact sensor state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of the door reported by the lock's contact sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorContact {
    /// The door is ajar.
    Open,
    /// The door is shut.
    #[default]
    Closed,
    /// No sensor reading is available.
    Unknown,
}

impl DoorContact {
    /// Resolves a textual door state such as `kAugDoorState_Open`.
    ///
    /// Returns `None` when the text mentions neither state, so the caller
    /// can keep its previous value.
    ///
    /// # Examples
    ///
    /// ```
    /// use august_homekit::types::DoorContact;
    ///
    /// assert_eq!(DoorContact::from_door_state("kAugDoorState_Open"), Some(DoorContact::Open));
    /// assert_eq!(DoorContact::from_door_state("closed"), Some(DoorContact::Closed));
    /// assert_eq!(DoorContact::from_door_state("init"), None);
    /// ```
    #[must_use]
    pub fn from_door_state(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("open") {
            Some(Self::Open)
        } else if lower.contains("closed") {
            Some(Self::Closed)
        } else {
            None
        }
    }

    /// Returns a lowercase name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DoorContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
