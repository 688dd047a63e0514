// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock mechanism states.
//!
//! [`LockPhase`] is the reconciled state of the bolt as reported by the
//! vendor. [`TargetState`] is what a user asked for. The two are kept apart
//! so that a pending request is never mistaken for a confirmed state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Reconciled state of a lock mechanism.
///
/// # Examples
///
/// ```
/// use august_homekit::types::LockPhase;
///
/// assert_eq!(LockPhase::default(), LockPhase::Locked);
/// assert!(LockPhase::Locked.is_stable());
/// assert!(!LockPhase::Unknown.is_stable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockPhase {
    /// The bolt is thrown.
    #[default]
    Locked,
    /// The bolt is retracted.
    Unlocked,
    /// The lock failed to reach a requested position.
    Jammed,
    /// The vendor reported contradictory or empty state.
    Unknown,
}

impl LockPhase {
    /// Returns a lowercase name for logs and persisted context.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Jammed => "jammed",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` for the two terminal positions of the bolt.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        matches!(self, Self::Locked | Self::Unlocked)
    }

    /// Returns the target this phase satisfies, if any.
    #[must_use]
    pub const fn as_target(&self) -> Option<TargetState> {
        match self {
            Self::Locked => Some(TargetState::Locked),
            Self::Unlocked => Some(TargetState::Unlocked),
            Self::Jammed | Self::Unknown => None,
        }
    }
}

impl fmt::Display for LockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-requested lock position.
///
/// # Examples
///
/// ```
/// use august_homekit::types::{LockPhase, TargetState};
///
/// let target: TargetState = "unlock".parse().unwrap();
/// assert_eq!(target, TargetState::Unlocked);
/// assert_eq!(target.as_phase(), LockPhase::Unlocked);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    /// Throw the bolt.
    Locked,
    /// Retract the bolt.
    Unlocked,
}

impl TargetState {
    /// Returns the phase that confirms this target.
    #[must_use]
    pub const fn as_phase(&self) -> LockPhase {
        match self {
            Self::Locked => LockPhase::Locked,
            Self::Unlocked => LockPhase::Unlocked,
        }
    }

    /// Returns a lowercase name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locked" | "lock" | "secured" | "1" => Ok(Self::Locked),
            "unlocked" | "unlock" | "unsecured" | "0" => Ok(Self::Unlocked),
            _ => Err(ValueError::InvalidTargetState(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_targets() {
        assert_eq!(LockPhase::Locked.as_target(), Some(TargetState::Locked));
        assert_eq!(LockPhase::Unlocked.as_target(), Some(TargetState::Unlocked));
        assert_eq!(LockPhase::Jammed.as_target(), None);
        assert_eq!(LockPhase::Unknown.as_target(), None);
    }

    #[test]
    fn target_from_str() {
        assert_eq!("LOCKED".parse::<TargetState>(), Ok(TargetState::Locked));
        assert_eq!("secured".parse::<TargetState>(), Ok(TargetState::Locked));
        assert_eq!("0".parse::<TargetState>(), Ok(TargetState::Unlocked));
        assert!("ajar".parse::<TargetState>().is_err());
    }

    #[test]
    fn phase_serde_is_lowercase() {
        let json = serde_json::to_string(&LockPhase::Jammed).unwrap();
        assert_eq!(json, "\"jammed\"");
        let phase: LockPhase = serde_json::from_str("\"unlocked\"").unwrap();
        assert_eq!(phase, LockPhase::Unlocked);
    }
}
