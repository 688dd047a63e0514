// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Battery level type.
//!
//! This module provides a type-safe battery percentage, ensuring values are
//! always within 0-100% whatever the vendor reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Battery charge as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use august_homekit::types::BatteryLevel;
///
/// let level = BatteryLevel::from_fraction(0.82);
/// assert_eq!(level.value(), 82);
/// assert!(!level.is_low());
///
/// // Out-of-range vendor values are clamped
/// assert_eq!(BatteryLevel::from_fraction(1.7).value(), 100);
/// assert_eq!(BatteryLevel::from_fraction(-0.2).value(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// Empty battery.
    pub const EMPTY: Self = Self(0);

    /// Full battery.
    pub const FULL: Self = Self(100);

    /// Levels strictly below this percentage are reported as low.
    pub const LOW_THRESHOLD: u8 = 15;

    /// Creates a battery level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a battery level from a vendor fraction (nominally 0.0-1.0).
    ///
    /// The fraction is scaled to a percentage, rounded, and clamped. A
    /// non-finite fraction yields an empty battery.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_fraction(fraction: f64) -> Self {
        if !fraction.is_finite() {
            return Self::EMPTY;
        }
        // Clamped to [0, 100] before the cast, so truncation cannot occur
        let percent = (fraction * 100.0).round().clamp(0.0, 100.0);
        Self(percent as u8)
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` when the level is below [`Self::LOW_THRESHOLD`].
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.0 < Self::LOW_THRESHOLD
    }
}

impl Default for BatteryLevel {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<u8> for BatteryLevel {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatteryLevel> for u8 {
    fn from(level: BatteryLevel) -> Self {
        level.0
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
