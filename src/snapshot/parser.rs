// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of raw snapshots into reconciliation outcomes.

use crate::error::ParseError;
use crate::types::{BatteryLevel, DoorContact, LockPhase};

use super::{RawSnapshot, RawStateFlags};

/// Confirmation attempts above this count turn an ambiguous snapshot into
/// [`LockPhase::Jammed`].
pub const JAM_RETRY_THRESHOLD: u32 = 1;

/// What a snapshot says about the lock phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The snapshot resolves to this phase.
    Resolved(LockPhase),
    /// The bolt is mid-travel; keep the previous stable phase.
    Deferred,
    /// The snapshot carries no lock state at all.
    Absent,
}

/// Canonical reading of one snapshot.
///
/// `None` fields mean "no information", and the engine keeps its previous
/// value for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    /// Lock phase reading.
    pub phase: PhaseOutcome,
    /// Door contact reading.
    pub door: Option<DoorContact>,
    /// Battery reading.
    pub battery: Option<BatteryLevel>,
    /// Firmware version reading.
    pub firmware: Option<String>,
}

impl ReconciliationOutcome {
    /// An outcome that changes nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            phase: PhaseOutcome::Absent,
            door: None,
            battery: None,
            firmware: None,
        }
    }

    /// Returns `true` if this outcome carries no information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

/// Parses a raw snapshot into a reconciliation outcome.
///
/// `retry_count` is the number of confirmation attempts made for the
/// current intent; it only matters when the flags are ambiguous.
///
/// # Examples
///
/// ```
/// use august_homekit::snapshot::{PhaseOutcome, RawSnapshot, RawStateFlags, parse};
/// use august_homekit::types::LockPhase;
///
/// let raw = RawSnapshot::with_flags(RawStateFlags { locked: true, ..Default::default() })
///     .with_battery(0.82);
/// let outcome = parse(&raw, 1);
///
/// assert_eq!(outcome.phase, PhaseOutcome::Resolved(LockPhase::Locked));
/// assert_eq!(outcome.battery.unwrap().value(), 82);
/// ```
#[must_use]
pub fn parse(raw: &RawSnapshot, retry_count: u32) -> ReconciliationOutcome {
    let flags = raw.flags();

    if flags.is_none() {
        tracing::debug!(snapshot = ?raw, "Snapshot carries no lock state");
    }

    ReconciliationOutcome {
        phase: flags.map_or(PhaseOutcome::Absent, |f| phase_from_flags(f, retry_count)),
        door: door_from(flags, raw.door_state.as_deref()),
        battery: raw
            .battery
            .filter(|fraction| fraction.is_finite())
            .map(BatteryLevel::from_fraction),
        firmware: raw
            .current_firmware_version
            .as_ref()
            .filter(|v| !v.is_empty())
            .cloned(),
    }
}

/// Decodes a JSON push payload into a raw snapshot.
///
/// # Errors
///
/// Returns `ParseError::Json` if the payload is not a JSON object of the
/// expected shape.
pub fn parse_push_payload(payload: &str) -> Result<RawSnapshot, ParseError> {
    serde_json::from_str(payload).map_err(ParseError::Json)
}

fn phase_from_flags(flags: RawStateFlags, retry_count: u32) -> PhaseOutcome {
    if flags.is_transient() {
        return PhaseOutcome::Deferred;
    }

    match (flags.locked, flags.unlocked) {
        (true, false) => PhaseOutcome::Resolved(LockPhase::Locked),
        (false, true) => PhaseOutcome::Resolved(LockPhase::Unlocked),
        _ if retry_count > JAM_RETRY_THRESHOLD => PhaseOutcome::Resolved(LockPhase::Jammed),
        _ => PhaseOutcome::Resolved(LockPhase::Unknown),
    }
}

fn door_from(flags: Option<RawStateFlags>, door_state: Option<&str>) -> Option<DoorContact> {
    if let Some(flags) = flags {
        match (flags.open, flags.closed) {
            (true, false) => return Some(DoorContact::Open),
            (false, true) => return Some(DoorContact::Closed),
            _ => {}
        }
    }
    door_state.and_then(DoorContact::from_door_state)
}
