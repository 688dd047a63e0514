// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-lock reconciliation engine.

use std::fmt;

use chrono::Utc;

use crate::snapshot::{PhaseOutcome, ReconciliationOutcome};
use crate::state::{CanonicalLockState, StateChange};
use crate::types::{LockId, LockPhase, TargetState};

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotSource {
    /// A scheduled, out-of-band, or confirmatory poll.
    Poll,
    /// The vendor push channel.
    Push,
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll => f.write_str("poll"),
            Self::Push => f.write_str("push"),
        }
    }
}

/// Result of merging one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Changes accepted into canonical state, in application order.
    pub changes: Vec<StateChange>,
    /// New firmware version, raised once per change.
    pub firmware_changed: Option<String>,
    /// The phase entered Unknown and polling is enabled.
    pub refresh_requested: bool,
    /// The snapshot reported the bolt mid-travel.
    pub deferred: bool,
}

impl Reconciled {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the new phase, if the phase changed.
    #[must_use]
    pub fn phase_change(&self) -> Option<LockPhase> {
        self.changes.iter().find_map(|c| match c {
            StateChange::Phase(phase) => Some(*phase),
            _ => None,
        })
    }
}

/// Single source of truth for one lock's canonical state and intent.
#[derive(Debug)]
pub struct ReconciliationEngine {
    lock_id: LockId,
    state: CanonicalLockState,
    intent: Option<TargetState>,
    polling_enabled: bool,
    /// Confirmation attempts for the pending intent. Nothing retries a
    /// command yet, so this stays at 1 and jammed detection is unreachable.
    confirmation_attempts: u32,
}

impl ReconciliationEngine {
    /// Creates an engine seeded with `state`.
    ///
    /// `polling_enabled` controls whether entering Unknown requests an
    /// out-of-band refresh.
    #[must_use]
    pub fn new(lock_id: LockId, state: CanonicalLockState, polling_enabled: bool) -> Self {
        Self {
            lock_id,
            state,
            intent: None,
            polling_enabled,
            confirmation_attempts: 1,
        }
    }

    /// Returns the lock id.
    #[must_use]
    pub fn lock_id(&self) -> &LockId {
        &self.lock_id
    }

    /// Returns the canonical state.
    #[must_use]
    pub fn state(&self) -> &CanonicalLockState {
        &self.state
    }

    /// Returns the pending intent.
    #[must_use]
    pub fn intent(&self) -> Option<TargetState> {
        self.intent
    }

    /// Returns the retry count to hand to the snapshot parser.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.confirmation_attempts
    }

    /// Merges a parsed snapshot into canonical state.
    ///
    /// Applying the same outcome twice yields the same state; the second
    /// application reports no changes.
    pub fn apply_snapshot(
        &mut self,
        outcome: &ReconciliationOutcome,
        source: SnapshotSource,
    ) -> Reconciled {
        let mut reconciled = Reconciled::default();

        match outcome.phase {
            PhaseOutcome::Resolved(phase) => {
                let change = StateChange::Phase(phase);
                if self.state.apply(&change) {
                    reconciled.changes.push(change);
                    if phase == LockPhase::Unknown && self.polling_enabled {
                        reconciled.refresh_requested = true;
                    }
                }
            }
            PhaseOutcome::Deferred => {
                tracing::debug!(
                    lock_id = %self.lock_id,
                    %source,
                    phase = %self.state.lock_phase(),
                    "Bolt in motion, keeping last stable phase"
                );
                reconciled.deferred = true;
            }
            PhaseOutcome::Absent => {}
        }

        if let Some(door) = outcome.door {
            self.accept(StateChange::Door(door), &mut reconciled);
        }

        if let Some(battery) = outcome.battery {
            self.accept(StateChange::Battery(battery), &mut reconciled);
        }

        if let Some(version) = &outcome.firmware
            && self.accept(StateChange::Firmware(version.clone()), &mut reconciled)
        {
            reconciled.firmware_changed = Some(version.clone());
        }

        if !outcome.is_empty() {
            self.state.mark_reconciled(Utc::now());
        }

        if !reconciled.is_noop() {
            tracing::debug!(
                lock_id = %self.lock_id,
                %source,
                changes = reconciled.changes.len(),
                "Snapshot reconciled"
            );
        }

        reconciled
    }

    /// Records the user's requested target. Never blocks.
    ///
    /// Returns the intent it replaced, if any.
    pub fn record_intent(&mut self, target: TargetState) -> Option<TargetState> {
        tracing::debug!(lock_id = %self.lock_id, %target, "Recording intent");
        self.intent.replace(target)
    }

    /// Clears the intent if canonical state now satisfies it.
    ///
    /// Returns the confirmed target. A mismatching intent stays pending for
    /// the next reconciliation.
    pub fn reconcile_intent(&mut self) -> Option<TargetState> {
        let target = self.intent?;
        if self.state.lock_phase() == target.as_phase() {
            self.intent = None;
            tracing::debug!(lock_id = %self.lock_id, %target, "Intent confirmed");
            Some(target)
        } else {
            None
        }
    }

    fn accept(&mut self, change: StateChange, reconciled: &mut Reconciled) -> bool {
        if self.state.apply(&change) {
            reconciled.changes.push(change);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{RawSnapshot, RawStateFlags, parse};
    use crate::types::{BatteryLevel, DoorContact};

    fn engine() -> ReconciliationEngine {
        ReconciliationEngine::new(LockId::new("lock"), CanonicalLockState::new(), true)
    }

    fn raw(locked: bool, unlocked: bool) -> RawSnapshot {
        RawSnapshot::with_flags(RawStateFlags {
            locked,
            unlocked,
            ..RawStateFlags::default()
        })
    }

    fn apply(engine: &mut ReconciliationEngine, raw: &RawSnapshot) -> Reconciled {
        let outcome = parse(raw, engine.retry_count());
        engine.apply_snapshot(&outcome, SnapshotSource::Poll)
    }

    #[test]
    fn merge_is_idempotent() {
        let snapshots = [
            raw(false, true).with_battery(0.5).with_door_state("open"),
            raw(true, true).with_firmware("2.0"),
            RawSnapshot::with_flags(RawStateFlags {
                locking: true,
                ..RawStateFlags::default()
            }),
            RawSnapshot::default(),
        ];

        for snapshot in snapshots {
            let mut engine = engine();
            apply(&mut engine, &snapshot);
            let once = engine.state().clone();

            let second = apply(&mut engine, &snapshot);
            assert!(second.is_noop());
            assert_eq!(engine.state().lock_phase(), once.lock_phase());
            assert_eq!(engine.state().door_contact(), once.door_contact());
            assert_eq!(engine.state().battery(), once.battery());
            assert_eq!(engine.state().firmware_version(), once.firmware_version());
        }
    }

    #[test]
    fn contradictory_flags_become_unknown_not_carry_over() {
        let mut engine = engine();
        apply(&mut engine, &raw(false, true));
        assert_eq!(engine.state().lock_phase(), LockPhase::Unlocked);

        let reconciled = apply(&mut engine, &raw(true, true));
        assert_eq!(engine.state().lock_phase(), LockPhase::Unknown);
        assert!(reconciled.refresh_requested);

        apply(&mut engine, &raw(false, false));
        assert_eq!(engine.state().lock_phase(), LockPhase::Unknown);
    }

    #[test]
    fn unknown_does_not_request_refresh_when_polling_disabled() {
        let mut engine =
            ReconciliationEngine::new(LockId::new("lock"), CanonicalLockState::new(), false);
        let reconciled = apply(&mut engine, &raw(false, false));
        assert_eq!(engine.state().lock_phase(), LockPhase::Unknown);
        assert!(!reconciled.refresh_requested);
    }

    #[test]
    fn transient_snapshot_keeps_previous_phase() {
        let mut engine = engine();
        apply(&mut engine, &raw(false, true));

        let reconciled = apply(
            &mut engine,
            &RawSnapshot::with_flags(RawStateFlags {
                locked: true,
                locking: true,
                ..RawStateFlags::default()
            }),
        );
        assert!(reconciled.deferred);
        assert_eq!(reconciled.phase_change(), None);
        assert_eq!(engine.state().lock_phase(), LockPhase::Unlocked);
    }

    #[test]
    fn transient_snapshot_still_updates_battery() {
        let mut engine = engine();
        let reconciled = apply(
            &mut engine,
            &RawSnapshot::with_flags(RawStateFlags {
                unlocking: true,
                ..RawStateFlags::default()
            })
            .with_battery(0.4),
        );
        assert_eq!(
            reconciled.changes,
            vec![StateChange::Battery(BatteryLevel::new(40).unwrap())]
        );
    }

    #[test]
    fn non_finite_battery_keeps_previous_level() {
        let mut engine = engine();
        apply(&mut engine, &raw(true, false).with_battery(0.6));

        let reconciled = apply(&mut engine, &raw(true, false).with_battery(f64::NAN));
        assert!(reconciled.is_noop());
        assert_eq!(engine.state().battery().value(), 60);
        assert!(!engine.state().low_battery());
    }

    #[test]
    fn door_retained_on_partial_data() {
        let mut engine = engine();
        apply(&mut engine, &raw(true, false).with_door_state("open"));
        assert_eq!(engine.state().door_contact(), Some(DoorContact::Open));

        apply(&mut engine, &raw(true, false));
        assert_eq!(engine.state().door_contact(), Some(DoorContact::Open));
    }

    #[test]
    fn firmware_change_is_signalled_once() {
        let mut engine = engine();
        let first = apply(&mut engine, &RawSnapshot::default().with_firmware("1.0"));
        assert_eq!(first.firmware_changed.as_deref(), Some("1.0"));

        let repeat = apply(&mut engine, &RawSnapshot::default().with_firmware("1.0"));
        assert_eq!(repeat.firmware_changed, None);

        let upgrade = apply(&mut engine, &RawSnapshot::default().with_firmware("1.1"));
        assert_eq!(upgrade.firmware_changed.as_deref(), Some("1.1"));
    }

    #[test]
    fn steady_state_poll() {
        let mut engine = engine();
        let snapshot = raw(true, false).with_battery(0.82);

        let first = apply(&mut engine, &snapshot);
        assert_eq!(engine.state().lock_phase(), LockPhase::Locked);
        assert_eq!(engine.state().battery().value(), 82);
        assert!(!engine.state().low_battery());
        assert_eq!(first.changes.len(), 1);

        for _ in 0..3 {
            assert!(apply(&mut engine, &snapshot).is_noop());
        }
    }

    #[test]
    fn intent_is_confirmed_only_on_match() {
        let mut engine = engine();
        assert_eq!(engine.record_intent(TargetState::Unlocked), None);
        assert_eq!(engine.reconcile_intent(), None);
        assert_eq!(engine.intent(), Some(TargetState::Unlocked));

        apply(&mut engine, &raw(false, true));
        assert_eq!(engine.reconcile_intent(), Some(TargetState::Unlocked));
        assert_eq!(engine.intent(), None);
        assert_eq!(engine.reconcile_intent(), None);
    }

    #[test]
    fn record_intent_is_last_write_wins() {
        let mut engine = engine();
        engine.record_intent(TargetState::Unlocked);
        assert_eq!(
            engine.record_intent(TargetState::Locked),
            Some(TargetState::Unlocked)
        );
        assert_eq!(engine.intent(), Some(TargetState::Locked));
    }

    #[test]
    fn push_and_poll_converge() {
        let push_first = {
            let mut engine = engine();
            let a = parse(&raw(false, true).with_door_state("open"), 1);
            let b = parse(&raw(false, true).with_battery(0.3), 1);
            engine.apply_snapshot(&a, SnapshotSource::Push);
            engine.apply_snapshot(&b, SnapshotSource::Poll);
            engine.state().clone()
        };
        let poll_first = {
            let mut engine = engine();
            let a = parse(&raw(false, true).with_door_state("open"), 1);
            let b = parse(&raw(false, true).with_battery(0.3), 1);
            engine.apply_snapshot(&b, SnapshotSource::Poll);
            engine.apply_snapshot(&a, SnapshotSource::Push);
            engine.state().clone()
        };
        assert_eq!(push_first.lock_phase(), poll_first.lock_phase());
        assert_eq!(push_first.door_contact(), poll_first.door_contact());
        assert_eq!(push_first.battery(), poll_first.battery());
    }

    #[test]
    fn empty_snapshot_does_not_touch_timestamp() {
        let mut engine = engine();
        apply(&mut engine, &RawSnapshot::default());
        assert!(engine.state().last_reconciled_at().is_none());

        apply(&mut engine, &raw(true, false));
        assert!(engine.state().last_reconciled_at().is_some());
    }
}
