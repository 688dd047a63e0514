// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of lock state from polls, push events, and user intent.
//!
//! The [`ReconciliationEngine`] owns the [`CanonicalLockState`] and the
//! pending [`TargetState`] of one lock. Poll results and push events both
//! go through [`ReconciliationEngine::apply_snapshot`]; the merge rules are
//! the same for either source, so the order in which they arrive does not
//! change the state they converge to once transient readings resolve.
//!
//! # Examples
//!
//! ```
//! use august_homekit::engine::{ReconciliationEngine, SnapshotSource};
//! use august_homekit::snapshot::{RawSnapshot, RawStateFlags, parse};
//! use august_homekit::state::CanonicalLockState;
//! use august_homekit::types::{LockId, LockPhase, TargetState};
//!
//! let mut engine = ReconciliationEngine::new(LockId::new("front"), CanonicalLockState::new(), true);
//! engine.record_intent(TargetState::Unlocked);
//!
//! let raw = RawSnapshot::with_flags(RawStateFlags { unlocked: true, ..Default::default() });
//! let reconciled = engine.apply_snapshot(&parse(&raw, engine.retry_count()), SnapshotSource::Poll);
//!
//! assert_eq!(reconciled.changes.len(), 1);
//! assert_eq!(engine.state().lock_phase(), LockPhase::Unlocked);
//! assert_eq!(engine.reconcile_intent(), Some(TargetState::Unlocked));
//! assert_eq!(engine.intent(), None);
//! ```

mod reconcile;

pub use reconcile::{Reconciled, ReconciliationEngine, SnapshotSource};
