// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for lock state.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so clamping and validation happen once at the edge.
//!
//! # Types
//!
//! - [`LockPhase`] - Reconciled bolt state (Locked/Unlocked/Jammed/Unknown)
//! - [`TargetState`] - User-requested bolt state (Locked/Unlocked)
//! - [`DoorContact`] - Door sensor state (Open/Closed/Unknown)
//! - [`BatteryLevel`] - Battery percentage (0-100%)
//! - [`LockId`] / [`LockIdentity`] - Vendor id and discovery metadata

mod battery;
mod door;
mod lock_id;
mod lock_phase;

pub use battery::BatteryLevel;
pub use door::DoorContact;
pub use lock_id::{LockId, LockIdentity};
pub use lock_phase::{LockPhase, TargetState};
