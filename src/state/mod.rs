// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical lock state types.
//!
//! [`CanonicalLockState`] is the single authoritative, host-facing state of a
//! lock. [`StateChange`] represents the individual changes the
//! reconciliation engine applies to it.

mod lock_state;
mod state_change;

pub use lock_state::CanonicalLockState;
pub use state_change::StateChange;
