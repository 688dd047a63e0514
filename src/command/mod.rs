// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User command dispatch.
//!
//! Target-state writes from HomeKit are queued with [`command_channel`] and
//! coalesced by a [`Debouncer`]: rapid successive writes within the debounce
//! window collapse into one vendor command carrying the last target. The
//! [`UpdateGuard`] is raised from enqueue until the confirmatory poll has
//! run, and the poll scheduler skips its ticks while it is raised.

mod debouncer;

pub use debouncer::{CommandSender, Debouncer, UpdateGuard, command_channel};
