// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot parsing for vendor lock payloads.
//!
//! Lock state reaches the library two ways:
//!
//! - Polls return [`LockDetails`], a complete description of the lock
//! - Push events carry a partial [`RawSnapshot`] (usually no battery or firmware)
//!
//! Both are normalized by [`parse`] into a [`ReconciliationOutcome`] that the
//! reconciliation engine merges into canonical state.
//!
//! # Examples
//!
//! ```
//! use august_homekit::snapshot::{PhaseOutcome, parse, parse_push_payload};
//!
//! let raw = parse_push_payload(r#"{"state":{"locking":true}}"#).unwrap();
//! assert_eq!(parse(&raw, 1).phase, PhaseOutcome::Deferred);
//! ```

mod parser;
mod raw;

pub use parser::{
    JAM_RETRY_THRESHOLD, PhaseOutcome, ReconciliationOutcome, parse, parse_push_payload,
};
pub use raw::{LockDetails, PushEvent, RawSnapshot, RawStateFlags};
