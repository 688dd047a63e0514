// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock platform and per-lock accessory runtime.
//!
//! The [`LockPlatform`] discovers the account's locks and creates one
//! [`LockAccessory`] per bridged lock. Each accessory owns its own
//! reconciliation engine, characteristic bridge, and tasks; nothing is
//! shared between locks except the vendor client and the event bus.
//!
//! # Examples
//!
//! ## Subscribing to Events
//!
//! ```no_run
//! use august_homekit::event::LockEvent;
//! use august_homekit::manager::LockPlatform;
//! use august_homekit::protocol::{HttpLockApi, PushHub};
//!
//! # fn example(platform: &LockPlatform<HttpLockApi, PushHub>) {
//! let mut events = platform.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             LockEvent::Transition { lock_id, transition } => {
//!                 println!("{lock_id} {transition}");
//!             }
//!             LockEvent::CommandFailed { lock_id, class, .. } => {
//!                 println!("{lock_id}: command failed ({class})");
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ## Watching Lock State
//!
//! ```no_run
//! use august_homekit::manager::LockPlatform;
//! use august_homekit::protocol::{HttpLockApi, PushHub};
//! use august_homekit::types::LockId;
//!
//! # async fn example(platform: &LockPlatform<HttpLockApi, PushHub>) {
//! if let Some(mut state_rx) = platform.watch_lock(&LockId::new("front")).await {
//!     tokio::spawn(async move {
//!         while state_rx.changed().await.is_ok() {
//!             println!("phase: {}", state_rx.borrow().lock_phase());
//!         }
//!     });
//! }
//! # }
//! ```

mod lock_accessory;
mod platform;

pub use lock_accessory::LockAccessory;
pub use platform::LockPlatform;
