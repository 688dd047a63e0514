// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for lock state changes.
//!
//! The [`EventBus`] uses tokio's broadcast channel so that any number of
//! subscribers can observe [`LockEvent`]s published by the platform.
//!
//! # Examples
//!
//! ```
//! use august_homekit::event::{EventBus, LockEvent};
//! use august_homekit::types::LockId;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//! bus.publish(LockEvent::accessory_added(LockId::new("front")));
//! ```

mod event_bus;
mod lock_event;

pub use event_bus::EventBus;
pub use lock_event::{LockEvent, Transition};
