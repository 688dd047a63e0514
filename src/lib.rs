// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `august_homekit` - Bridges August/Yale smart locks to HomeKit accessories.
//!
//! Every lock is observed through three independent channels: periodic
//! polling, vendor push events, and target-state writes from HomeKit. This
//! library reconciles them into one canonical state per lock and keeps the
//! HomeKit characteristics consistent with it.
//!
//! # Architecture
//!
//! ```text
//!  poll scheduler ──┐
//!                   ├─► snapshot parser ─► reconciliation engine ─► characteristic bridge ─► host
//!  push stream ─────┘                            ▲
//!                                                │ confirmatory poll
//!  host "set" ─► intent ─► debouncer ─► vendor command
//! ```
//!
//! - [`snapshot`]: vendor payloads and their normalization
//! - [`engine`]: the per-lock state machine and intent tracking
//! - [`command`]: debounced command queue and the update guard
//! - [`scheduler`]: periodic and out-of-band polling
//! - [`homekit`]: host abstraction, characteristic mapping, persisted context
//! - [`protocol`]: vendor API traits, REST client, push routing
//! - [`manager`]: per-lock runtime and account-wide platform
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use august_homekit::config::PlatformConfig;
//! use august_homekit::homekit::HomeKitHost;
//! use august_homekit::manager::LockPlatform;
//! use august_homekit::protocol::{HttpLockApi, PushHub};
//! use august_homekit::types::{LockId, TargetState};
//!
//! # async fn example(host: Arc<dyn HomeKitHost>) -> august_homekit::Result<()> {
//! let config = PlatformConfig::from_json(r#"{
//!     "credentials": { "apiKey": "key", "accessToken": "token" },
//!     "options": { "refreshRate": 360, "pushRate": 1 }
//! }"#)?;
//!
//! let push = Arc::new(PushHub::new());
//! let platform = LockPlatform::<HttpLockApi, PushHub>::from_config(config, host)?
//!     .with_push(Arc::clone(&push));
//!
//! for lock_id in platform.discover().await? {
//!     println!("bridged {lock_id}");
//! }
//!
//! // Messages from the vendor push transport are routed by lock id
//! push.route_payload(
//!     &LockId::new("front"),
//!     r#"{"status":"kAugLockState_Unlocked"}"#,
//!     None,
//! )?;
//!
//! platform.set_target_state(&LockId::new("front"), TargetState::Locked).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod homekit;
pub mod manager;
pub mod protocol;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod types;

pub use config::{LockSettings, PlatformConfig};
pub use engine::{ReconciliationEngine, SnapshotSource};
pub use error::{ApiError, ConfigError, Error, ParseError, Result, StatusClass, ValueError};
pub use event::{EventBus, LockEvent, Transition};
pub use homekit::{Characteristic, CharacteristicValue, HomeKitHost, Service};
pub use manager::{LockAccessory, LockPlatform};
#[cfg(feature = "http")]
pub use protocol::{HttpConfig, HttpLockApi};
pub use protocol::{LockApi, PushHub, PushSource};
pub use state::{CanonicalLockState, StateChange};
pub use types::{BatteryLevel, DoorContact, LockId, LockIdentity, LockPhase, TargetState};
