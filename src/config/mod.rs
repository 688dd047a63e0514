// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform configuration.
//!
//! [`PlatformConfig`] is the deserialized configuration document. Calling
//! [`PlatformConfig::settings_for`] merges platform options with a lock's
//! overrides into [`LockSettings`], which is what the runtime consumes.

mod backoff;
mod platform;
mod settings;

pub use backoff::BackoffPolicy;
pub use platform::{Credentials, DeviceConfig, PlatformConfig, PlatformOptions};
pub use settings::LockSettings;
