// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform configuration document.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::LockId;

use super::{LockSettings, settings::clamp_refresh_rate};

/// Top-level platform configuration.
///
/// Keys are camelCase, except the visibility toggles which keep their
/// snake_case names.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use august_homekit::config::PlatformConfig;
/// use august_homekit::types::LockId;
///
/// let config = PlatformConfig::from_json(r#"{
///     "credentials": { "apiKey": "key", "accessToken": "token" },
///     "options": { "refreshRate": 120, "pushRate": 0.5 },
///     "devices": [ { "lockId": "front", "hide_contactsensor": true } ]
/// }"#).unwrap();
///
/// let front = config.settings_for(&LockId::new("front"));
/// assert_eq!(front.refresh_rate, Some(Duration::from_secs(120)));
/// assert_eq!(front.push_rate, Duration::from_millis(500));
/// assert!(front.hide_contactsensor);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Vendor API credentials.
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Defaults applied to every lock.
    #[serde(default)]
    pub options: PlatformOptions,
    /// Per-lock overrides.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Vendor API credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Application API key.
    pub api_key: String,
    /// Session access token.
    pub access_token: String,
    /// Alternate API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Platform-wide option defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOptions {
    /// Poll interval in seconds; `0` disables polling.
    #[serde(default)]
    pub refresh_rate: Option<u64>,
    /// Command debounce window in seconds.
    #[serde(default)]
    pub push_rate: Option<f64>,
    /// Confirmatory poll cap in seconds.
    #[serde(default)]
    pub update_rate: Option<u64>,
    /// Hide the LockMechanism service.
    #[serde(default, rename = "hide_lock")]
    pub hide_lock: bool,
    /// Hide the ContactSensor service.
    #[serde(default, rename = "hide_contactsensor")]
    pub hide_contactsensor: bool,
    /// Bridge locks that are natively paired with HomeKit.
    #[serde(default, rename = "overrideHomeKitEnabled")]
    pub override_homekit_enabled: bool,
}

/// Per-lock configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Vendor lock id.
    pub lock_id: LockId,
    /// Skip this lock entirely.
    #[serde(default, rename = "hide_device")]
    pub hide_device: bool,
    /// Override for `hide_lock`.
    #[serde(default, rename = "hide_lock")]
    pub hide_lock: Option<bool>,
    /// Override for `hide_contactsensor`.
    #[serde(default, rename = "hide_contactsensor")]
    pub hide_contactsensor: Option<bool>,
    /// Override for `overrideHomeKitEnabled`.
    #[serde(default, rename = "overrideHomeKitEnabled")]
    pub override_homekit_enabled: Option<bool>,
    /// Override for `refreshRate`.
    #[serde(default)]
    pub refresh_rate: Option<u64>,
    /// Override for `pushRate`.
    #[serde(default)]
    pub push_rate: Option<f64>,
    /// Override for `updateRate`.
    #[serde(default)]
    pub update_rate: Option<u64>,
}

impl DeviceConfig {
    /// Creates an override entry with nothing overridden.
    #[must_use]
    pub fn new(lock_id: impl Into<LockId>) -> Self {
        Self {
            lock_id: lock_id.into(),
            hide_device: false,
            hide_lock: None,
            hide_contactsensor: None,
            override_homekit_enabled: None,
            refresh_rate: None,
            push_rate: None,
            update_rate: None,
        }
    }

    /// Hides the lock from the platform.
    #[must_use]
    pub fn with_hidden_device(mut self) -> Self {
        self.hide_device = true;
        self
    }

    /// Overrides the contact sensor visibility.
    #[must_use]
    pub fn with_hide_contactsensor(mut self, hide: bool) -> Self {
        self.hide_contactsensor = Some(hide);
        self
    }

    /// Overrides the native HomeKit skip.
    #[must_use]
    pub fn with_override_homekit_enabled(mut self, enabled: bool) -> Self {
        self.override_homekit_enabled = Some(enabled);
        self
    }

    /// Overrides the poll interval, in seconds.
    #[must_use]
    pub fn with_refresh_rate(mut self, secs: u64) -> Self {
        self.refresh_rate = Some(secs);
        self
    }

    /// Overrides the debounce window, in seconds.
    #[must_use]
    pub fn with_push_rate(mut self, secs: f64) -> Self {
        self.push_rate = Some(secs);
        self
    }
}

impl PlatformConfig {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document does not match the
    /// schema, or [`ConfigError::InvalidSetting`] for unusable values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Adds a per-lock override.
    #[must_use]
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.devices.push(device);
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Checks values that deserialization alone cannot reject.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for negative or non-finite
    /// push rates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let push_rates = std::iter::once(self.options.push_rate)
            .chain(self.devices.iter().map(|d| d.push_rate))
            .flatten();
        for rate in push_rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConfigError::InvalidSetting {
                    name: "pushRate",
                    message: format!("{rate} is not a non-negative number of seconds"),
                });
            }
        }
        Ok(())
    }

    /// Returns the credentials, or an error naming the missing one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when the credentials block
    /// is absent or a field is empty.
    pub fn require_credentials(&self) -> Result<&Credentials, ConfigError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ConfigError::MissingCredential("credentials"))?;
        if credentials.api_key.is_empty() {
            return Err(ConfigError::MissingCredential("apiKey"));
        }
        if credentials.access_token.is_empty() {
            return Err(ConfigError::MissingCredential("accessToken"));
        }
        Ok(credentials)
    }

    /// Returns the override entry for a lock.
    #[must_use]
    pub fn device(&self, lock_id: &LockId) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| &d.lock_id == lock_id)
    }

    /// Returns `true` if the lock is configured with `hide_device`.
    #[must_use]
    pub fn is_hidden(&self, lock_id: &LockId) -> bool {
        self.device(lock_id).is_some_and(|d| d.hide_device)
    }

    /// Resolves the effective settings for a lock.
    ///
    /// Per-device values win over platform options, which win over
    /// defaults.
    #[must_use]
    pub fn settings_for(&self, lock_id: &LockId) -> LockSettings {
        let options = &self.options;
        let device = self.device(lock_id);
        let defaults = LockSettings::default();

        let refresh_rate = device
            .and_then(|d| d.refresh_rate)
            .or(options.refresh_rate)
            .map_or(defaults.refresh_rate, |secs| {
                clamp_refresh_rate(Duration::from_secs(secs))
            });

        let push_rate = device
            .and_then(|d| d.push_rate)
            .or(options.push_rate)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(defaults.push_rate);

        let update_rate = device
            .and_then(|d| d.update_rate)
            .or(options.update_rate)
            .map_or(defaults.update_rate, Duration::from_secs);

        LockSettings {
            refresh_rate,
            push_rate,
            update_rate,
            hide_lock: device
                .and_then(|d| d.hide_lock)
                .unwrap_or(options.hide_lock),
            hide_contactsensor: device
                .and_then(|d| d.hide_contactsensor)
                .unwrap_or(options.hide_contactsensor),
            override_homekit_enabled: device
                .and_then(|d| d.override_homekit_enabled)
                .unwrap_or(options.override_homekit_enabled),
            backoff: defaults.backoff,
        }
    }
}
