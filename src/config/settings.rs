// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolved per-lock settings.

use std::time::Duration;

use super::BackoffPolicy;

/// Effective settings for one lock, after platform and per-device
/// configuration have been merged and clamped.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use august_homekit::config::LockSettings;
///
/// let settings = LockSettings::default();
/// assert_eq!(settings.refresh_rate, Some(Duration::from_secs(360)));
/// assert_eq!(settings.confirm_delay(), Duration::from_secs(5));
///
/// let settings = LockSettings::default().with_refresh_rate(Duration::ZERO);
/// assert!(!settings.polling_enabled());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LockSettings {
    /// Poll interval. `None` disables polling.
    pub refresh_rate: Option<Duration>,
    /// Debounce window for user commands.
    pub push_rate: Duration,
    /// Cap on the confirmatory poll delay.
    pub update_rate: Duration,
    /// Hide the LockMechanism service.
    pub hide_lock: bool,
    /// Hide the ContactSensor service.
    pub hide_contactsensor: bool,
    /// Bridge the lock even when it is natively paired with HomeKit.
    pub override_homekit_enabled: bool,
    /// Backoff applied to rate-limited polls.
    pub backoff: BackoffPolicy,
}

impl LockSettings {
    /// Default poll interval.
    pub const DEFAULT_REFRESH_RATE: Duration = Duration::from_secs(360);
    /// Shortest accepted non-zero poll interval.
    pub const MIN_REFRESH_RATE: Duration = Duration::from_secs(30);
    /// Default debounce window.
    pub const DEFAULT_PUSH_RATE: Duration = Duration::from_secs(1);
    /// Default confirmatory poll cap.
    pub const DEFAULT_UPDATE_RATE: Duration = Duration::from_secs(5);

    /// Sets the poll interval, clamping it like the configuration loader.
    #[must_use]
    pub fn with_refresh_rate(mut self, rate: Duration) -> Self {
        self.refresh_rate = clamp_refresh_rate(rate);
        self
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_push_rate(mut self, rate: Duration) -> Self {
        self.push_rate = rate;
        self
    }

    /// Sets the confirmatory poll cap.
    #[must_use]
    pub fn with_update_rate(mut self, rate: Duration) -> Self {
        self.update_rate = rate;
        self
    }

    /// Hides the contact sensor.
    #[must_use]
    pub fn with_hidden_contact_sensor(mut self) -> Self {
        self.hide_contactsensor = true;
        self
    }

    /// Hides the lock mechanism.
    #[must_use]
    pub fn with_hidden_lock(mut self) -> Self {
        self.hide_lock = true;
        self
    }

    /// Sets the rate-limit backoff.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns `true` if the poll scheduler should run.
    #[must_use]
    pub fn polling_enabled(&self) -> bool {
        self.refresh_rate.is_some()
    }

    /// Delay between a command and its confirmatory poll.
    ///
    /// Half the poll interval capped by `update_rate`, or `update_rate`
    /// itself when polling is disabled.
    #[must_use]
    pub fn confirm_delay(&self) -> Duration {
        match self.refresh_rate {
            Some(refresh) => (refresh / 2).min(self.update_rate),
            None => self.update_rate,
        }
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            refresh_rate: Some(Self::DEFAULT_REFRESH_RATE),
            push_rate: Self::DEFAULT_PUSH_RATE,
            update_rate: Self::DEFAULT_UPDATE_RATE,
            hide_lock: false,
            hide_contactsensor: false,
            override_homekit_enabled: false,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Zero disables polling; anything else is at least [`LockSettings::MIN_REFRESH_RATE`].
pub(crate) fn clamp_refresh_rate(rate: Duration) -> Option<Duration> {
    if rate.is_zero() {
        None
    } else if rate < LockSettings::MIN_REFRESH_RATE {
        tracing::warn!(
            requested_secs = rate.as_secs_f64(),
            min_secs = LockSettings::MIN_REFRESH_RATE.as_secs(),
            "refreshRate below minimum, clamping"
        );
        Some(LockSettings::MIN_REFRESH_RATE)
    } else {
        Some(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_rate_clamping() {
        assert_eq!(clamp_refresh_rate(Duration::ZERO), None);
        assert_eq!(
            clamp_refresh_rate(Duration::from_secs(10)),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            clamp_refresh_rate(Duration::from_secs(600)),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn confirm_delay_is_half_refresh_capped_by_update_rate() {
        let settings = LockSettings::default()
            .with_refresh_rate(Duration::from_secs(30))
            .with_update_rate(Duration::from_secs(60));
        assert_eq!(settings.confirm_delay(), Duration::from_secs(15));

        let settings = settings.with_update_rate(Duration::from_secs(5));
        assert_eq!(settings.confirm_delay(), Duration::from_secs(5));
    }

    #[test]
    fn confirm_delay_without_polling_is_update_rate() {
        let settings = LockSettings::default()
            .with_refresh_rate(Duration::ZERO)
            .with_update_rate(Duration::from_secs(7));
        assert_eq!(settings.confirm_delay(), Duration::from_secs(7));
    }
}
