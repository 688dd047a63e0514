// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Backoff applied to polling when the vendor rate limits us.

use std::time::Duration;

/// Exponential backoff for rate-limited polls.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use august_homekit::config::BackoffPolicy;
///
/// let policy = BackoffPolicy::default();
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
///
/// let policy = BackoffPolicy::new()
///     .with_initial_delay(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(30));
/// assert_eq!(policy.delay_for_attempt(20), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first rate-limited poll.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive rate-limited polls.
    pub backoff_multiplier: f32,
}

impl BackoffPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay after `attempt` consecutive rate-limited polls,
    /// counting from zero.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        // Delays are seconds to minutes, far from f32 precision trouble
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        if !delay_ms.is_finite() {
            return self.max_delay;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_exponentially() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn delays_are_capped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(9), Duration::from_secs(300));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn builder_overrides_defaults() {
        let policy = BackoffPolicy::new()
            .with_initial_delay(Duration::from_secs(5))
            .with_backoff_multiplier(3.0);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(15));
    }
}
