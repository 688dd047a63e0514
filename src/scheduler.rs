// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic polling of one lock.
//!
//! The [`PollScheduler`] wakes every refresh interval, or early when the
//! reconciliation engine asks for an out-of-band refresh, and runs the
//! lock's refresh unless a command cycle holds the [`UpdateGuard`].
//! Failures never stop the loop; rate limiting stretches the next wait
//! according to the [`BackoffPolicy`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::sleep;

use crate::command::UpdateGuard;
use crate::config::BackoffPolicy;
use crate::error::{Result, StatusClass};
use crate::protocol::log_api_failure;
use crate::types::LockId;

/// What one scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A command cycle was in flight; nothing was fetched.
    Skipped,
    /// The refresh succeeded.
    Refreshed,
    /// The refresh failed with the given classification.
    Failed(StatusClass),
}

/// Poll loop for one lock.
#[derive(Debug)]
pub struct PollScheduler {
    lock_id: LockId,
    interval: Duration,
    guard: Arc<UpdateGuard>,
    wake: Arc<Notify>,
    backoff: BackoffPolicy,
    rate_limited: u32,
}

impl PollScheduler {
    /// Creates a scheduler ticking every `interval`.
    #[must_use]
    pub fn new(
        lock_id: LockId,
        interval: Duration,
        guard: Arc<UpdateGuard>,
        wake: Arc<Notify>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            lock_id,
            interval,
            guard,
            wake,
            backoff,
            rate_limited: 0,
        }
    }

    /// Runs one tick.
    pub async fn tick<F, Fut>(&mut self, refresh: &mut F) -> TickOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.guard.is_raised() {
            tracing::debug!(lock_id = %self.lock_id, "Update in progress, skipping poll");
            return TickOutcome::Skipped;
        }

        match refresh().await {
            Ok(()) => {
                self.rate_limited = 0;
                TickOutcome::Refreshed
            }
            Err(e) => TickOutcome::Failed(log_api_failure(&self.lock_id, "poll", &e)),
        }
    }

    /// Returns how long to wait before the next tick.
    pub fn next_delay(&mut self, outcome: TickOutcome) -> Duration {
        if outcome == TickOutcome::Failed(StatusClass::RateLimited) {
            let extra = self.backoff.delay_for_attempt(self.rate_limited);
            self.rate_limited = self.rate_limited.saturating_add(1);
            tracing::debug!(
                lock_id = %self.lock_id,
                backoff_ms = u64::try_from(extra.as_millis()).unwrap_or(u64::MAX),
                "Backing off after rate limit"
            );
            self.interval + extra
        } else {
            self.interval
        }
    }

    /// Runs until the task is aborted.
    pub async fn run<F, Fut>(mut self, mut refresh: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut wait = self.interval;
        loop {
            tokio::select! {
                () = sleep(wait) => {}
                () = self.wake.notified() => {
                    tracing::debug!(lock_id = %self.lock_id, "Out-of-band refresh");
                }
            }
            let outcome = self.tick(&mut refresh).await;
            wait = self.next_delay(outcome);
        }
    }
}
