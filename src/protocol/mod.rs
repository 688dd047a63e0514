// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor protocol abstractions.
//!
//! The runtime talks to the vendor through two traits:
//!
//! - [`LockApi`]: request/response calls (list, details, lock, unlock)
//! - [`PushSource`]: a per-lock stream of push events
//!
//! [`HttpLockApi`] implements [`LockApi`] against the REST API and
//! [`PushHub`] implements [`PushSource`] by fanning externally received
//! push messages out to per-lock channels.

#[cfg(feature = "http")]
mod http;
mod push_hub;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpLockApi};
pub use push_hub::PushHub;

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::{Error, RATE_LIMIT_GUIDANCE, StatusClass};
use crate::snapshot::{LockDetails, PushEvent};
use crate::types::{LockId, TargetState};

/// Acknowledgement of an accepted lock or unlock command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAck {
    /// HTTP status of the response.
    pub status: u16,
    /// The raw response body.
    pub body: String,
}

impl CommandAck {
    /// Creates an acknowledgement.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the classification of the status.
    #[must_use]
    pub fn class(&self) -> StatusClass {
        StatusClass::from_status(self.status)
    }
}

/// An entry of the account's lock list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSummary {
    /// Vendor lock id.
    pub lock_id: LockId,
    /// Display name.
    pub name: String,
    /// House the lock belongs to.
    pub house_name: Option<String>,
}

/// Request/response access to the vendor API.
pub trait LockApi: Send + Sync + 'static {
    /// Lists the locks of the account.
    fn locks(&self) -> impl Future<Output = Result<Vec<LockSummary>, Error>> + Send;

    /// Fetches details and current status of a lock.
    fn details(&self, lock_id: &LockId)
    -> impl Future<Output = Result<LockDetails, Error>> + Send;

    /// Asks the lock to lock.
    fn lock(&self, lock_id: &LockId) -> impl Future<Output = Result<CommandAck, Error>> + Send;

    /// Asks the lock to unlock.
    fn unlock(&self, lock_id: &LockId)
    -> impl Future<Output = Result<CommandAck, Error>> + Send;

    /// Sends the command that moves the bolt to `target`.
    fn send(
        &self,
        lock_id: &LockId,
        target: TargetState,
    ) -> impl Future<Output = Result<CommandAck, Error>> + Send {
        async move {
            match target {
                TargetState::Locked => self.lock(lock_id).await,
                TargetState::Unlocked => self.unlock(lock_id).await,
            }
        }
    }
}

/// A source of push events for individual locks.
pub trait PushSource: Send + Sync + 'static {
    /// Opens the push stream for a lock.
    ///
    /// The stream ends when the source drops its sender.
    fn subscribe(
        &self,
        lock_id: &LockId,
    ) -> impl Future<Output = Result<mpsc::Receiver<PushEvent>, Error>> + Send;
}

/// Logs a failed vendor call according to its classification.
///
/// Returns the classification so callers can react to rate limiting.
pub(crate) fn log_api_failure(lock_id: &LockId, operation: &str, error: &Error) -> StatusClass {
    let class = error.status_class();
    match class {
        StatusClass::RateLimited => tracing::error!(
            lock_id = %lock_id,
            operation,
            error = %error,
            "{RATE_LIMIT_GUIDANCE}"
        ),
        StatusClass::ClientError => tracing::error!(
            lock_id = %lock_id,
            operation,
            error = %error,
            "Vendor rejected request"
        ),
        StatusClass::Accepted | StatusClass::Unclassified => tracing::error!(
            lock_id = %lock_id,
            operation,
            error = %error,
            "Vendor request failed"
        ),
    }
    class
}
