// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push message routing to per-lock subscribers.
//!
//! The vendor push transport is owned by the embedding application. It
//! hands each message to [`PushHub::route_payload`], and the hub forwards
//! the decoded snapshot to whichever lock subscribed to that id.
//!
//! ```text
//! push message for lock "7EDF..." → {"status":"kAugLockState_Unlocked"}
//!                     ↓
//!           PushHub.route_payload()
//!                     ↓
//!        lookup "7EDF..." in subscribers
//!                     ↓
//!      mpsc::Sender<PushEvent>.try_send()
//!                     ↓
//!          lock accessory push loop
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::{Error, ParseError};
use crate::snapshot::{PushEvent, RawSnapshot, parse_push_payload};
use crate::types::LockId;

use super::PushSource;

/// Buffered push events per subscriber.
const CHANNEL_CAPACITY: usize = 32;

/// Routes push messages to per-lock channels.
///
/// # Examples
///
/// ```
/// use august_homekit::protocol::{PushHub, PushSource};
/// use august_homekit::types::LockId;
///
/// # tokio_test_block_on(async {
/// let hub = PushHub::new();
/// let id = LockId::new("front");
/// let mut rx = hub.subscribe(&id).await.unwrap();
///
/// assert!(hub.route_payload(&id, r#"{"status":"unlocked"}"#, None).unwrap());
/// let event = rx.recv().await.unwrap();
/// assert!(event.snapshot.flags().unwrap().unlocked);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PushHub {
    subscribers: RwLock<HashMap<LockId, mpsc::Sender<PushEvent>>>,
}

impl PushHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a lock's subscription, ending its stream.
    ///
    /// Returns `true` if the lock was subscribed.
    pub fn unsubscribe(&self, lock_id: &LockId) -> bool {
        tracing::debug!(lock_id = %lock_id, "Unsubscribing from push events");
        self.subscribers.write().remove(lock_id).is_some()
    }

    /// Returns the number of subscribed locks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Decodes a raw push message and routes it.
    ///
    /// `timestamp` is the vendor's event time; `None` stamps it on arrival.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the payload is not a valid push message.
    pub fn route_payload(
        &self,
        lock_id: &LockId,
        payload: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<bool, ParseError> {
        let snapshot = parse_push_payload(payload)?;
        Ok(self.route(lock_id, snapshot, timestamp))
    }

    /// Routes a snapshot to the lock's subscriber.
    ///
    /// Returns `true` if the event was queued. Subscribers whose receiver
    /// has gone away are removed; a full channel drops the event.
    pub fn route(
        &self,
        lock_id: &LockId,
        snapshot: RawSnapshot,
        timestamp: Option<DateTime<Utc>>,
    ) -> bool {
        let sender = self.subscribers.read().get(lock_id).cloned();
        let Some(sender) = sender else {
            tracing::debug!(lock_id = %lock_id, "Push event for unsubscribed lock");
            return false;
        };

        let event = match timestamp {
            Some(timestamp) => PushEvent {
                snapshot,
                timestamp,
            },
            None => PushEvent::now(snapshot),
        };

        match sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(lock_id = %lock_id, "Push channel full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(lock_id = %lock_id, "Push subscriber gone, cleaning up");
                let mut subscribers = self.subscribers.write();
                if subscribers.get(lock_id).is_some_and(mpsc::Sender::is_closed) {
                    subscribers.remove(lock_id);
                }
                false
            }
        }
    }
}

impl PushSource for PushHub {
    async fn subscribe(&self, lock_id: &LockId) -> Result<mpsc::Receiver<PushEvent>, Error> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tracing::debug!(lock_id = %lock_id, "Subscribing to push events");
        // A newer subscription replaces the old one
        self.subscribers.write().insert(lock_id.clone(), tx);
        Ok(rx)
    }
}
