// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform coordinating every lock of an account.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, watch};

use crate::config::PlatformConfig;
use crate::error::{Error, Result};
use crate::event::{EventBus, LockEvent};
use crate::homekit::{Characteristic, CharacteristicValue, HomeKitHost};
use crate::protocol::{LockApi, LockSummary, PushSource, log_api_failure};
use crate::snapshot::LockDetails;
use crate::state::CanonicalLockState;
use crate::types::{LockId, LockIdentity, TargetState};

use super::LockAccessory;

/// Discovers locks and owns one [`LockAccessory`] per bridged lock.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use august_homekit::config::PlatformConfig;
/// use august_homekit::homekit::HomeKitHost;
/// use august_homekit::manager::LockPlatform;
/// use august_homekit::protocol::{HttpLockApi, PushHub};
///
/// # async fn example(host: Arc<dyn HomeKitHost>) -> august_homekit::Result<()> {
/// let config = PlatformConfig::from_json(r#"{
///     "credentials": { "apiKey": "key", "accessToken": "token" }
/// }"#)?;
///
/// let platform = LockPlatform::<HttpLockApi, PushHub>::from_config(config, host)?
///     .with_push(Arc::new(PushHub::new()));
/// let bridged = platform.discover().await?;
/// println!("bridging {} locks", bridged.len());
/// # Ok(())
/// # }
/// ```
pub struct LockPlatform<A: LockApi, P: PushSource> {
    config: PlatformConfig,
    api: Arc<A>,
    push: Option<Arc<P>>,
    host: Arc<dyn HomeKitHost>,
    accessories: RwLock<HashMap<LockId, LockAccessory<A>>>,
    event_bus: EventBus,
}

impl<A: LockApi, P: PushSource> std::fmt::Debug for LockPlatform<A, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockPlatform")
            .field("config", &self.config)
            .field("push", &self.push.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "http")]
impl<P: PushSource> LockPlatform<crate::protocol::HttpLockApi, P> {
    /// Creates a platform talking to the vendor REST API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when credentials are missing and
    /// [`Error::Api`] when the HTTP client cannot be built.
    pub fn from_config(config: PlatformConfig, host: Arc<dyn HomeKitHost>) -> Result<Self> {
        let api = crate::protocol::HttpConfig::from_credentials(config.require_credentials()?)
            .into_client()?;
        Ok(Self::new(config, Arc::new(api), host))
    }
}

impl<A: LockApi, P: PushSource> LockPlatform<A, P> {
    /// Creates a platform with no locks yet.
    #[must_use]
    pub fn new(config: PlatformConfig, api: Arc<A>, host: Arc<dyn HomeKitHost>) -> Self {
        Self {
            config,
            api,
            push: None,
            host,
            accessories: RwLock::new(HashMap::new()),
            event_bus: EventBus::new(),
        }
    }

    /// Feeds push events from `push` to every accessory started afterwards.
    #[must_use]
    pub fn with_push(mut self, push: Arc<P>) -> Self {
        self.push = Some(push);
        self
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to platform events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LockEvent> {
        self.event_bus.subscribe()
    }

    /// Returns a watch receiver for a lock's canonical state.
    pub async fn watch_lock(&self, lock_id: &LockId) -> Option<watch::Receiver<CanonicalLockState>> {
        self.accessories
            .read()
            .await
            .get(lock_id)
            .map(LockAccessory::watch_state)
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Lists the account's locks and reconciles the accessory set with it.
    ///
    /// Locks configured with `hide_device`, and locks natively paired with
    /// HomeKit unless `overrideHomeKitEnabled` is set, are skipped. Cached
    /// accessories that no longer match a bridged lock are removed from the
    /// host. A lock whose details cannot be fetched is skipped this round
    /// but keeps its cached accessory.
    ///
    /// Returns the ids of the locks now bridged.
    ///
    /// # Errors
    ///
    /// Returns the vendor error if the lock list cannot be fetched.
    pub async fn discover(&self) -> Result<Vec<LockId>> {
        let summaries = self.api.locks().await?;
        tracing::debug!(count = summaries.len(), "Discovered locks");

        let mut keep = HashSet::new();
        let mut bridged = Vec::new();

        for summary in summaries {
            let lock_id = summary.lock_id.clone();

            if self.config.is_hidden(&lock_id) {
                tracing::info!(lock_id = %lock_id, name = %summary.name, "Hidden by configuration");
                continue;
            }

            let details = match self.api.details(&lock_id).await {
                Ok(details) => details,
                Err(e) => {
                    log_api_failure(&lock_id, "discover", &e);
                    keep.insert(lock_id.accessory_uuid());
                    continue;
                }
            };

            let settings = self.config.settings_for(&lock_id);
            if details.homekit_enabled && !settings.override_homekit_enabled {
                tracing::info!(
                    lock_id = %lock_id,
                    name = %summary.name,
                    "Lock is natively paired with HomeKit, skipping; set overrideHomeKitEnabled to bridge it anyway"
                );
                continue;
            }

            keep.insert(lock_id.accessory_uuid());
            bridged.push(lock_id.clone());

            if self.accessories.read().await.contains_key(&lock_id) {
                tracing::debug!(lock_id = %lock_id, "Lock already bridged");
                continue;
            }

            let identity = identity_from(&summary, &details);
            tracing::info!(lock_id = %lock_id, name = %identity.name, "Adding accessory");

            let mut accessory = LockAccessory::new(
                identity,
                settings,
                Arc::clone(&self.api),
                Arc::clone(&self.host),
                self.event_bus.clone(),
            );
            accessory.start(self.push.clone());
            accessory.apply_snapshot(
                &details.into_snapshot(),
                crate::engine::SnapshotSource::Poll,
            );

            self.accessories.write().await.insert(lock_id.clone(), accessory);
            self.event_bus.publish(LockEvent::accessory_added(lock_id));
        }

        self.remove_stale(&keep).await;
        Ok(bridged)
    }

    async fn remove_stale(&self, keep: &HashSet<uuid::Uuid>) {
        let stale: Vec<(LockId, uuid::Uuid)> = self
            .accessories
            .read()
            .await
            .values()
            .filter(|a| !keep.contains(&a.uuid()))
            .map(|a| (a.lock_id().clone(), a.uuid()))
            .collect();

        let mut removed = HashSet::new();
        for (lock_id, uuid) in stale {
            if self.remove_lock(&lock_id).await {
                removed.insert(uuid);
            }
        }

        for uuid in self.host.cached_accessories() {
            if !keep.contains(&uuid) && !removed.contains(&uuid) {
                tracing::info!(%uuid, "Removing stale cached accessory");
                self.host.remove_accessory(uuid);
            }
        }
    }

    /// Stops a lock's tasks and removes its accessory from the host.
    ///
    /// Returns `true` if the lock was bridged.
    pub async fn remove_lock(&self, lock_id: &LockId) -> bool {
        let removed = self.accessories.write().await.remove(lock_id);
        match removed {
            Some(mut accessory) => {
                accessory.shutdown();
                self.host.remove_accessory(accessory.uuid());
                tracing::info!(lock_id = %lock_id, "Removed accessory");
                self.event_bus
                    .publish(LockEvent::accessory_removed(lock_id.clone()));
                true
            }
            None => false,
        }
    }

    /// Stops every accessory's tasks, leaving the host cache intact.
    pub async fn shutdown(&self) {
        for accessory in self.accessories.write().await.values_mut() {
            accessory.shutdown();
        }
    }

    // =========================================================================
    // Queries and commands
    // =========================================================================

    /// Returns the ids of the bridged locks.
    pub async fn lock_ids(&self) -> Vec<LockId> {
        self.accessories.read().await.keys().cloned().collect()
    }

    /// Returns the number of bridged locks.
    pub async fn lock_count(&self) -> usize {
        self.accessories.read().await.len()
    }

    /// Returns a lock's canonical state.
    pub async fn state(&self, lock_id: &LockId) -> Option<CanonicalLockState> {
        self.accessories
            .read()
            .await
            .get(lock_id)
            .map(LockAccessory::state)
    }

    /// Returns a lock's pending intent.
    pub async fn intent(&self, lock_id: &LockId) -> Option<TargetState> {
        self.accessories
            .read()
            .await
            .get(lock_id)
            .and_then(LockAccessory::intent)
    }

    /// Requests a new target for a lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockNotFound`] if the lock is not bridged.
    pub async fn set_target_state(&self, lock_id: &LockId, target: TargetState) -> Result<()> {
        let accessories = self.accessories.read().await;
        let accessory = accessories
            .get(lock_id)
            .ok_or_else(|| Error::LockNotFound(lock_id.to_string()))?;
        accessory.set_target_state(target);
        Ok(())
    }

    /// Forwards a host "set".
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockNotFound`] if the lock is not bridged, or the
    /// accessory's validation error.
    pub async fn set_characteristic(
        &self,
        lock_id: &LockId,
        characteristic: Characteristic,
        value: &CharacteristicValue,
    ) -> Result<()> {
        let accessories = self.accessories.read().await;
        accessories
            .get(lock_id)
            .ok_or_else(|| Error::LockNotFound(lock_id.to_string()))?
            .set_characteristic(characteristic, value)
    }

    /// Answers a host "get".
    pub async fn characteristic(
        &self,
        lock_id: &LockId,
        characteristic: Characteristic,
    ) -> Option<CharacteristicValue> {
        self.accessories
            .read()
            .await
            .get(lock_id)
            .and_then(|a| a.characteristic(characteristic))
    }

    /// Polls one lock immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockNotFound`] if the lock is not bridged, or the
    /// vendor error.
    pub async fn refresh(&self, lock_id: &LockId) -> Result<()> {
        let accessories = self.accessories.read().await;
        let accessory = accessories
            .get(lock_id)
            .ok_or_else(|| Error::LockNotFound(lock_id.to_string()))?;
        accessory.refresh().await
    }
}

fn identity_from(summary: &LockSummary, details: &LockDetails) -> LockIdentity {
    let name = details
        .lock_name
        .clone()
        .unwrap_or_else(|| summary.name.clone());
    let mut identity = LockIdentity::new(summary.lock_id.clone(), name);
    if let Some(serial) = &details.serial_number {
        identity = identity.with_serial_number(serial);
    }
    if let Some(version) = &details.current_firmware_version {
        identity = identity.with_firmware_version(version);
    }
    if let Some(house) = details.house_name.as_ref().or(summary.house_name.as_ref()) {
        identity = identity.with_house_name(house);
    }
    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prefers_details() {
        let summary = LockSummary {
            lock_id: LockId::new("a"),
            name: "From list".into(),
            house_name: Some("Home".into()),
        };
        let details = LockDetails {
            lock_name: Some("Front Door".into()),
            serial_number: Some("SN1".into()),
            current_firmware_version: Some("1.2".into()),
            ..LockDetails::default()
        };

        let identity = identity_from(&summary, &details);
        assert_eq!(identity.name, "Front Door");
        assert_eq!(identity.serial_number, "SN1");
        assert_eq!(identity.firmware_version, "1.2");
        assert_eq!(identity.house_name.as_deref(), Some("Home"));
    }

    #[test]
    fn identity_falls_back_to_summary() {
        let summary = LockSummary {
            lock_id: LockId::new("a"),
            name: "From list".into(),
            house_name: None,
        };
        let identity = identity_from(&summary, &LockDetails::default());
        assert_eq!(identity.name, "From list");
        assert!(identity.serial_number.is_empty());
    }
}
