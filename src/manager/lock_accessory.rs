// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runtime of a single lock accessory.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

use crate::command::{CommandSender, Debouncer, UpdateGuard, command_channel};
use crate::config::LockSettings;
use crate::engine::{ReconciliationEngine, SnapshotSource};
use crate::error::{Result, ValueError};
use crate::event::{EventBus, LockEvent};
use crate::homekit::{
    AccessoryContext, AccessoryRegistration, Characteristic, CharacteristicBridge,
    CharacteristicValue, HomeKitHost, target_from_value,
};
use crate::protocol::{LockApi, PushSource, log_api_failure};
use crate::scheduler::PollScheduler;
use crate::snapshot::{PushEvent, RawSnapshot, parse};
use crate::state::CanonicalLockState;
use crate::types::{LockId, LockIdentity, TargetState};

/// Everything that mutates together under the per-lock mutex.
#[derive(Debug)]
struct LockCore {
    engine: ReconciliationEngine,
    bridge: CharacteristicBridge,
    context: AccessoryContext,
}

/// State shared between the accessory handle and its tasks.
struct Shared<A> {
    identity: LockIdentity,
    uuid: Uuid,
    settings: LockSettings,
    api: Arc<A>,
    host: Arc<dyn HomeKitHost>,
    events: EventBus,
    /// Never held across an await.
    core: Mutex<LockCore>,
    guard: Arc<UpdateGuard>,
    wake: Arc<Notify>,
    state_tx: watch::Sender<CanonicalLockState>,
}

/// One lock exposed as a HomeKit accessory.
///
/// Creating the accessory registers it with the host and seeds its state
/// from the persisted context. [`start`](Self::start) spawns its three
/// tasks: the poll loop, the push loop and the command loop. Dropping the
/// accessory aborts them, which also closes the push subscription.
pub struct LockAccessory<A: LockApi> {
    shared: Arc<Shared<A>>,
    commands: CommandSender,
    debouncer: Option<Debouncer>,
    tasks: Vec<JoinHandle<()>>,
}

impl<A: LockApi> std::fmt::Debug for LockAccessory<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockAccessory")
            .field("lock_id", &self.shared.identity.id)
            .field("uuid", &self.shared.uuid)
            .field("running", &!self.tasks.is_empty())
            .finish_non_exhaustive()
    }
}

impl<A: LockApi> LockAccessory<A> {
    /// Creates the accessory and registers it with the host.
    ///
    /// A context cached by the host seeds the initial state; otherwise the
    /// state starts from safe defaults. Either way every visible
    /// characteristic is pushed once.
    #[must_use]
    pub fn new(
        identity: LockIdentity,
        settings: LockSettings,
        api: Arc<A>,
        host: Arc<dyn HomeKitHost>,
        events: EventBus,
    ) -> Self {
        let uuid = identity.id.accessory_uuid();

        let context = match host.cached_context(uuid) {
            Some(mut cached) => {
                tracing::debug!(lock_id = %identity.id, "Restoring accessory from cache");
                cached.refresh_identity(&identity);
                cached
            }
            None => AccessoryContext::from_identity(&identity),
        };

        let state = context.seed_state(!settings.hide_contactsensor);
        let engine = ReconciliationEngine::new(
            identity.id.clone(),
            state.clone(),
            settings.polling_enabled(),
        );
        let mut bridge = CharacteristicBridge::new(&identity, &settings);

        host.register_accessory(&AccessoryRegistration {
            uuid,
            identity: identity.clone(),
            services: bridge.services(),
        });
        bridge.sync(host.as_ref(), &state, None);
        host.persist_context(uuid, &context);

        let guard = Arc::new(UpdateGuard::new());
        let (commands, debouncer) = command_channel(Arc::clone(&guard), settings.push_rate);
        let (state_tx, _) = watch::channel(state);

        Self {
            shared: Arc::new(Shared {
                identity,
                uuid,
                settings,
                api,
                host,
                events,
                core: Mutex::new(LockCore {
                    engine,
                    bridge,
                    context,
                }),
                guard,
                wake: Arc::new(Notify::new()),
                state_tx,
            }),
            commands,
            debouncer: Some(debouncer),
            tasks: Vec::new(),
        }
    }

    /// Spawns the accessory's tasks. Calling it again has no effect.
    ///
    /// The poll loop only runs when polling is enabled. The push loop
    /// subscribes once; a failed subscription is logged and not retried.
    pub fn start<P: PushSource>(&mut self, push: Option<Arc<P>>) {
        let Some(debouncer) = self.debouncer.take() else {
            return;
        };

        let shared = Arc::clone(&self.shared);
        self.tasks
            .push(tokio::spawn(async move { shared.command_loop(debouncer).await }));

        if let Some(interval) = self.shared.settings.refresh_rate {
            let scheduler = PollScheduler::new(
                self.shared.identity.id.clone(),
                interval,
                Arc::clone(&self.shared.guard),
                Arc::clone(&self.shared.wake),
                self.shared.settings.backoff.clone(),
            );
            let shared = Arc::clone(&self.shared);
            self.tasks.push(tokio::spawn(scheduler.run(move || {
                let shared = Arc::clone(&shared);
                async move { shared.refresh().await }
            })));
        }

        if let Some(push) = push {
            let shared = Arc::clone(&self.shared);
            self.tasks.push(tokio::spawn(async move {
                match push.subscribe(&shared.identity.id).await {
                    Ok(rx) => shared.push_loop(rx).await,
                    Err(e) => tracing::error!(
                        lock_id = %shared.identity.id,
                        error = %e,
                        "Push subscription failed"
                    ),
                }
            }));
        }

        tracing::debug!(
            lock_id = %self.shared.identity.id,
            tasks = self.tasks.len(),
            "Accessory started"
        );
    }

    /// Aborts the accessory's tasks.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the lock id.
    #[must_use]
    pub fn lock_id(&self) -> &LockId {
        &self.shared.identity.id
    }

    /// Returns the identity captured at discovery.
    #[must_use]
    pub fn identity(&self) -> &LockIdentity {
        &self.shared.identity
    }

    /// Returns the accessory UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.shared.uuid
    }

    /// Returns the effective settings.
    #[must_use]
    pub fn settings(&self) -> &LockSettings {
        &self.shared.settings
    }

    /// Returns a copy of the canonical state.
    #[must_use]
    pub fn state(&self) -> CanonicalLockState {
        self.shared.core.lock().engine.state().clone()
    }

    /// Returns the pending intent.
    #[must_use]
    pub fn intent(&self) -> Option<TargetState> {
        self.shared.core.lock().engine.intent()
    }

    /// Returns `true` while a command cycle is queued or running.
    #[must_use]
    pub fn is_update_in_progress(&self) -> bool {
        self.shared.guard.is_raised()
    }

    /// Returns a watch receiver that observes canonical state.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<CanonicalLockState> {
        self.shared.state_tx.subscribe()
    }

    // =========================================================================
    // Host entry points
    // =========================================================================

    /// Handles a host "set" of `LockTargetState`.
    ///
    /// Records the intent and queues the command; never blocks.
    pub fn set_target_state(&self, target: TargetState) {
        self.shared.record_intent(target);
        if !self.commands.enqueue(target) {
            tracing::warn!(
                lock_id = %self.shared.identity.id,
                %target,
                "Command loop not running, command dropped"
            );
        }
    }

    /// Handles a raw host "set".
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the characteristic is read-only or the
    /// value is not a valid target.
    pub fn set_characteristic(
        &self,
        characteristic: Characteristic,
        value: &CharacteristicValue,
    ) -> Result<()> {
        if characteristic != Characteristic::LockTargetState {
            return Err(ValueError::ReadOnlyCharacteristic(characteristic.as_str()).into());
        }
        let raw = value
            .as_u8()
            .ok_or_else(|| ValueError::InvalidTargetState(format!("{value:?}")))?;
        self.set_target_state(target_from_value(raw)?);
        Ok(())
    }

    /// Handles a host "get".
    #[must_use]
    pub fn characteristic(&self, characteristic: Characteristic) -> Option<CharacteristicValue> {
        let core = self.shared.core.lock();
        core.bridge
            .characteristic(core.engine.state(), core.engine.intent(), characteristic)
    }

    // =========================================================================
    // Vendor entry points
    // =========================================================================

    /// Polls the vendor and reconciles the result.
    ///
    /// # Errors
    ///
    /// Returns the vendor error; canonical state is left untouched.
    pub async fn refresh(&self) -> Result<()> {
        self.shared.refresh().await
    }

    /// Reconciles a snapshot obtained outside the accessory's own tasks.
    pub fn apply_snapshot(&self, raw: &RawSnapshot, source: SnapshotSource) {
        self.shared.apply(raw, source);
    }

    /// Reconciles a push event.
    pub fn handle_push(&self, event: &PushEvent) {
        self.shared.apply(&event.snapshot, SnapshotSource::Push);
    }
}

impl<A: LockApi> Drop for LockAccessory<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<A: LockApi> Shared<A> {
    fn record_intent(&self, target: TargetState) {
        let mut core = self.core.lock();
        core.engine.record_intent(target);
        core.bridge.record_target(target);
    }

    async fn refresh(&self) -> Result<()> {
        let details = self.api.details(&self.identity.id).await?;
        self.apply(&details.into_snapshot(), SnapshotSource::Poll);
        Ok(())
    }

    fn apply(&self, raw: &RawSnapshot, source: SnapshotSource) {
        let realign_target = !self.guard.is_raised();

        let (reconciled, transitions, confirmed, state) = {
            let mut core = self.core.lock();
            let LockCore {
                engine,
                bridge,
                context,
            } = &mut *core;

            let outcome = parse(raw, engine.retry_count());
            let reconciled = engine.apply_snapshot(&outcome, source);
            let transitions = bridge.on_canonical_change(
                self.host.as_ref(),
                engine.state(),
                &reconciled.changes,
                realign_target,
            );
            if context.record(engine.state()) {
                self.host.persist_context(self.uuid, context);
            }
            let confirmed = engine.reconcile_intent();
            let state = (!reconciled.is_noop()).then(|| engine.state().clone());
            (reconciled, transitions, confirmed, state)
        };

        let lock_id = &self.identity.id;

        if let Some(state) = state {
            self.state_tx.send_replace(state);
        }

        for change in reconciled.changes {
            self.events.publish(LockEvent::StateChanged {
                lock_id: lock_id.clone(),
                change,
                source,
            });
        }

        for transition in transitions {
            self.events.publish(LockEvent::Transition {
                lock_id: lock_id.clone(),
                transition,
            });
        }

        if let Some(version) = reconciled.firmware_changed {
            tracing::info!(lock_id = %lock_id, version = %version, "Firmware version changed");
            self.events.publish(LockEvent::FirmwareChanged {
                lock_id: lock_id.clone(),
                version,
            });
        }

        if let Some(target) = confirmed {
            self.events.publish(LockEvent::IntentConfirmed {
                lock_id: lock_id.clone(),
                target,
            });
        }

        if reconciled.refresh_requested {
            tracing::debug!(lock_id = %lock_id, "Lock state unknown, requesting refresh");
            self.wake.notify_one();
        }
    }

    async fn execute(&self, target: TargetState) {
        let lock_id = &self.identity.id;
        tracing::debug!(lock_id = %lock_id, %target, "Sending command");

        match self.api.send(lock_id, target).await {
            Ok(ack) => {
                tracing::debug!(
                    lock_id = %lock_id,
                    %target,
                    status = ack.status,
                    class = %ack.class(),
                    "Command accepted"
                );
            }
            Err(e) => {
                // Intent stays pending; the next reconciliation reflects the
                // real device state
                let class = log_api_failure(lock_id, target.as_str(), &e);
                self.events.publish(LockEvent::CommandFailed {
                    lock_id: lock_id.clone(),
                    target,
                    class,
                    message: e.to_string(),
                });
            }
        }
    }

    async fn command_loop(self: Arc<Self>, mut debouncer: Debouncer) {
        while let Some(target) = debouncer.next().await {
            self.execute(target).await;

            sleep(self.settings.confirm_delay()).await;
            if let Err(e) = self.refresh().await {
                log_api_failure(&self.identity.id, "confirm", &e);
            }

            debouncer.finish_cycle();
        }
    }

    async fn push_loop(self: Arc<Self>, mut rx: mpsc::Receiver<PushEvent>) {
        while let Some(event) = rx.recv().await {
            tracing::debug!(
                lock_id = %self.identity.id,
                timestamp = %event.timestamp,
                "Push event received"
            );
            self.apply(&event.snapshot, SnapshotSource::Push);
        }
        tracing::debug!(lock_id = %self.identity.id, "Push stream ended");
    }
}
