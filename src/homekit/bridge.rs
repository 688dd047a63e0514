// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical state to characteristic translation.

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::LockSettings;
use crate::event::Transition;
use crate::state::{CanonicalLockState, StateChange};
use crate::types::{DoorContact, LockIdentity, LockId, LockPhase, TargetState};

use super::{
    Characteristic, CharacteristicValue, HomeKitHost, Service, contact_sensor_state,
    lock_current_state, lock_target_state, status_low_battery,
};

/// Pushes canonical state to the host, one characteristic at a time.
///
/// The bridge remembers the last value it pushed for every characteristic
/// and only calls the host when a value differs, so repeated identical
/// snapshots cause no host traffic.
#[derive(Debug)]
pub struct CharacteristicBridge {
    lock_id: LockId,
    uuid: Uuid,
    display_name: String,
    show_lock: bool,
    show_contact_sensor: bool,
    last_pushed: HashMap<Characteristic, CharacteristicValue>,
}

impl CharacteristicBridge {
    /// Creates a bridge; visibility is fixed from `settings` here.
    #[must_use]
    pub fn new(identity: &LockIdentity, settings: &LockSettings) -> Self {
        Self {
            lock_id: identity.id.clone(),
            uuid: identity.id.accessory_uuid(),
            display_name: identity.name.clone(),
            show_lock: !settings.hide_lock,
            show_contact_sensor: !settings.hide_contactsensor,
            last_pushed: HashMap::new(),
        }
    }

    /// Returns the accessory UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the services this accessory exposes.
    #[must_use]
    pub fn services(&self) -> Vec<Service> {
        let mut services = vec![Service::AccessoryInformation];
        if self.show_lock {
            services.push(Service::LockMechanism);
        }
        if self.show_contact_sensor {
            services.push(Service::ContactSensor);
        }
        services.push(Service::Battery);
        services
    }

    /// Returns `true` if the service is exposed.
    #[must_use]
    pub fn is_visible(&self, service: Service) -> bool {
        match service {
            Service::LockMechanism => self.show_lock,
            Service::ContactSensor => self.show_contact_sensor,
            Service::AccessoryInformation | Service::Battery => true,
        }
    }

    /// Pushes every visible characteristic that differs from the last
    /// pushed value, and returns the transitions implied by `changes`.
    ///
    /// `realign_target` lets `LockTargetState` follow a stable phase; the
    /// caller clears it while a command cycle owns the target.
    pub fn on_canonical_change(
        &mut self,
        host: &dyn HomeKitHost,
        state: &CanonicalLockState,
        changes: &[StateChange],
        realign_target: bool,
    ) -> Vec<Transition> {
        self.push_state(host, state, realign_target);

        let transitions: Vec<Transition> = changes.iter().filter_map(transition_for).collect();
        for transition in &transitions {
            tracing::info!(lock_id = %self.lock_id, "{} {}", self.display_name, transition);
        }
        transitions
    }

    /// Pushes the full state, for example right after registration.
    pub fn sync(
        &mut self,
        host: &dyn HomeKitHost,
        state: &CanonicalLockState,
        intent: Option<TargetState>,
    ) {
        self.push_state(host, state, intent.is_none());
        if let Some(target) = intent {
            self.push(
                host,
                Characteristic::LockTargetState,
                CharacteristicValue::Int(lock_target_state(target)),
            );
        }
    }

    /// Records a target the host set itself, so it is not echoed back.
    pub fn record_target(&mut self, target: TargetState) {
        self.last_pushed.insert(
            Characteristic::LockTargetState,
            CharacteristicValue::Int(lock_target_state(target)),
        );
    }

    /// Answers a host "get" from canonical state.
    ///
    /// `LockTargetState` reports the last value set or pushed, falling back
    /// to the pending intent and then the stable phase. Returns `None` for
    /// characteristics of hidden services and for a door contact that has
    /// no HomeKit encoding.
    #[must_use]
    pub fn characteristic(
        &self,
        state: &CanonicalLockState,
        intent: Option<TargetState>,
        characteristic: Characteristic,
    ) -> Option<CharacteristicValue> {
        if !self.is_visible(characteristic.service()) {
            return None;
        }
        match characteristic {
            // The displayed target is whatever was last set or pushed
            Characteristic::LockTargetState => self
                .last_pushed
                .get(&characteristic)
                .cloned()
                .or_else(|| {
                    intent
                        .or_else(|| state.lock_phase().as_target())
                        .map(|t| CharacteristicValue::Int(lock_target_state(t)))
                })
                .or(Some(CharacteristicValue::Int(lock_target_state(
                    TargetState::Locked,
                )))),
            _ => state_value(state, characteristic),
        }
    }

    fn push_state(&mut self, host: &dyn HomeKitHost, state: &CanonicalLockState, realign: bool) {
        for characteristic in [
            Characteristic::LockCurrentState,
            Characteristic::ContactSensorState,
            Characteristic::BatteryLevel,
            Characteristic::StatusLowBattery,
            Characteristic::FirmwareRevision,
            Characteristic::HardwareRevision,
        ] {
            if let Some(value) = state_value(state, characteristic) {
                self.push(host, characteristic, value);
            }
        }

        if realign && let Some(target) = state.lock_phase().as_target() {
            self.push(
                host,
                Characteristic::LockTargetState,
                CharacteristicValue::Int(lock_target_state(target)),
            );
        }
    }

    fn push(
        &mut self,
        host: &dyn HomeKitHost,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) {
        if !self.is_visible(characteristic.service())
            || self.last_pushed.get(&characteristic) == Some(&value)
        {
            return;
        }
        tracing::debug!(
            lock_id = %self.lock_id,
            %characteristic,
            ?value,
            "Updating characteristic"
        );
        host.update_characteristic(self.uuid, characteristic, &value);
        self.last_pushed.insert(characteristic, value);
    }
}

fn state_value(
    state: &CanonicalLockState,
    characteristic: Characteristic,
) -> Option<CharacteristicValue> {
    match characteristic {
        Characteristic::LockCurrentState => Some(CharacteristicValue::Int(lock_current_state(
            state.lock_phase(),
        ))),
        Characteristic::LockTargetState => state
            .lock_phase()
            .as_target()
            .map(|t| CharacteristicValue::Int(lock_target_state(t))),
        Characteristic::ContactSensorState => state
            .door_contact()
            .and_then(contact_sensor_state)
            .map(CharacteristicValue::Int),
        Characteristic::BatteryLevel => Some(CharacteristicValue::Int(state.battery().value())),
        Characteristic::StatusLowBattery => Some(CharacteristicValue::Int(status_low_battery(
            state.low_battery(),
        ))),
        Characteristic::FirmwareRevision | Characteristic::HardwareRevision => state
            .firmware_version()
            .map(|v| CharacteristicValue::Text(v.to_string())),
    }
}

fn transition_for(change: &StateChange) -> Option<Transition> {
    match change {
        StateChange::Phase(LockPhase::Locked) => Some(Transition::Locked),
        StateChange::Phase(LockPhase::Unlocked) => Some(Transition::Unlocked),
        StateChange::Door(DoorContact::Open) => Some(Transition::Opened),
        StateChange::Door(DoorContact::Closed) => Some(Transition::Closed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homekit::{AccessoryContext, AccessoryRegistration};
    use crate::types::BatteryLevel;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        updates: Mutex<Vec<(Characteristic, CharacteristicValue)>>,
    }

    impl RecordingHost {
        fn take(&self) -> Vec<(Characteristic, CharacteristicValue)> {
            std::mem::take(&mut *self.updates.lock())
        }
    }

    impl HomeKitHost for RecordingHost {
        fn register_accessory(&self, _: &AccessoryRegistration) {}
        fn remove_accessory(&self, _: Uuid) {}
        fn update_characteristic(&self, _: Uuid, c: Characteristic, v: &CharacteristicValue) {
            self.updates.lock().push((c, v.clone()));
        }
        fn persist_context(&self, _: Uuid, _: &AccessoryContext) {}
        fn cached_context(&self, _: Uuid) -> Option<AccessoryContext> {
            None
        }
        fn cached_accessories(&self) -> Vec<Uuid> {
            Vec::new()
        }
    }

    fn bridge(settings: &LockSettings) -> CharacteristicBridge {
        CharacteristicBridge::new(&LockIdentity::new("front", "Front Door"), settings)
    }

    fn state(phase: LockPhase, door: DoorContact, battery: u8) -> CanonicalLockState {
        CanonicalLockState::seeded(phase, Some(door), BatteryLevel::new(battery).unwrap(), None)
    }

    #[test]
    fn unchanged_values_are_not_pushed_twice() {
        let host = RecordingHost::default();
        let mut bridge = bridge(&LockSettings::default());
        let s = state(LockPhase::Locked, DoorContact::Closed, 82);

        bridge.sync(&host, &s, None);
        let first = host.take();
        assert!(first.contains(&(Characteristic::LockCurrentState, CharacteristicValue::Int(1))));
        assert!(first.contains(&(Characteristic::BatteryLevel, CharacteristicValue::Int(82))));
        assert!(first.contains(&(Characteristic::StatusLowBattery, CharacteristicValue::Int(0))));

        for _ in 0..3 {
            bridge.on_canonical_change(&host, &s, &[], true);
        }
        assert!(host.take().is_empty());
    }

    #[test]
    fn transitions_follow_accepted_changes() {
        let host = RecordingHost::default();
        let mut bridge = bridge(&LockSettings::default());
        let s = state(LockPhase::Unlocked, DoorContact::Open, 50);

        let transitions = bridge.on_canonical_change(
            &host,
            &s,
            &[
                StateChange::Phase(LockPhase::Unlocked),
                StateChange::Door(DoorContact::Open),
                StateChange::Battery(BatteryLevel::new(50).unwrap()),
            ],
            true,
        );
        assert_eq!(transitions, vec![Transition::Unlocked, Transition::Opened]);

        let unknown = bridge.on_canonical_change(
            &host,
            &state(LockPhase::Unknown, DoorContact::Open, 50),
            &[StateChange::Phase(LockPhase::Unknown)],
            true,
        );
        assert!(unknown.is_empty());
    }

    #[test]
    fn hidden_contact_sensor_is_never_pushed() {
        let host = RecordingHost::default();
        let mut bridge = bridge(&LockSettings::default().with_hidden_contact_sensor());
        assert!(!bridge.services().contains(&Service::ContactSensor));

        bridge.sync(&host, &state(LockPhase::Locked, DoorContact::Open, 90), None);
        assert!(
            host.take()
                .iter()
                .all(|(c, _)| *c != Characteristic::ContactSensorState)
        );
        assert_eq!(
            bridge.characteristic(
                &CanonicalLockState::new(),
                None,
                Characteristic::ContactSensorState
            ),
            None
        );
    }

    #[test]
    fn target_is_not_realigned_while_command_in_flight() {
        let host = RecordingHost::default();
        let mut bridge = bridge(&LockSettings::default());
        bridge.sync(&host, &state(LockPhase::Locked, DoorContact::Closed, 90), None);
        host.take();

        bridge.record_target(TargetState::Unlocked);
        bridge.on_canonical_change(&host, &state(LockPhase::Locked, DoorContact::Closed, 90), &[], false);
        assert!(host.take().is_empty());

        bridge.on_canonical_change(&host, &state(LockPhase::Locked, DoorContact::Closed, 90), &[], true);
        assert_eq!(
            host.take(),
            vec![(Characteristic::LockTargetState, CharacteristicValue::Int(1))]
        );
    }

    #[test]
    fn firmware_change_updates_both_revisions() {
        let host = RecordingHost::default();
        let mut bridge = bridge(&LockSettings::default());
        let s = CanonicalLockState::seeded(
            LockPhase::Locked,
            None,
            BatteryLevel::FULL,
            Some("1.2.3".into()),
        );
        bridge.on_canonical_change(&host, &s, &[StateChange::Firmware("1.2.3".into())], true);
        let updates = host.take();
        let text = CharacteristicValue::Text("1.2.3".into());
        assert!(updates.contains(&(Characteristic::FirmwareRevision, text.clone())));
        assert!(updates.contains(&(Characteristic::HardwareRevision, text)));
    }

    #[test]
    fn get_target_without_history() {
        let bridge = bridge(&LockSettings::default());
        let s = CanonicalLockState::new();
        assert_eq!(
            bridge.characteristic(&s, Some(TargetState::Unlocked), Characteristic::LockTargetState),
            Some(CharacteristicValue::Int(0))
        );
        assert_eq!(
            bridge.characteristic(&s, None, Characteristic::LockTargetState),
            Some(CharacteristicValue::Int(1))
        );
        assert_eq!(
            bridge.characteristic(&s, None, Characteristic::LockCurrentState),
            Some(CharacteristicValue::Int(1))
        );
    }

    #[test]
    fn get_target_reports_last_set_value() {
        let mut bridge = bridge(&LockSettings::default());
        bridge.record_target(TargetState::Unlocked);
        assert_eq!(
            bridge.characteristic(
                &CanonicalLockState::new(),
                None,
                Characteristic::LockTargetState
            ),
            Some(CharacteristicValue::Int(0))
        );
    }
}
