// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HomeKit accessory surface.
//!
//! The host framework (the HomeKit accessory server) is abstracted by the
//! [`HomeKitHost`] trait. Each lock is exposed as one accessory with up to
//! four services; the [`CharacteristicBridge`] translates canonical lock
//! state into characteristic values and pushes only the ones that changed.

mod bridge;
mod context;
mod values;

use std::fmt;

use uuid::Uuid;

use crate::types::LockIdentity;

pub use bridge::CharacteristicBridge;
pub use context::AccessoryContext;
pub use values::{
    contact_sensor_state, lock_current_state, lock_target_state, status_low_battery,
    target_from_value,
};

/// A HomeKit service exposed by a lock accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Manufacturer, model, serial and firmware.
    AccessoryInformation,
    /// Bolt state and target.
    LockMechanism,
    /// Door sensor.
    ContactSensor,
    /// Battery level and low-battery flag.
    Battery,
}

/// A HomeKit characteristic maintained by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// 0 Unsecured, 1 Secured, 2 Jammed, 3 Unknown.
    LockCurrentState,
    /// 0 Unsecured, 1 Secured.
    LockTargetState,
    /// 0 contact detected (closed), 1 not detected (open).
    ContactSensorState,
    /// Percent, 0 to 100.
    BatteryLevel,
    /// 0 normal, 1 low.
    StatusLowBattery,
    /// Firmware version string.
    FirmwareRevision,
    /// Hardware revision string.
    HardwareRevision,
}

impl Characteristic {
    /// Returns the service that carries this characteristic.
    #[must_use]
    pub const fn service(self) -> Service {
        match self {
            Self::LockCurrentState | Self::LockTargetState => Service::LockMechanism,
            Self::ContactSensorState => Service::ContactSensor,
            Self::BatteryLevel | Self::StatusLowBattery => Service::Battery,
            Self::FirmwareRevision | Self::HardwareRevision => Service::AccessoryInformation,
        }
    }

    /// Returns the HomeKit name of the characteristic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LockCurrentState => "LockCurrentState",
            Self::LockTargetState => "LockTargetState",
            Self::ContactSensorState => "ContactSensorState",
            Self::BatteryLevel => "BatteryLevel",
            Self::StatusLowBattery => "StatusLowBattery",
            Self::FirmwareRevision => "FirmwareRevision",
            Self::HardwareRevision => "HardwareRevision",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A characteristic value as exchanged with the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacteristicValue {
    /// Enumerated or percentage value.
    Int(u8),
    /// Free-form text.
    Text(String),
}

impl CharacteristicValue {
    /// Returns the numeric value, if any.
    #[must_use]
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Returns the text value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

/// What a host needs to publish a new accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryRegistration {
    /// Stable accessory UUID derived from the lock id.
    pub uuid: Uuid,
    /// Descriptive information for the AccessoryInformation service.
    pub identity: LockIdentity,
    /// Visible services.
    pub services: Vec<Service>,
}

/// The HomeKit accessory server the platform publishes into.
///
/// Implementations are expected to be cheap and non-blocking; the runtime
/// calls them while holding a lock's state mutex.
pub trait HomeKitHost: Send + Sync {
    /// Publishes an accessory, or refreshes an already cached one.
    fn register_accessory(&self, registration: &AccessoryRegistration);

    /// Removes an accessory from the host.
    fn remove_accessory(&self, uuid: Uuid);

    /// Pushes a new value for one characteristic.
    fn update_characteristic(
        &self,
        uuid: Uuid,
        characteristic: Characteristic,
        value: &CharacteristicValue,
    );

    /// Stores the accessory context so it survives restarts.
    fn persist_context(&self, uuid: Uuid, context: &AccessoryContext);

    /// Returns the context stored for an accessory, if any.
    fn cached_context(&self, uuid: Uuid) -> Option<AccessoryContext>;

    /// Returns the UUIDs of every accessory restored from the host cache.
    fn cached_accessories(&self) -> Vec<Uuid>;
}
