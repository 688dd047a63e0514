// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock identifier and identity types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for accessory UUIDs derived from vendor lock ids.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_52c4_9d0e_4b7a_8c3e_2f51_a9d4_7e10);

/// Vendor identifier of a lock.
///
/// The accessory UUID handed to the host is derived from this id with UUID
/// v5, so the same lock maps to the same accessory across restarts.
///
/// # Examples
///
/// ```
/// use august_homekit::types::LockId;
///
/// let id = LockId::new("7EDFA965E0AE0CE19772AFA435364295");
/// assert_eq!(id.accessory_uuid(), LockId::new("7EDFA965E0AE0CE19772AFA435364295").accessory_uuid());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockId(String);

impl LockId {
    /// Creates a lock id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the stable accessory UUID for this lock.
    #[must_use]
    pub fn accessory_uuid(&self) -> Uuid {
        Uuid::new_v5(&ACCESSORY_NAMESPACE, self.0.as_bytes())
    }
}

impl fmt::Debug for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LockId({})", self.0)
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Descriptive information about a lock, captured at discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockIdentity {
    /// Vendor lock id.
    pub id: LockId,
    /// Display name chosen in the vendor app.
    pub name: String,
    /// Hardware serial number.
    pub serial_number: String,
    /// Firmware version at discovery time.
    pub firmware_version: String,
    /// Name of the house the lock belongs to.
    pub house_name: Option<String>,
}

impl LockIdentity {
    /// Creates an identity with only an id and a name.
    #[must_use]
    pub fn new(id: impl Into<LockId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            serial_number: String::new(),
            firmware_version: String::new(),
            house_name: None,
        }
    }

    /// Sets the serial number.
    #[must_use]
    pub fn with_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = serial.into();
        self
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = version.into();
        self
    }

    /// Sets the house name.
    #[must_use]
    pub fn with_house_name(mut self, house: impl Into<String>) -> Self {
        self.house_name = Some(house.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessory_uuid_is_stable_and_distinct() {
        let a = LockId::new("lock-a");
        let b = LockId::new("lock-b");
        assert_eq!(a.accessory_uuid(), LockId::new("lock-a").accessory_uuid());
        assert_ne!(a.accessory_uuid(), b.accessory_uuid());
        assert_eq!(a.accessory_uuid().get_version_num(), 5);
    }

    #[test]
    fn debug_and_display() {
        let id = LockId::new("ABC");
        assert_eq!(format!("{id:?}"), "LockId(ABC)");
        assert_eq!(id.to_string(), "ABC");
    }

    #[test]
    fn identity_builder() {
        let identity = LockIdentity::new("ABC", "Front Door")
            .with_serial_number("L1FDH01234")
            .with_firmware_version("1.59.0")
            .with_house_name("Home");
        assert_eq!(identity.id.as_str(), "ABC");
        assert_eq!(identity.serial_number, "L1FDH01234");
        assert_eq!(identity.house_name.as_deref(), Some("Home"));
    }
}
