//! In-memory device registry.
//!
//! The registry is the source of truth for the running process. Every device is
//! reachable through its MAC (registration dedup) and its key (check-in
//! authentication); both indexes point into the same record list and are only
//! touched while the write lock is held, so a lookup followed by an insert can
//! never interleave with another registration.

mod key;

pub use key::KeyScheme;

use crate::catalog::Outcome;
use crate::models::{Device, DeviceCandidate, InvalidMac, MacAddress};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Keys are re-issued this many times when they collide with an existing one.
const KEY_ATTEMPTS: usize = 4;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("device {0} is missing")]
    MissingInformation(&'static str),
    #[error(transparent)]
    BadDeviceMac(#[from] InvalidMac),
    #[error("{mac} is already registered as '{name}'")]
    AlreadyRegistered { mac: MacAddress, name: String },
    #[error("could not issue a unique key in {0} attempts")]
    KeyExhausted(usize),
}

impl RegisterError {
    /// The catalog outcome reported to the device, `None` for internal failures.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            RegisterError::MissingInformation(_) => Some(Outcome::MissingInformation),
            RegisterError::BadDeviceMac(_) => Some(Outcome::BadDeviceMac),
            RegisterError::AlreadyRegistered { .. } => Some(Outcome::AlreadyRegistered),
            RegisterError::KeyExhausted(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckinError {
    #[error("check-in carries no key")]
    MalformedCheckin,
    #[error("key is not issued to any device")]
    BadKey,
}

impl CheckinError {
    pub fn outcome(&self) -> Outcome {
        match self {
            CheckinError::MalformedCheckin => Outcome::MalformedCheckin,
            CheckinError::BadKey => Outcome::BadKey,
        }
    }
}

#[derive(Debug, Default)]
struct Index {
    devices: Vec<Device>,
    by_mac: HashMap<MacAddress, usize>,
    by_key: HashMap<String, usize>,
}

impl Index {
    fn insert(&mut self, device: Device) -> usize {
        let slot = self.devices.len();
        self.by_mac.insert(device.mac.clone(), slot);
        self.by_key.insert(device.key.clone(), slot);
        self.devices.push(device);
        slot
    }
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    index: RwLock<Index>,
    scheme: KeyScheme,
}

impl DeviceRegistry {
    pub fn new(scheme: KeyScheme) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            scheme,
        }
    }

    // Every critical section restores the index before anything can panic, so a
    // poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new device and returns it with its freshly issued key.
    ///
    /// Input is validated before the lock is taken. The MAC lookup, key issuing
    /// and insert then run as one critical section, so of any number of concurrent
    /// registrations for the same MAC exactly one succeeds.
    pub fn register(&self, candidate: &DeviceCandidate) -> Result<Device, RegisterError> {
        if candidate.name.is_empty() {
            return Err(RegisterError::MissingInformation("name"));
        }
        if candidate.mac.is_empty() {
            return Err(RegisterError::MissingInformation("mac"));
        }
        let mac = MacAddress::parse(&candidate.mac)?;

        let device = {
            let mut index = self.write();
            if let Some(&slot) = index.by_mac.get(&mac) {
                let name = index.devices[slot].name.clone();
                return Err(RegisterError::AlreadyRegistered { mac, name });
            }
            let key = (0..KEY_ATTEMPTS)
                .map(|_| self.scheme.issue(&mac, &candidate.name))
                .find(|key| !index.by_key.contains_key(key))
                .ok_or(RegisterError::KeyExhausted(KEY_ATTEMPTS))?;
            let device = Device {
                name: candidate.name.clone(),
                mac,
                key,
                registered_at: Utc::now(),
                last_checkin: None,
            };
            index.insert(device.clone());
            device
        };
        tracing::info!("Registered new device, {} ({})", device.name, device.mac);
        Ok(device)
    }

    /// Records a check-in for the device holding `key` and returns its new
    /// `last_checkin`.
    ///
    /// The returned timestamp never precedes the device's registration or its
    /// previous check-in, even if the wall clock steps back.
    pub fn check_in(&self, key: &str) -> Result<DateTime<Utc>, CheckinError> {
        if key.is_empty() {
            return Err(CheckinError::MalformedCheckin);
        }
        let (at, name) = {
            let mut index = self.write();
            let slot = *index.by_key.get(key).ok_or(CheckinError::BadKey)?;
            let device = &mut index.devices[slot];
            let floor = device.last_checkin.unwrap_or(device.registered_at);
            let at = Utc::now().max(floor);
            device.last_checkin = Some(at);
            (at, device.name.clone())
        };
        tracing::debug!("Received valid checkin from {name}");
        Ok(at)
    }

    pub fn find_by_mac(&self, mac: &str) -> Option<usize> {
        let mac = MacAddress::parse(mac).ok()?;
        self.read().by_mac.get(&mac).copied()
    }

    #[allow(unused)]
    pub fn find_by_key(&self, key: &str) -> Option<usize> {
        self.read().by_key.get(key).copied()
    }

    pub fn get(&self, slot: usize) -> Option<Device> {
        self.read().devices.get(slot).cloned()
    }

    /// All devices in registration order.
    pub fn snapshot(&self) -> Vec<Device> {
        self.read().devices.clone()
    }

    pub fn len(&self) -> usize {
        self.read().devices.len()
    }

    #[allow(unused)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads previously persisted devices. Rows whose MAC or key is already
    /// known are skipped. Returns how many devices were added.
    pub fn hydrate(&self, devices: impl IntoIterator<Item = Device>) -> usize {
        let mut index = self.write();
        let mut added = 0;
        for device in devices {
            if index.by_mac.contains_key(&device.mac) || index.by_key.contains_key(&device.key) {
                tracing::warn!(
                    "Skipped stored device {} ({}), its MAC or key is already in use",
                    device.name,
                    device.mac
                );
                continue;
            }
            index.insert(device);
            added += 1;
        }
        added
    }
}
