use crate::models::MacAddress;
use crate::utils::{option_serialize_rfc3339, serialize_rfc3339};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered fleet member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub name: String,
    pub mac: MacAddress,
    /// Credential presented on every check-in, issued once at registration.
    pub key: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub registered_at: DateTime<Utc>,
    #[serde(
        serialize_with = "option_serialize_rfc3339",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_checkin: Option<DateTime<Utc>>,
}

/// Unvalidated registration input as reported by a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceCandidate {
    pub name: String,
    pub mac: String,
}

impl DeviceCandidate {
    #[allow(unused)]
    pub fn new(name: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mac: mac.into(),
        }
    }
}
