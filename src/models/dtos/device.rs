use crate::catalog::ReturnCode;
use crate::models::{Device, DeviceCandidate, MacAddress};
use crate::utils::{option_serialize_rfc3339, serialize_rfc3339};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct RegisterBodyDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
}

impl From<RegisterBodyDto> for DeviceCandidate {
    fn from(value: RegisterBodyDto) -> Self {
        Self {
            name: value.name.unwrap_or_default(),
            mac: value.mac.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CheckinBodyDto {
    pub key: String,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponseDto {
    #[serde(flatten)]
    pub code: ReturnCode,
    pub key: String,
    pub mac: MacAddress,
}

#[derive(Serialize, Debug)]
pub struct CheckinResponseDto {
    #[serde(flatten)]
    pub code: ReturnCode,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub last_checkin: DateTime<Utc>,
}

/// Diagnostic view of a device, without its key.
#[derive(Serialize, Debug)]
pub struct DeviceSummaryDto {
    pub name: String,
    pub mac: MacAddress,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub registered_at: DateTime<Utc>,
    #[serde(
        serialize_with = "option_serialize_rfc3339",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_checkin: Option<DateTime<Utc>>,
}

impl From<Device> for DeviceSummaryDto {
    fn from(value: Device) -> Self {
        Self {
            name: value.name,
            mac: value.mac,
            registered_at: value.registered_at,
            last_checkin: value.last_checkin,
        }
    }
}
