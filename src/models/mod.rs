pub mod device;
pub mod dtos;
pub mod mac;

pub use device::{Device, DeviceCandidate};
pub use mac::{InvalidMac, MacAddress};
