use crate::models::MacAddress;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt::Write;

const KEY_BYTES: usize = 32;

/// How device keys are minted at registration.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// Random token, unrelated to anything the device reports.
    #[default]
    Random,
    /// `sha256(mac + name)` as issued by older deployments. Anyone who knows a
    /// device's MAC and name can compute its key.
    Legacy,
}

impl KeyScheme {
    pub fn issue(&self, mac: &MacAddress, name: &str) -> String {
        match self {
            KeyScheme::Random => to_hex(&rand::random::<[u8; KEY_BYTES]>()),
            KeyScheme::Legacy => {
                let mut hasher = Sha256::new();
                hasher.update(mac.as_str().as_bytes());
                hasher.update(name.as_bytes());
                format!("{:x}", hasher.finalize())
            }
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        MacAddress::parse("00:11:22:33:44:55").unwrap()
    }

    #[test]
    fn random_keys_are_unique_hex_tokens() {
        let a = KeyScheme::Random.issue(&mac(), "sensor-1");
        let b = KeyScheme::Random.issue(&mac(), "sensor-1");
        assert_eq!(a.len(), KEY_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn legacy_keys_hash_mac_then_name() {
        let key = KeyScheme::Legacy.issue(&mac(), "sensor-1");
        let expected = format!(
            "{:x}",
            Sha256::digest("00:11:22:33:44:55sensor-1".as_bytes())
        );
        assert_eq!(key, expected);
        assert_eq!(key, KeyScheme::Legacy.issue(&mac(), "sensor-1"));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0x01, 0xab, 0xff]), "0001abff");
    }
}
