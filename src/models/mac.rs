use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const OCTETS: usize = 6;

/// Hardware address in its canonical form: six lowercase hex octets joined by `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a colon separated MAC address")]
pub struct InvalidMac(pub String);

impl MacAddress {
    pub fn parse(value: &str) -> Result<Self, InvalidMac> {
        let mut count = 0;
        for octet in value.split(':') {
            count += 1;
            if octet.len() != 2 || !octet.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(InvalidMac(value.to_string()));
            }
        }
        if count != OCTETS {
            return Err(InvalidMac(value.to_string()));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = InvalidMac;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MacAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_and_mixed_case() {
        let mac = MacAddress::parse("00:11:22:33:44:55").unwrap();
        assert_eq!(mac.as_str(), "00:11:22:33:44:55");
        let mac = MacAddress::parse("AA:bb:Cc:dD:EE:ff").unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(mac, "aa:bb:cc:dd:ee:ff".parse::<MacAddress>().unwrap());
    }

    #[test]
    fn rejects_malformed() {
        for value in [
            "",
            "00:011::03:04:5",
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "00-11-22-33-44-55",
            "0:11:22:33:44:55",
            "00:11:22:33:44:5g",
            "00:11:22:33:44:55:",
            " 00:11:22:33:44:55",
        ] {
            assert_eq!(MacAddress::parse(value), Err(InvalidMac(value.to_string())));
        }
    }
}
