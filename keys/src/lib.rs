use bech32::{Bech32m, Hrp};
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{Error, ErrorKind};
use std::str::FromStr;
use xch_history_core::blockchain::sized_bytes::{Bytes32, SizedBytes};

fn _version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
fn _pkg_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

#[must_use]
pub fn version() -> String {
    format!("{}: {}", _pkg_name(), _version())
}

#[test]
fn test_version() {
    println!("{}", version());
}

pub fn encode_puzzle_hash(puzzle_hash: &Bytes32, prefix: &str) -> Result<String, Error> {
    let hrp = Hrp::parse(prefix).map_err(|e| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Invalid address prefix ({prefix}): {e:?}"),
        )
    })?;
    bech32::encode::<Bech32m>(hrp, puzzle_hash.as_ref())
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("{e:?}")))
}

pub fn decode_puzzle_hash(address: &str) -> Result<Bytes32, Error> {
    Address::from_str(address).map(|a| a.hash)
}

/// A puzzle hash paired with the network prefix it is displayed under.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Address {
    pub prefix: String,
    pub hash: Bytes32,
}
impl Address {
    pub fn new(prefix: &str, hash: Bytes32) -> Self {
        Address {
            prefix: prefix.to_string(),
            hash,
        }
    }
    pub fn encode(&self) -> Result<String, Error> {
        encode_puzzle_hash(&self.hash, &self.prefix)
    }
}
impl FromStr for Address {
    type Err = Error;
    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let (hrp, data) = bech32::decode(address.trim()).map_err(|e| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Error Decoding address: ({address}): {e:?}"),
            )
        })?;
        let hash = Bytes32::parse(&data).map_err(|e| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Error Decoding address: ({address}): {e}"),
            )
        })?;
        Ok(Address {
            prefix: hrp.to_lowercase(),
            hash,
        })
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}:{}", self.prefix, self.hash),
        }
    }
}
impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode().map_err(S::Error::custom)?)
    }
}
impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(D::Error::custom)
    }
}
