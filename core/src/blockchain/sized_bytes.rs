use hex::{decode, encode};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{Error, ErrorKind};
use std::str::FromStr;

pub fn prep_hex_str(to_fix: &str) -> String {
    let lc = to_fix.trim().to_lowercase();
    if let Some(s) = lc.strip_prefix("0x") {
        s.to_string()
    } else {
        lc
    }
}

pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, Error> {
    decode(prep_hex_str(hex))
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Invalid hex ({hex}): {e:?}")))
}

pub trait SizedBytes<const SIZE: usize>: Copy + Serialize + fmt::Display + FromStr {
    fn new(bytes: [u8; SIZE]) -> Self;
    fn parse(bytes: &[u8]) -> Result<Self, Error>;
    fn bytes(&self) -> [u8; SIZE];
}

macro_rules! impl_sized_bytes {
    ($($name: ident, $size:expr, $visitor:ident);*) => {
        $(
            #[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name {
                bytes: [u8; $size]
            }
            impl SizedBytes<$size> for $name {
                fn new(bytes: [u8; $size]) -> Self {
                    Self { bytes }
                }
                fn parse(bytes: &[u8]) -> Result<Self, Error> {
                    let bytes: [u8; $size] = bytes.try_into().map_err(|_| {
                        Error::new(
                            ErrorKind::InvalidInput,
                            format!(
                                "Invalid length for {}, expected {} got {}",
                                stringify!($name),
                                $size,
                                bytes.len()
                            ),
                        )
                    })?;
                    Ok(Self { bytes })
                }
                fn bytes(&self) -> [u8; $size] {
                    self.bytes
                }
            }

            impl AsRef<[u8]> for $name {
                fn as_ref(&self) -> &[u8] {
                    &self.bytes
                }
            }

            impl From<[u8; $size]> for $name {
                fn from(bytes: [u8; $size]) -> Self {
                    Self { bytes }
                }
            }

            impl From<&[u8; $size]> for $name {
                fn from(bytes: &[u8; $size]) -> Self {
                    Self { bytes: *bytes }
                }
            }

            impl FromStr for $name {
                type Err = Error;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::parse(&hex_to_bytes(s)?)
                }
            }

            impl Serialize for $name {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    serializer.serialize_str(&self.to_string())
                }
            }

            struct $visitor;

            impl<'de> Visitor<'de> for $visitor {
                type Value = $name;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    write!(formatter, "a hex string of {} bytes", $size)
                }

                fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    $name::from_str(value).map_err(E::custom)
                }
            }

            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserializer.deserialize_str($visitor)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "0x{}", encode(self.bytes))
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self)
                }
            }
        )*
    };
    ()=>{};
}

impl_sized_bytes!(
    Bytes32, 32, Bytes32Visitor
);
