//! `#[serde(with = "serde_hex")]` for byte arrays and vectors.

use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: TryFrom<Vec<u8>>,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)?;
    let len = bytes.len();
    T::try_from(bytes).map_err(|_| de::Error::custom(format!("unexpected byte length {len}")))
}
