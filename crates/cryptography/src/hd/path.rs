//! Derivation paths and the mixer's canonical layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HdError, HdResult};

/// Indices at or above this offset use hardened derivation
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP44 purpose
pub const BIP44_PURPOSE: u32 = 44;

/// Neo N3 coin type, as registered in SLIP-0044
pub const NEO_COIN_TYPE: u32 = 888;

/// Account reserved for mixer pool keys
pub const MIXER_ACCOUNT: u32 = 0;

/// External chain under the mixer account
pub const EXTERNAL_CHAIN: u32 = 0;

/// Largest pool index that keeps the final path component non-hardened
pub const MAX_POOL_INDEX: u32 = HARDENED_OFFSET - 1;

/// Depth of the node at [`mixer_chain_path`]
pub const MIXER_CHAIN_DEPTH: u8 = 4;

/// Marks `index` as hardened.
#[inline]
pub const fn hardened(index: u32) -> u32 {
    index | HARDENED_OFFSET
}

/// Whether `index` selects hardened derivation.
#[inline]
pub const fn is_hardened(index: u32) -> bool {
    index >= HARDENED_OFFSET
}

/// An ordered sequence of child indices, applied from the master key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path with `index` appended.
    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

/// `m/44'/888'/0'/0`, the parent of every pool key.
///
/// The Master signer can export the extended public key at this level so
/// that pool public keys are derivable without its private key.
pub fn mixer_chain_path() -> DerivationPath {
    DerivationPath(vec![
        hardened(BIP44_PURPOSE),
        hardened(NEO_COIN_TYPE),
        hardened(MIXER_ACCOUNT),
        EXTERNAL_CHAIN,
    ])
}

/// `m/44'/888'/0'/0/index`, the pool key path shared by both seeds.
///
/// Fails with [`HdError::InvalidIndex`] for indices in the hardened range.
pub fn mixer_derivation_path(index: u32) -> HdResult<DerivationPath> {
    if index > MAX_POOL_INDEX {
        return Err(HdError::InvalidIndex(index));
    }
    Ok(mixer_chain_path().child(index))
}

impl AsRef<[u32]> for DerivationPath {
    #[inline]
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(indices: Vec<u32>) -> Self {
        Self(indices)
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for &index in &self.0 {
            if is_hardened(index) {
                write!(f, "/{}'", index - HARDENED_OFFSET)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = HdError;

    /// Parses `m/44'/888'/0'/0/5`; `h` is accepted in place of `'`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = match s {
            "m" => return Ok(Self::default()),
            _ => s
                .strip_prefix("m/")
                .ok_or_else(|| HdError::InvalidPath(format!("path must start with 'm/': {s}")))?,
        };

        let mut indices = Vec::new();
        for segment in rest.split('/') {
            let stripped = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'));
            let (digits, hard) = match stripped {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            let value: u32 = digits
                .parse()
                .map_err(|e| HdError::InvalidPath(format!("invalid segment '{segment}': {e}")))?;
            if is_hardened(value) {
                return Err(HdError::InvalidPath(format!(
                    "segment '{segment}' exceeds the non-hardened range"
                )));
            }
            indices.push(if hard { hardened(value) } else { value });
        }
        Ok(Self(indices))
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
