//! BIP32-style extended keys on secp256r1.

use std::fmt;

use p256::{
    elliptic_curve::{group::Curve, ops::Reduce, PrimeField},
    FieldBytes, ProjectivePoint, PublicKey, Scalar, U256,
};
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

use super::path::is_hardened;
use crate::ecdsa::{ECDsa, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::{HdError, HdResult};
use crate::hash::{hash160, hmac_sha512};

/// HMAC key for master key generation
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Smallest accepted seed
pub const MIN_SEED_SIZE: usize = 16;

/// Largest accepted seed
pub const MAX_SEED_SIZE: usize = 64;

/// Size of a chain code
pub const CHAIN_CODE_SIZE: usize = 32;

/// A node in the derivation tree.
///
/// Holds either a private scalar in `[1, n-1]` or only the compressed
/// public point. The public key is always present so that normal
/// derivation and address computation never need the scalar.
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: Option<Zeroizing<[u8; PRIVATE_KEY_SIZE]>>,
    public_key: [u8; PUBLIC_KEY_SIZE],
    chain_code: Zeroizing<[u8; CHAIN_CODE_SIZE]>,
    depth: u8,
    index: u32,
    parent_fingerprint: [u8; 4],
}

impl ExtendedKey {
    /// Creates the master key for `seed`.
    pub fn from_seed(seed: &[u8]) -> HdResult<Self> {
        if !(MIN_SEED_SIZE..=MAX_SEED_SIZE).contains(&seed.len()) {
            return Err(HdError::InvalidSeed(seed.len()));
        }

        let output = hmac_sha512(MASTER_HMAC_KEY, &[seed])?;
        let (il, ir) = output.split_at(32);

        let scalar = scalar_from_bytes(il)
            .ok_or_else(|| HdError::DerivationFailed("master scalar exceeds curve order".into()))?;
        if is_zero(&scalar) {
            return Err(HdError::DerivationFailed("master scalar is zero".into()));
        }

        Self::from_scalar(&scalar, chain_code_from(ir), 0, 0, [0u8; 4])
    }

    /// Imports an extended public key, typically one exported by the
    /// offline Master signer at the chain level.
    pub fn from_public_parts(
        public_key: &[u8],
        chain_code: [u8; CHAIN_CODE_SIZE],
        depth: u8,
        index: u32,
    ) -> HdResult<Self> {
        let point = ECDsa::parse_compressed(public_key)?;
        Ok(Self {
            private_key: None,
            public_key: ECDsa::compress(&point),
            chain_code: Zeroizing::new(chain_code),
            depth,
            index,
            parent_fingerprint: [0u8; 4],
        })
    }

    fn from_scalar(
        scalar: &Scalar,
        chain_code: Zeroizing<[u8; CHAIN_CODE_SIZE]>,
        depth: u8,
        index: u32,
        parent_fingerprint: [u8; 4],
    ) -> HdResult<Self> {
        let mut private_key = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        private_key.copy_from_slice(&scalar.to_repr());
        let public_key = ECDsa::derive_compressed_public_key(&private_key)?;

        Ok(Self {
            private_key: Some(private_key),
            public_key,
            chain_code,
            depth,
            index,
            parent_fingerprint,
        })
    }

    /// Derives the child at `index`; indices at or above 2^31 are hardened.
    pub fn derive_child(&self, index: u32) -> HdResult<Self> {
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            HdError::DerivationFailed(format!("maximum depth exceeded at index {index:#x}"))
        })?;
        let ser_index = index.to_be_bytes();

        let output = if is_hardened(index) {
            let private_key = self
                .private_key
                .as_ref()
                .ok_or(HdError::HardenedFromPublicKey(index))?;
            let data: [&[u8]; 3] = [&[0x00], &private_key[..], &ser_index];
            hmac_sha512(&self.chain_code[..], &data)?
        } else {
            let data: [&[u8]; 2] = [&self.public_key, &ser_index];
            hmac_sha512(&self.chain_code[..], &data)?
        };
        let (il, ir) = output.split_at(32);

        let tweak = reduce_scalar(il);
        let chain_code = chain_code_from(ir);
        let fingerprint = self.fingerprint();

        match &self.private_key {
            Some(private_key) => {
                let parent = scalar_from_bytes(&private_key[..]).ok_or_else(|| {
                    HdError::DerivationFailed("parent scalar out of range".into())
                })?;
                let child = tweak + parent;
                if is_zero(&child) {
                    return Err(HdError::DerivationFailed(format!(
                        "child scalar is zero at index {index:#x}"
                    )));
                }
                Self::from_scalar(&child, chain_code, depth, index, fingerprint)
            }
            None => {
                let parent = ECDsa::parse_compressed(&self.public_key)?;
                let point = ProjectivePoint::GENERATOR * tweak + parent.to_projective();
                let child = PublicKey::from_affine(point.to_affine()).map_err(|_| {
                    HdError::DerivationFailed(format!(
                        "child point at infinity at index {index:#x}"
                    ))
                })?;
                Ok(Self {
                    private_key: None,
                    public_key: ECDsa::compress(&child),
                    chain_code,
                    depth,
                    index,
                    parent_fingerprint: fingerprint,
                })
            }
        }
    }

    /// Applies [`derive_child`](Self::derive_child) along `path`, stopping
    /// at the first index that fails.
    pub fn derive_path<P: AsRef<[u32]>>(&self, path: P) -> HdResult<Self> {
        path.as_ref()
            .iter()
            .enumerate()
            .try_fold(self.clone(), |key, (position, &index)| {
                key.derive_child(index).map_err(|err| {
                    debug!(target: "neo::hd", position, index, %err, "derivation stopped");
                    err
                })
            })
    }

    /// Compressed SEC1 public key.
    #[inline]
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key
    }

    /// Private scalar, or `None` for a neutered key.
    #[inline]
    pub fn private_key(&self) -> Option<&[u8; PRIVATE_KEY_SIZE]> {
        self.private_key.as_deref()
    }

    #[inline]
    pub fn is_private(&self) -> bool {
        self.private_key.is_some()
    }

    /// Public-only copy with the same chain code, depth and index.
    pub fn neuter(&self) -> Self {
        Self {
            private_key: None,
            public_key: self.public_key,
            chain_code: self.chain_code.clone(),
            depth: self.depth,
            index: self.index,
            parent_fingerprint: self.parent_fingerprint,
        }
    }

    #[inline]
    pub fn chain_code(&self) -> &[u8; CHAIN_CODE_SIZE] {
        &self.chain_code
    }

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    /// First four bytes of `hash160(public_key)`.
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.public_key);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Signs `SHA-256(data)`; fails on a neutered key.
    pub fn sign(&self, data: &[u8]) -> HdResult<[u8; SIGNATURE_SIZE]> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or_else(|| HdError::SigningFailed("key has no private component".into()))?;
        ECDsa::sign(data, private_key)
    }

    /// Verifies a signature produced by [`sign`](Self::sign).
    pub fn verify(&self, data: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> HdResult<bool> {
        ECDsa::verify(data, signature, &self.public_key)
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("public_key", &hex::encode(self.public_key))
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .field("depth", &self.depth)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

fn scalar_from_bytes(bytes: &[u8]) -> Option<Scalar> {
    Option::from(Scalar::from_repr(*FieldBytes::from_slice(bytes)))
}

/// Interprets 32 big-endian bytes as an integer reduced mod n.
fn reduce_scalar(bytes: &[u8]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(bytes))
}

fn is_zero(scalar: &Scalar) -> bool {
    bool::from(scalar.ct_eq(&Scalar::ZERO))
}

fn chain_code_from(bytes: &[u8]) -> Zeroizing<[u8; CHAIN_CODE_SIZE]> {
    let mut chain_code = Zeroizing::new([0u8; CHAIN_CODE_SIZE]);
    chain_code.copy_from_slice(bytes);
    chain_code
}
