//! Access to the offline Master signer's keys.
//!
//! In production the provider holds only public material: either the
//! chain-level extended public key (`m/44'/888'/0'/0`) or a set of
//! pre-derived pool keys. Seed mode exists for tests and disaster
//! recovery and is the only mode that can sign.

use std::collections::HashMap;
use std::sync::Arc;

use neo_mixer_crypto::{
    mixer_chain_path, mixer_derivation_path, verify_signature, ECDsa, ExtendedKey, HdError,
    MAX_POOL_INDEX, MIXER_CHAIN_DEPTH, PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::cache::KeyCache;
use crate::config::DEFAULT_CACHE_SIZE;
use crate::error::{TeeError, TeeResult};

/// Supplies the Master public key for a pool index.
pub trait MasterKeyProvider: Send + Sync {
    /// Compressed Master public key at pool `index`.
    fn master_public_key(&self, index: u32) -> TeeResult<[u8; PUBLIC_KEY_SIZE]>;
}

enum MasterRoot {
    /// Master key from the seed; derives the full mixer path
    Seed(ExtendedKey),
    /// Neutered key at the chain level; derives `/index`
    ChainPublic(ExtendedKey),
    /// Only pre-derived keys
    None,
}

/// HD-backed [`MasterKeyProvider`].
pub struct HdMasterKeyProvider {
    root: MasterRoot,
    public_keys: RwLock<HashMap<u32, [u8; PUBLIC_KEY_SIZE]>>,
    cache: KeyCache,
}

impl HdMasterKeyProvider {
    /// Full private access. Testing and recovery only.
    pub fn from_seed(seed: &[u8]) -> TeeResult<Self> {
        let master = ExtendedKey::from_seed(seed)?;
        info!(target: "neo::master", "master key provider created with private keys");
        Ok(Self::with_root(MasterRoot::Seed(master)))
    }

    /// Derives pool keys from the chain-level extended public key.
    ///
    /// `chain_key` must sit at depth [`MIXER_CHAIN_DEPTH`]; a root or pool
    /// level key fails with [`TeeError::Config`]. Private material on
    /// `chain_key` is discarded.
    pub fn from_extended_public_key(chain_key: &ExtendedKey) -> TeeResult<Self> {
        if chain_key.depth() != MIXER_CHAIN_DEPTH {
            return Err(TeeError::Config(format!(
                "extended public key is at depth {}, expected the chain level {} ({})",
                chain_key.depth(),
                MIXER_CHAIN_DEPTH,
                mixer_chain_path()
            )));
        }
        info!(
            target: "neo::master",
            depth = chain_key.depth(),
            "master key provider created from extended public key"
        );
        Ok(Self::with_root(MasterRoot::ChainPublic(chain_key.neuter())))
    }

    /// Serves only the given pre-derived keys.
    pub fn from_public_keys<I, K>(keys: I) -> TeeResult<Self>
    where
        I: IntoIterator<Item = (u32, K)>,
        K: AsRef<[u8]>,
    {
        let provider = Self::with_root(MasterRoot::None);
        provider.batch_add_public_keys(keys)?;
        if provider.public_keys.read().is_empty() {
            return Err(TeeError::Config(
                "master key provider needs a seed, an extended public key or public keys".into(),
            ));
        }
        Ok(provider)
    }

    fn with_root(root: MasterRoot) -> Self {
        Self {
            root,
            public_keys: RwLock::new(HashMap::new()),
            cache: KeyCache::new(DEFAULT_CACHE_SIZE),
        }
    }

    /// Whether the provider can sign, i.e. was built from a seed.
    #[inline]
    pub fn has_private_keys(&self) -> bool {
        matches!(self.root, MasterRoot::Seed(_))
    }

    /// Verifies a Master-leg signature for pool `index`.
    pub fn verify_master_signature(
        &self,
        index: u32,
        data: &[u8],
        signature: &[u8],
    ) -> TeeResult<bool> {
        let public_key = self.master_public_key(index)?;
        Ok(verify_signature(&public_key, data, signature)?)
    }

    /// Signs with the Master key at pool `index`. Seed mode only.
    pub fn sign_with_master(&self, index: u32, data: &[u8]) -> TeeResult<[u8; SIGNATURE_SIZE]> {
        if !self.has_private_keys() {
            return Err(TeeError::PrivateKeysUnavailable);
        }
        let key = self.derive_key(index)?;
        Ok(key.sign(data)?)
    }

    /// Registers a pre-derived key; it takes precedence over derivation.
    pub fn add_public_key(&self, index: u32, public_key: &[u8]) -> TeeResult<()> {
        let key = validate_public_key(public_key)?;
        self.public_keys.write().insert(index, key);
        Ok(())
    }

    pub fn add_public_key_hex(&self, index: u32, public_key_hex: &str) -> TeeResult<()> {
        let public_key = hex::decode(public_key_hex.trim_start_matches("0x"))
            .map_err(|e| TeeError::Config(format!("invalid public key hex: {e}")))?;
        self.add_public_key(index, &public_key)
    }

    /// Adds every key or none of them.
    pub fn batch_add_public_keys<I, K>(&self, keys: I) -> TeeResult<()>
    where
        I: IntoIterator<Item = (u32, K)>,
        K: AsRef<[u8]>,
    {
        let validated = keys
            .into_iter()
            .map(|(index, key)| Ok((index, validate_public_key(key.as_ref())?)))
            .collect::<TeeResult<Vec<_>>>()?;
        debug!(target: "neo::master", count = validated.len(), "master public keys added");
        self.public_keys.write().extend(validated);
        Ok(())
    }

    fn derive_key(&self, index: u32) -> TeeResult<Arc<ExtendedKey>> {
        let derived = match &self.root {
            MasterRoot::Seed(master) => self.cache.get_or_try_insert_with(index, || {
                master.derive_path(mixer_derivation_path(index)?)
            }),
            MasterRoot::ChainPublic(chain) => self.cache.get_or_try_insert_with(index, || {
                if index > MAX_POOL_INDEX {
                    return Err(HdError::InvalidIndex(index));
                }
                chain.derive_child(index)
            }),
            MasterRoot::None => return Err(TeeError::MasterKeyUnavailable(index)),
        };
        Ok(derived?)
    }
}

impl MasterKeyProvider for HdMasterKeyProvider {
    fn master_public_key(&self, index: u32) -> TeeResult<[u8; PUBLIC_KEY_SIZE]> {
        if let Some(key) = self.public_keys.read().get(&index) {
            return Ok(*key);
        }
        Ok(self.derive_key(index)?.public_key())
    }
}

impl std::fmt::Debug for HdMasterKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.root {
            MasterRoot::Seed(_) => "seed",
            MasterRoot::ChainPublic(_) => "extended-public-key",
            MasterRoot::None => "public-keys",
        };
        f.debug_struct("HdMasterKeyProvider")
            .field("mode", &mode)
            .field("public_keys", &self.public_keys.read().len())
            .finish()
    }
}

fn validate_public_key(public_key: &[u8]) -> TeeResult<[u8; PUBLIC_KEY_SIZE]> {
    let invalid = || TeeError::InvalidMasterKey(public_key.len());
    let point = ECDsa::parse_compressed(public_key).map_err(|_| invalid())?;
    Ok(ECDsa::compress(&point))
}
