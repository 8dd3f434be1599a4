//! The sealed TEE key manager.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use neo_mixer_crypto::{
    mixer_derivation_path, ECDsa, ExtendedKey, HdError, MAX_POOL_INDEX, PUBLIC_KEY_SIZE,
    SIGNATURE_SIZE,
};
use neo_mixer_wallets::{compose_pool_key_pair, MultiSigError, PoolKeyPair};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::attestation::{
    attestation_message, decode_signature, is_fresh, unix_now, Attestation, ATTESTATION_KEY_INDEX,
};
use crate::cache::KeyCache;
use crate::config::TeeManagerConfig;
use crate::error::{TeeError, TeeResult};
use crate::master::MasterKeyProvider;
use crate::proof::{CommitmentProofEngine, MixRequest, ProofEngine};
use crate::sealing::{SealedSeed, SeedSealer};
use crate::store::RecoveryStore;

/// Owns the sealed TEE root seed and every operation that needs it.
///
/// The seed and master key are fixed at construction. Derived keys are
/// cached behind a lock and the pool counter is atomic, so a manager can
/// be shared across threads behind an `Arc`. The Master private key is
/// never held here.
pub struct SealedTeeManager {
    config: TeeManagerConfig,
    sealer: Arc<dyn SeedSealer>,
    sealed_seed: SealedSeed,
    master_key: ExtendedKey,
    cache: KeyCache,
    /// Last issued pool index; 0 means none issued yet
    last_index: AtomicU32,
    store: Option<Arc<dyn RecoveryStore>>,
    proof_engine: Box<dyn ProofEngine>,
}

impl SealedTeeManager {
    /// Creates a manager with a fresh random seed of `config.seed_size` bytes.
    pub fn new(config: TeeManagerConfig, sealer: Arc<dyn SeedSealer>) -> TeeResult<Self> {
        let config = config.normalized();
        config.validate()?;

        let mut seed = Zeroizing::new(vec![0u8; config.seed_size]);
        OsRng.fill_bytes(&mut seed);
        info!(target: "neo::tee", seed_size = config.seed_size, "generated new root seed");

        Self::with_seed(&seed, config, sealer)
    }

    /// Restores a manager from a plaintext seed, for recovery.
    pub fn with_seed(
        seed: &[u8],
        config: TeeManagerConfig,
        sealer: Arc<dyn SeedSealer>,
    ) -> TeeResult<Self> {
        let master_key = ExtendedKey::from_seed(seed)?;
        let sealed_seed = sealer.seal(seed)?;
        Ok(Self::assemble(config, sealer, sealed_seed, master_key))
    }

    /// Restores a manager from a sealed seed.
    pub fn restore(
        sealed_seed: SealedSeed,
        config: TeeManagerConfig,
        sealer: Arc<dyn SeedSealer>,
    ) -> TeeResult<Self> {
        let seed = sealer.unseal(&sealed_seed)?;
        let master_key = ExtendedKey::from_seed(&seed)?;
        info!(target: "neo::tee", sealer = sealer.name(), "restored root seed");
        Ok(Self::assemble(config, sealer, sealed_seed, master_key))
    }

    /// Resumes from `store`, or initialises it with a fresh seed.
    ///
    /// The pool counter continues after the last index the store recorded.
    pub fn open(
        config: TeeManagerConfig,
        sealer: Arc<dyn SeedSealer>,
        store: Arc<dyn RecoveryStore>,
    ) -> TeeResult<Self> {
        let mut manager = match store.load_sealed_seed()? {
            Some(sealed) => Self::restore(sealed, config, sealer)?,
            None => {
                let manager = Self::new(config, sealer)?;
                store.store_sealed_seed(&manager.sealed_seed)?;
                manager
            }
        };

        let last = store.load_last_pool_index()?.unwrap_or(0);
        manager.last_index.store(last, Ordering::SeqCst);
        manager.store = Some(store);
        info!(target: "neo::tee", last_pool_index = last, "manager opened from recovery store");
        Ok(manager)
    }

    fn assemble(
        config: TeeManagerConfig,
        sealer: Arc<dyn SeedSealer>,
        sealed_seed: SealedSeed,
        master_key: ExtendedKey,
    ) -> Self {
        let config = config.normalized();
        Self {
            cache: KeyCache::new(config.cache_size),
            config,
            sealer,
            sealed_seed,
            master_key,
            last_index: AtomicU32::new(0),
            store: None,
            proof_engine: Box::new(CommitmentProofEngine),
        }
    }

    /// Replaces the commitment placeholder with another proof engine.
    pub fn with_proof_engine(mut self, engine: Box<dyn ProofEngine>) -> Self {
        self.proof_engine = engine;
        self
    }

    fn key_at(&self, index: u32) -> TeeResult<Arc<ExtendedKey>> {
        Ok(self.cache.get_or_try_insert_with(index, || {
            let key = self.master_key.derive_path(mixer_derivation_path(index)?)?;
            debug!(target: "neo::tee", index, "derived pool key");
            Ok::<_, HdError>(key)
        })?)
    }

    /// Derives the TEE key at `index` and pairs it with the Master key.
    pub fn derive_pool_keys(&self, index: u32, master_public_key: &[u8]) -> TeeResult<PoolKeyPair> {
        if master_public_key.len() != PUBLIC_KEY_SIZE {
            return Err(TeeError::InvalidMasterKey(master_public_key.len()));
        }
        let key = self.key_at(index)?;

        let pair = compose_pool_key_pair(index, &key.public_key(), master_public_key).map_err(
            |err| match err {
                MultiSigError::InvalidMasterKey(len) => TeeError::InvalidMasterKey(len),
                other => other.into(),
            },
        )?;
        info!(target: "neo::tee", index, address = %pair.address, "pool key pair derived");
        Ok(pair)
    }

    /// Signs `SHA-256(tx_data)` with the TEE key at `index`.
    ///
    /// This is the TEE leg of the 1-of-2 witness.
    pub fn sign_transaction(&self, index: u32, tx_data: &[u8]) -> TeeResult<[u8; SIGNATURE_SIZE]> {
        let signature = self.key_at(index)?.sign(tx_data)?;
        debug!(target: "neo::tee", index, "transaction signed");
        Ok(signature)
    }

    /// Compressed TEE public key at pool `index`.
    pub fn tee_public_key(&self, index: u32) -> TeeResult<[u8; PUBLIC_KEY_SIZE]> {
        Ok(self.key_at(index)?.public_key())
    }

    /// Public key of the attestation identity (pool index 0).
    pub fn attestation_public_key(&self) -> TeeResult<[u8; PUBLIC_KEY_SIZE]> {
        self.tee_public_key(ATTESTATION_KEY_INDEX)
    }

    /// Signs `data || be64(now)` with the attestation key.
    pub fn sign_attestation(&self, data: &[u8]) -> TeeResult<Attestation> {
        self.sign_attestation_at(data, unix_now())
    }

    /// Signs `data || be64(timestamp)` with the attestation key.
    pub fn sign_attestation_at(&self, data: &[u8], timestamp: u64) -> TeeResult<Attestation> {
        let key = self.key_at(ATTESTATION_KEY_INDEX)?;
        let signature = key.sign(&attestation_message(data, timestamp))?;
        Ok(Attestation {
            signature: hex::encode(signature),
            timestamp,
        })
    }

    /// Verifies an attestation signature.
    ///
    /// With `Some(timestamp)` the signature must cover `data || be64(timestamp)`
    /// and the timestamp must be within the attestation timeout of now.
    /// With `None` the signature is checked over `data` alone.
    pub fn verify_attestation(
        &self,
        data: &[u8],
        signature_hex: &str,
        timestamp: Option<u64>,
    ) -> TeeResult<bool> {
        let signature = decode_signature(signature_hex)?;
        let public_key = self.attestation_public_key()?;

        let valid = match timestamp {
            Some(timestamp) => {
                let now = unix_now();
                if !is_fresh(timestamp, now, self.config.attestation_timeout_secs) {
                    warn!(
                        target: "neo::tee",
                        timestamp,
                        now,
                        timeout = self.config.attestation_timeout_secs,
                        "attestation outside freshness window"
                    );
                    return Ok(false);
                }
                ECDsa::verify(
                    &attestation_message(data, timestamp),
                    &signature,
                    &public_key,
                )?
            }
            None => ECDsa::verify(data, &signature, &public_key)?,
        };
        Ok(valid)
    }

    /// Verifies an [`Attestation`] produced by
    /// [`sign_attestation`](Self::sign_attestation), freshness included.
    pub fn verify_attestation_report(
        &self,
        data: &[u8],
        attestation: &Attestation,
    ) -> TeeResult<bool> {
        self.verify_attestation(data, &attestation.signature, Some(attestation.timestamp))
    }

    /// Hex commitment for `request` from the configured proof engine.
    ///
    /// With the default engine this is a SHA-256 commitment, not a
    /// zero-knowledge proof.
    pub fn generate_zk_proof(&self, request: &MixRequest) -> TeeResult<String> {
        self.proof_engine.prove(request)
    }

    /// Checks `proof` against `request` with the configured proof engine.
    pub fn verify_zk_proof(&self, request: &MixRequest, proof: &str) -> TeeResult<bool> {
        self.proof_engine.verify(request, proof)
    }

    /// Issues the next pool index. The first call returns 1; index 0 is the
    /// attestation identity.
    pub fn next_pool_index(&self) -> TeeResult<u32> {
        let index = self
            .last_index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                (last < MAX_POOL_INDEX).then(|| last + 1)
            })
            .map(|last| last + 1)
            .map_err(|last| HdError::InvalidIndex(last.saturating_add(1)))?;

        if let Some(store) = &self.store {
            store.store_last_pool_index(index)?;
        }
        debug!(target: "neo::tee", index, "pool index issued");
        Ok(index)
    }

    /// Resets the counter so that the next call to
    /// [`next_pool_index`](Self::next_pool_index) returns `last_issued + 1`.
    pub fn set_next_pool_index(&self, last_issued: u32) {
        self.last_index.store(last_issued, Ordering::SeqCst);
        info!(target: "neo::tee", last_issued, "pool index counter reset");
    }

    /// Last issued pool index.
    pub fn current_pool_index(&self) -> u32 {
        self.last_index.load(Ordering::SeqCst)
    }

    /// Allocates the next index and builds its pool account.
    pub fn mint_pool_account(&self, provider: &dyn MasterKeyProvider) -> TeeResult<PoolKeyPair> {
        let index = self.next_pool_index()?;
        let master_public_key = provider.master_public_key(index)?;
        self.derive_pool_keys(index, &master_public_key)
    }

    /// Drops every cached derived key. Later lookups re-derive from the seed.
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!(target: "neo::tee", "key cache cleared");
    }

    /// Number of derived keys currently cached.
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }

    /// Sealed seed, for backup export.
    pub fn sealed_seed(&self) -> &SealedSeed {
        &self.sealed_seed
    }

    /// Active configuration, with zero values already replaced by defaults.
    pub fn config(&self) -> &TeeManagerConfig {
        &self.config
    }
}

impl fmt::Debug for SealedTeeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedTeeManager")
            .field("sealer", &self.sealer.name())
            .field("proof_engine", &self.proof_engine.name())
            .field("cached_keys", &self.cache.len())
            .field("last_pool_index", &self.current_pool_index())
            .finish_non_exhaustive()
    }
}
