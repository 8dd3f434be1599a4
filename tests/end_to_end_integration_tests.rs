//! End-to-end pool lifecycle: mint, sign on both legs, restart, recover.
//!
//! These tests wire the three crates together the way a deployment does:
//! the TEE host owns a sealed manager, the offline signer exports only its
//! chain-level public key, and recovery works from the Master seed alone.

use std::sync::Arc;

use neo_mixer::prelude::*;
use neo_mixer::tee::{MixRequest, MixTarget, RecoveryStore};
use neo_mixer::wallets::address_to_script_hash;
use parking_lot::Mutex;
use proptest::prelude::*;

const MASTER_SEED: [u8; 32] = [0x42; 32];

fn chain_level_provider() -> HdMasterKeyProvider {
    let chain = ExtendedKey::from_seed(&MASTER_SEED)
        .unwrap()
        .derive_path(mixer_chain_path())
        .unwrap();
    HdMasterKeyProvider::from_extended_public_key(&chain).unwrap()
}

#[test]
fn test_pool_lifecycle() {
    let manager = SealedTeeManager::with_seed(
        &[0u8; 32],
        TeeManagerConfig::default(),
        Arc::new(PassthroughSealer),
    )
    .unwrap();
    let provider = chain_level_provider();
    assert!(!provider.has_private_keys());

    let pools: Vec<PoolKeyPair> = (0..5)
        .map(|_| manager.mint_pool_account(&provider).unwrap())
        .collect();

    let indices: Vec<u32> = pools.iter().map(|pool| pool.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    assert_eq!(pools[0].address, "NYKKYTmv3dJ4NDz6f9VqW3w5u96Bftr8CX");

    for pool in &pools {
        assert!(pool.verify());
        assert!(verify_multisig_address(
            &pool.address,
            1,
            &[pool.tee_public_key, pool.master_public_key]
        ));
        assert_eq!(
            address_to_script_hash(&pool.address).unwrap(),
            pool.script_hash
        );
    }
}

#[test]
fn test_master_recovers_without_tee() {
    let manager = SealedTeeManager::new(
        TeeManagerConfig::default(),
        Arc::new(AesGcmSealer::generate()),
    )
    .unwrap();
    let pool = manager.mint_pool_account(&chain_level_provider()).unwrap();
    drop(manager);

    // the offline signer recovers from its seed and the published pool record
    let recovery = HdMasterKeyProvider::from_seed(&MASTER_SEED).unwrap();
    assert_eq!(
        recovery.master_public_key(pool.index).unwrap(),
        pool.master_public_key
    );

    let sweep = b"sweep pool funds to cold storage";
    let signature = recovery.sign_with_master(pool.index, sweep).unwrap();
    assert!(verify_signature(&pool.master_public_key, sweep, &signature).unwrap());
    assert!(recovery
        .verify_master_signature(pool.index, sweep, &signature)
        .unwrap());

    let account = create_1of2_multisig(&pool.tee_public_key, &pool.master_public_key).unwrap();
    assert!(account.contains_key(&pool.master_public_key));
    assert_eq!(account.address(), pool.address);
}

#[test]
fn test_restart_never_reuses_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recovery.json");
    let sealer = Arc::new(AesGcmSealer::new([9u8; 32]));
    let provider = chain_level_provider();

    let mut addresses = Vec::new();
    for _ in 0..3 {
        let store = Arc::new(FileRecoveryStore::open(&path).unwrap());
        let manager =
            SealedTeeManager::open(TeeManagerConfig::default(), sealer.clone(), store).unwrap();
        for _ in 0..2 {
            addresses.push(manager.mint_pool_account(&provider).unwrap().address);
        }
    }

    let mut unique = addresses.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 6);

    let store = FileRecoveryStore::open(&path).unwrap();
    assert_eq!(store.load_last_pool_index().unwrap(), Some(6));
}

#[derive(Default)]
struct LoggingStore {
    inner: MemoryRecoveryStore,
    writes: Mutex<Vec<u32>>,
}

impl RecoveryStore for LoggingStore {
    fn load_sealed_seed(&self) -> Result<Option<neo_mixer::tee::SealedSeed>, TeeError> {
        self.inner.load_sealed_seed()
    }

    fn store_sealed_seed(&self, sealed: &neo_mixer::tee::SealedSeed) -> Result<(), TeeError> {
        self.inner.store_sealed_seed(sealed)
    }

    fn load_last_pool_index(&self) -> Result<Option<u32>, TeeError> {
        self.inner.load_last_pool_index()
    }

    fn store_last_pool_index(&self, index: u32) -> Result<(), TeeError> {
        self.writes.lock().push(index);
        self.inner.store_last_pool_index(index)
    }
}

#[test]
fn test_every_issued_index_is_persisted() {
    let store = Arc::new(LoggingStore::default());
    let manager = SealedTeeManager::open(
        TeeManagerConfig::default(),
        Arc::new(PassthroughSealer),
        store.clone(),
    )
    .unwrap();

    for _ in 0..4 {
        manager.next_pool_index().unwrap();
    }
    assert_eq!(*store.writes.lock(), vec![1, 2, 3, 4]);
}

#[test]
fn test_attested_mix_commitment() {
    let manager = SealedTeeManager::with_seed(
        &[0u8; 32],
        TeeManagerConfig::default(),
        Arc::new(PassthroughSealer),
    )
    .unwrap();
    let pool = manager.mint_pool_account(&chain_level_provider()).unwrap();

    let request = MixRequest {
        id: "mix-9".into(),
        account_id: "acct-3".into(),
        source_wallet: pool.address.clone(),
        amount: "10".into(),
        targets: vec![MixTarget {
            address: "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv".into(),
            amount: "10".into(),
        }],
    };

    let proof = manager.generate_zk_proof(&request).unwrap();
    let attestation: Attestation = manager.sign_attestation(proof.as_bytes()).unwrap();
    assert!(manager
        .verify_attestation_report(proof.as_bytes(), &attestation)
        .unwrap());
    assert!(manager.verify_zk_proof(&request, &proof).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_tee_and_master_legs_never_collide(seed in prop::array::uniform32(any::<u8>()), index in 1u32..10_000) {
        prop_assume!(seed != MASTER_SEED);
        let manager = SealedTeeManager::with_seed(
            &seed,
            TeeManagerConfig::default(),
            Arc::new(PassthroughSealer),
        )
        .unwrap();
        let provider = HdMasterKeyProvider::from_seed(&MASTER_SEED).unwrap();
        let master_key = provider.master_public_key(index).unwrap();

        let pool = manager.derive_pool_keys(index, &master_key).unwrap();
        prop_assert_ne!(pool.tee_public_key, pool.master_public_key);

        let tx = index.to_be_bytes();
        let tee_sig = manager.sign_transaction(index, &tx).unwrap();
        let master_sig = provider.sign_with_master(index, &tx).unwrap();
        prop_assert!(verify_signature(&pool.tee_public_key, &tx, &tee_sig).unwrap());
        prop_assert!(verify_signature(&pool.master_public_key, &tx, &master_sig).unwrap());
    }
}
