//! Command execution.
//!
//! Every command returns a JSON document; `main` only prints it.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use neo_mixer_crypto::{
    mixer_chain_path, verify_signature, ExtendedKey, CHAIN_CODE_SIZE, MIXER_CHAIN_DEPTH,
    PUBLIC_KEY_SIZE,
};
use neo_mixer_tee::{
    AesGcmSealer, FileRecoveryStore, HdMasterKeyProvider, MasterKeyProvider, PassthroughSealer,
    SealedTeeManager, SeedSealer, TeeManagerConfig,
};
use neo_mixer_wallets::{
    compose_pool_key_pair, create_1of2_multisig, public_key_to_address, serde_hex,
    verify_multisig_address,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use zeroize::Zeroizing;

use crate::args::{CliArgs, Command, MasterCommand, PoolCommand, StoreArgs, TeeCommand};

/// Chain-level Master key as exchanged between the offline signer and the
/// TEE host. Holds no private material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainKeyExport {
    #[serde(with = "serde_hex")]
    pub public_key: [u8; PUBLIC_KEY_SIZE],
    #[serde(with = "serde_hex")]
    pub chain_code: [u8; CHAIN_CODE_SIZE],
    pub depth: u8,
    pub index: u32,
    /// Derivation path of the exported key
    pub path: String,
}

impl ChainKeyExport {
    pub fn from_key(key: &ExtendedKey) -> Self {
        Self {
            public_key: key.public_key(),
            chain_code: *key.chain_code(),
            depth: key.depth(),
            index: key.index(),
            path: mixer_chain_path().to_string(),
        }
    }

    /// Rebuilds the neutered chain key. Exports of any other node than
    /// `m/44'/888'/0'/0` are rejected.
    pub fn to_key(&self) -> Result<ExtendedKey> {
        let expected = mixer_chain_path().to_string();
        if self.path != expected {
            bail!(
                "chain key export is for path {}, expected {expected}",
                self.path
            );
        }
        if self.depth != MIXER_CHAIN_DEPTH {
            bail!(
                "chain key export has depth {}, expected {MIXER_CHAIN_DEPTH}",
                self.depth
            );
        }
        ExtendedKey::from_public_parts(&self.public_key, self.chain_code, self.depth, self.index)
            .context("chain key export holds an invalid public key")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("failed to read chain key from {}", path.display()))?;
        serde_json::from_slice(&content).context("failed to parse chain key export")
    }
}

pub fn run(args: &CliArgs) -> Result<Value> {
    let config = load_config(args.config.as_deref())?;
    match &args.command {
        Command::Tee(command) => run_tee(command, config),
        Command::Master(command) => run_master(command),
        Command::Pool(command) => run_pool(command),
    }
}

fn load_config(path: Option<&Path>) -> Result<TeeManagerConfig> {
    match path {
        Some(path) => TeeManagerConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(TeeManagerConfig::default()),
    }
}

fn open_manager(store: &StoreArgs, config: TeeManagerConfig) -> Result<SealedTeeManager> {
    let sealer: Arc<dyn SeedSealer> = match &store.sealing_key {
        Some(key) => {
            let key = Zeroizing::new(decode_hex(key, "sealing key")?);
            let key: [u8; 32] = key
                .as_slice()
                .try_into()
                .with_context(|| format!("sealing key must be 32 bytes, got {}", key.len()))?;
            Arc::new(AesGcmSealer::new(key))
        }
        None => Arc::new(PassthroughSealer),
    };

    let recovery = FileRecoveryStore::open(&store.store)
        .with_context(|| format!("failed to open recovery store {}", store.store.display()))?;
    let manager = SealedTeeManager::open(config, sealer, Arc::new(recovery))
        .context("failed to open TEE manager")?;
    Ok(manager)
}

fn run_tee(command: &TeeCommand, config: TeeManagerConfig) -> Result<Value> {
    match command {
        TeeCommand::Init { store } => {
            let manager = open_manager(store, config)?;
            Ok(json!({
                "store": store.store.display().to_string(),
                "sealer": manager.sealed_seed().sealer,
                "attestation_public_key": hex::encode(manager.attestation_public_key()?),
                "last_pool_index": manager.current_pool_index(),
            }))
        }
        TeeCommand::Mint {
            store,
            master_chain_key,
        } => {
            let manager = open_manager(store, config)?;
            let chain_key = ChainKeyExport::load(master_chain_key)?.to_key()?;
            let provider = HdMasterKeyProvider::from_extended_public_key(&chain_key)?;

            let pair = manager.mint_pool_account(&provider)?;
            info!(target: "neo::cli", index = pair.index, address = %pair.address, "pool account minted");
            Ok(serde_json::to_value(pair)?)
        }
        TeeCommand::Derive {
            store,
            index,
            master_key,
        } => {
            let manager = open_manager(store, config)?;
            let master_key = decode_hex(master_key, "master key")?;
            let pair = manager.derive_pool_keys(*index, &master_key)?;
            Ok(serde_json::to_value(pair)?)
        }
        TeeCommand::Sign { store, index, data } => {
            let manager = open_manager(store, config)?;
            let data = decode_hex(data, "data")?;
            let signature = manager.sign_transaction(*index, &data)?;
            Ok(json!({
                "index": index,
                "public_key": hex::encode(manager.tee_public_key(*index)?),
                "signature": hex::encode(signature),
            }))
        }
        TeeCommand::Attest { store, data } => {
            let manager = open_manager(store, config)?;
            let data = decode_hex(data, "data")?;
            let attestation = manager.sign_attestation(&data)?;
            Ok(json!({
                "public_key": hex::encode(manager.attestation_public_key()?),
                "signature": attestation.signature,
                "timestamp": attestation.timestamp,
            }))
        }
    }
}

fn run_master(command: &MasterCommand) -> Result<Value> {
    match command {
        MasterCommand::Pubkey { seed, index } => {
            let provider = master_provider(seed)?;
            let public_key = provider.master_public_key(*index)?;
            Ok(json!({
                "index": index,
                "public_key": hex::encode(public_key),
            }))
        }
        MasterCommand::ChainKey { seed, output } => {
            let seed = Zeroizing::new(decode_hex(seed, "seed")?);
            let chain_key = ExtendedKey::from_seed(&seed)?
                .derive_path(mixer_chain_path())?
                .neuter();
            let export = ChainKeyExport::from_key(&chain_key);
            let value = serde_json::to_value(&export)?;

            if let Some(path) = output {
                std::fs::write(path, serde_json::to_vec_pretty(&export)?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(target: "neo::cli", path = %path.display(), "chain key exported");
            }
            Ok(value)
        }
        MasterCommand::Sign { seed, index, data } => {
            let provider = master_provider(seed)?;
            let data = decode_hex(data, "data")?;
            let signature = provider.sign_with_master(*index, &data)?;
            Ok(json!({
                "index": index,
                "public_key": hex::encode(provider.master_public_key(*index)?),
                "signature": hex::encode(signature),
            }))
        }
    }
}

fn master_provider(seed_hex: &str) -> Result<HdMasterKeyProvider> {
    let seed = Zeroizing::new(decode_hex(seed_hex, "seed")?);
    Ok(HdMasterKeyProvider::from_seed(&seed)?)
}

fn run_pool(command: &PoolCommand) -> Result<Value> {
    match command {
        PoolCommand::Compose {
            index,
            tee_key,
            master_key,
        } => {
            let tee_key = decode_public_key(tee_key, "TEE key")?;
            let master_key = decode_hex(master_key, "master key")?;
            let pair = compose_pool_key_pair(*index, &tee_key, &master_key)?;
            Ok(serde_json::to_value(pair)?)
        }
        PoolCommand::Verify {
            address,
            tee_key,
            master_key,
        } => {
            let keys = [
                decode_hex(tee_key, "TEE key")?,
                decode_hex(master_key, "master key")?,
            ];
            let valid = verify_multisig_address(address, 1, &keys);
            let expected = create_1of2_multisig(&keys[0], &keys[1])
                .map(|account| account.address().to_string())
                .ok();
            Ok(json!({
                "address": address,
                "valid": valid,
                "expected": expected,
            }))
        }
        PoolCommand::Address { key } => {
            let key = decode_public_key(key, "public key")?;
            Ok(json!({
                "public_key": hex::encode(key),
                "address": public_key_to_address(&key),
            }))
        }
        PoolCommand::CheckSig {
            key,
            data,
            signature,
        } => {
            let key = decode_hex(key, "public key")?;
            let data = decode_hex(data, "data")?;
            let signature = decode_hex(signature, "signature")?;
            Ok(json!({ "valid": verify_signature(&key, &data, &signature)? }))
        }
    }
}

fn decode_hex(value: &str, what: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if trimmed.is_empty() {
        bail!("{what} is empty");
    }
    hex::decode(trimmed).with_context(|| format!("{what} is not valid hex"))
}

fn decode_public_key(value: &str, what: &str) -> Result<[u8; PUBLIC_KEY_SIZE]> {
    let bytes = decode_hex(value, what)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("{what} must be {PUBLIC_KEY_SIZE} bytes, got {len}"))
}
