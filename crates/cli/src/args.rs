//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "neo-mixer",
    version,
    about = "Neo N3 mixer pool key tooling (TEE manager and offline Master signer)"
)]
pub struct CliArgs {
    /// Path to the TEE manager TOML configuration.
    #[arg(short, long, global = true, env = "NEO_MIXER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// TEE manager operations backed by a recovery store.
    #[command(subcommand)]
    Tee(TeeCommand),

    /// Offline Master signer operations.
    #[command(subcommand)]
    Master(MasterCommand),

    /// Pool account composition and checks.
    #[command(subcommand)]
    Pool(PoolCommand),
}

/// Recovery store and sealing key shared by every TEE command.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Recovery store file holding the sealed seed and pool counter.
    #[arg(long, env = "NEO_MIXER_STORE", value_name = "PATH")]
    pub store: PathBuf,

    /// 32-byte AES-256-GCM sealing key (hex). Without it the seed is stored unsealed.
    #[arg(long, env = "NEO_MIXER_SEALING_KEY", value_name = "HEX", hide_env_values = true)]
    pub sealing_key: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TeeCommand {
    /// Creates the recovery store with a fresh root seed, or opens an existing one.
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Allocates the next pool index and prints its 1-of-2 account.
    Mint {
        #[command(flatten)]
        store: StoreArgs,

        /// Chain-level Master key exported by `master chain-key`.
        #[arg(long, value_name = "PATH")]
        master_chain_key: PathBuf,
    },

    /// Prints the pool account for an index without advancing the counter.
    Derive {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long)]
        index: u32,

        /// Compressed Master public key for the index (hex).
        #[arg(long, value_name = "HEX")]
        master_key: String,
    },

    /// Signs a transaction with the TEE key at an index.
    Sign {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long)]
        index: u32,

        /// Transaction bytes (hex).
        #[arg(long, value_name = "HEX")]
        data: String,
    },

    /// Produces a timestamped attestation over data.
    Attest {
        #[command(flatten)]
        store: StoreArgs,

        /// Attested bytes (hex).
        #[arg(long, value_name = "HEX")]
        data: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MasterCommand {
    /// Prints the Master public key at a pool index.
    Pubkey {
        /// Master root seed (hex).
        #[arg(long, env = "NEO_MIXER_MASTER_SEED", value_name = "HEX", hide_env_values = true)]
        seed: String,

        #[arg(long)]
        index: u32,
    },

    /// Exports the chain-level extended public key `m/44'/888'/0'/0`.
    ChainKey {
        /// Master root seed (hex).
        #[arg(long, env = "NEO_MIXER_MASTER_SEED", value_name = "HEX", hide_env_values = true)]
        seed: String,

        /// Writes the export to a file instead of stdout.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Signs a transaction with the Master key at an index.
    Sign {
        /// Master root seed (hex).
        #[arg(long, env = "NEO_MIXER_MASTER_SEED", value_name = "HEX", hide_env_values = true)]
        seed: String,

        #[arg(long)]
        index: u32,

        /// Transaction bytes (hex).
        #[arg(long, value_name = "HEX")]
        data: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PoolCommand {
    /// Builds the 1-of-2 account for a TEE key and a Master key.
    Compose {
        #[arg(long)]
        index: u32,

        #[arg(long, value_name = "HEX")]
        tee_key: String,

        #[arg(long, value_name = "HEX")]
        master_key: String,
    },

    /// Checks that an address is the 1-of-2 account of two keys.
    Verify {
        #[arg(long)]
        address: String,

        #[arg(long, value_name = "HEX")]
        tee_key: String,

        #[arg(long, value_name = "HEX")]
        master_key: String,
    },

    /// Prints the single-signature address of a public key.
    Address {
        #[arg(long, value_name = "HEX")]
        key: String,
    },

    /// Checks a signature against a public key.
    CheckSig {
        #[arg(long, value_name = "HEX")]
        key: String,

        /// Signed bytes (hex).
        #[arg(long, value_name = "HEX")]
        data: String,

        #[arg(long, value_name = "HEX")]
        signature: String,
    },
}
