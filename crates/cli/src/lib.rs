//! Neo Mixer CLI
//!
//! Operator tooling for the two halves of the pool key scheme: the TEE
//! host (`tee`), the offline Master signer (`master`) and account checks
//! that need neither seed (`pool`).

pub mod args;
pub mod commands;

pub use args::CliArgs;
pub use commands::{run, ChainKeyExport};
