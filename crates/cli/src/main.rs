use anyhow::Result;
use clap::Parser;
use neo_mixer_cli::{run, CliArgs};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let output = run(&args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,neo=info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
