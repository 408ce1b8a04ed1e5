use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod script;
mod session;

use config::load_settings;
use script::Script;

/// Replays a scripted touch session through the gesture core and prints every
/// core event, the final poses and any dropped input as JSON lines.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Session script (JSON, or TOML when the extension is `.toml`).
    script: PathBuf,
    /// Gesture configuration; `gesture.toml` in the working directory is used
    /// when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    let script = Script::from_path(&cli.script)?;
    let lines = session::run(&script, &settings)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in &lines {
        serde_json::to_writer(&mut out, line)?;
        writeln!(out)?;
    }
    info!(lines = lines.len(), "replay finished");
    Ok(())
}
