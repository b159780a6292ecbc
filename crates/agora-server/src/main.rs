//! Board module entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use agora_server::{Server, Settings};

#[derive(Parser)]
#[command(name = "agora-server", about = "Agora board module")]
struct Args {
    /// Path of the settings file.
    #[arg(long, default_value = "agora.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "agora_server=info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::load(&args.config)?;

    let server = Server::start(settings).await?;
    tokio::signal::ctrl_c().await?;
    server.stop().await;
    Ok(())
}
