//! mochi_agent: privileged host process for the Mochi UI.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mochi_agent::bridge::Bridge;
use mochi_agent::config::{parse_args, AgentConfig};
use mochi_agent::state::AppState;
use mochi_agent::ws::router;
use mochi_agent::VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(std::env::args()) {
        Ok(a) => a,
        Err(msg) if msg.starts_with("Usage:") => {
            println!("{msg}");
            return Ok(());
        }
        Err(msg) => bail!(msg),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AgentConfig::from_env(args.port);
    let state = AppState::new(&config).context("invalid command executor settings")?;
    let app = router(Bridge::new(state));

    // Loopback only
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(version = VERSION, addr = %listener.local_addr()?, "mochi_agent listening");

    axum::serve(listener, app).await?;
    Ok(())
}
