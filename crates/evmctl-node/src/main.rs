//! evmctl-node — in-memory development node.
//!
//! Serves the `evm_*` control methods plus the handful of `eth_*` queries
//! needed to observe them, so the control bridge can be exercised without an
//! external test chain. State lives in memory and is gone on exit.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use evmctl_rpc::{NodeConfig, RpcServer, RpcServerState};

#[derive(Parser, Debug)]
#[command(
    name = "evmctl-node",
    version,
    about = "In-memory EVM development node with snapshot, revert and time travel"
)]
struct Args {
    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Genesis block timestamp (Unix seconds). Defaults to now.
    #[arg(long)]
    genesis_timestamp: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,evmctl=debug")),
        )
        .init();

    let args = Args::parse();
    info!("evmctl node starting");

    let config = NodeConfig {
        genesis_timestamp: args.genesis_timestamp,
        ..NodeConfig::default()
    };
    let state = Arc::new(RpcServerState::new(&config));
    let (addr, handle) = RpcServer::new(state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(%addr, version = %config.client_version, "node ready");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;

    info!("shutting down");
    handle.stop().context("stopping RPC server")?;
    handle.stopped().await;
    Ok(())
}
