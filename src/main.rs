//! Aggregator core entry point: loads configuration, brings up the pool
//! store, and (unless `NO_TASKS` is set) starts the sync worker.
//!
//! This binary wires no concrete `RpcClient`/`KvCache`/venue-family sync
//! implementations — those talk to the live chain and a real cache, and
//! belong to the deployment that embeds this crate. What ships here is
//! the pricing, routing and evaluation engine plus the `QueryService`
//! façade; a production binary swaps in real implementations of the
//! traits in `external.rs` and `sync::VenueFamilySync`.

use anyhow::Result;
use tracing::{info, warn, Level};

use dex_aggregator_core::config::load_config;
use dex_aggregator_core::query::QueryService;
use dex_aggregator_core::store::PoolStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).with_target(false).init();

    let config = load_config()?;
    info!(gateway = %config.gateway_url, no_tasks = config.no_tasks, "aggregator core starting");

    let store = PoolStore::new();
    let query_service = QueryService::new(store.clone());

    if config.no_tasks {
        info!("NO_TASKS set, running as a read-only replica with no sync worker");
    } else {
        warn!("no venue family sync implementations are wired into this binary; the pool store will stay empty until a deployment registers them");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut signals = signal_hook_tokio::Signals::new([signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM])?;
    let signal_handle = signals.handle();

    tokio::spawn(async move {
        use futures::stream::StreamExt;
        if signals.next().await.is_some() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let _ = query_service.ready();
    let mut shutdown_rx = shutdown_rx;
    shutdown_rx.changed().await.ok();

    signal_handle.close();
    info!("aggregator core stopped");
    Ok(())
}
