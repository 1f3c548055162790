//! Background sync worker: periodically refreshes pool reserves per venue
//! family and publishes a new [`crate::store::Snapshot`].
//!
//! Grounded in the teacher's `pool/syncer.rs` ("sync one source, write
//! into shared state", generalized from "one function per DEX" to "one
//! task per venue family") and `redis_utils.py`'s distributed lock, used
//! here so that only one process instance runs a sync cycle at a time
//! when several replicas share a `KvCache`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::error::SyncError;
use crate::external::KvCache;
use crate::pricing::PoolModel;
use crate::store::{PoolStore, Snapshot};
use crate::types::{SwapPool, Token};

const SYNC_LEASE_KEY: &str = "dex-aggregator:sync-lease";

/// One venue family's sync step: fetch current reserves and hand back the
/// pools/tokens/models it owns. Isolated per family so one venue's RPC
/// outage never blocks the others (`SyncError::Family` wraps the source
/// error for the caller's log line; the worker degrades to "skip this
/// family this cycle" rather than aborting the whole sync).
#[async_trait::async_trait]
pub trait VenueFamilySync: Send + Sync {
    fn name(&self) -> &'static str;
    async fn sync(&self) -> anyhow::Result<VenueFamilyState>;
}

#[derive(Debug, Clone, Default)]
pub struct VenueFamilyState {
    pub tokens: Vec<Token>,
    pub pools: Vec<SwapPool>,
    pub models: Vec<PoolModel>,
}

pub struct SyncWorker {
    store: PoolStore,
    families: Vec<Box<dyn VenueFamilySync>>,
    lease: Arc<dyn KvCache>,
    interval: Duration,
    lease_ttl_secs: u64,
}

impl SyncWorker {
    pub fn new(store: PoolStore, families: Vec<Box<dyn VenueFamilySync>>, lease: Arc<dyn KvCache>, interval: Duration, lease_ttl_secs: u64) -> Self {
        Self {
            store,
            families,
            lease,
            interval,
            lease_ttl_secs,
        }
    }

    /// Runs forever, one cycle per tick, until `shutdown` resolves.
    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        let mut cycle = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.lease.lock(SYNC_LEASE_KEY, self.lease_ttl_secs).await {
                        warn!("sync lease held by another instance, skipping cycle");
                        continue;
                    }
                    cycle += 1;
                    if let Err(err) = self.run_cycle(cycle).await {
                        error!(cycle, error = %err, "sync cycle failed");
                    }
                    self.lease.unlock(SYNC_LEASE_KEY).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("sync worker shutting down");
                        return;
                    }
                }
            }
        }
    }

    async fn run_cycle(&self, cycle: u64) -> Result<(), SyncError> {
        let results = join_all(self.families.iter().map(|family| async move {
            let state = family.sync().await;
            (family.name(), state)
        }))
        .await;

        let mut tokens: HashMap<String, Token> = HashMap::new();
        let mut pools = Vec::new();
        let mut models = HashMap::new();
        let mut model_by_pool_index = Vec::new();
        let mut any_succeeded = false;

        for (name, result) in results {
            match result {
                Ok(state) => {
                    any_succeeded = true;
                    for token in state.tokens {
                        tokens.insert(token.identifier.clone(), token);
                    }
                    for (pool, model) in state.pools.into_iter().zip(state.models.into_iter()) {
                        let idx = pools.len() as u64;
                        pools.push(pool);
                        models.insert(idx, model);
                        model_by_pool_index.push(idx);
                    }
                }
                Err(source) => {
                    error!(family = name, error = %source, "venue family sync failed");
                }
            }
        }

        if !any_succeeded {
            return Err(SyncError::Family {
                family: "all".to_string(),
                source: anyhow::anyhow!("every venue family failed this cycle"),
            });
        }

        self.store.publish(Snapshot {
            tokens,
            pools,
            models,
            model_by_pool_index,
            synced_at_unix: now_unix(),
            sync_cycle: cycle,
        });

        info!(cycle, "published new pool snapshot");
        Ok(())
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
