//! Process-wide pool/token/rate snapshot.
//!
//! Grounded in the teacher's `pool/state.rs` (`PoolStateManager`, a
//! `DashMap`-backed concurrent store) generalized per spec §5/§9's
//! "process-wide snapshot state" note: the sync worker is the sole writer
//! and publishes a whole new immutable [`Snapshot`] each cycle rather than
//! mutating pools in place, so a reader's view of the world never changes
//! mid-evaluation. Readers pay one short read-lock to clone an `Arc` and
//! then work against an immutable snapshot with no lock held.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::pricing::PoolModel;
use crate::types::{SwapPool, Token};

/// One immutable view of every known pool, token and venue edge, published
/// atomically by the sync worker.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tokens: HashMap<String, Token>,
    pub pools: Vec<SwapPool>,
    pub models: HashMap<u64, PoolModel>,
    /// Maps a pool's identity (by `sc_address` + `tokens_in`, hashed via
    /// index into `pools`) to its model — index-aligned with `pools`.
    pub model_by_pool_index: Vec<u64>,
    pub synced_at_unix: i64,
    pub sync_cycle: u64,
}

impl Snapshot {
    pub fn model_for_pool(&self, pool_index: usize) -> Option<&PoolModel> {
        let key = self.model_by_pool_index.get(pool_index)?;
        self.models.get(key)
    }

    pub fn token(&self, identifier: &str) -> Option<&Token> {
        self.tokens.get(identifier)
    }
}

/// Single-writer/multi-reader publication point for [`Snapshot`].
///
/// Readers never hold the lock across solver work: [`PoolStore::current`]
/// clones the `Arc` under the read lock and returns immediately.
#[derive(Debug, Clone)]
pub struct PoolStore {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl PoolStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(Snapshot::default()))),
        }
    }

    /// Returns `None` until the sync worker has published at least once,
    /// the condition the query service's `ready()` check surfaces as
    /// `QueryError::NotReady`.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        let snapshot = self.inner.read().expect("pool store lock poisoned").clone();
        if snapshot.sync_cycle == 0 {
            None
        } else {
            Some(snapshot)
        }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let mut guard = self.inner.write().expect("pool store lock poisoned");
        *guard = Arc::new(snapshot);
    }
}

impl Default for PoolStore {
    fn default() -> Self {
        Self::new()
    }
}
