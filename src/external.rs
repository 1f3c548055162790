//! Boundary traits for systems this crate observes but does not own: a
//! distributed cache/lock, the chain RPC endpoint, and the two metadata
//! feeds (token registry, USD reference prices).
//!
//! Grounded in `services/tokens.py`/`services/prices.py` for the shape of
//! the metadata fetches, and in the teacher's `async-trait`-based
//! boundary pattern (no concrete network client lives in this crate; a
//! binary wires a real implementation in, these traits only pin the
//! contract). In-memory implementations are provided for tests.

use async_trait::async_trait;

use crate::types::Token;

/// Distributed key-value cache plus a mutual-exclusion lease, used for the
/// route/evaluation short-TTL caches and the sync worker's cross-instance
/// lock, mirroring `redis_utils.py`'s `get`/`setex`/distributed lock.
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn setex(&self, key: &str, value: String, ttl_secs: u64);
    /// Acquire a named lease for `ttl_secs`; `Ok(true)` means the caller now
    /// holds it, `Ok(false)` means someone else does.
    async fn lock(&self, key: &str, ttl_secs: u64) -> bool;
    async fn unlock(&self, key: &str);
}

/// Read-only view onto the chain, used by the sync worker to pull reserves
/// and by the evaluator's online escape hatch (`evaluate_online`) to
/// re-quote a single hop against live state when the cached snapshot is
/// suspected stale.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn sc_query(&self, sc_address: &str, function: &str, args: &[String]) -> anyhow::Result<Vec<Vec<u8>>>;
}

/// Lazily-fetched token metadata (decimals, ticker, name), matching
/// `services/tokens.py::get_token`.
#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn get_token(&self, identifier: &str) -> anyhow::Result<Option<Token>>;
}

/// The two USD reference prices (`services/prices.py`) used only for
/// reporting fields (`Token.usd_price`), never as a routing or ranking
/// input.
#[async_trait]
pub trait UsdPriceOracle: Send + Sync {
    async fn usd_price(&self, token_identifier: &str) -> anyhow::Result<Option<f64>>;
}
