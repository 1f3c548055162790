//! Query service: the façade used by bin/main.rs (and, in production, an
//! HTTP layer this crate does not ship) to turn a token pair and amount
//! into routes and evaluations.
//!
//! Grounded in `routers/evaluations.py::do_evaluate` (route lookup →
//! capped concurrent evaluation → sort → optional dynamic routing),
//! `routers/routes.py`/`routers/tokens.py`, and `routers/multi_eval.py`.
//! The short-TTL route/evaluation caches are `dashmap`-backed per-key
//! locks gated by a `tokio::sync::Notify`, so concurrent requests for the
//! same `(token_in, token_out, max_hops)` triple compute once and the
//! rest wait on the first result instead of duplicating the route search.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use num_bigint::BigInt;
use tokio::sync::{Notify, RwLock};

use crate::error::QueryError;
use crate::evaluator::evaluate;
use crate::optimizer::find_best_split;
use crate::router::find_routes;
use crate::store::PoolStore;
use crate::types::{DynamicRoutingSwapEvaluation, SwapEvaluation, SwapRoute, Token};

const ROUTE_CACHE_TTL: Duration = Duration::from_secs(60);
const MAX_CONCURRENT_EVALUATIONS: usize = 16;

struct CacheSlot<V> {
    value: RwLock<Option<(V, Instant)>>,
    in_flight: AtomicBool,
    notify: Notify,
}

impl<V> CacheSlot<V> {
    fn new() -> Self {
        Self {
            value: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }
}

/// Read-through, thundering-herd-safe TTL cache keyed by an arbitrary
/// hashable key.
struct TtlCache<K, V> {
    slots: DashMap<K, Arc<CacheSlot<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    fn new(ttl: Duration) -> Self {
        Self { slots: DashMap::new(), ttl }
    }

    async fn get_or_compute<E>(
        &self,
        key: K,
        compute: impl std::future::Future<Output = Result<V, E>>,
    ) -> Result<V, E> {
        let slot = self.slots.entry(key).or_insert_with(|| Arc::new(CacheSlot::new())).clone();

        loop {
            {
                let guard = slot.value.read().await;
                if let Some((value, computed_at)) = guard.as_ref() {
                    if computed_at.elapsed() < self.ttl {
                        return Ok(value.clone());
                    }
                }
            }

            if slot.in_flight.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
                let result = compute.await;
                if let Ok(value) = &result {
                    *slot.value.write().await = Some((value.clone(), Instant::now()));
                }
                slot.in_flight.store(false, Ordering::SeqCst);
                slot.notify.notify_waiters();
                return result;
            }

            slot.notify.notified().await;
        }
    }
}

fn route_cache_key(token_in: &str, token_out: &str, max_hops: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    (token_in, token_out, max_hops).hash(&mut hasher);
    hasher.finish()
}

/// The outcome of [`QueryService::evaluate`]: a ranked list of single-route
/// evaluations, plus a split-route evaluation when spreading the input
/// across multiple routes beat the best single route.
pub struct EvaluateResult {
    pub routes: Vec<SwapEvaluation>,
    pub dynamic_routing: Option<DynamicRoutingSwapEvaluation>,
}

pub struct QueryService {
    store: PoolStore,
    route_cache: TtlCache<u64, Vec<SwapRoute>>,
}

impl QueryService {
    pub fn new(store: PoolStore) -> Self {
        Self {
            store,
            route_cache: TtlCache::new(ROUTE_CACHE_TTL),
        }
    }

    pub fn ready(&self) -> bool {
        self.store.current().is_some()
    }

    pub async fn routes(&self, token_in: &str, token_out: &str, max_hops: u32) -> Result<Vec<SwapRoute>, QueryError> {
        let snapshot = self.store.current().ok_or(QueryError::NotReady)?;
        let key = route_cache_key(token_in, token_out, max_hops);
        let (token_in, token_out) = (token_in.to_string(), token_out.to_string());
        self.route_cache
            .get_or_compute(key, async move { find_routes(&snapshot, &token_in, &token_out, max_hops) })
            .await
            .map_err(QueryError::from)
    }

    /// Evaluate a fixed input amount across every route found, ranked by
    /// net output, plus the split-route plan if it beats the best single
    /// route. Route-local failures are dropped silently; a request-wide
    /// failure (no routes found, no successful evaluation) is surfaced.
    pub async fn evaluate(&self, token_in: &str, token_out: &str, amount_in: &BigInt, max_hops: u32) -> Result<EvaluateResult, QueryError> {
        if amount_in <= &BigInt::from(0) {
            return Err(QueryError::InvalidInput("amount_in must be positive".into()));
        }

        let snapshot = self.store.current().ok_or(QueryError::NotReady)?;
        let routes = self.routes(token_in, token_out, max_hops).await?;
        if routes.is_empty() {
            return Ok(EvaluateResult { routes: vec![], dynamic_routing: None });
        }

        let mut evaluations = Vec::new();
        for chunk in routes.chunks(MAX_CONCURRENT_EVALUATIONS) {
            let futures = chunk.iter().map(|route| {
                let snapshot = snapshot.clone();
                let amount_in = amount_in.clone();
                async move { evaluate(&snapshot, route, &amount_in) }
            });
            evaluations.extend(join_all(futures).await.into_iter().filter_map(Result::ok));
        }

        evaluations.sort_by(|a, b| b.net_amount_out.cmp(&a.net_amount_out));

        let dynamic_routing = find_best_split(&snapshot, &routes, amount_in)
            .ok()
            .flatten()
            .filter(|split| evaluations.first().map(|best| split.net_amount_out > best.net_amount_out).unwrap_or(true));

        Ok(EvaluateResult { routes: evaluations, dynamic_routing })
    }

    /// Bounded batch of single-token evaluations against one shared
    /// `token_out`, per `routers/multi_eval.py`: each `(token_in,
    /// amount_in)` pair is evaluated independently and only its best route
    /// is kept.
    pub async fn multi_eval(&self, legs: &[(String, BigInt)], token_out: &str, max_hops: u32) -> Result<Vec<Option<SwapEvaluation>>, QueryError> {
        let mut results = Vec::with_capacity(legs.len());
        for chunk in legs.chunks(MAX_CONCURRENT_EVALUATIONS) {
            let futures = chunk.iter().map(|(token_in, amount_in)| async move {
                self.evaluate(token_in, token_out, amount_in, max_hops)
                    .await
                    .ok()
                    .and_then(|r| r.routes.into_iter().next())
            });
            results.extend(join_all(futures).await);
        }
        Ok(results)
    }

    pub fn tokens(&self) -> Result<Vec<Token>, QueryError> {
        let snapshot = self.store.current().ok_or(QueryError::NotReady)?;
        Ok(snapshot.tokens.values().cloned().collect::<Vec<_>>())
    }
}
