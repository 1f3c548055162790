//! Route evaluation: walking a route's pricing models for a fixed input
//! (or fixed output) amount.
//!
//! Grounded in `services/evaluations.py` (`evaluate`, `evaluate_online`)
//! across both the `jex_dex_aggregator_api` and `opendex_aggregator_api`
//! sources. `fee_amount`/`fee_token` report only the aggregator's own flat
//! fee (`AGGREGATOR_FEE_TOKEN`/`AGGREGATOR_FEE_NUMERATOR`), not a pool's
//! internal swap fee — a hop's `quote_out` already nets its own fee out of
//! `net_out` before this walk ever sees it. Reserve mutation happens on a
//! per-evaluation deep copy of each hop's pricing model (never the shared
//! snapshot), so two concurrent evaluations of routes sharing a pool never
//! observe each other's hypothetical state.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::EvaluationError;
use crate::external::RpcClient;
use crate::pricing::PricingModel;
use crate::store::Snapshot;
use crate::types::{SwapEvaluation, SwapRoute};

/// The wrapped-native identifier the aggregator levies its own fee in,
/// per `services/tokens.py::WEGLD_IDENTIFIER`.
const AGGREGATOR_FEE_TOKEN: &str = "WEGLD-bd4d79";
const AGGREGATOR_FEE_NUMERATOR: i64 = 50;
const AGGREGATOR_FEE_DENOMINATOR: i64 = 100_000;

fn aggregator_fee(amount: &BigInt) -> BigInt {
    (amount * AGGREGATOR_FEE_NUMERATOR) / AGGREGATOR_FEE_DENOMINATOR
}

fn pool_index(snapshot: &Snapshot, route: &SwapRoute, hop_idx: usize) -> Option<usize> {
    let pool = &route.hops[hop_idx].pool;
    snapshot.pools.iter().position(|p| p == pool)
}

/// Fixed-input walk: push `amount_in` of `route.token_in` through every
/// hop in order. The aggregator fee is levied once, on the first hop whose
/// `token_in` is the fee token; if no hop matches, it is levied on the
/// final output instead (the governing spec's stated fallback — the
/// sources themselves have this branch dead behind a `fee_amount is None`
/// check that an `int` initial value of `0` never satisfies).
pub fn evaluate(snapshot: &Snapshot, route: &SwapRoute, amount_in: &BigInt) -> Result<SwapEvaluation, EvaluationError> {
    let mut current = amount_in.clone();
    let mut theoretical = amount_in.clone();
    let mut total_gas = 0u64;
    let mut fee_amount = BigInt::zero();
    let mut fee_token: Option<String> = None;

    for (i, hop) in route.hops.iter().enumerate() {
        if i == 0 && hop.token_in != route.token_in {
            return Err(EvaluationError::BrokenChain {
                expected: route.token_in.clone(),
                actual: hop.token_in.clone(),
            });
        }
        if i > 0 && hop.token_in != route.hops[i - 1].token_out {
            return Err(EvaluationError::BrokenChain {
                expected: route.hops[i - 1].token_out.clone(),
                actual: hop.token_in.clone(),
            });
        }

        if fee_token.is_none() && hop.token_in == AGGREGATOR_FEE_TOKEN {
            let fee = aggregator_fee(&current);
            current -= &fee;
            theoretical -= &fee;
            fee_amount = fee;
            fee_token = Some(hop.token_in.clone());
        }

        let idx = pool_index(snapshot, route, i).ok_or_else(|| EvaluationError::BrokenChain {
            expected: hop.pool.name.clone(),
            actual: "<pool not in snapshot>".to_string(),
        })?;
        let model = snapshot
            .model_for_pool(idx)
            .ok_or_else(|| EvaluationError::ExternalFailure(format!("no pricing model for pool {}", hop.pool.name)))?;

        let token_in = snapshot
            .token(&hop.token_in)
            .ok_or_else(|| EvaluationError::ExternalFailure(format!("unknown token {}", hop.token_in)))?;
        let token_out = snapshot
            .token(&hop.token_out)
            .ok_or_else(|| EvaluationError::ExternalFailure(format!("unknown token {}", hop.token_out)))?;

        let (net_out, _admin_fee_in, _admin_fee_out) = model.quote_out(token_in, &current, token_out)?;
        theoretical = model.theoretical_out(token_in, &theoretical, token_out)?;

        total_gas += model.gas_estimate();
        current = net_out;
    }

    if fee_token.is_none() {
        let fee = aggregator_fee(&current);
        current -= &fee;
        fee_amount = fee;
        fee_token = Some(route.token_out.clone());
    }

    Ok(SwapEvaluation {
        amount_in: amount_in.clone(),
        estimated_gas: total_gas,
        fee_amount,
        fee_token,
        net_amount_out: current,
        route: route.clone(),
        theoretical_amount_out: theoretical,
    })
}

/// Fixed-output dual: walk the route backwards, asking each hop how much
/// input it needs to produce the required output. The governing spec has
/// no direct source grounding for this direction (the sources only
/// implement the forward walk); it mirrors `evaluate`'s aggregator-fee
/// placement, applying the fee against the route's final output token
/// first (per "applied on the output side first") before falling back to
/// the route's input token if no hop's `token_out` is the fee token.
pub fn evaluate_for_output(snapshot: &Snapshot, route: &SwapRoute, amount_out: &BigInt) -> Result<SwapEvaluation, EvaluationError> {
    let mut fee_amount = BigInt::zero();
    let mut fee_token: Option<String> = None;
    let mut current_out = amount_out.clone();

    if route.token_out == AGGREGATOR_FEE_TOKEN {
        fee_amount = aggregator_fee(&current_out);
        fee_token = Some(route.token_out.clone());
        current_out += &fee_amount;
    }

    let mut total_gas = 0u64;

    for (rev_i, hop) in route.hops.iter().enumerate().rev() {
        let idx = pool_index(snapshot, route, rev_i).ok_or_else(|| EvaluationError::BrokenChain {
            expected: hop.pool.name.clone(),
            actual: "<pool not in snapshot>".to_string(),
        })?;
        let model = snapshot
            .model_for_pool(idx)
            .ok_or_else(|| EvaluationError::ExternalFailure(format!("no pricing model for pool {}", hop.pool.name)))?;

        let token_in = snapshot
            .token(&hop.token_in)
            .ok_or_else(|| EvaluationError::ExternalFailure(format!("unknown token {}", hop.token_in)))?;
        let token_out = snapshot
            .token(&hop.token_out)
            .ok_or_else(|| EvaluationError::ExternalFailure(format!("unknown token {}", hop.token_out)))?;

        let (required_in, _admin_fee_in, _admin_fee_out) = model.quote_in(token_out, &current_out, token_in)?;
        total_gas += model.gas_estimate();
        current_out = required_in;
    }

    if fee_token.is_none() {
        fee_amount = aggregator_fee(&current_out);
        fee_token = Some(route.token_in.clone());
        current_out += &fee_amount;
    }

    Ok(SwapEvaluation {
        amount_in: current_out,
        estimated_gas: total_gas,
        fee_amount,
        fee_token,
        net_amount_out: amount_out.clone(),
        route: route.clone(),
        theoretical_amount_out: amount_out.clone(),
    })
}

/// Escape hatch for when the cached snapshot is suspected stale: re-quote
/// every hop against the chain directly instead of the local model,
/// trading latency for freshness. Grounded in `evaluate_online`.
pub async fn evaluate_online(rpc: &dyn RpcClient, route: &SwapRoute, amount_in: &BigInt) -> Result<SwapEvaluation, EvaluationError> {
    let mut current = amount_in.clone();
    let mut total_gas = 0u64;

    for hop in &route.hops {
        let args = vec![hop.token_in.clone(), current.to_string()];
        let response = rpc
            .sc_query(&hop.pool.sc_address.to_hex(), "getAmountOut", &args)
            .await
            .map_err(|e| EvaluationError::ExternalFailure(e.to_string()))?;
        let raw = response
            .first()
            .ok_or_else(|| EvaluationError::ExternalFailure("empty sc_query response".to_string()))?;
        current = BigInt::from_bytes_be(num_bigint::Sign::Plus, raw);
        total_gas += hop.pool.sc_type.base_gas_estimate();
    }

    Ok(SwapEvaluation {
        amount_in: amount_in.clone(),
        estimated_gas: total_gas,
        fee_amount: BigInt::zero(),
        fee_token: None,
        net_amount_out: current.clone(),
        route: route.clone(),
        theoretical_amount_out: current,
    })
}
