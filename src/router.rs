//! Route search over the bipartite token/venue graph.
//!
//! Grounded in `services/routes.py` (`find_routes`, `_find_routes_inner`,
//! `sort_routes`). Routes are found by depth-first walk bounded by
//! `max_hops`, never revisiting a token already on the path (cycles are
//! never useful: they can only add fees and slippage), and sorted with a
//! simple penalty that prefers fewer hops and penalizes going through a
//! wrapped/intermediate token more than once across the whole route set.

use crate::error::RouterError;
use crate::store::Snapshot;
use crate::types::{SwapHop, SwapPool, SwapRoute};

/// One token-in/token-out edge a pool can serve, with the pool it came
/// from — the unit the adjacency list is built from.
struct Edge<'a> {
    pool: &'a SwapPool,
    token_in: &'a str,
    token_out: &'a str,
}

fn edges_from_pool(pool: &SwapPool) -> Vec<Edge<'_>> {
    let mut out = Vec::new();
    for token_in in &pool.tokens_in {
        for token_out in &pool.tokens_out {
            if token_in != token_out {
                out.push(Edge { pool, token_in, token_out });
            }
        }
    }
    out
}

/// Depth-first search for every simple path (no repeated token) from
/// `token_in` to `token_out` of at most `max_hops` pool hops.
pub fn find_routes(snapshot: &Snapshot, token_in: &str, token_out: &str, max_hops: u32) -> Result<Vec<SwapRoute>, RouterError> {
    if !(1..=4).contains(&max_hops) {
        return Err(RouterError::InvalidMaxHops(max_hops));
    }
    if !snapshot.tokens.contains_key(token_in) {
        return Err(RouterError::UnknownToken(token_in.to_string()));
    }
    if !snapshot.tokens.contains_key(token_out) {
        return Err(RouterError::UnknownToken(token_out.to_string()));
    }

    let edges: Vec<Edge<'_>> = snapshot.pools.iter().flat_map(edges_from_pool).collect();

    let mut results = Vec::new();
    let mut visited_tokens = vec![token_in.to_string()];
    let mut path: Vec<SwapHop> = Vec::new();

    find_routes_inner(&edges, token_in, token_out, max_hops, &mut path, &mut visited_tokens, &mut results);

    let mut routes: Vec<SwapRoute> = results
        .into_iter()
        .map(|hops| SwapRoute::new(token_in, token_out, hops))
        .collect();
    sort_routes(&mut routes);
    Ok(routes)
}

fn find_routes_inner(
    edges: &[Edge<'_>],
    current_token: &str,
    target_token: &str,
    hops_remaining: u32,
    path: &mut Vec<SwapHop>,
    visited_tokens: &mut Vec<String>,
    results: &mut Vec<Vec<SwapHop>>,
) {
    if current_token == target_token && !path.is_empty() {
        results.push(path.clone());
        return;
    }
    if hops_remaining == 0 {
        return;
    }

    for edge in edges.iter().filter(|e| e.token_in == current_token) {
        if visited_tokens.iter().any(|t| t == edge.token_out) {
            continue;
        }
        path.push(SwapHop {
            pool: edge.pool.clone(),
            token_in: edge.token_in.to_string(),
            token_out: edge.token_out.to_string(),
        });
        visited_tokens.push(edge.token_out.to_string());

        find_routes_inner(edges, edge.token_out, target_token, hops_remaining - 1, path, visited_tokens, results);

        visited_tokens.pop();
        path.pop();
    }
}

/// Ascending by hop count, then by venue-family diversity (routes that
/// repeat a venue family score worse), stable otherwise so that equally
/// ranked routes keep their discovery order.
pub fn sort_routes(routes: &mut [SwapRoute]) {
    routes.sort_by_key(|r| (r.hops.len(), route_penalty(r)));
}

fn route_penalty(route: &SwapRoute) -> u32 {
    let mut seen = std::collections::HashSet::new();
    let mut penalty = 0u32;
    for hop in &route.hops {
        if !seen.insert(hop.pool.sc_type) {
            penalty += 1;
        }
    }
    penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScType, Token, VenueAddress};

    fn snapshot_with_path() -> Snapshot {
        let mut tokens = std::collections::HashMap::new();
        for id in ["A", "B", "C"] {
            tokens.insert(id.to_string(), Token::new(id, 18));
        }
        let pool_ab = SwapPool {
            name: "ab".into(),
            sc_address: VenueAddress([1; 32]),
            tokens_in: vec!["A".into()],
            tokens_out: vec!["B".into()],
            sc_type: ScType::XExchange,
        };
        let pool_bc = SwapPool {
            name: "bc".into(),
            sc_address: VenueAddress([2; 32]),
            tokens_in: vec!["B".into()],
            tokens_out: vec!["C".into()],
            sc_type: ScType::OneDex,
        };
        let pool_ac = SwapPool {
            name: "ac".into(),
            sc_address: VenueAddress([3; 32]),
            tokens_in: vec!["A".into()],
            tokens_out: vec!["C".into()],
            sc_type: ScType::VestaDex,
        };
        Snapshot {
            tokens,
            pools: vec![pool_ab, pool_bc, pool_ac],
            ..Default::default()
        }
    }

    #[test]
    fn finds_both_direct_and_multihop_routes() {
        let snapshot = snapshot_with_path();
        let routes = find_routes(&snapshot, "A", "C", 3).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].hops.len(), 1);
        assert_eq!(routes[1].hops.len(), 2);
    }

    #[test]
    fn rejects_unknown_token() {
        let snapshot = snapshot_with_path();
        let err = find_routes(&snapshot, "ZZZ", "C", 3).unwrap_err();
        assert!(matches!(err, RouterError::UnknownToken(_)));
    }

    #[test]
    fn rejects_out_of_range_max_hops() {
        let snapshot = snapshot_with_path();
        let err = find_routes(&snapshot, "A", "C", 0).unwrap_err();
        assert!(matches!(err, RouterError::InvalidMaxHops(0)));
    }
}
