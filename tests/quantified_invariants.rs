//! Property-based checks for the quantified invariants.
//!
//! Each property below matches one numbered invariant: monotonicity, fee
//! bound, round-trip, invariant preservation, curve convergence, split
//! never worse, route validity, disjointness, serialization round-trip.
//! Fixed-vector scenarios (S1-S7) live as unit tests next to the pricing
//! model they exercise instead of here.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use proptest::prelude::*;

use dex_aggregator_core::bigmath::curve;
use dex_aggregator_core::pricing::{ConstantProductCore, PoolModel, PricingModel};
use dex_aggregator_core::router::find_routes;
use dex_aggregator_core::store::Snapshot;
use dex_aggregator_core::types::{ScType, SwapHop, SwapPool, Token, VenueAddress};
use dex_aggregator_core::wire::{WireHop, WireRoute};

fn core_pool(reserve_in: u64, reserve_out: u64, fee_bps: u64) -> ConstantProductCore {
    ConstantProductCore {
        source: "xexchange",
        sc_address: VenueAddress([1; 32]),
        first_token: "IN".into(),
        first_reserves: BigInt::from(reserve_in),
        second_token: "OUT".into(),
        second_reserves: BigInt::from(reserve_out),
        lp_token_id: None,
        lp_token_supply: BigInt::zero(),
        total_fee_bps: fee_bps,
        fee_denominator: 10_000,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// 1. `quote_out.net_out` is non-decreasing in `amount_in`, up to the
    /// output reserve bound.
    #[test]
    fn monotonicity_in_amount_in(
        reserve_in in 1_000_000u64..1_000_000_000_000u64,
        reserve_out in 1_000_000u64..1_000_000_000_000u64,
        fee_bps in 0u64..500u64,
        a1 in 1u64..1_000_000_000u64,
        delta in 0u64..1_000_000_000u64,
    ) {
        let pool = core_pool(reserve_in, reserve_out, fee_bps);
        let token_in = Token::new("IN", 18);
        let token_out = Token::new("OUT", 18);

        let a1 = BigInt::from(a1);
        let a2 = &a1 + BigInt::from(delta);

        let out1 = pool.quote_out(&token_in, &a1, &token_out);
        let out2 = pool.quote_out(&token_in, &a2, &token_out);

        if let (Ok((net1, _, _)), Ok((net2, _, _))) = (out1, out2) {
            prop_assert!(net2 >= net1);
        }
    }

    /// 2. `quote_out.net_out <= theoretical_out` for the same fee parameters.
    #[test]
    fn fee_bound_holds(
        reserve_in in 1_000_000u64..1_000_000_000_000u64,
        reserve_out in 1_000_000u64..1_000_000_000_000u64,
        fee_bps in 0u64..500u64,
        amount_in in 1u64..1_000_000_000u64,
    ) {
        let pool = core_pool(reserve_in, reserve_out, fee_bps);
        let token_in = Token::new("IN", 18);
        let token_out = Token::new("OUT", 18);
        let amount_in = BigInt::from(amount_in);

        if let (Ok((net_out, _, _)), Ok(theoretical)) = (
            pool.quote_out(&token_in, &amount_in, &token_out),
            pool.theoretical_out(&token_in, &amount_in, &token_out),
        ) {
            prop_assert!(net_out <= theoretical);
        }
    }

    /// 3. Round-trip through `raw_amount_out`/`raw_amount_in` recovers the
    /// original input to within one unit (ceiling-division rounding).
    #[test]
    fn round_trip_within_one_unit(
        reserve_in in 1_000_000u64..1_000_000_000_000u64,
        reserve_out in 1_000_000u64..1_000_000_000_000u64,
        amount_in in 1u64..1_000_000_000u64,
    ) {
        let pool = core_pool(reserve_in, reserve_out, 0);
        let amount_in = BigInt::from(amount_in);

        if let Ok(out) = pool.raw_amount_out("IN", &amount_in, "OUT") {
            if !out.is_zero() {
                let recovered = pool.raw_amount_in("OUT", &out, "IN").unwrap();
                prop_assert!((&recovered - &amount_in).abs() <= BigInt::from(1));
            }
        }
    }

    /// 4. `update_reserves` after a `quote_out` never shrinks the
    /// constant-product invariant (fees can only grow it, modulo floor
    /// rounding).
    #[test]
    fn invariant_preservation_after_update(
        reserve_in in 1_000_000u64..1_000_000_000_000u64,
        reserve_out in 1_000_000u64..1_000_000_000_000u64,
        fee_bps in 0u64..500u64,
        amount_in in 1u64..1_000_000_000u64,
    ) {
        let mut pool = core_pool(reserve_in, reserve_out, fee_bps);
        let token_in = Token::new("IN", 18);
        let token_out = Token::new("OUT", 18);
        let amount_in = BigInt::from(amount_in);

        let before = BigInt::from(reserve_in) * BigInt::from(reserve_out);

        if let Ok((net_out, fee_in, fee_out)) = pool.quote_out(&token_in, &amount_in, &token_out) {
            let amount_in_net = &amount_in - &fee_in;
            let amount_out_plus_admin = &net_out + &fee_out;
            pool.update_reserves(&token_in, &amount_in_net, &token_out, &amount_out_plus_admin);

            let after = &pool.first_reserves * &pool.second_reserves;
            prop_assert!(after >= before);
        }
    }

    /// 5. `D(A, x[])` converges within 128 iterations whenever the balances
    /// are within a 10^6 ratio of each other and `A` is in range.
    #[test]
    fn curve_d_converges(
        base in 1_000_000u64..1_000_000_000_000u64,
        ratios in prop::collection::vec(1u64..1_000_000u64, 2..5),
        amp in 1i64..1_048_576i64,
    ) {
        let amounts: Vec<BigInt> = ratios.iter().map(|r| BigInt::from(base) * BigInt::from(*r)).collect();
        prop_assert!(curve::d(&BigInt::from(amp), &amounts).is_ok());
    }

    /// 9. A `WireRoute` round-trips through `serialize`/`deserialize`
    /// exactly, and the encoded length matches the closed-form formula.
    #[test]
    fn wire_route_round_trips(
        token_in in "[A-Za-z0-9]{1,12}",
        hop_tokens in prop::collection::vec("[A-Za-z0-9]{1,12}", 0..5),
        addr_seed in prop::array::uniform32(any::<u8>()),
    ) {
        let hops: Vec<WireHop> = hop_tokens
            .into_iter()
            .enumerate()
            .map(|(i, token_out)| {
                let mut addr = addr_seed;
                addr[0] = addr[0].wrapping_add(i as u8);
                WireHop {
                    sc_address: VenueAddress(addr),
                    sc_type: ScType::ALL[i % ScType::ALL.len()],
                    token_out,
                }
            })
            .collect();
        let wire = WireRoute { token_in, hops };

        let bytes = wire.serialize();
        prop_assert_eq!(bytes.len(), wire.expected_len());

        let decoded = WireRoute::deserialize(&bytes).unwrap();
        prop_assert_eq!(decoded, wire);
    }
}

/// 7. Route validity: every route `find_routes` returns chains
/// `token_in -> ... -> token_out` through hops that actually exist on the
/// snapshot, and never exceeds the requested hop bound.
#[test]
fn route_validity_over_a_random_chain_graph() {
    fn graph_snapshot(n: usize) -> Snapshot {
        let ids: Vec<String> = (0..n).map(|i| format!("T{i}")).collect();
        let mut tokens = HashMap::new();
        for id in &ids {
            tokens.insert(id.clone(), Token::new(id, 18));
        }
        let mut pools = Vec::new();
        for i in 0..n - 1 {
            pools.push(SwapPool {
                name: format!("pool-{i}"),
                sc_address: VenueAddress([i as u8 + 1; 32]),
                tokens_in: vec![ids[i].clone()],
                tokens_out: vec![ids[i + 1].clone()],
                sc_type: ScType::XExchange,
            });
        }
        Snapshot {
            tokens,
            pools,
            ..Default::default()
        }
    }

    for n in 2..6 {
        let snapshot = graph_snapshot(n);
        for max_hops in 1..=4u32 {
            let routes = find_routes(&snapshot, "T0", &format!("T{}", n - 1), max_hops).unwrap();
            for route in &routes {
                assert!(route.hops.len() as u32 <= max_hops);
                assert_eq!(route.hops[0].token_in, route.token_in);
                assert_eq!(route.hops.last().unwrap().token_out, route.token_out);
                for w in route.hops.windows(2) {
                    assert_eq!(w[0].token_out, w[1].token_in);
                }
            }
        }
    }
}

/// 6 & 8. When the split optimizer reports a result, it beats the best
/// single-route evaluation and every pair of chosen routes is disjoint.
#[test]
fn split_never_worse_and_disjoint() {
    use dex_aggregator_core::evaluator::evaluate;
    use dex_aggregator_core::optimizer::find_best_split;

    let reserve_pairs = [(50_000_000_000u64, 50_000_000_000u64), (10_000_000_000u64, 9_000_000_000u64), (80_000_000_000u64, 95_000_000_000u64)];

    let mut tokens = HashMap::new();
    tokens.insert("A".to_string(), Token::new("A", 18));
    tokens.insert("B".to_string(), Token::new("B", 18));

    let mut pools = Vec::new();
    let mut models = HashMap::new();
    let mut model_by_pool_index = Vec::new();
    let mut routes = Vec::new();

    for (i, (r_in, r_out)) in reserve_pairs.iter().enumerate() {
        let pool = SwapPool {
            name: format!("venue-{i}"),
            sc_address: VenueAddress([i as u8 + 1; 32]),
            tokens_in: vec!["A".into()],
            tokens_out: vec!["B".into()],
            sc_type: ScType::XExchange,
        };
        let hop = SwapHop {
            pool: pool.clone(),
            token_in: "A".into(),
            token_out: "B".into(),
        };
        routes.push(dex_aggregator_core::types::SwapRoute::new("A", "B", vec![hop]));
        models.insert(i as u64, PoolModel::ConstantProduct(core_pool(*r_in, *r_out, 30)));
        model_by_pool_index.push(i as u64);
        pools.push(pool);
    }

    let snapshot = Snapshot {
        tokens,
        pools,
        models,
        model_by_pool_index,
        synced_at_unix: 0,
        sync_cycle: 1,
    };

    let amount = BigInt::from(5_000_000_000i64);
    let best_single = routes
        .iter()
        .map(|r| evaluate(&snapshot, r, &amount).unwrap().net_amount_out)
        .max()
        .unwrap();

    if let Some(split) = find_best_split(&snapshot, &routes, &amount).unwrap() {
        assert!(split.net_amount_out > best_single);
        for i in 0..split.evaluations.len() {
            for j in (i + 1)..split.evaluations.len() {
                assert!(split.evaluations[i].route.is_disjoint(&split.evaluations[j].route));
            }
        }
    }
}
