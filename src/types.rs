//! Core data model: tokens, venue/pool edge descriptors, routes and
//! evaluation results.
//!
//! Grounded in `opendex_aggregator_api/data/model.py` (`Esdt`,
//! `ExchangeRate`, `LpTokenComposition`) and `opendex_aggregator_api/pools/
//! model.py` (`SwapPool`, `SwapHop`, `SwapRoute`, `SwapEvaluation`,
//! `DynamicRoutingSwapEvaluation`), restated as plain Rust structs the way
//! the teacher's `types.rs` restates on-chain DTOs (`PoolState`,
//! `V3PoolState`, `ArbitrageOpportunity`) as plain structs with derived
//! `Eq`/`Hash` where identity matters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A swap-eligible token, identified by its exchange-native ticker
/// (e.g. `"WEGLD-bd4d79"`). Equality and hashing are by `identifier` alone,
/// matching `Esdt.__eq__`/`__hash__` in the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub identifier: String,
    pub decimals: u32,
    pub ticker: String,
    pub name: String,
    pub is_lp_token: Option<bool>,
    pub exchange: Option<String>,
    pub usd_price: Option<f64>,
}

impl Token {
    pub fn new(identifier: impl Into<String>, decimals: u32) -> Self {
        let identifier = identifier.into();
        Self {
            ticker: identifier.clone(),
            name: identifier.clone(),
            identifier,
            decimals,
            is_lp_token: None,
            exchange: None,
            usd_price: None,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}
impl Eq for Token {}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// A 32-byte venue (smart contract) address. The wire format in §6 of the
/// spec fixes hop addresses at exactly 32 bytes, which is why this is not
/// the teacher's 20-byte `ethers::types::Address`: this ecosystem's
/// accounts are bech32-encoded 32-byte public keys, not EVM addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueAddress(pub [u8; 32]);

impl VenueAddress {
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let bytes = hex::decode(hex_str).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Some(Self(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for VenueAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// The fixed enumeration of venue families, mirroring `SC_TYPES` in
/// `data/constants.py`. Index into this list is the wire `type_code`, so
/// the ordering here must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScType {
    AshSwapStablePool,
    AshSwapV2,
    Exrond,
    OneDex,
    XExchange,
    JexchangeLp,
    VestaDex,
    VestaxStake,
    HatomStake,
    HatomMoneyMarketMint,
    HatomMoneyMarketRedeem,
    JexchangeStablePool,
}

impl ScType {
    pub const ALL: [ScType; 12] = [
        ScType::AshSwapStablePool,
        ScType::AshSwapV2,
        ScType::Exrond,
        ScType::OneDex,
        ScType::XExchange,
        ScType::JexchangeLp,
        ScType::VestaDex,
        ScType::VestaxStake,
        ScType::HatomStake,
        ScType::HatomMoneyMarketMint,
        ScType::HatomMoneyMarketRedeem,
        ScType::JexchangeStablePool,
    ];

    /// 1-based, matching `SC_TYPES.index(self.type)` in the source (slot 0
    /// of `SC_TYPES` is `None`).
    pub fn code(self) -> u8 {
        (Self::ALL.iter().position(|t| *t == self).unwrap() + 1) as u8
    }

    /// Fixed per-type gas charge, per the "gas estimation as a table"
    /// design note: a single lookup keeps the evaluator branch-free.
    pub fn base_gas_estimate(self) -> u64 {
        match self {
            ScType::AshSwapStablePool | ScType::AshSwapV2 => 30_000_000,
            _ => 20_000_000,
        }
    }
}

/// Directed-multigraph edge descriptor for one venue's swap surface.
///
/// Equality is `(type, sc_address, tokens_in)`, matching `SwapPool.__eq__`
/// — two pools of the same type and address but different declared
/// `tokens_in` (e.g. a money-market mint vs. redeem edge on the same
/// contract) are distinct edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapPool {
    pub name: String,
    pub sc_address: VenueAddress,
    pub tokens_in: Vec<String>,
    pub tokens_out: Vec<String>,
    pub sc_type: ScType,
}

impl SwapPool {
    pub fn sc_type_as_code(&self) -> u8 {
        self.sc_type.code()
    }
}

impl PartialEq for SwapPool {
    fn eq(&self, other: &Self) -> bool {
        self.sc_type == other.sc_type
            && self.sc_address == other.sc_address
            && self.tokens_in == other.tokens_in
    }
}
impl Eq for SwapPool {}

/// A single swap step: `token_in ∈ pool.tokens_in`, `token_out ∈
/// pool.tokens_out`. Construction does not re-validate membership; callers
/// (the router) are responsible for only producing well-formed hops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapHop {
    pub pool: SwapPool,
    pub token_in: String,
    pub token_out: String,
}

static ROUTE_ID_SEQ: AtomicU64 = AtomicU64::new(1);

/// An ordered, nonempty sequence of hops from `token_in` to `token_out`.
///
/// Carries a process-local opaque `id` (the source uses a random UUID
/// hash; a monotonic counter serves the same "stable map key" purpose
/// without needing a source of randomness threaded through every
/// constructor) used for route-cache keys and `Hash`/`Eq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRoute {
    pub id: u64,
    pub hops: Vec<SwapHop>,
    pub token_in: String,
    pub token_out: String,
}

impl SwapRoute {
    pub fn new(token_in: impl Into<String>, token_out: impl Into<String>, hops: Vec<SwapHop>) -> Self {
        Self {
            id: ROUTE_ID_SEQ.fetch_add(1, Ordering::Relaxed),
            hops,
            token_in: token_in.into(),
            token_out: token_out.into(),
        }
    }

    /// Two routes are disjoint iff no pool (by `SwapPool` equality)
    /// appears in both.
    pub fn is_disjoint(&self, other: &SwapRoute) -> bool {
        !self
            .hops
            .iter()
            .any(|h| other.hops.iter().any(|x| h.pool == x.pool))
    }

    /// Sum of each hop's fixed per-type gas estimate, used by the online
    /// fallback which cannot ask a live model for `gas_estimate()`.
    pub fn static_estimated_gas(&self) -> u64 {
        self.hops.iter().map(|h| h.pool.sc_type.base_gas_estimate()).sum()
    }
}

impl PartialEq for SwapRoute {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for SwapRoute {}
impl std::hash::Hash for SwapRoute {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The outcome of walking one route through the pricing models for a
/// fixed input (or fixed output) amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvaluation {
    pub amount_in: num_bigint::BigInt,
    pub estimated_gas: u64,
    pub fee_amount: num_bigint::BigInt,
    pub fee_token: Option<String>,
    pub net_amount_out: num_bigint::BigInt,
    pub route: SwapRoute,
    pub theoretical_amount_out: num_bigint::BigInt,
}

/// The outcome of the split-route optimizer: an allocation of the input
/// across ≥ 2 disjoint routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicRoutingSwapEvaluation {
    pub amount_in: num_bigint::BigInt,
    pub estimated_gas: u64,
    pub evaluations: Vec<SwapEvaluation>,
    pub net_amount_out: num_bigint::BigInt,
    pub theoretical_amount_out: num_bigint::BigInt,
    pub token_in: String,
    pub token_out: String,
}

/// Reporting-only summary of a pool's current price, produced by the sync
/// step. Never used as a routing or ranking input (ranking is always by
/// `net_amount_out`, never by a USD- or rate-derived value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base_token_id: String,
    pub quote_token_id: String,
    pub rate: f64,
    pub rate2: f64,
    pub source: String,
    pub sc_address: VenueAddress,
    pub base_token_liquidity: num_bigint::BigInt,
    pub quote_token_liquidity: num_bigint::BigInt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpTokenComposition {
    pub lp_token_id: String,
    pub lp_token_supply: num_bigint::BigInt,
    pub token_ids: Vec<String>,
    pub token_reserves: Vec<num_bigint::BigInt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sc_type_code_matches_source_ordering() {
        assert_eq!(ScType::AshSwapStablePool.code(), 1);
        assert_eq!(ScType::JexchangeStablePool.code(), 12);
    }

    #[test]
    fn routes_sharing_a_pool_are_not_disjoint() {
        let pool = SwapPool {
            name: "p".into(),
            sc_address: VenueAddress([1; 32]),
            tokens_in: vec!["A".into()],
            tokens_out: vec!["B".into()],
            sc_type: ScType::XExchange,
        };
        let hop = SwapHop {
            pool: pool.clone(),
            token_in: "A".into(),
            token_out: "B".into(),
        };
        let r1 = SwapRoute::new("A", "B", vec![hop.clone()]);
        let r2 = SwapRoute::new("A", "B", vec![hop]);
        assert!(!r1.is_disjoint(&r2));
    }
}
