//! Pricing models: one analytic cost function per venue family, behind a
//! shared capability set.
//!
//! Per the "avoid deep type hierarchies" design note, variants are a
//! closed tagged union ([`PoolModel`]) rather than boxed trait objects; the
//! [`PricingModel`] trait is implemented on the enum itself so call sites
//! see one concrete type and the match inside each method body *is* the
//! dispatch table.

pub mod composite;
pub mod constant_price;
pub mod constant_product;
pub mod stable_swap;

use num_bigint::BigInt;

use crate::error::PricingError;
use crate::types::{ExchangeRate, LpTokenComposition, Token, VenueAddress};

pub use composite::CompositePool;
pub use constant_price::{ConstantPricePool, ConstantPriceVariant};
pub use constant_product::{ConstantProductCore, DirectedFeeConstantProductPool, OneDexPool, XExchangePool};
pub use stable_swap::StableSwapPool;

/// `(net_out, admin_fee_in, admin_fee_out)`, matching `estimate_amount_out`'s
/// three-tuple return in the source.
pub type QuoteOut = (BigInt, BigInt, BigInt);

/// Common capability set every venue family implements, per spec §4.2.
pub trait PricingModel {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError>;

    fn quote_in(&self, token_out: &Token, net_amount_out: &BigInt, token_in: &Token) -> Result<QuoteOut, PricingError> {
        let _ = (token_out, net_amount_out, token_in);
        Err(PricingError::UnsupportedOperation("quote_in".into()))
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError>;

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt);

    fn gas_estimate(&self) -> u64;

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate>;

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        None
    }

    fn source(&self) -> &'static str;
}

/// Tagged union over every pricing-model variant the sync worker can
/// materialize. Kept deliberately flat: adding a venue family means adding
/// one variant plus one `match` arm per trait method, not a new subtype.
#[derive(Debug, Clone)]
pub enum PoolModel {
    ConstantProduct(ConstantProductCore),
    OneDex(OneDexPool),
    XExchange(XExchangePool),
    DirectedFee(DirectedFeeConstantProductPool),
    StableSwap(StableSwapPool),
    Composite(CompositePool),
    ConstantPrice(ConstantPricePool),
}

impl PoolModel {
    pub fn deep_copy(&self) -> PoolModel {
        self.clone()
    }
}

impl PricingModel for PoolModel {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        match self {
            PoolModel::ConstantProduct(p) => p.quote_out(token_in, amount_in, token_out),
            PoolModel::OneDex(p) => p.quote_out(token_in, amount_in, token_out),
            PoolModel::XExchange(p) => p.quote_out(token_in, amount_in, token_out),
            PoolModel::DirectedFee(p) => p.quote_out(token_in, amount_in, token_out),
            PoolModel::StableSwap(p) => p.quote_out(token_in, amount_in, token_out),
            PoolModel::Composite(p) => p.quote_out(token_in, amount_in, token_out),
            PoolModel::ConstantPrice(p) => p.quote_out(token_in, amount_in, token_out),
        }
    }

    fn quote_in(&self, token_out: &Token, net_amount_out: &BigInt, token_in: &Token) -> Result<QuoteOut, PricingError> {
        match self {
            PoolModel::ConstantProduct(p) => p.quote_in(token_out, net_amount_out, token_in),
            PoolModel::OneDex(p) => p.quote_in(token_out, net_amount_out, token_in),
            PoolModel::XExchange(p) => p.quote_in(token_out, net_amount_out, token_in),
            PoolModel::DirectedFee(p) => p.quote_in(token_out, net_amount_out, token_in),
            PoolModel::StableSwap(p) => p.quote_in(token_out, net_amount_out, token_in),
            PoolModel::Composite(p) => p.quote_in(token_out, net_amount_out, token_in),
            PoolModel::ConstantPrice(p) => p.quote_in(token_out, net_amount_out, token_in),
        }
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        match self {
            PoolModel::ConstantProduct(p) => p.theoretical_out(token_in, amount_in, token_out),
            PoolModel::OneDex(p) => p.theoretical_out(token_in, amount_in, token_out),
            PoolModel::XExchange(p) => p.theoretical_out(token_in, amount_in, token_out),
            PoolModel::DirectedFee(p) => p.theoretical_out(token_in, amount_in, token_out),
            PoolModel::StableSwap(p) => p.theoretical_out(token_in, amount_in, token_out),
            PoolModel::Composite(p) => p.theoretical_out(token_in, amount_in, token_out),
            PoolModel::ConstantPrice(p) => p.theoretical_out(token_in, amount_in, token_out),
        }
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        match self {
            PoolModel::ConstantProduct(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
            PoolModel::OneDex(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
            PoolModel::XExchange(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
            PoolModel::DirectedFee(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
            PoolModel::StableSwap(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
            PoolModel::Composite(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
            PoolModel::ConstantPrice(p) => p.update_reserves(token_in, amount_in_net, token_out, amount_out_plus_admin),
        }
    }

    fn gas_estimate(&self) -> u64 {
        match self {
            PoolModel::ConstantProduct(p) => p.gas_estimate(),
            PoolModel::OneDex(p) => p.gas_estimate(),
            PoolModel::XExchange(p) => p.gas_estimate(),
            PoolModel::DirectedFee(p) => p.gas_estimate(),
            PoolModel::StableSwap(p) => p.gas_estimate(),
            PoolModel::Composite(p) => p.gas_estimate(),
            PoolModel::ConstantPrice(p) => p.gas_estimate(),
        }
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        match self {
            PoolModel::ConstantProduct(p) => p.exchange_rates(sc_address),
            PoolModel::OneDex(p) => p.exchange_rates(sc_address),
            PoolModel::XExchange(p) => p.exchange_rates(sc_address),
            PoolModel::DirectedFee(p) => p.exchange_rates(sc_address),
            PoolModel::StableSwap(p) => p.exchange_rates(sc_address),
            PoolModel::Composite(p) => p.exchange_rates(sc_address),
            PoolModel::ConstantPrice(p) => p.exchange_rates(sc_address),
        }
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        match self {
            PoolModel::ConstantProduct(p) => p.lp_token_composition(),
            PoolModel::OneDex(p) => p.lp_token_composition(),
            PoolModel::XExchange(p) => p.lp_token_composition(),
            PoolModel::DirectedFee(p) => p.lp_token_composition(),
            PoolModel::StableSwap(p) => p.lp_token_composition(),
            PoolModel::Composite(p) => p.lp_token_composition(),
            PoolModel::ConstantPrice(p) => p.lp_token_composition(),
        }
    }

    fn source(&self) -> &'static str {
        match self {
            PoolModel::ConstantProduct(p) => p.source(),
            PoolModel::OneDex(p) => p.source(),
            PoolModel::XExchange(p) => p.source(),
            PoolModel::DirectedFee(p) => p.source(),
            PoolModel::StableSwap(p) => p.source(),
            PoolModel::Composite(p) => p.source(),
            PoolModel::ConstantPrice(p) => p.source(),
        }
    }
}

/// `(amount*10^18)/10^decimals` — shared by every variant that needs to
/// work in an 18-decimal-normalized space (stable swap, constant price).
pub fn normalize_amount(amount: &BigInt, decimals: u32) -> BigInt {
    (amount * crate::bigmath::pow10(18)) / crate::bigmath::pow10(decimals)
}

/// Inverse of [`normalize_amount`].
pub fn denormalize_amount(amount: &BigInt, decimals: u32) -> BigInt {
    (amount * crate::bigmath::pow10(decimals)) / crate::bigmath::pow10(18)
}
