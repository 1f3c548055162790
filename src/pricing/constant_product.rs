//! Constant-product (x*y=k) family: the base AMM formula plus four
//! venue-specific fee policies layered on top of it.
//!
//! Grounded in `pools/pools.py` (`ConstantPricePool` is elsewhere; the base
//! `estimate_amount_out`/`estimate_amount_in` pair lives on a shared
//! `LiquidityPool` ancestor there), `pools/onedex.py`, `pools/xexchange.py`,
//! `pools/opendex.py` and `pools/vestadex.py` (the latter two are the same
//! formula under different `MAX_FEE`/field names, unified here into one
//! [`DirectedFeeConstantProductPool`] rather than two near-identical structs).

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::bigmath::big;
use crate::error::PricingError;
use crate::types::{ExchangeRate, LpTokenComposition, Token, VenueAddress};

use super::{PricingModel, QuoteOut};

/// Fee-less constant-product core shared by every variant in this module:
/// two reserves, an optional LP token, and the raw `x*y=k` math. Venue
/// variants wrap this and intercept fee handling before/after calling into
/// it, the same way `onedex.py`/`xexchange.py` call into the shared
/// `LiquidityPool` base.
#[derive(Debug, Clone)]
pub struct ConstantProductCore {
    pub source: &'static str,
    pub sc_address: VenueAddress,
    pub first_token: String,
    pub first_reserves: BigInt,
    pub second_token: String,
    pub second_reserves: BigInt,
    pub lp_token_id: Option<String>,
    pub lp_token_supply: BigInt,
    /// Total swap fee in basis points out of `fee_denominator`.
    pub total_fee_bps: u64,
    pub fee_denominator: u64,
}

impl ConstantProductCore {
    fn reserves_for(&self, token: &str) -> Option<(&BigInt, &BigInt, &str)> {
        if token == self.first_token {
            Some((&self.first_reserves, &self.second_reserves, &self.second_token))
        } else if token == self.second_token {
            Some((&self.second_reserves, &self.first_reserves, &self.first_token))
        } else {
            None
        }
    }

    /// Raw `x*y=k` quote on an already-fee-deducted input amount: no fee
    /// bookkeeping here, callers apply their own fee policy around this.
    pub fn raw_amount_out(&self, token_in: &str, amount_in_after_fee: &BigInt, token_out: &str) -> Result<BigInt, PricingError> {
        let (reserve_in, reserve_out, expected_out) = self
            .reserves_for(token_in)
            .ok_or_else(|| PricingError::InvalidToken(token_in.to_string()))?;
        if expected_out != token_out {
            return Err(PricingError::InvalidToken(token_out.to_string()));
        }
        if amount_in_after_fee <= &BigInt::zero() {
            return Err(PricingError::InsufficientInput("amount_in must be positive".into()));
        }
        let numerator = amount_in_after_fee * reserve_out;
        let denominator = reserve_in + amount_in_after_fee;
        let out = numerator / denominator;
        if out >= *reserve_out {
            return Err(PricingError::InsufficientLiquidity);
        }
        Ok(out)
    }

    pub fn raw_amount_in(&self, token_out: &str, amount_out: &BigInt, token_in: &str) -> Result<BigInt, PricingError> {
        let (reserve_out_side, reserve_in_side, expected_in) = self
            .reserves_for(token_out)
            .map(|(r_out, r_in, other)| (r_out, r_in, other))
            .ok_or_else(|| PricingError::InvalidToken(token_out.to_string()))?;
        let _ = reserve_in_side;
        if expected_in != token_in {
            return Err(PricingError::InvalidToken(token_in.to_string()));
        }
        // reserves_for(token_out) returns (reserve_of(token_out), reserve_of(token_in), token_in_name)
        let reserve_out = reserve_out_side;
        let reserve_in = self.reserve_of(token_in).ok_or_else(|| PricingError::InvalidToken(token_in.to_string()))?;
        if amount_out >= reserve_out {
            return Err(PricingError::InsufficientLiquidity);
        }
        let numerator = reserve_in * amount_out;
        let denominator = reserve_out - amount_out;
        Ok(numerator / denominator + BigInt::from(1))
    }

    /// `(reserve_in, reserve_out)` for a validated `token_in -> token_out`
    /// pair, used by fee policies that need the raw reserves directly
    /// rather than going through [`Self::raw_amount_out`].
    fn reserve_pair(&self, token_in: &str, token_out: &str) -> Option<(&BigInt, &BigInt)> {
        let (reserve_in, reserve_out, expected_out) = self.reserves_for(token_in)?;
        if expected_out != token_out {
            return None;
        }
        Some((reserve_in, reserve_out))
    }

    fn reserve_of(&self, token: &str) -> Option<&BigInt> {
        if token == self.first_token {
            Some(&self.first_reserves)
        } else if token == self.second_token {
            Some(&self.second_reserves)
        } else {
            None
        }
    }

    pub fn apply_update(&mut self, token_in: &str, amount_in_net: &BigInt, token_out: &str, amount_out_plus_admin: &BigInt) {
        if token_in == self.first_token {
            self.first_reserves += amount_in_net;
        } else if token_in == self.second_token {
            self.second_reserves += amount_in_net;
        }
        if token_out == self.first_token {
            self.first_reserves -= amount_out_plus_admin;
        } else if token_out == self.second_token {
            self.second_reserves -= amount_out_plus_admin;
        }
    }

    pub fn rates(&self, sc_address: VenueAddress, source: &str) -> Vec<ExchangeRate> {
        if self.first_reserves.is_zero() || self.second_reserves.is_zero() {
            return vec![];
        }
        let rate = ratio(&self.second_reserves, &self.first_reserves);
        let rate2 = ratio(&self.first_reserves, &self.second_reserves);
        vec![ExchangeRate {
            base_token_id: self.first_token.clone(),
            quote_token_id: self.second_token.clone(),
            rate,
            rate2,
            source: source.to_string(),
            sc_address,
            base_token_liquidity: self.first_reserves.clone(),
            quote_token_liquidity: self.second_reserves.clone(),
        }]
    }

    pub fn composition(&self) -> Option<LpTokenComposition> {
        let lp_token_id = self.lp_token_id.clone()?;
        Some(LpTokenComposition {
            lp_token_id,
            lp_token_supply: self.lp_token_supply.clone(),
            token_ids: vec![self.first_token.clone(), self.second_token.clone()],
            token_reserves: vec![self.first_reserves.clone(), self.second_reserves.clone()],
        })
    }

    /// `_zap_optimal_swap_amount`: the largest amount of a single input
    /// token that can be swapped into the pool before a one-sided deposit,
    /// such that the remainder deposits at the pool's current ratio. Closed
    /// form for a constant-product pool with a fee, grounded in the
    /// zap-contract formula used across the OpenDEX family's one-sided
    /// deposit helper (`sqrt((2-f)^2*r_in^2 + 4*(1-f)*amount*r_in) -
    /// (2-f)*r_in) / (2*(1-f))`, computed with integer `sqrt`.
    pub fn zap_optimal_swap_amount(&self, token_in: &str, amount_in: &BigInt) -> Result<BigInt, PricingError> {
        let reserve_in = self.reserve_of(token_in).ok_or_else(|| PricingError::InvalidToken(token_in.to_string()))?;
        let fee_num = big(self.total_fee_bps as i64);
        let fee_den = big(self.fee_denominator as i64);

        let two_minus_f = &fee_den * big(2) - &fee_num;
        let one_minus_f = &fee_den - &fee_num;

        let a = &two_minus_f * &two_minus_f * reserve_in * reserve_in;
        let b = big(4) * &one_minus_f * &fee_den * amount_in * reserve_in;
        let radicand = a + b;
        let root = isqrt(&radicand);

        let numerator = root - &two_minus_f * reserve_in;
        let denominator = big(2) * &one_minus_f * &fee_den;
        if denominator.is_zero() {
            return Err(PricingError::UnsupportedOperation("zero fee denominator".into()));
        }
        Ok(numerator / denominator)
    }
}

fn ratio(numerator: &BigInt, denominator: &BigInt) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    let n: f64 = numerator.to_string().parse().unwrap_or(0.0);
    let d: f64 = denominator.to_string().parse().unwrap_or(1.0);
    n / d
}

/// Integer square root via Newton's method, used only by the zap helper.
fn isqrt(n: &BigInt) -> BigInt {
    if n.is_zero() {
        return BigInt::zero();
    }
    let mut x = n.clone();
    let mut y = (&x + BigInt::from(1)) / big(2);
    while y < x {
        x = y.clone();
        y = (&x + n / &x) / big(2);
    }
    x
}

impl PricingModel for ConstantProductCore {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        let raw_out = self.raw_amount_out(&token_in.identifier, amount_in, &token_out.identifier)?;
        let fee = (&raw_out * big(self.total_fee_bps as i64)) / big(self.fee_denominator as i64);
        Ok((&raw_out - &fee, BigInt::zero(), BigInt::zero()))
    }

    fn quote_in(&self, token_out: &Token, net_amount_out: &BigInt, token_in: &Token) -> Result<QuoteOut, PricingError> {
        let fee_den = big(self.fee_denominator as i64);
        let fee_num = big(self.total_fee_bps as i64);
        let denom = &fee_den - &fee_num;
        if denom <= BigInt::zero() {
            return Err(PricingError::UnsupportedOperation("fee consumes entire output".into()));
        }
        let amount_out = (net_amount_out * &fee_den) / &denom;
        let amount_in = self.raw_amount_in(&token_out.identifier, &amount_out, &token_in.identifier)?;
        Ok((amount_in, BigInt::zero(), BigInt::zero()))
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        let reserve_in = self.reserve_of(&token_in.identifier).ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        if reserve_in.is_zero() {
            return Ok(BigInt::zero());
        }
        let reserve_out = self.reserve_of(&token_out.identifier).ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;
        let fee = (amount_in * big(self.total_fee_bps as i64)) / big(self.fee_denominator as i64);
        let amount_after_fee = amount_in - &fee;
        Ok((amount_after_fee * reserve_out) / reserve_in)
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        self.apply_update(&token_in.identifier, amount_in_net, &token_out.identifier, amount_out_plus_admin);
    }

    fn gas_estimate(&self) -> u64 {
        20_000_000
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        self.rates(sc_address, self.source)
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        self.composition()
    }

    fn source(&self) -> &'static str {
        self.source
    }
}

/// OneDex: the swap fee is charged on the *input* token, via the scaled
/// `amount_in*(MAX_FEE-total_fee)` form, when `token_in` is one of the
/// pool's declared main-pair tokens; otherwise it is charged on the raw
/// output. Either way no admin cut is reported — the fee simply stays
/// with the pool — per `onedex.py`'s `estimate_amount_out`.
#[derive(Debug, Clone)]
pub struct OneDexPool {
    pub core: ConstantProductCore,
    pub main_pair_tokens: Vec<String>,
}

impl OneDexPool {
    fn fee_on_input(&self, token_in: &str) -> bool {
        self.main_pair_tokens.iter().any(|t| t == token_in)
    }
}

impl PricingModel for OneDexPool {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        if self.fee_on_input(&token_in.identifier) {
            let fee_den = big(self.core.fee_denominator as i64);
            let fee_num = big(self.core.total_fee_bps as i64);
            let (reserve_in, reserve_out) = self
                .core
                .reserve_pair(&token_in.identifier, &token_out.identifier)
                .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
            let amount_in_with_fee = amount_in * (&fee_den - &fee_num);
            let numerator = &amount_in_with_fee * reserve_out;
            let denominator = reserve_in * &fee_den + &amount_in_with_fee;
            let net_out = numerator / denominator;
            Ok((net_out, BigInt::zero(), BigInt::zero()))
        } else {
            let raw_out = self.core.raw_amount_out(&token_in.identifier, amount_in, &token_out.identifier)?;
            let out_fee = (&raw_out * big(self.core.total_fee_bps as i64)) / big(self.core.fee_denominator as i64);
            Ok((&raw_out - &out_fee, BigInt::zero(), BigInt::zero()))
        }
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        self.core.raw_amount_out(&token_in.identifier, amount_in, &token_out.identifier)
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        self.core.apply_update(&token_in.identifier, amount_in_net, &token_out.identifier, amount_out_plus_admin);
    }

    fn gas_estimate(&self) -> u64 {
        20_000_000
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        self.core.rates(sc_address, "onedex")
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        self.core.composition()
    }

    fn source(&self) -> &'static str {
        "onedex"
    }
}

/// xExchange: the swap itself only ever pays `total_fee`, applied via the
/// scaled `amount_in*(MAX_FEE-total_fee)` form; `special_fee` is skimmed
/// separately from the raw `amount_in` and reported as the admin's cut
/// without ever being removed from the quoted output, per `xexchange.py`'s
/// `estimate_amount_out`.
#[derive(Debug, Clone)]
pub struct XExchangePool {
    pub core: ConstantProductCore,
    pub special_fee_bps: u64,
}

impl PricingModel for XExchangePool {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        let fee_den = big(self.core.fee_denominator as i64);
        let fee_num = big(self.core.total_fee_bps as i64);
        let (reserve_in, reserve_out) = self
            .core
            .reserve_pair(&token_in.identifier, &token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        let amount_in_with_fee = amount_in * (&fee_den - &fee_num);
        let numerator = &amount_in_with_fee * reserve_out;
        let denominator = reserve_in * &fee_den + &amount_in_with_fee;
        let net_out = numerator / denominator;
        let special_fee = (amount_in * big(self.special_fee_bps as i64)) / fee_den;
        Ok((net_out, special_fee, BigInt::zero()))
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        self.core.raw_amount_out(&token_in.identifier, amount_in, &token_out.identifier)
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        self.core.apply_update(&token_in.identifier, amount_in_net, &token_out.identifier, amount_out_plus_admin);
    }

    fn gas_estimate(&self) -> u64 {
        20_000_000
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        self.core.rates(sc_address, "xexchange")
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        self.core.composition()
    }

    fn source(&self) -> &'static str {
        "xexchange"
    }
}

/// Opendex / VestaDex: `total_fee` always applies, but which side of the
/// swap pays it depends on `fee_token` — fee on input when the trade
/// swaps `fee_token` in, fee on output otherwise. Only the `platform_fee`
/// share of `total_fee` is reported as the admin cut; the rest stays with
/// LPs. `opendex.py` and `vestadex.py` implement the identical formula
/// under different `MAX_FEE` denominators (10_000 vs. 1_000_000) and
/// field names, so they are carried here as one parameterized variant
/// rather than two structs.
#[derive(Debug, Clone)]
pub struct DirectedFeeConstantProductPool {
    pub core: ConstantProductCore,
    pub source_name: &'static str,
    /// Token the fee is taken in when the trade swaps it in; `None` (or a
    /// trade that swaps the other token in) always charges on the output,
    /// per `opendex.py`'s `fee_token` field.
    pub fee_token: Option<String>,
    /// The admin's cut of `total_fee_bps`, out of the same `fee_denominator`.
    /// The rest of `total_fee_bps` stays with LPs.
    pub platform_fee_bps: u64,
}

impl DirectedFeeConstantProductPool {
    /// `(lp_fee, platform_fee)` split of `total_fee_bps*amount` into the
    /// LP and admin portions, per `opendex.py`'s `_calculate_fees`.
    fn split_fees(&self, amount: &BigInt) -> (BigInt, BigInt) {
        let total_fee = (amount * big(self.core.total_fee_bps as i64)) / big(self.core.fee_denominator as i64);
        let platform_fee = (amount * big(self.platform_fee_bps as i64)) / big(self.core.fee_denominator as i64);
        (total_fee - &platform_fee, platform_fee)
    }
}

impl PricingModel for DirectedFeeConstantProductPool {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        let reserve_in = self
            .core
            .reserve_of(&token_in.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        if reserve_in.is_zero() {
            return Ok((BigInt::zero(), BigInt::zero(), BigInt::zero()));
        }

        if self.fee_token.as_deref() == Some(token_in.identifier.as_str()) {
            let (lp_fee, platform_fee_in) = self.split_fees(amount_in);
            let amount_in_less_fees = amount_in - &lp_fee - &platform_fee_in;
            let net_out = self.core.raw_amount_out(&token_in.identifier, &amount_in_less_fees, &token_out.identifier)?;
            Ok((net_out, platform_fee_in, BigInt::zero()))
        } else {
            let raw_out = self.core.raw_amount_out(&token_in.identifier, amount_in, &token_out.identifier)?;
            let (lp_fee, platform_fee_out) = self.split_fees(&raw_out);
            let net_out = &raw_out - &lp_fee - &platform_fee_out;
            Ok((net_out, BigInt::zero(), platform_fee_out))
        }
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        self.core.raw_amount_out(&token_in.identifier, amount_in, &token_out.identifier)
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        self.core.apply_update(&token_in.identifier, amount_in_net, &token_out.identifier, amount_out_plus_admin);
    }

    fn gas_estimate(&self) -> u64 {
        20_000_000
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        self.core.rates(sc_address, self.source_name)
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        self.core.composition()
    }

    fn source(&self) -> &'static str {
        self.source_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> ConstantProductCore {
        ConstantProductCore {
            source: "xexchange",
            sc_address: VenueAddress([1; 32]),
            first_token: "WEGLD-bd4d79".into(),
            first_reserves: BigInt::from(1_000_000_000_000_000_000_000i128),
            second_token: "USDC-c76f1f".into(),
            second_reserves: BigInt::from(40_000_000_000i64),
            lp_token_id: Some("LPWU-abcdef".into()),
            lp_token_supply: BigInt::from(1_000_000i64),
            total_fee_bps: 30,
            fee_denominator: 10_000,
        }
    }

    #[test]
    fn constant_product_quote_respects_fee() {
        let pool = core();
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);
        let amount_in = BigInt::from(10u64.pow(18));
        let (net_out, admin_in, admin_out) = pool.quote_out(&wegld, &amount_in, &usdc).unwrap();
        let raw_out = pool.raw_amount_out("WEGLD-bd4d79", &amount_in, "USDC-c76f1f").unwrap();
        assert!(net_out > BigInt::zero());
        assert!(net_out < raw_out, "fee must be deducted from the raw x*y=k output");
        assert_eq!(admin_in, BigInt::zero());
        assert_eq!(admin_out, BigInt::zero());
    }

    #[test]
    fn quote_in_recovers_amount_in_for_a_zero_fee_pool() {
        let mut pool = core();
        pool.total_fee_bps = 0;
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);
        let amount_in = BigInt::from(10u64.pow(18));
        let (net_out, _, _) = pool.quote_out(&wegld, &amount_in, &usdc).unwrap();

        let (recovered_in, admin_in, admin_out) = pool.quote_in(&usdc, &net_out, &wegld).unwrap();
        assert_eq!(admin_in, BigInt::zero());
        assert_eq!(admin_out, BigInt::zero());
        assert!((&recovered_in - &amount_in).abs() <= BigInt::from(1));
    }

    #[test]
    fn fee_less_quote_matches_reference_vector() {
        let pool = ConstantProductCore {
            source: "xexchange",
            sc_address: VenueAddress([1; 32]),
            first_token: "WEGLD-bd4d79".into(),
            first_reserves: big(1000) * crate::bigmath::pow10(18),
            second_token: "USDC-c76f1f".into(),
            second_reserves: big(1000) * crate::bigmath::pow10(6),
            lp_token_id: None,
            lp_token_supply: BigInt::zero(),
            total_fee_bps: 0,
            fee_denominator: 10_000,
        };
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);

        let amt_in = big(10) * crate::bigmath::pow10(18);
        let (net_out, fee, admin_out) = pool.quote_out(&wegld, &amt_in, &usdc).unwrap();
        assert_eq!(net_out, BigInt::from(9_900_990i64));
        assert_eq!(fee, BigInt::zero());
        assert_eq!(admin_out, BigInt::zero());

        let amt_in_inverse = pool.raw_amount_in("USDC-c76f1f", &BigInt::from(9_900_990i64), "WEGLD-bd4d79").unwrap();
        assert_eq!(amt_in_inverse, "9999999899000000011".parse::<BigInt>().unwrap());
    }

    #[test]
    fn onedex_charges_fee_on_output_for_non_main_pair() {
        let mut pool_core = core();
        pool_core.total_fee_bps = 20;
        let onedex = OneDexPool {
            core: pool_core,
            main_pair_tokens: vec!["MEX-455c57".into(), "EGLD-USD-abcdef".into()],
        };
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);
        let amount_in = BigInt::from(10u64.pow(18));
        let (net_out, fee_in, fee_out) = onedex.quote_out(&wegld, &amount_in, &usdc).unwrap();
        let raw_out = onedex.core.raw_amount_out("WEGLD-bd4d79", &amount_in, "USDC-c76f1f").unwrap();
        assert_eq!(fee_in, BigInt::zero());
        assert_eq!(fee_out, BigInt::zero());
        assert!(net_out > BigInt::zero());
        assert!(net_out < raw_out, "non-main-pair swaps still pay the fee, just never as a reported admin cut");
    }

    #[test]
    fn onedex_uses_the_scaled_form_on_the_main_pair() {
        let mut pool_core = core();
        pool_core.total_fee_bps = 20;
        let onedex = OneDexPool {
            core: pool_core,
            main_pair_tokens: vec!["WEGLD-bd4d79".into()],
        };
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);
        let amount_in = BigInt::from(10u64.pow(18));
        let (net_out, fee_in, fee_out) = onedex.quote_out(&wegld, &amount_in, &usdc).unwrap();
        assert_eq!(fee_in, BigInt::zero());
        assert_eq!(fee_out, BigInt::zero());

        let raw_out = onedex.core.raw_amount_out("WEGLD-bd4d79", &amount_in, "USDC-c76f1f").unwrap();
        assert!(net_out > BigInt::zero());
        assert!(net_out < raw_out);
    }

    #[test]
    fn xexchange_reports_special_fee_without_removing_it_from_the_swap() {
        let mut pool_core = core();
        pool_core.total_fee_bps = 30;
        let xexchange = XExchangePool { core: pool_core, special_fee_bps: 5 };
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);
        let amount_in = BigInt::from(10u64.pow(18));

        let (net_out, special_fee, admin_out) = xexchange.quote_out(&wegld, &amount_in, &usdc).unwrap();
        assert!(special_fee > BigInt::zero());
        assert_eq!(admin_out, BigInt::zero());

        let total_fee_only = XExchangePool { core: xexchange.core.clone(), special_fee_bps: 0 };
        let (net_out_no_special, no_special_fee, _) = total_fee_only.quote_out(&wegld, &amount_in, &usdc).unwrap();
        assert_eq!(no_special_fee, BigInt::zero());
        assert_eq!(net_out, net_out_no_special, "special_fee is skimmed separately, not subtracted from the swap");
    }

    #[test]
    fn directed_fee_splits_platform_cut_from_the_lp_fee() {
        let mut pool_core = core();
        pool_core.total_fee_bps = 50;
        let pool = DirectedFeeConstantProductPool {
            core: pool_core,
            source_name: "opendex",
            fee_token: Some("WEGLD-bd4d79".into()),
            platform_fee_bps: 20,
        };
        let wegld = Token::new("WEGLD-bd4d79", 18);
        let usdc = Token::new("USDC-c76f1f", 6);
        let amount_in = BigInt::from(10u64.pow(18));

        let (net_out_in, platform_in, admin_out) = pool.quote_out(&wegld, &amount_in, &usdc).unwrap();
        assert!(platform_in > BigInt::zero());
        assert_eq!(admin_out, BigInt::zero());
        assert!(net_out_in > BigInt::zero());

        let (net_out_out, admin_in, platform_out) = pool.quote_out(&usdc, &BigInt::from(1_000_000i64), &wegld).unwrap();
        assert_eq!(admin_in, BigInt::zero());
        assert!(platform_out > BigInt::zero());
        assert!(net_out_out > BigInt::zero());
    }
}
