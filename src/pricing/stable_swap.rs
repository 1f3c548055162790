//! Curve-style StableSwap pool, wrapping the `D`/`y`/`y_D` solvers in
//! `bigmath::curve`.
//!
//! Grounded in `pools/stableswap.py` (`estimate_amount_out`,
//! `estimate_deposit`, `estimate_withdraw_one_token`) and `pools/pools.py`'s
//! `StableSwapPool` wrapper (`estimate_theorical_amount_out`). The Python
//! reference works in a token's native decimals directly; amounts here are
//! first normalized to 18 decimals (matching the "underlying price"
//! weighting the source applies per-coin) via [`super::normalize_amount`].
//! Unlike the composite pool, the swap fee here is never tracked as a
//! separate admin cut — it's simply subtracted from what leaves the pool,
//! so `quote_out` always reports `(net_out, 0, 0)`.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::bigmath::curve;
use crate::error::PricingError;
use crate::types::{ExchangeRate, LpTokenComposition, Token, VenueAddress};

use super::{denormalize_amount, normalize_amount, PricingModel, QuoteOut};

#[derive(Debug, Clone)]
pub struct StableSwapPool {
    pub sc_address: VenueAddress,
    pub amplification: BigInt,
    pub tokens: Vec<String>,
    pub decimals: Vec<u32>,
    pub reserves: Vec<BigInt>,
    pub underlying_prices: Vec<BigInt>,
    pub lp_token_id: Option<String>,
    pub lp_token_supply: BigInt,
    pub swap_fee_bps: u64,
    pub fee_denominator: u64,
}

impl StableSwapPool {
    fn index_of(&self, token: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t == token)
    }

    /// Reserves weighted by `underlying_prices`, normalized to 18 decimals
    /// — the balances the invariant solver actually operates on.
    fn weighted_normalized_balances(&self) -> Vec<BigInt> {
        self.reserves
            .iter()
            .zip(self.decimals.iter())
            .zip(self.underlying_prices.iter())
            .map(|((reserve, dec), price)| (normalize_amount(reserve, *dec) * price) / crate::bigmath::pow10(18))
            .collect()
    }

    /// Multi-coin deposit quote: LP tokens minted for depositing
    /// `deposits[k]` (native units) of every pool token simultaneously,
    /// `deposits[k] = 0` for tokens left untouched. Imbalanced deposits are
    /// penalized by redistributing `swap_fee_bps` over each coin's
    /// deviation from its ideal post-deposit balance before minting against
    /// the fee-adjusted invariant. Supplements the base swap pair with the
    /// deposit/withdraw side the spec calls out as enriching the
    /// stable-swap surface. Grounded in `stableswap.py::estimate_deposit`.
    pub fn estimate_deposit(&self, deposits: &[BigInt]) -> Result<BigInt, PricingError> {
        if deposits.len() != self.tokens.len() {
            return Err(PricingError::InvalidToken("deposit vector length mismatch".to_string()));
        }

        let old_xs = self.weighted_normalized_balances();
        let d0 = if self.lp_token_supply.is_zero() {
            BigInt::zero()
        } else {
            curve::d(&self.amplification, &old_xs)?
        };

        let new_xs: Vec<BigInt> = old_xs
            .iter()
            .zip(deposits.iter())
            .zip(self.decimals.iter())
            .zip(self.underlying_prices.iter())
            .map(|(((x, amount), dec), price)| x + (normalize_amount(amount, *dec) * price) / crate::bigmath::pow10(18))
            .collect();

        let d1 = curve::d(&self.amplification, &new_xs)?;
        if d1 <= d0 {
            return Ok(BigInt::zero());
        }

        if self.lp_token_supply.is_zero() {
            return Ok(d1);
        }

        let mut new_xs2 = new_xs.clone();
        for i in 0..old_xs.len() {
            let ideal_balance = (&old_xs[i] * &d1) / &d0;
            let diff = (&new_xs[i] - &ideal_balance).abs();
            let fee = (&diff * crate::bigmath::big(self.swap_fee_bps as i64)) / crate::bigmath::big(self.fee_denominator as i64);
            new_xs2[i] -= fee;
        }
        let d2 = curve::d(&self.amplification, &new_xs2)?;

        Ok((&self.lp_token_supply * (&d2 - &d0)) / &d0)
    }

    /// Withdraw a single coin for `lp_amount` of LP tokens burned, the
    /// inverse of [`Self::estimate_deposit`]: every coin's imbalance fee is
    /// applied before resolving the target token's post-withdrawal balance
    /// a second time, same as the deposit side. Returns `(amount_out, fee)`.
    /// Ported from `estimate_withdraw_one_coin` via `y_D`.
    pub fn estimate_withdraw_one_token(&self, lp_amount: &BigInt, token_out: &Token) -> Result<(BigInt, BigInt), PricingError> {
        let idx = self
            .index_of(&token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;
        if self.lp_token_supply.is_zero() {
            return Err(PricingError::InsufficientLiquidity);
        }

        let mut xp = self.weighted_normalized_balances();
        let d0 = curve::d(&self.amplification, &xp)?;
        let d1 = &d0 - (&d0 * lp_amount) / &self.lp_token_supply;

        let y0 = curve::y_d(&self.amplification, &xp, idx, &d1)?;
        let dy0 = &xp[idx] - &y0;

        for j in 0..xp.len() {
            let dx = if j == idx {
                (&xp[j] * &d1) / &d0 - &y0
            } else {
                &xp[j] - (&xp[j] * &d1) / &d0
            };
            let fee = (&dx * crate::bigmath::big(self.swap_fee_bps as i64)) / crate::bigmath::big(self.fee_denominator as i64);
            xp[j] -= fee;
        }

        let y1 = curve::y_d(&self.amplification, &xp, idx, &d1)?;
        let weighted_dy = &xp[idx] - &y1 - BigInt::from(1);
        let unweighted = (&weighted_dy * crate::bigmath::pow10(18)) / &self.underlying_prices[idx];
        let denormalized = denormalize_amount(&unweighted, token_out.decimals);

        let weighted_fee = &dy0 - &weighted_dy;
        let unweighted_fee = (&weighted_fee * crate::bigmath::pow10(18)) / &self.underlying_prices[idx];
        let fee_denormalized = denormalize_amount(&unweighted_fee, token_out.decimals);

        Ok((denormalized, fee_denormalized))
    }
}

impl PricingModel for StableSwapPool {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        let i = self
            .index_of(&token_in.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        let j = self
            .index_of(&token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;

        let balances = self.weighted_normalized_balances();
        let weighted_in = (normalize_amount(amount_in, token_in.decimals) * &self.underlying_prices[i]) / crate::bigmath::pow10(18);

        let new_in_balance = &balances[i] + &weighted_in;
        let new_out_balance = curve::y(&self.amplification, &balances, i, j, &new_in_balance)?;
        let weighted_out = &balances[j] - &new_out_balance;

        let unweighted_out = (weighted_out * crate::bigmath::pow10(18)) / &self.underlying_prices[j];
        let raw_out = denormalize_amount(&unweighted_out, token_out.decimals);

        let fee = (&raw_out * crate::bigmath::big(self.swap_fee_bps as i64)) / crate::bigmath::big(self.fee_denominator as i64);
        if fee > raw_out {
            return Err(PricingError::InsufficientLiquidity);
        }
        // Unlike the composite pool, the source reports no admin fee here
        // (`estimate_amount_out` returns `(amount_out - fee, 0, 0)`): the
        // swap fee simply reduces what leaves the pool, staying with LPs
        // rather than being tracked as a separate protocol cut.
        Ok((&raw_out - &fee, BigInt::zero(), BigInt::zero()))
    }

    /// A straight peg-ratio conversion via `underlying_prices`, not the
    /// curve — the no-slippage reference a live quote is compared against.
    /// Grounded in `StableSwapPool.estimate_theorical_amount_out`.
    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        let i = self
            .index_of(&token_in.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        let j = self
            .index_of(&token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;

        let normalized_in = normalize_amount(amount_in, token_in.decimals);
        let amount = (normalized_in * &self.underlying_prices[i]) / &self.underlying_prices[j];
        let fee = (&amount * crate::bigmath::big(self.swap_fee_bps as i64)) / crate::bigmath::big(self.fee_denominator as i64);
        Ok(denormalize_amount(&(amount - fee), token_out.decimals))
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        if let Some(i) = self.index_of(&token_in.identifier) {
            self.reserves[i] += amount_in_net;
        }
        if let Some(j) = self.index_of(&token_out.identifier) {
            self.reserves[j] -= amount_out_plus_admin;
        }
    }

    fn gas_estimate(&self) -> u64 {
        30_000_000
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        let mut rates = Vec::new();
        for i in 0..self.tokens.len() {
            for j in 0..self.tokens.len() {
                if i == j || self.reserves[i].is_zero() || self.reserves[j].is_zero() {
                    continue;
                }
                let rate = div_f64(&self.reserves[j], &self.reserves[i]);
                let rate2 = div_f64(&self.reserves[i], &self.reserves[j]);
                rates.push(ExchangeRate {
                    base_token_id: self.tokens[i].clone(),
                    quote_token_id: self.tokens[j].clone(),
                    rate,
                    rate2,
                    source: "curve".to_string(),
                    sc_address,
                    base_token_liquidity: self.reserves[i].clone(),
                    quote_token_liquidity: self.reserves[j].clone(),
                });
            }
        }
        rates
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        let lp_token_id = self.lp_token_id.clone()?;
        Some(LpTokenComposition {
            lp_token_id,
            lp_token_supply: self.lp_token_supply.clone(),
            token_ids: self.tokens.clone(),
            token_reserves: self.reserves.clone(),
        })
    }

    fn source(&self) -> &'static str {
        "curve"
    }
}

fn div_f64(numerator: &BigInt, denominator: &BigInt) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    let n: f64 = numerator.to_string().parse().unwrap_or(0.0);
    let d: f64 = denominator.to_string().parse().unwrap_or(1.0);
    n / d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> StableSwapPool {
        StableSwapPool {
            sc_address: VenueAddress([2; 32]),
            amplification: BigInt::from(200),
            tokens: vec!["USDC-c76f1f".into(), "USDT-f8c08c".into()],
            decimals: vec![6, 6],
            reserves: vec![BigInt::from(1_000_000_000_000i64), BigInt::from(1_000_000_000_000i64)],
            underlying_prices: vec![crate::bigmath::pow10(18), crate::bigmath::pow10(18)],
            lp_token_id: Some("USDCUSDT-abcdef".into()),
            lp_token_supply: BigInt::from(2_000_000_000_000i64),
            swap_fee_bps: 4,
            fee_denominator: 10_000,
        }
    }

    #[test]
    fn stable_swap_quote_is_close_to_one_for_balanced_pool() {
        let p = pool();
        let usdc = Token::new("USDC-c76f1f", 6);
        let usdt = Token::new("USDT-f8c08c", 6);
        let (net_out, _, _) = p.quote_out(&usdc, &BigInt::from(1_000_000i64), &usdt).unwrap();
        let diff = (&net_out - BigInt::from(1_000_000i64)).abs();
        assert!(diff < BigInt::from(1_000i64));
    }

    #[test]
    fn deposit_then_withdraw_roundtrips_approximately() {
        let p = pool();
        let minted = p.estimate_deposit(&[BigInt::from(1_000_000i64), BigInt::zero()]).unwrap();
        assert!(minted > BigInt::zero());
    }

    fn big(v: i128) -> BigInt {
        BigInt::from(v)
    }

    /// `examples/original_source/.../pools/test_pools.py::test_StableSwapPool_estimate_amount_out`
    /// (the `BUSD -> USDC` vector, `reserves = [466060e18, 518355e6, 428216e6]`).
    #[test]
    fn three_asset_quote_matches_reference_vector() {
        let pool = StableSwapPool {
            sc_address: VenueAddress([4; 32]),
            amplification: big(256),
            tokens: vec!["BUSD-000000".into(), "USDC-000000".into(), "USDT-000000".into()],
            decimals: vec![18, 6, 6],
            reserves: vec![big(466_060) * crate::bigmath::pow10(18), big(518_355) * crate::bigmath::pow10(6), big(428_216) * crate::bigmath::pow10(6)],
            underlying_prices: vec![crate::bigmath::pow10(18); 3],
            lp_token_id: None,
            lp_token_supply: BigInt::zero(),
            swap_fee_bps: 0,
            fee_denominator: 1_000_000,
        };
        let busd = Token::new("BUSD-000000", 18);
        let usdc = Token::new("USDC-000000", 6);

        let (net_out, admin_in, admin_out) = pool.quote_out(&busd, &(big(100_000) * crate::bigmath::pow10(18)), &usdc).unwrap();
        assert_eq!(net_out, big(99_962_775_195));
        assert!(admin_in.is_zero() && admin_out.is_zero());
    }

    /// `test_StableSwapPool_estimate_amount_out_with_underlying_prices`
    /// (`SEGLD`/`WEGLD`, price-weighted, `amp = 256`).
    #[test]
    fn underlying_price_weighted_quote_matches_reference_vector() {
        let pool = StableSwapPool {
            sc_address: VenueAddress([4; 32]),
            amplification: big(256),
            tokens: vec!["SEGLD-000000".into(), "WEGLD-bd4d79".into()],
            decimals: vec![18, 18],
            reserves: vec!["34757243263043583945104".parse().unwrap(), "15347185452846389893231".parse().unwrap()],
            underlying_prices: vec![big(1_013_470_148_086_771_241), crate::bigmath::pow10(18)],
            lp_token_id: None,
            lp_token_supply: BigInt::zero(),
            swap_fee_bps: 0,
            fee_denominator: 1_000_000,
        };
        let segld = Token::new("SEGLD-000000", 18);
        let wegld = Token::new("WEGLD-bd4d79", 18);

        let (net_out, _, _) = pool.quote_out(&wegld, &(big(5000) * crate::bigmath::pow10(18)), &segld).unwrap();
        assert_eq!(net_out, "4947425727157696845099".parse::<BigInt>().unwrap());
    }

    /// `test_estimate_deposit`'s first vector: an imbalanced two-coin
    /// deposit into a three-asset pool, `liquidity_fees = 187/1_000_000`.
    #[test]
    fn imbalanced_deposit_matches_reference_vector() {
        let pool = StableSwapPool {
            sc_address: VenueAddress([4; 32]),
            amplification: big(256),
            tokens: vec!["USDC-000000".into(), "USDT-000000".into(), "BUSD-000000".into()],
            decimals: vec![6, 6, 6],
            reserves: vec![big(514_710_000_000), big(392_730_000_000), big(495_510_000_000)],
            underlying_prices: vec![crate::bigmath::pow10(18); 3],
            lp_token_id: None,
            lp_token_supply: big(1_398_807_409_000),
            swap_fee_bps: 187,
            fee_denominator: 1_000_000,
        };

        let shares = pool.estimate_deposit(&[BigInt::zero(), big(100_000_000), big(50_000_000)]).unwrap();
        assert_eq!(shares, big(149_599_831));
    }
}
