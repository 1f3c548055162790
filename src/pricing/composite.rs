//! AshSwap-V2-style composite (two-coin, concentrated-liquidity) pool,
//! wrapping the `newton_d`/`newton_y` solvers in `bigmath::composite`.
//!
//! Grounded in `pools/ashswap.py` (`AshSwapPoolV2.estimate_amount_out`,
//! `estimate_theorical_amount_out`, `_fee`). The Python reference keeps `D`,
//! `price_scale` and a separate per-token-scaled `xp` cached on the pool
//! object and only recomputes `D` via `newton_d` when
//! `future_a_gamma_time > 0` (the pool is mid-ramp); otherwise it trusts the
//! last-synced `d`. That cache-or-recompute split is preserved here as
//! `cached_d` / `future_a_gamma_time`. `xp` is distinct from `reserves`: it's
//! the last-synced precision- and price-scaled balance vector, read only by
//! `_fee` (both in the live quote and in the theoretical/no-slippage quote)
//! and by `newton_d`'s ramp recompute — `update_reserves` never touches it,
//! matching the source, where only a fresh sync replaces it.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::bigmath::composite;
use crate::bigmath::{big, floor_div, pow10};
use crate::error::PricingError;
use crate::types::{ExchangeRate, LpTokenComposition, Token, VenueAddress};

use super::{PricingModel, QuoteOut};

#[derive(Debug, Clone)]
pub struct CompositePool {
    pub sc_address: VenueAddress,
    pub tokens: [String; 2],
    pub reserves: [BigInt; 2],
    /// Last-synced precision- and price-scaled balances, distinct from
    /// `reserves`. See the module doc for why it's kept separate.
    pub xp: [BigInt; 2],
    /// Raw (unscaled by either token's decimals) price-scale factor.
    pub price_scale: BigInt,
    pub amp: BigInt,
    pub gamma: BigInt,
    pub cached_d: BigInt,
    pub future_a_gamma_time: i64,
    pub lp_token_id: Option<String>,
    pub lp_token_supply: BigInt,
    pub fee_gamma: BigInt,
    /// Raw fee figures expressed PRECISION(1e18)-relative, as `_fee` computes
    /// and interpolates between them before a final `// 1e10` in the caller.
    pub mid_fee: BigInt,
    pub out_fee: BigInt,
}

impl CompositePool {
    fn index_of(&self, token: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t == token)
    }

    fn d(&self) -> Result<BigInt, PricingError> {
        if self.future_a_gamma_time > 0 {
            composite::newton_d(&self.amp, &self.gamma, &self.xp, &self.reserves)
        } else {
            Ok(self.cached_d.clone())
        }
    }

    /// Dynamic fee interpolating between `mid_fee` (balanced pool) and
    /// `out_fee` (imbalanced pool) by distance from parity, per `_fee` in
    /// the source. Preserves the source's exact left-to-right `*`/`//`
    /// grouping — integer division doesn't associate, so re-ordering this
    /// changes the result.
    fn fee(&self, xp: &[BigInt; 2]) -> BigInt {
        let f = &xp[0] + &xp[1];
        let f_num = &self.fee_gamma * pow10(18);
        let f_den = &self.fee_gamma + pow10(18)
            - floor_div(&(floor_div(&(big(4) * pow10(18) * &xp[0]), &f) * &xp[1]), &f);
        let f = floor_div(&f_num, &f_den);
        let f = &self.mid_fee * &f + &self.out_fee * (pow10(18) - &f);
        floor_div(&f, &pow10(18))
    }

    /// `precisions[k] = 10^(18 - decimals[k])` for this pool's own token
    /// order, worked out from whichever of `token_in`/`token_out` sits at
    /// each index (a two-token pool's swap always names both sides).
    fn precisions(&self, i: usize, token_a: &Token, token_b: &Token) -> [BigInt; 2] {
        let (token0, token1) = if i == 0 { (token_a, token_b) } else { (token_b, token_a) };
        [pow10(18 - token0.decimals), pow10(18 - token1.decimals)]
    }
}

impl PricingModel for CompositePool {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        let i = self
            .index_of(&token_in.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        let j = self
            .index_of(&token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;
        if i == j {
            return Err(PricingError::InvalidToken(token_out.identifier.clone()));
        }
        if amount_in.is_zero() {
            return Ok((BigInt::zero(), BigInt::zero(), BigInt::zero()));
        }

        let precisions = self.precisions(i, token_in, token_out);
        let price_scale_scaled = &self.price_scale * &precisions[1];

        let mut raw = self.reserves.clone();
        raw[i] += amount_in;
        let mut xp = [&raw[0] * &precisions[0], floor_div(&(&raw[1] * &price_scale_scaled), &pow10(18))];

        let d = self.d()?;
        let y = composite::newton_y(&self.amp, &self.gamma, &xp, &d, j, &self.reserves)?;
        let dy_scaled = &xp[j] - &y - BigInt::from(1);
        xp[j] = y;

        let dy = if j > 0 {
            floor_div(&(&dy_scaled * pow10(18)), &price_scale_scaled)
        } else {
            floor_div(&dy_scaled, &precisions[0])
        };

        let fee = floor_div(&(&dy * self.fee(&xp)), &pow10(10));
        let net_out = &dy - &fee;
        if net_out.is_negative() {
            return Err(PricingError::InsufficientLiquidity);
        }
        Ok((net_out, BigInt::zero(), floor_div(&fee, &big(3))))
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        let i = self
            .index_of(&token_in.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_in.identifier.clone()))?;
        let j = self
            .index_of(&token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;
        if i == j {
            return Err(PricingError::InvalidToken(token_out.identifier.clone()));
        }

        let mut amount_out = floor_div(&(amount_in * &self.reserves[j]), &self.reserves[i]);
        let fee = floor_div(&(&amount_out * self.fee(&self.xp)), &pow10(10));
        amount_out -= fee;
        Ok(amount_out)
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
        if self.reserves[0].is_zero() || self.reserves[1].is_zero() {
            return vec![];
        }
        let rate = div_f64(&self.reserves[1], &self.reserves[0]);
        let rate2 = div_f64(&self.reserves[0], &self.reserves[1]);
        vec![ExchangeRate {
            base_token_id: self.tokens[0].clone(),
            quote_token_id: self.tokens[1].clone(),
            rate,
            rate2,
            source: "ashswap".to_string(),
            sc_address,
            base_token_liquidity: self.reserves[0].clone(),
            quote_token_liquidity: self.reserves[1].clone(),
        }]
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        let lp_token_id = self.lp_token_id.clone()?;
        Some(LpTokenComposition {
            lp_token_id,
            lp_token_supply: self.lp_token_supply.clone(),
            token_ids: self.tokens.to_vec(),
            token_reserves: self.reserves.to_vec(),
        })
    }

    fn source(&self) -> &'static str {
        "ashswap"
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

    /// `examples/original_source/opendex_aggregator_api/pools/test_ashswap_v2.py::test_AshSwapPoolV2_estimate_amount_out`,
    /// a literal fixed vector straight from the source's own test suite.
    fn reference_pool() -> CompositePool {
        CompositePool {
            sc_address: VenueAddress([5; 32]),
            tokens: ["IN-000000".into(), "OUT-000000".into()],
            reserves: [big(6_610_310_763), "10775028285126628963544615".parse().unwrap()],
            xp: ["6610310763000000000000".parse().unwrap(), "8175014856796592762449".parse().unwrap()],
            price_scale: big(758_700_083_236_071),
            amp: big(400_000),
            gamma: big(145_000_000_000_000),
            cached_d: "14713381882176947720176".parse().unwrap(),
            future_a_gamma_time: 0,
            lp_token_id: None,
            lp_token_supply: BigInt::zero(),
            fee_gamma: big(230_000_000_000_000),
            mid_fee: big(20_000_000),
            out_fee: big(40_000_000),
        }
    }

    #[test]
    fn quote_out_matches_reference_vector() {
        let pool = reference_pool();
        let token_in = Token::new("IN-000000", 6);
        let token_out = Token::new("OUT-000000", 18);

        let (net_out, admin_in, admin_out) = pool.quote_out(&token_in, &big(100_000_000), &token_out).unwrap();
        assert_eq!(net_out, "158153183456644670162885".parse::<BigInt>().unwrap());
        assert_eq!(admin_in, BigInt::zero());
        assert_eq!(admin_out, "208848375516246118801".parse::<BigInt>().unwrap());
    }

    #[test]
    fn quote_out_keeps_output_below_reserve() {
        let pool = reference_pool();
        let token_in = Token::new("IN-000000", 6);
        let token_out = Token::new("OUT-000000", 18);
        let (net_out, _, admin_out) = pool.quote_out(&token_in, &big(100_000_000), &token_out).unwrap();
        assert!(net_out + admin_out < pool.reserves[1]);
    }

    #[test]
    fn zero_amount_in_quotes_zero() {
        let pool = reference_pool();
        let token_in = Token::new("IN-000000", 6);
        let token_out = Token::new("OUT-000000", 18);
        let (net_out, admin_in, admin_out) = pool.quote_out(&token_in, &BigInt::zero(), &token_out).unwrap();
        assert!(net_out.is_zero() && admin_in.is_zero() && admin_out.is_zero());
    }
}
