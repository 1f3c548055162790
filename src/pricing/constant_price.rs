//! Constant-price pools: liquid-staking and money-market wrappers that
//! swap at a fixed (or slowly-drifting) exchange rate rather than an
//! `x*y=k` curve.
//!
//! Grounded in `pools/xoxno.py` (`XoxnoLiquidStakingPool`, minimum-input
//! check on the WEGLD leg) and `pools/hatom.py` (`HatomMoneyMarketPool`,
//! flat gas surcharge on mint/redeem). Both wrap the same constant-price
//! math, kept as one struct with a variant tag rather than two pool types,
//! matching the "few and closed" design note for this family.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::PricingError;
use crate::types::{ExchangeRate, LpTokenComposition, Token, VenueAddress};

use super::{denormalize_amount, normalize_amount, PricingModel, QuoteOut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantPriceVariant {
    Base,
    /// xExchange-adjacent liquid staking: rejects inputs below a venue
    /// minimum stake amount.
    Xoxno { min_input: u64 },
    /// Hatom money market: mint/redeem charge a fixed gas surcharge beyond
    /// the base estimate, reflected only in `gas_estimate`.
    Hatom { extra_gas: u64 },
}

/// `exchange_rate_num / exchange_rate_den`: the fixed conversion rate from
/// `underlying_token` to `derived_token` (e.g. EGLD -> sEGLD), updated by
/// the sync worker on each cycle rather than derived from reserves.
#[derive(Debug, Clone)]
pub struct ConstantPricePool {
    pub source: &'static str,
    pub sc_address: VenueAddress,
    pub underlying_token: String,
    pub derived_token: String,
    pub exchange_rate_num: BigInt,
    pub exchange_rate_den: BigInt,
    pub underlying_liquidity: BigInt,
    pub derived_liquidity: BigInt,
    pub variant: ConstantPriceVariant,
}

impl ConstantPricePool {
    fn direction(&self, token_in: &str, token_out: &str) -> Option<bool> {
        if token_in == self.underlying_token && token_out == self.derived_token {
            Some(true)
        } else if token_in == self.derived_token && token_out == self.underlying_token {
            Some(false)
        } else {
            None
        }
    }
}

impl PricingModel for ConstantPricePool {
    fn quote_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<QuoteOut, PricingError> {
        let forward = self
            .direction(&token_in.identifier, &token_out.identifier)
            .ok_or_else(|| PricingError::InvalidToken(token_out.identifier.clone()))?;

        if let ConstantPriceVariant::Xoxno { min_input } = self.variant {
            if forward && amount_in < &BigInt::from(min_input) {
                return Err(PricingError::InsufficientInput(format!(
                    "amount_in below minimum stake of {min_input}"
                )));
            }
        }

        // pools.py normalizes to 18 decimals, applies the rate, then
        // denormalizes to the output token's own decimals; skipping this
        // for cross-decimal pairs (e.g. an 18-decimal stake token redeemed
        // for a 6-decimal one) would misprice the quote by 10^|dec diff|.
        let normalized_in = normalize_amount(amount_in, token_in.decimals);
        let normalized_out = if forward {
            (&normalized_in * &self.exchange_rate_num) / &self.exchange_rate_den
        } else {
            (&normalized_in * &self.exchange_rate_den) / &self.exchange_rate_num
        };
        let net_out = denormalize_amount(&normalized_out, token_out.decimals);
        Ok((net_out, BigInt::zero(), BigInt::zero()))
    }

    fn theoretical_out(&self, token_in: &Token, amount_in: &BigInt, token_out: &Token) -> Result<BigInt, PricingError> {
        Ok(self.quote_out(token_in, amount_in, token_out)?.0)
    }

    fn update_reserves(&mut self, token_in: &Token, amount_in_net: &BigInt, token_out: &Token, amount_out_plus_admin: &BigInt) {
        if token_in.identifier == self.underlying_token {
            self.underlying_liquidity += amount_in_net;
        } else if token_in.identifier == self.derived_token {
            self.derived_liquidity += amount_in_net;
        }
        if token_out.identifier == self.underlying_token {
            self.underlying_liquidity -= amount_out_plus_admin;
        } else if token_out.identifier == self.derived_token {
            self.derived_liquidity -= amount_out_plus_admin;
        }
    }

    fn gas_estimate(&self) -> u64 {
        match self.variant {
            ConstantPriceVariant::Base | ConstantPriceVariant::Xoxno { .. } => 20_000_000,
            ConstantPriceVariant::Hatom { extra_gas } => 20_000_000 + extra_gas,
        }
    }

    fn exchange_rates(&self, sc_address: VenueAddress) -> Vec<ExchangeRate> {
        let rate = div_f64(&self.exchange_rate_num, &self.exchange_rate_den);
        let rate2 = div_f64(&self.exchange_rate_den, &self.exchange_rate_num);
        vec![ExchangeRate {
            base_token_id: self.underlying_token.clone(),
            quote_token_id: self.derived_token.clone(),
            rate,
            rate2,
            source: self.source.to_string(),
            sc_address,
            base_token_liquidity: self.underlying_liquidity.clone(),
            quote_token_liquidity: self.derived_liquidity.clone(),
        }]
    }

    fn lp_token_composition(&self) -> Option<LpTokenComposition> {
        None
    }

    fn source(&self) -> &'static str {
        self.source
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

    fn pool(variant: ConstantPriceVariant) -> ConstantPricePool {
        ConstantPricePool {
            source: "xoxno",
            sc_address: VenueAddress([4; 32]),
            underlying_token: "EGLD".into(),
            derived_token: "SEGLD-3cd9b1".into(),
            exchange_rate_num: BigInt::from(1_050_000_000_000_000_000i128),
            exchange_rate_den: BigInt::from(1_000_000_000_000_000_000i128),
            underlying_liquidity: BigInt::from(10_000_000_000_000_000_000_000i128),
            derived_liquidity: BigInt::from(9_500_000_000_000_000_000_000i128),
            variant,
        }
    }

    #[test]
    fn xoxno_rejects_below_minimum_stake() {
        let p = pool(ConstantPriceVariant::Xoxno { min_input: 1_000_000_000_000_000_000 });
        let egld = Token::new("EGLD", 18);
        let segld = Token::new("SEGLD-3cd9b1", 18);
        let err = p.quote_out(&egld, &BigInt::from(1_000), &segld).unwrap_err();
        assert!(matches!(err, PricingError::InsufficientInput(_)));
    }

    #[test]
    fn quote_out_normalizes_across_differing_decimals() {
        let mut p = pool(ConstantPriceVariant::Base);
        p.derived_token = "USDC-c76f1f".into();
        let egld = Token::new("EGLD", 18);
        let usdc_derived = Token::new("USDC-c76f1f", 6);

        let (net_out, admin_in, admin_out) = p.quote_out(&egld, &BigInt::from(10u64.pow(18)), &usdc_derived).unwrap();
        assert_eq!(net_out, BigInt::from(1_050_000i64));
        assert_eq!(admin_in, BigInt::zero());
        assert_eq!(admin_out, BigInt::zero());
    }

    #[test]
    fn hatom_gas_estimate_includes_surcharge() {
        let p = pool(ConstantPriceVariant::Hatom { extra_gas: 5_000_000 });
        assert_eq!(p.gas_estimate(), 25_000_000);
    }
}
