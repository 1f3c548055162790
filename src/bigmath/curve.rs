//! Curve-style StableSwap invariant solvers.
//!
//! Grounded in `pools/curve.py` (`D`, `y`, `y_D`). `D` and `y` are ported
//! close to literally; `y_D`'s reference implementation conflates its
//! token-index parameter `i` with the iteration counter in the `while i <
//! MAX_ITERS` guard, which makes the loop run until convergence rather
//! than for a bounded number of steps. Here it gets its own counter and
//! the same `DidNotConverge` budget as `D`/`y`, per §4.1 of the spec.

use num_traits::{One, Signed, Zero};

use crate::bigmath::{big, floor_div};
use crate::error::PricingError;
use num_bigint::BigInt;

const MAX_ITERS: u32 = 128;

/// Stable-swap invariant `D` for an arbitrary number of balanced coins.
pub fn d(amp: &BigInt, amounts: &[BigInt]) -> Result<BigInt, PricingError> {
    let n_coins = big(amounts.len() as i64);
    let ann = amp * &n_coins;
    let s: BigInt = amounts.iter().sum();
    if s.is_zero() {
        return Ok(BigInt::zero());
    }

    let mut d_prev = BigInt::zero();
    let mut d = s.clone();

    for _ in 0..MAX_ITERS {
        let mut d_p = d.clone();
        for a in amounts {
            d_p = floor_div(&(&d_p * &d), &(a * &n_coins));
        }
        d_prev = d.clone();

        let d_num = (&ann * &s + &d_p * &n_coins) * &d;
        let d_den = (&ann - BigInt::one()) * &d + (&n_coins + BigInt::one()) * &d_p;
        d = floor_div(&d_num, &d_den);

        if (&d_prev - &d).abs() <= BigInt::one() {
            return Ok(d);
        }
    }

    let _ = d_prev;
    Err(PricingError::DidNotConverge("D didn't converge".into()))
}

/// Solve for the new balance of `i_token_out` given that `i_token_in`'s
/// balance has moved to `token_in_balance`, holding `D` fixed.
pub fn y(
    amp: &BigInt,
    amounts: &[BigInt],
    i_token_in: usize,
    i_token_out: usize,
    token_in_balance: &BigInt,
) -> Result<BigInt, PricingError> {
    let n_coins = amounts.len();
    let d_val = d(amp, amounts)?;
    let ann = amp * big(n_coins as i64);

    let mut updated = amounts.to_vec();
    updated[i_token_in] = token_in_balance.clone();
    let reduced: Vec<BigInt> = updated
        .iter()
        .enumerate()
        .filter(|(k, _)| *k != i_token_out)
        .map(|(_, v)| v.clone())
        .collect();

    let n_coins_b = big(n_coins as i64);
    let mut c = d_val.clone();
    for yv in &reduced {
        c = floor_div(&(&c * &d_val), &(yv * &n_coins_b));
    }
    c = floor_div(&(&c * &d_val), &(&n_coins_b * &ann));

    let sum_reduced: BigInt = reduced.iter().sum();
    let b = sum_reduced + floor_div(&d_val, &ann) - &d_val;

    let mut y_prev = BigInt::zero();
    let mut y_val = d_val.clone();

    for _ in 0..MAX_ITERS {
        y_prev = y_val.clone();
        y_val = floor_div(&(&y_val * &y_val + &c), &(big(2) * &y_val + &b));

        if (&y_prev - &y_val).abs() <= BigInt::one() {
            return Ok(y_val);
        }
    }

    let _ = y_prev;
    Err(PricingError::DidNotConverge("y didn't converge".into()))
}

/// Solve for the balance of token `i` such that the invariant evaluates to
/// `target_d`, holding every other balance fixed. Used by the stable-swap
/// deposit/withdraw formulas in `stable_swap.rs`.
pub fn y_d(
    amp: &BigInt,
    amounts: &[BigInt],
    i: usize,
    target_d: &BigInt,
) -> Result<BigInt, PricingError> {
    let n_coins = amounts.len();
    let n_coins_b = big(n_coins as i64);

    let xx: Vec<BigInt> = amounts
        .iter()
        .enumerate()
        .filter(|(k, _)| *k != i)
        .map(|(_, v)| v.clone())
        .collect();

    let s: BigInt = xx.iter().sum();
    let ann = amp * &n_coins_b;

    let mut c = target_d.clone();
    for yv in &xx {
        c = floor_div(&(&c * target_d), &(yv * &n_coins_b));
    }
    c = floor_div(&(&c * target_d), &(&n_coins_b * &ann));

    let b = s + floor_div(target_d, &ann);

    let mut y_prev = BigInt::zero();
    let mut y_val = target_d.clone();

    for _ in 0..MAX_ITERS {
        y_prev = y_val.clone();
        let denom = big(2) * &y_val + &b - target_d;
        y_val = floor_div(&(&y_val * &y_val + &c), &denom);

        if (&y_prev - &y_val).abs() <= BigInt::one() {
            return Ok(y_val);
        }
    }

    let _ = y_prev;
    Err(PricingError::DidNotConverge("y_D didn't converge".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(vals: &[i128]) -> Vec<BigInt> {
        vals.iter().map(|v| BigInt::from(*v)).collect()
    }

    #[test]
    fn d_converges_for_balanced_pool() {
        let amp = big(256);
        let xs = amounts(&[466_060_000_000_000_000_000_000i128, 518_355_000_000, 428_216_000_000]);
        let result = d(&amp, &xs).unwrap();
        assert!(result > BigInt::zero());
    }

    #[test]
    fn y_d_roundtrips_through_d() {
        let amp = big(256);
        let xs = amounts(&[514_710_000_000i128, 392_730_000_000, 495_510_000_000]);
        let d0 = d(&amp, &xs).unwrap();
        let y0 = y_d(&amp, &xs, 1, &d0).unwrap();
        assert!((&y0 - &xs[1]).abs() <= BigInt::one());
    }
}
