//! Newton solvers for the AshSwap-V2-style composite reserve-invariant pool.
//!
//! Grounded in `pools/ashswap.py` (`geometric_mean`, `newton_d`, `newton_y`).
//! Every `assert` in the Python reference becomes an `UnsafeValue` error
//! here; the Python reference is itself two-token-only (`AshSwapPoolV2`
//! asserts `len(tokens) == 2`), so `newton_y`'s `x[1 - i]` indexing is kept
//! as-is rather than generalized to N coins.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::bigmath::{big, floor_div, pow10};
use crate::error::PricingError;

pub const A_MULTIPLIER: i64 = 10_000;
const MAX_ITERATIONS: u32 = 255;

fn min_gamma() -> BigInt {
    pow10(10)
}

fn max_gamma() -> BigInt {
    big(2) * pow10(16)
}

fn precision() -> BigInt {
    pow10(18)
}

fn unsafe_value(msg: &str) -> PricingError {
    PricingError::UnsafeValue(msg.to_string())
}

fn did_not_converge(msg: &str) -> PricingError {
    PricingError::DidNotConverge(msg.to_string())
}

/// Newton iteration for the geometric mean of a coin-balance vector.
pub fn geometric_mean(unsorted_x: &[BigInt]) -> Result<BigInt, PricingError> {
    let n_coins = big(unsorted_x.len() as i64);
    let precision = precision();

    let mut d = unsorted_x[0].clone();

    for _ in 0..MAX_ITERATIONS {
        let d_prev = d.clone();
        let mut tmp = precision.clone();
        for x in unsorted_x {
            tmp = floor_div(&(&tmp * x), &d);
        }
        d = floor_div(
            &(&d * (&n_coins - BigInt::one()) * &precision + &tmp),
            &(&n_coins * &precision),
        );

        let diff = (&d - &d_prev).abs();
        if diff <= BigInt::one() || &diff * &precision < d {
            return Ok(d);
        }
    }

    Err(did_not_converge("geometric_mean did not converge"))
}

fn ann_bounds(n_coins: i64) -> (BigInt, BigInt) {
    let n_pow = BigInt::from(n_coins.pow(n_coins as u32));
    let min_a = floor_div(&(&n_pow * big(A_MULTIPLIER)), &big(10));
    let max_a = &n_pow * big(A_MULTIPLIER) * big(10_000);
    (min_a, max_a)
}

/// Recompute the composite invariant `D` from scratch, used when
/// `future_a_gamma_time > 0` (the pool is mid-ramp on `A`/`gamma`).
pub fn newton_d(
    ann: &BigInt,
    gamma: &BigInt,
    x_unsorted: &[BigInt],
    reserves: &[BigInt],
) -> Result<BigInt, PricingError> {
    let n_coins = reserves.len() as i64;
    let n_coins_b = big(n_coins);
    let precision = precision();

    let (min_a, max_a) = ann_bounds(n_coins);
    if !(ann > &(&min_a - BigInt::one()) && ann < &(&max_a + BigInt::one())) {
        return Err(unsafe_value("invalid ann"));
    }
    if !(gamma > &(min_gamma() - BigInt::one()) && gamma < &(max_gamma() + BigInt::one())) {
        return Err(unsafe_value("invalid gamma"));
    }

    let mut x = x_unsorted.to_vec();
    x.sort();

    if !(x[0] > pow10(9) - BigInt::one() && x[0] < pow10(33) + BigInt::one()) {
        return Err(unsafe_value("invalid x0"));
    }
    if floor_div(&(&x[1] * pow10(18)), &x[0]) <= pow10(14) - BigInt::one() {
        return Err(unsafe_value("invalid x1"));
    }

    let mut d = geometric_mean(&x)? * &n_coins_b;
    let s: BigInt = x.iter().sum();

    let n_pow = BigInt::from(n_coins.pow(n_coins as u32));
    let gamma_sq = gamma * gamma;

    for _ in 0..MAX_ITERATIONS {
        let d_prev = d.clone();

        let k0 = floor_div(&(&x[0] * &precision * &n_pow * &x[1]), &(&d * &d));

        let g1k0_raw = gamma + &precision;
        let g1k0 = (&k0 - &g1k0_raw).abs() + BigInt::one();

        let mul1 = floor_div(
            &(&d * &precision * &g1k0 * &g1k0 * big(A_MULTIPLIER)),
            &(&gamma_sq * ann),
        );
        let mul2 = floor_div(&(&precision * big(2) * &n_coins_b * &k0), &g1k0);

        let neg_fprime = &s
            + floor_div(&(&s * &mul2), &precision)
            + floor_div(&(&mul1 * &n_coins_b), &k0)
            - floor_div(&(&mul2 * &d), &precision);

        let d_plus = floor_div(&(&d * (&neg_fprime + &s)), &neg_fprime);
        let mut d_minus = floor_div(&(&d * &d), &neg_fprime);

        if precision > k0 {
            d_minus += floor_div(
                &(floor_div(&(&d * floor_div(&mul1, &neg_fprime)), &precision) * (&precision - &k0)),
                &k0,
            );
        } else {
            d_minus -= floor_div(
                &(floor_div(&(&d * floor_div(&mul1, &neg_fprime)), &precision) * (&k0 - &precision)),
                &k0,
            );
        }

        d = if d_plus > d_minus {
            d_plus - d_minus
        } else {
            floor_div(&(d_minus - d_plus), &big(2))
        };

        let diff = (&d - &d_prev).abs();
        let max_d = std::cmp::max(d.clone(), pow10(16));

        if &diff * pow10(14) < max_d {
            for xi in &x {
                let frac = floor_div(&(xi * &precision), &d);
                if !(frac > pow10(16) - BigInt::one() && frac < pow10(20) + BigInt::one()) {
                    return Err(unsafe_value("unsafe value"));
                }
            }
            return Ok(d);
        }
    }

    Err(did_not_converge("newton_d did not converge"))
}

/// Solve for the composite-pool balance of token `i` given the other
/// token's transformed balance and the (possibly stale) invariant `d`.
pub fn newton_y(
    ann: &BigInt,
    gamma: &BigInt,
    x: &[BigInt; 2],
    d: &BigInt,
    i: usize,
    reserves: &[BigInt],
) -> Result<BigInt, PricingError> {
    let n_coins = reserves.len() as i64;
    let n_coins_b = big(n_coins);
    let precision = precision();

    let (min_a, max_a) = ann_bounds(n_coins);
    if !(ann > &(&min_a - BigInt::one()) && ann < &(&max_a + BigInt::one())) {
        return Err(unsafe_value("Unsafe value A"));
    }
    if !(gamma > &(min_gamma() - BigInt::one()) && gamma < &(max_gamma() + BigInt::one())) {
        return Err(unsafe_value("Unsafe value gamma"));
    }
    if !(d > &(pow10(17) - BigInt::one()) && d < &(pow10(33) + BigInt::one())) {
        return Err(unsafe_value("invalid d"));
    }

    for k in 0..2usize {
        if k != i {
            let frac = floor_div(&(&x[k] * pow10(18)), d);
            if !(frac > pow10(16) - BigInt::one() && frac < pow10(20) - BigInt::one()) {
                return Err(unsafe_value("unsafe value"));
            }
        }
    }

    let x_j = x[1 - i].clone();
    let mut y = floor_div(&(d * d), &(&x_j * &n_coins_b * &n_coins_b));
    let k0_i = floor_div(&(&x_j * &precision * &n_coins_b), d);
    if !(k0_i > (&n_coins_b * pow10(16) - BigInt::one())
        && k0_i < (&n_coins_b * pow10(20) + BigInt::one()))
    {
        return Err(unsafe_value("unsafe value"));
    }

    let convergence_limit = std::cmp::max(
        std::cmp::max(floor_div(&x_j, &pow10(14)), floor_div(d, &pow10(14))),
        big(100),
    );

    for _ in 0..MAX_ITERATIONS {
        let y_prev = y.clone();
        let k0 = floor_div(&(&k0_i * &y * &n_coins_b), d);
        let s = &x_j + &y;

        let g1k0_raw = gamma + pow10(18);
        let g1k0 = (&k0 - &g1k0_raw).abs() + BigInt::one();

        let mul1 = floor_div(
            &(floor_div(
                &(floor_div(&(d * &precision), gamma) * &g1k0),
                gamma,
            ) * &g1k0
                * big(A_MULTIPLIER)),
            ann,
        );
        let mul2 = floor_div(&(&k0 * big(2) * &precision), &g1k0) + &precision;

        let yfprime_raw = &y * &precision + &s * &mul2 + &mul1;
        let dyfprime = d * &mul2;

        if yfprime_raw < dyfprime {
            y = floor_div(&y_prev, &big(2));
            continue;
        }
        let yfprime = yfprime_raw - dyfprime;

        let fprime = floor_div(&yfprime, &y);

        let mut y_minus = floor_div(&mul1, &fprime);
        let y_plus = floor_div(&(d * &precision + &yfprime), &fprime)
            + floor_div(&(&y_minus * &precision), &k0);
        y_minus += floor_div(&(&s * &precision), &fprime);

        y = if y_plus < y_minus {
            floor_div(&y_prev, &big(2))
        } else {
            y_plus - y_minus
        };

        let diff = (&y - &y_prev).abs();
        let limit = std::cmp::max(convergence_limit.clone(), floor_div(&y, &pow10(14)));

        if diff < limit {
            let frac = floor_div(&(&y * &precision), d);
            if !(frac > pow10(16) - BigInt::one() && frac < pow10(20) + BigInt::one()) {
                return Err(unsafe_value("Unsafe value for y"));
            }
            return Ok(y);
        }
    }

    Err(did_not_converge("newton_y did not converge"))
}
