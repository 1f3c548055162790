//! Arbitrary-precision pool arithmetic.
//!
//! Every pricing model does its math in [`num_bigint::BigInt`], never in
//! `f64` — the composite-pool Newton solver's intermediate products
//! (`d * PRECISION * g1k0^2 * A_MULTIPLIER`, see [`composite::newton_d`])
//! routinely exceed 256 bits for realistic reserve magnitudes, so a
//! fixed-width integer (the teacher's `ethers::types::U256`) is not wide
//! enough here. `rate`/`rate2` reporting fields are the only place this
//! crate touches floating point.

pub mod composite;
pub mod curve;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

pub fn big(v: i64) -> BigInt {
    BigInt::from(v)
}

/// `10^n` as a `BigInt`, used pervasively for decimal normalization.
pub fn pow10(n: u32) -> BigInt {
    BigInt::from(10).pow(n)
}

pub fn abs_diff(a: &BigInt, b: &BigInt) -> BigInt {
    (a - b).abs()
}

/// Floor division matching Python's `//` for the (always non-negative in
/// this domain) operands the solvers work with.
pub fn floor_div(a: &BigInt, b: &BigInt) -> BigInt {
    a / b
}

pub fn ceil_div(a: &BigInt, b: &BigInt) -> BigInt {
    if b.is_zero() {
        return BigInt::zero();
    }
    let (q, r) = (a / b, a % b);
    if r.is_zero() {
        q
    } else {
        q + BigInt::one()
    }
}
