//! # SimpleSwap Math - Wide-Integer AMM Arithmetic
//!
//! ## Purpose
//!
//! Integer arithmetic primitives for constant-product AMM calculations:
//! ratio scaling that cannot overflow on 256-bit operands, floor square
//! roots for initial liquidity minting, and explicit overflow reporting
//! instead of silent wraparound.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Reserve and amount values from the swap engine
//! - **Output Destinations**: Liquidity minting, swap pricing, price queries
//! - **Precision**: All division truncates toward zero; rounding loss always
//!   favors the pool, never the caller
//!
//! No floating point and no `Decimal` appear anywhere in this crate: amounts
//! are native-unit integers end to end.

use ethers_core::types::{U256, U512};

/// Arithmetic failures surfaced to callers instead of wrapping or panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,
}

/// Computes `floor(a * b / denominator)` without overflowing the
/// intermediate product.
///
/// The multiplication is performed in 512 bits, so any `a * b` is exact;
/// the result only fails with [`MathError::Overflow`] when the final
/// quotient itself does not fit in 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let wide = a.full_mul(b) / U512::from(denominator);
    U256::try_from(wide).map_err(|_| MathError::Overflow)
}

/// Floor integer square root via the Babylonian method.
///
/// `integer_sqrt(n)` is the largest `x` with `x * x <= n`.
pub fn integer_sqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let mut x = n;
    let mut y = (x + U256::one()) >> 1;
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

/// Checked addition lifted into [`MathError`].
pub fn checked_add(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// Checked subtraction lifted into [`MathError`].
///
/// Underflow is reported as [`MathError::Overflow`]: for unsigned reserve
/// arithmetic both are the same failure, a result outside the representable
/// range.
pub fn checked_sub(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_sub(b).ok_or(MathError::Overflow)
}

/// Checked multiplication lifted into [`MathError`].
pub fn checked_mul(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u128) -> U256 {
        U256::from(v)
    }

    /// 10^18, the base unit of an 18-decimal token.
    fn wad() -> U256 {
        U256::exp10(18)
    }

    #[test]
    fn mul_div_floors_toward_zero() {
        assert_eq!(mul_div(u(7), u(3), u(2)).unwrap(), u(10)); // 21/2
        assert_eq!(mul_div(u(1), u(1), u(3)).unwrap(), u(0));
        assert_eq!(mul_div(u(0), u(5), u(3)).unwrap(), u(0));
    }

    #[test]
    fn mul_div_survives_wide_intermediate() {
        // a * b far exceeds 256 bits, but the quotient fits.
        let a = U256::from(2).pow(u(200));
        let b = U256::from(2).pow(u(200));
        let c = U256::from(2).pow(u(200));
        assert_eq!(mul_div(a, b, c).unwrap(), a);
    }

    #[test]
    fn mul_div_reports_quotient_overflow() {
        let a = U256::MAX;
        assert_eq!(mul_div(a, a, U256::one()), Err(MathError::Overflow));
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert_eq!(mul_div(u(1), u(1), u(0)), Err(MathError::DivisionByZero));
    }

    #[test]
    fn sqrt_small_values() {
        assert_eq!(integer_sqrt(u(0)), u(0));
        assert_eq!(integer_sqrt(u(1)), u(1));
        assert_eq!(integer_sqrt(u(3)), u(1));
        assert_eq!(integer_sqrt(u(4)), u(2));
        assert_eq!(integer_sqrt(u(99)), u(9));
        assert_eq!(integer_sqrt(u(100)), u(10));
    }

    #[test]
    fn sqrt_of_wad_squared() {
        assert_eq!(integer_sqrt(wad() * wad()), wad());
    }

    #[test]
    fn sqrt_of_bootstrap_deposit() {
        // First liquidity deposit of (500e18, 1000e18):
        // floor(sqrt(500e18 * 1000e18)) = 707106781186547524400
        let product = (u(500) * wad()) * (u(1000) * wad());
        let expected = U256::from_dec_str("707106781186547524400").unwrap();
        assert_eq!(integer_sqrt(product), expected);
    }

    #[test]
    fn checked_ops_report_overflow() {
        assert_eq!(checked_add(U256::MAX, u(1)), Err(MathError::Overflow));
        assert_eq!(checked_sub(u(1), u(2)), Err(MathError::Overflow));
        assert_eq!(checked_mul(U256::MAX, u(2)), Err(MathError::Overflow));
        assert_eq!(checked_add(u(2), u(3)).unwrap(), u(5));
        assert_eq!(checked_sub(u(3), u(2)).unwrap(), u(1));
        assert_eq!(checked_mul(u(3), u(2)).unwrap(), u(6));
    }

    proptest::proptest! {
        #[test]
        fn sqrt_is_floor(n in proptest::prelude::any::<u128>()) {
            let root = integer_sqrt(U256::from(n));
            proptest::prop_assert!(root * root <= U256::from(n));
            let next = root + U256::one();
            proptest::prop_assert!(next * next > U256::from(n));
        }

        #[test]
        fn mul_div_matches_u128_when_exact(
            a in proptest::prelude::any::<u64>(),
            b in proptest::prelude::any::<u64>(),
            c in 1u64..,
        ) {
            let expected = (a as u128) * (b as u128) / (c as u128);
            let got = mul_div(U256::from(a), U256::from(b), U256::from(c)).unwrap();
            proptest::prop_assert_eq!(got, U256::from(expected));
        }
    }
}
