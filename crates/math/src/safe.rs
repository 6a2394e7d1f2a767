/// Safe arithmetic operations with overflow protection
///
/// All operations return errors instead of panicking. Products of two
/// amounts go through a 256-bit intermediate so `a * b / c` never overflows
/// before the division.

use ethnum::U256;
use liquidity_types::{LiquidityError, LiquidityResult};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

// ============================================================================
// Safe Basic Arithmetic
// ============================================================================

/// Safe addition for u128 values
pub fn safe_add_u128(a: u128, b: u128) -> LiquidityResult<u128> {
    a.checked_add(b)
        .ok_or_else(|| LiquidityError::math_overflow(&format!("u128 addition {} + {}", a, b)))
}

/// Safe subtraction for u128 values
pub fn safe_sub_u128(a: u128, b: u128) -> LiquidityResult<u128> {
    a.checked_sub(b)
        .ok_or_else(|| LiquidityError::math_underflow(&format!("u128 subtraction {} - {}", a, b)))
}

/// Safe multiplication for u128 values
pub fn safe_mul_u128(a: u128, b: u128) -> LiquidityResult<u128> {
    a.checked_mul(b)
        .ok_or_else(|| LiquidityError::math_overflow(&format!("u128 multiplication {} * {}", a, b)))
}

/// Safe division for u128 values
pub fn safe_div_u128(a: u128, b: u128) -> LiquidityResult<u128> {
    if b == 0 {
        return Err(LiquidityError::division_by_zero(&format!("u128 division {} / 0", a)));
    }
    Ok(a / b)
}

/// Sum a sequence of amounts
pub fn safe_sum_u128<I>(values: I) -> LiquidityResult<u128>
where
    I: IntoIterator<Item = u128>,
{
    values.into_iter().try_fold(0u128, safe_add_u128)
}

// ============================================================================
// Mul-Div
// ============================================================================

/// `a * b / denominator` with a 256-bit intermediate
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> LiquidityResult<u128> {
    if denominator == 0 {
        return Err(LiquidityError::division_by_zero("mul_div"));
    }

    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut quotient = product / denominator;

    if rounding == Rounding::Up && product % denominator != U256::ZERO {
        quotient += U256::ONE;
    }

    let (hi, lo) = quotient.into_words();
    if hi != 0 {
        return Err(LiquidityError::math_overflow(&format!("mul_div {} * {} / {}", a, b, denominator)));
    }
    Ok(lo)
}

/// `floor(amount * part / whole)`
pub fn proportional_share(amount: u128, part: u128, whole: u128) -> LiquidityResult<u128> {
    mul_div(amount, part, whole, Rounding::Down)
}
