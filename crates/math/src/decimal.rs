/// Decimal utilities for rates and prices
///
/// Rates and prices are `rust_decimal::Decimal`. Applying a decimal to an
/// amount goes through its exact mantissa/scale form and the 256-bit mul-div,
/// so results are exact up to the chosen rounding and independent of the
/// amount's magnitude.

use ethnum::U256;
use liquidity_types::{LiquidityError, LiquidityResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::safe::{mul_div, Rounding};

/// Largest integer a `Decimal` can hold exactly
const DECIMAL_MAX_INT: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Most fractional digits a `Decimal` carries
const DECIMAL_MAX_SCALE: u32 = 28;

// ============================================================================
// Conversions
// ============================================================================

/// Convert an amount to a decimal
pub fn to_decimal(amount: u128) -> LiquidityResult<Decimal> {
    Decimal::from_u128(amount).ok_or_else(|| LiquidityError::math_overflow("amount to decimal"))
}

/// Truncate a non-negative decimal to an amount
pub fn floor_to_u128(value: Decimal) -> LiquidityResult<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LiquidityError::math_underflow("negative decimal to amount"));
    }
    value
        .floor()
        .to_u128()
        .ok_or_else(|| LiquidityError::math_overflow("decimal to amount"))
}

/// Round a non-negative decimal up to an amount
pub fn ceil_to_u128(value: Decimal) -> LiquidityResult<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LiquidityError::math_underflow("negative decimal to amount"));
    }
    value
        .ceil()
        .to_u128()
        .ok_or_else(|| LiquidityError::math_overflow("decimal to amount"))
}

/// Split a non-negative decimal into `(mantissa, 10^scale)`
pub(crate) fn fraction_parts(value: Decimal) -> LiquidityResult<(u128, u128)> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LiquidityError::math_underflow("negative decimal factor"));
    }
    let mantissa = value.mantissa().unsigned_abs();
    let denominator = 10u128
        .checked_pow(value.scale())
        .ok_or_else(|| LiquidityError::math_overflow("decimal scale"))?;
    Ok((mantissa, denominator))
}

// ============================================================================
// Amount Arithmetic
// ============================================================================

/// `amount * factor`, rounded as requested
pub fn mul_amount(amount: u128, factor: Decimal, rounding: Rounding) -> LiquidityResult<u128> {
    let (mantissa, denominator) = fraction_parts(factor)?;
    mul_div(amount, mantissa, denominator, rounding)
}

/// `amount / divisor`, rounded as requested
pub fn div_amount(amount: u128, divisor: Decimal, rounding: Rounding) -> LiquidityResult<u128> {
    let (mantissa, denominator) = fraction_parts(divisor)?;
    if mantissa == 0 {
        return Err(LiquidityError::division_by_zero("amount / decimal"));
    }
    mul_div(amount, denominator, mantissa, rounding)
}

/// `numerator / denominator` as a decimal
pub fn ratio(numerator: u128, denominator: u128) -> LiquidityResult<Decimal> {
    ratio_wide(U256::from(numerator), U256::from(denominator), Rounding::Down)
}

/// `numerator / denominator` of 256-bit operands as a decimal
///
/// Keeps as many fractional digits as the quotient leaves room for, rounded
/// as requested. Fails only when the integer part exceeds the decimal range.
pub fn ratio_wide(numerator: U256, denominator: U256, rounding: Rounding) -> LiquidityResult<Decimal> {
    if denominator == U256::ZERO {
        return Err(LiquidityError::division_by_zero("ratio"));
    }
    let max = U256::from(DECIMAL_MAX_INT);

    for scale in (0..=DECIMAL_MAX_SCALE).rev() {
        let Some(scaled) = numerator.checked_mul(U256::from(10u128.pow(scale))) else {
            continue;
        };
        let mut quotient = scaled / denominator;
        if rounding == Rounding::Up && scaled % denominator != U256::ZERO {
            quotient += U256::ONE;
        }
        if quotient <= max {
            return Decimal::try_from_i128_with_scale(quotient.as_i128(), scale)
                .map(|d| d.normalize())
                .map_err(|_| LiquidityError::math_overflow("ratio"));
        }
    }
    Err(LiquidityError::math_overflow("ratio"))
}

/// Swap fee charged on each side of an order, `floor(amount * swap_fee_rate / 2)`
pub fn half_fee(amount: u128, swap_fee_rate: Decimal) -> LiquidityResult<u128> {
    mul_amount(amount, swap_fee_rate / Decimal::TWO, Rounding::Down)
}
