//! # Batch Clearing
//!
//! Uniform clearing price for one batch of swap orders against a two-coin
//! pool. Prices are quoted in X per Y, the same unit as the pool price
//! `reserve_x / reserve_y`.
//!
//! An XtoY order (offering X) participates when `price <= order_price`; a
//! YtoX order (offering Y) participates when `price >= order_price`. With
//! `EX(P)` and `EY(P)` the participating offer totals, the clearing price is
//! the root of
//!
//! ```text
//! f(P) = Rx + 2·EX(P) − P·(Ry + 2·EY(P))
//! ```
//!
//! at which the orders settle against each other and the pool absorbs the
//! residual so that its reserves end exactly at price `P`. `f` is strictly
//! decreasing in `P`, so the root is unique. When it falls on a limit price,
//! orders sitting exactly at that price share a common fill fraction per
//! side; the allocation filling one side completely and the other as far as
//! the balance allows is chosen.
//!
//! The pool absorbs at most `max_absorb_ratio` of a reserve per batch. Net
//! X absorbed at price `P` is `(P·Ry − Rx) / 2`, so the cap bounds the price
//! to `[P0 / (1 + 2r), P0·(1 + 2r)]`. A root outside that band clears at the
//! bound instead, with every participant on the surplus side filled by the
//! same fraction.
//!
//! Amounts stay 256-bit integers throughout. A price `m / 10^s` enters the
//! balance function by cross-multiplication, so only the reported price and
//! fill fractions are decimals.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ethnum::U256;
use liquidity_types::{LiquidityError, LiquidityResult, SwapDirection};
use rust_decimal::Decimal;

use crate::decimal::{fraction_parts, ratio, ratio_wide};
use crate::safe::Rounding;

const TWO: U256 = U256::new(2);

/// Order input to the clearing solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearingOrder {
    pub direction: SwapDirection,
    pub order_price: Decimal,
    /// Remaining offer amount, in the offer denom
    pub amount: u128,
}

/// How the clearing price was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearingKind {
    /// No orders, price stays at the pool price
    Idle,
    /// Price strictly between limit prices, every participant fills fully
    Interior,
    /// Price equals a limit price, orders at that price fill partially
    AtLimitPrice,
    /// Price held at the absorption bound, the surplus side fills partially
    Capped,
    /// No consistent price was found, nothing fills
    NoMatch,
}

/// Outcome of the clearing computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearingResult {
    pub kind: ClearingKind,
    /// Clearing price, X per Y
    pub price: Decimal,
    /// Fill fraction of partially filled XtoY orders
    pub marginal_x_fill: Decimal,
    /// Fill fraction of partially filled YtoX orders
    pub marginal_y_fill: Decimal,
}

impl ClearingResult {
    fn unmatched(kind: ClearingKind, price: Decimal) -> Self {
        Self { kind, price, marginal_x_fill: Decimal::ZERO, marginal_y_fill: Decimal::ZERO }
    }

    fn interior(price: Decimal) -> Self {
        Self {
            kind: ClearingKind::Interior,
            price,
            marginal_x_fill: Decimal::ONE,
            marginal_y_fill: Decimal::ONE,
        }
    }

    /// Fraction of an order's remaining offer that fills at this price
    pub fn fill_ratio(&self, direction: SwapDirection, order_price: Decimal) -> Decimal {
        match self.kind {
            ClearingKind::Idle | ClearingKind::NoMatch => Decimal::ZERO,
            ClearingKind::Capped => match direction {
                SwapDirection::XtoY if order_price >= self.price => self.marginal_x_fill,
                SwapDirection::YtoX if order_price <= self.price => self.marginal_y_fill,
                _ => Decimal::ZERO,
            },
            ClearingKind::Interior | ClearingKind::AtLimitPrice => match direction {
                SwapDirection::XtoY if order_price > self.price => Decimal::ONE,
                SwapDirection::XtoY if order_price == self.price => self.marginal_x_fill,
                SwapDirection::YtoX if order_price < self.price => Decimal::ONE,
                SwapDirection::YtoX if order_price == self.price => self.marginal_y_fill,
                _ => Decimal::ZERO,
            },
        }
    }
}

/// Positive price as `mantissa / denominator`
#[derive(Debug, Clone, Copy)]
struct Price {
    mantissa: U256,
    denominator: U256,
}

impl Price {
    fn of(value: Decimal) -> LiquidityResult<Self> {
        let (mantissa, denominator) = fraction_parts(value)?;
        Ok(Self { mantissa: U256::from(mantissa), denominator: U256::from(denominator) })
    }
}

/// Offer totals resting at one limit price
#[derive(Debug, Clone, Copy, Default)]
struct PriceLevel {
    x: U256,
    y: U256,
}

fn overflow() -> LiquidityError {
    LiquidityError::math_overflow("clearing balance")
}

fn checked_add(a: U256, b: U256) -> LiquidityResult<U256> {
    a.checked_add(b).ok_or_else(overflow)
}

fn checked_mul(a: U256, b: U256) -> LiquidityResult<U256> {
    a.checked_mul(b).ok_or_else(overflow)
}

/// Pool reserves with the balance function
struct Reserves {
    x: U256,
    y: U256,
}

impl Reserves {
    /// `Rx + 2·ex`
    fn supply(&self, ex: U256) -> LiquidityResult<U256> {
        checked_add(self.x, checked_mul(ex, TWO)?)
    }

    /// `Ry + 2·ey`
    fn demand(&self, ey: U256) -> LiquidityResult<U256> {
        checked_add(self.y, checked_mul(ey, TWO)?)
    }

    /// `f(P)·denominator` as its sign and magnitude
    fn balance(&self, price: Price, ex: U256, ey: U256) -> LiquidityResult<(Ordering, U256)> {
        let supply = checked_mul(self.supply(ex)?, price.denominator)?;
        let demand = checked_mul(self.demand(ey)?, price.mantissa)?;
        Ok(match supply.cmp(&demand) {
            Ordering::Less => (Ordering::Less, demand - supply),
            sign => (sign, supply - demand),
        })
    }

    fn sign(&self, price: Price, ex: U256, ey: U256) -> LiquidityResult<Ordering> {
        Ok(self.balance(price, ex, ey)?.0)
    }

    /// Root of the balance function when `ex` and `ey` are constant
    fn interior_price(&self, ex: U256, ey: U256) -> LiquidityResult<Decimal> {
        ratio_wide(self.supply(ex)?, self.demand(ey)?, Rounding::Down)
    }
}

/// `(whole − excess) / whole`, floored at zero
fn fill_fraction(whole: U256, excess: U256) -> LiquidityResult<Decimal> {
    if excess >= whole {
        return Ok(Decimal::ZERO);
    }
    Ok(ratio_wide(whole - excess, whole, Rounding::Down)?.min(Decimal::ONE))
}

/// Find the clearing price of a batch
///
/// `max_absorb_ratio` bounds the share of either reserve the pool takes in
/// net of the batch.
pub fn find_clearing_price(
    reserve_x: u128,
    reserve_y: u128,
    orders: &[ClearingOrder],
    max_absorb_ratio: Decimal,
) -> LiquidityResult<ClearingResult> {
    let pool_price = ratio(reserve_x, reserve_y)?;
    let reserves = Reserves { x: U256::from(reserve_x), y: U256::from(reserve_y) };

    let mut levels: BTreeMap<Decimal, PriceLevel> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.amount > 0) {
        if order.order_price <= Decimal::ZERO {
            return Err(LiquidityError::InvalidOrderPrice { price: order.order_price.to_string() });
        }
        let amount = U256::from(order.amount);
        let level = levels.entry(order.order_price.normalize()).or_default();
        match order.direction {
            SwapDirection::XtoY => level.x = checked_add(level.x, amount)?,
            SwapDirection::YtoX => level.y = checked_add(level.y, amount)?,
        }
    }

    if levels.is_empty() {
        return Ok(ClearingResult::unmatched(ClearingKind::Idle, pool_price));
    }

    let result = solve(&reserves, &levels)?;
    if result.kind == ClearingKind::NoMatch {
        log::warn!(
            "No clearing price found for reserves {}/{} with {} price levels, keeping pool price {}",
            reserve_x,
            reserve_y,
            levels.len(),
            pool_price
        );
        return Ok(ClearingResult::unmatched(ClearingKind::NoMatch, pool_price));
    }

    // Absorption band around the pool price
    let (growth_mantissa, growth_denominator) = fraction_parts(Decimal::ONE + max_absorb_ratio * Decimal::TWO)?;
    let (growth_mantissa, growth_denominator) = (U256::from(growth_mantissa), U256::from(growth_denominator));
    let upper = ratio_wide(
        checked_mul(reserves.x, growth_mantissa)?,
        checked_mul(reserves.y, growth_denominator)?,
        Rounding::Down,
    )?;
    let lower = ratio_wide(
        checked_mul(reserves.x, growth_denominator)?,
        checked_mul(reserves.y, growth_mantissa)?,
        Rounding::Up,
    )?;

    if result.price > upper {
        log::debug!("Clearing price {} above absorption bound {}", result.price, upper);
        absorb_x_at(&reserves, &levels, upper)
    } else if result.price < lower {
        log::debug!("Clearing price {} below absorption bound {}", result.price, lower);
        absorb_y_at(&reserves, &levels, lower)
    } else {
        Ok(result)
    }
}

/// Scan the limit prices in ascending order for the root of the balance function
fn solve(reserves: &Reserves, levels: &BTreeMap<Decimal, PriceLevel>) -> LiquidityResult<ClearingResult> {
    // Segment below the lowest limit: every XtoY order participates, no YtoX
    let mut ex = levels.values().try_fold(U256::ZERO, |acc, l| checked_add(acc, l.x))?;
    let mut ey = U256::ZERO;
    let mut lower: Option<Price> = None;

    for (&limit, level) in levels.iter() {
        let at = Price::of(limit)?;

        // Open segment (lower, limit)
        let above_lower = match lower {
            None => true,
            Some(p) => reserves.sign(p, ex, ey)? == Ordering::Greater,
        };
        let left = reserves.sign(at, ex, ey)?;
        if above_lower && left == Ordering::Less {
            return Ok(ClearingResult::interior(reserves.interior_price(ex, ey)?));
        }

        // Breakpoint at the limit price itself
        let ex_after = ex - level.x;
        let ey_after = checked_add(ey, level.y)?;
        let right = reserves.sign(at, ex_after, ey_after)?;
        if left != Ordering::Less && right != Ordering::Greater {
            return at_limit_price(reserves, limit, at, ex_after, ey, *level);
        }

        ex = ex_after;
        ey = ey_after;
        lower = Some(at);
    }

    // Open segment above the highest limit
    let above_lower = match lower {
        None => true,
        Some(p) => reserves.sign(p, ex, ey)? == Ordering::Greater,
    };
    if above_lower {
        return Ok(ClearingResult::interior(reserves.interior_price(ex, ey)?));
    }
    Ok(ClearingResult::unmatched(ClearingKind::NoMatch, Decimal::ZERO))
}

/// Settle the marginal orders resting exactly at `price`
fn at_limit_price(
    reserves: &Reserves,
    price: Decimal,
    at: Price,
    ex_full: U256,
    ey_full: U256,
    level: PriceLevel,
) -> LiquidityResult<ClearingResult> {
    // Balance with both marginal sides fully filled
    let (sign, excess) = reserves.balance(at, checked_add(ex_full, level.x)?, checked_add(ey_full, level.y)?)?;

    let (x_fill, y_fill) = if sign != Ordering::Less {
        // X is in surplus: fill all marginal Y, cut marginal X
        if level.x == U256::ZERO {
            (Decimal::ONE, Decimal::ONE)
        } else {
            let whole = checked_mul(checked_mul(level.x, TWO)?, at.denominator)?;
            (fill_fraction(whole, excess)?, Decimal::ONE)
        }
    } else {
        // Y is in surplus: fill all marginal X, cut marginal Y
        if level.y == U256::ZERO {
            (Decimal::ONE, Decimal::ONE)
        } else {
            let whole = checked_mul(checked_mul(level.y, TWO)?, at.mantissa)?;
            (Decimal::ONE, fill_fraction(whole, excess)?)
        }
    };

    Ok(ClearingResult {
        kind: ClearingKind::AtLimitPrice,
        price,
        marginal_x_fill: x_fill,
        marginal_y_fill: y_fill,
    })
}

/// Offer totals of the orders participating at `price`
fn participants(levels: &BTreeMap<Decimal, PriceLevel>, price: Decimal) -> LiquidityResult<(U256, U256)> {
    let mut ex = U256::ZERO;
    let mut ey = U256::ZERO;
    for (&limit, level) in levels {
        if limit >= price {
            ex = checked_add(ex, level.x)?;
        }
        if limit <= price {
            ey = checked_add(ey, level.y)?;
        }
    }
    Ok((ex, ey))
}

/// Clear at the upper bound, cutting every participating XtoY order alike
fn absorb_x_at(
    reserves: &Reserves,
    levels: &BTreeMap<Decimal, PriceLevel>,
    price: Decimal,
) -> LiquidityResult<ClearingResult> {
    let at = Price::of(price)?;
    let (ex, ey) = participants(levels, price)?;

    // Rx + 2·a·ex = P·(Ry + 2·ey)
    let target = checked_mul(reserves.demand(ey)?, at.mantissa)?;
    let base = checked_mul(reserves.x, at.denominator)?;
    let x_fill = if ex == U256::ZERO || target <= base {
        Decimal::ZERO
    } else {
        let whole = checked_mul(checked_mul(ex, TWO)?, at.denominator)?;
        ratio_wide(target - base, whole, Rounding::Down)?.min(Decimal::ONE)
    };

    Ok(ClearingResult {
        kind: ClearingKind::Capped,
        price,
        marginal_x_fill: x_fill,
        marginal_y_fill: Decimal::ONE,
    })
}

/// Clear at the lower bound, cutting every participating YtoX order alike
fn absorb_y_at(
    reserves: &Reserves,
    levels: &BTreeMap<Decimal, PriceLevel>,
    price: Decimal,
) -> LiquidityResult<ClearingResult> {
    let at = Price::of(price)?;
    let (ex, ey) = participants(levels, price)?;

    // Rx + 2·ex = P·(Ry + 2·b·ey)
    let target = checked_mul(reserves.supply(ex)?, at.denominator)?;
    let base = checked_mul(reserves.y, at.mantissa)?;
    let y_fill = if ey == U256::ZERO || target <= base {
        Decimal::ZERO
    } else {
        let whole = checked_mul(checked_mul(ey, TWO)?, at.mantissa)?;
        ratio_wide(target - base, whole, Rounding::Down)?.min(Decimal::ONE)
    };

    Ok(ClearingResult {
        kind: ClearingKind::Capped,
        price,
        marginal_x_fill: Decimal::ONE,
        marginal_y_fill: y_fill,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Absorption bound loose enough to leave small books unconstrained
    const LOOSE: Decimal = Decimal::ONE;

    fn order(direction: SwapDirection, price: Decimal, amount: u128) -> ClearingOrder {
        ClearingOrder { direction, order_price: price, amount }
    }

    #[test]
    fn test_no_orders_keeps_pool_price() {
        let result = find_clearing_price(200, 100, &[], LOOSE).unwrap();
        assert_eq!(result.kind, ClearingKind::Idle);
        assert_eq!(result.price, dec!(2));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(10)), Decimal::ZERO);
    }

    #[test]
    fn test_symmetric_orders_clear_at_pool_price() {
        let orders = vec![
            order(SwapDirection::XtoY, dec!(1.0), 10),
            order(SwapDirection::YtoX, dec!(1.0), 10),
        ];
        let result = find_clearing_price(100, 100, &orders, LOOSE).unwrap();
        assert_eq!(result.kind, ClearingKind::AtLimitPrice);
        assert_eq!(result.price, dec!(1));
        assert_eq!(result.marginal_x_fill, Decimal::ONE);
        assert_eq!(result.marginal_y_fill, Decimal::ONE);
    }

    #[test]
    fn test_one_sided_order_moves_price_within_limit() {
        let orders = vec![order(SwapDirection::XtoY, dec!(2.0), 10)];
        let result = find_clearing_price(100, 100, &orders, LOOSE).unwrap();
        assert_eq!(result.kind, ClearingKind::Interior);
        assert_eq!(result.price, dec!(1.2));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(2.0)), Decimal::ONE);
    }

    #[test]
    fn test_limit_binds_and_fills_partially() {
        // Unconstrained price would be 1.2, the limit caps it at 1.1
        let orders = vec![order(SwapDirection::XtoY, dec!(1.1), 10)];
        let result = find_clearing_price(100, 100, &orders, LOOSE).unwrap();
        assert_eq!(result.kind, ClearingKind::AtLimitPrice);
        assert_eq!(result.price, dec!(1.1));
        // 100 + 2·10·a = 1.1·100  =>  a = 0.5
        assert_eq!(result.marginal_x_fill, dec!(0.5));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(1.1)), dec!(0.5));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(1.0)), Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_orders_do_not_fill() {
        // XtoY wants price <= 0.5, YtoX wants price >= 2; pool sits at 1
        let orders = vec![
            order(SwapDirection::XtoY, dec!(0.5), 10),
            order(SwapDirection::YtoX, dec!(2), 10),
        ];
        let result = find_clearing_price(100, 100, &orders, LOOSE).unwrap();
        assert_eq!(result.price, dec!(1));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(0.5)), Decimal::ZERO);
        assert_eq!(result.fill_ratio(SwapDirection::YtoX, dec!(2)), Decimal::ZERO);
    }

    #[test]
    fn test_price_moves_down_for_y_surplus() {
        let orders = vec![order(SwapDirection::YtoX, dec!(0.1), 10)];
        let result = find_clearing_price(100, 100, &orders, LOOSE).unwrap();
        assert_eq!(result.kind, ClearingKind::Interior);
        // 100 / 120
        assert!(result.price < dec!(0.834) && result.price > dec!(0.833));
        assert_eq!(result.fill_ratio(SwapDirection::YtoX, dec!(0.1)), Decimal::ONE);
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let orders = vec![order(SwapDirection::XtoY, Decimal::ZERO, 10)];
        assert!(find_clearing_price(100, 100, &orders, LOOSE).is_err());
    }

    #[test]
    fn test_reserves_beyond_decimal_range() {
        let reserve = 100_000_000_000_000_000_000_000_000_000u128;
        let orders = vec![order(SwapDirection::XtoY, dec!(1.1), 1_000_000)];
        let result = find_clearing_price(reserve, reserve, &orders, dec!(0.1)).unwrap();
        assert_eq!(result.kind, ClearingKind::Interior);
        // (1e29 + 2e6) / 1e29
        assert_eq!(result.price, dec!(1.00000000000000000000002));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(1.1)), Decimal::ONE);
    }

    #[test]
    fn test_absorption_caps_x_surplus() {
        // Eight orders of 10% each would push the price to 2.6
        let orders: Vec<_> = (0..8).map(|_| order(SwapDirection::XtoY, dec!(10), 100_000)).collect();
        let result = find_clearing_price(1_000_000, 1_000_000, &orders, dec!(0.1)).unwrap();
        assert_eq!(result.kind, ClearingKind::Capped);
        assert_eq!(result.price, dec!(1.2));
        // 1_000_000 + 2·800_000·a = 1.2·1_000_000  =>  a = 0.125
        assert_eq!(result.marginal_x_fill, dec!(0.125));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(10)), dec!(0.125));
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(1.1)), Decimal::ZERO);
    }

    #[test]
    fn test_absorption_caps_y_surplus() {
        let orders = vec![
            order(SwapDirection::YtoX, dec!(0.1), 300_000),
            order(SwapDirection::YtoX, dec!(0.5), 100_000),
            order(SwapDirection::XtoY, dec!(2), 100_000),
        ];
        let result = find_clearing_price(1_000_000, 1_000_000, &orders, dec!(0.1)).unwrap();
        assert_eq!(result.kind, ClearingKind::Capped);
        // Lower bound 1 / 1.2, rounded up
        assert_eq!(result.price, dec!(0.8333333333333333333333333334));
        assert_eq!(result.marginal_x_fill, Decimal::ONE);
        assert!(result.marginal_y_fill > Decimal::ZERO && result.marginal_y_fill < Decimal::ONE);
        assert_eq!(result.fill_ratio(SwapDirection::YtoX, dec!(0.1)), result.marginal_y_fill);
        assert_eq!(result.fill_ratio(SwapDirection::XtoY, dec!(2)), Decimal::ONE);
    }

    #[test]
    fn test_offsetting_orders_are_not_capped() {
        // Large but balanced flow leaves the pool price in place
        let orders = vec![
            order(SwapDirection::XtoY, dec!(1), 5_000_000),
            order(SwapDirection::YtoX, dec!(1), 5_000_000),
        ];
        let result = find_clearing_price(1_000_000, 1_000_000, &orders, dec!(0.1)).unwrap();
        assert_eq!(result.kind, ClearingKind::AtLimitPrice);
        assert_eq!(result.price, dec!(1));
        assert_eq!(result.marginal_x_fill, Decimal::ONE);
        assert_eq!(result.marginal_y_fill, Decimal::ONE);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn orders() -> impl Strategy<Value = Vec<ClearingOrder>> {
            prop::collection::vec(
                (any::<bool>(), 50u32..200, 1u128..50_000).prop_map(|(x_to_y, cents, amount)| ClearingOrder {
                    direction: if x_to_y { SwapDirection::XtoY } else { SwapDirection::YtoX },
                    order_price: Decimal::new(cents as i64, 2),
                    amount,
                }),
                1..12,
            )
        }

        /// Filled offer volume per side, from the per-order fill ratios
        fn matched(orders: &[ClearingOrder], result: &ClearingResult) -> (Decimal, Decimal) {
            let mut x = Decimal::ZERO;
            let mut y = Decimal::ZERO;
            for o in orders {
                let filled = Decimal::from(o.amount as u64) * result.fill_ratio(o.direction, o.order_price);
                match o.direction {
                    SwapDirection::XtoY => x += filled,
                    SwapDirection::YtoX => y += filled,
                }
            }
            (x, y)
        }

        proptest! {
            /// Pool reserves end at the clearing price after absorbing the residual
            #[test]
            fn prop_clearing_balances_pool(
                reserve_x in 100_000u128..10_000_000,
                reserve_y in 100_000u128..10_000_000,
                orders in orders(),
            ) {
                let result = find_clearing_price(reserve_x, reserve_y, &orders, LOOSE).unwrap();
                prop_assert!(result.price > Decimal::ZERO);
                prop_assert!(result.marginal_x_fill >= Decimal::ZERO && result.marginal_x_fill <= Decimal::ONE);
                prop_assert!(result.marginal_y_fill >= Decimal::ZERO && result.marginal_y_fill <= Decimal::ONE);

                if result.kind != ClearingKind::NoMatch {
                    let (mx, my) = matched(&orders, &result);
                    let rx = Decimal::from(reserve_x as u64);
                    let ry = Decimal::from(reserve_y as u64);
                    let imbalance = rx + mx * Decimal::TWO - result.price * (ry + my * Decimal::TWO);
                    let scale = rx + mx * Decimal::TWO;
                    prop_assert!(imbalance.abs() <= scale * Decimal::new(1, 12), "imbalance {}", imbalance);
                }
            }

            /// Net absorption never exceeds the bound on either reserve
            #[test]
            fn prop_absorption_is_bounded(
                reserve_x in 100_000u128..10_000_000,
                reserve_y in 100_000u128..10_000_000,
                orders in orders(),
            ) {
                let bound = Decimal::new(1, 1);
                let result = find_clearing_price(reserve_x, reserve_y, &orders, bound).unwrap();
                let (mx, my) = matched(&orders, &result);
                let rx = Decimal::from(reserve_x as u64);
                let ry = Decimal::from(reserve_y as u64);
                let tolerance = Decimal::new(1, 6);

                // X kept by the pool, Y kept by the pool
                let absorbed_x = mx - my * result.price;
                let absorbed_y = my - mx / result.price;
                prop_assert!(absorbed_x <= rx * bound + tolerance, "absorbed x {}", absorbed_x);
                prop_assert!(absorbed_y <= ry * bound + tolerance, "absorbed y {}", absorbed_y);
            }
        }
    }
}
