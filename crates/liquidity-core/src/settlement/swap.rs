//! Swap phase
//!
//! All live orders clear at one price. Fills are computed first, then
//! checked against the pool's reserves as a whole, then paid out, so the
//! result does not depend on the order in which fills are applied.

use liquidity_math::*;
use liquidity_types::*;
use rust_decimal::Decimal;

use super::SettlementContext;
use crate::bank;
use crate::events::{Event, EventKind};
use crate::ledger;
use crate::store::KvStore;

/// Swap phase counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapSummary {
    pub price: Option<Decimal>,
    /// Orders completely filled this batch
    pub filled: usize,
    /// Partially filled or unfilled orders kept for the next batch
    pub carried: usize,
    /// Orders cancelled at expiry, remainder refunded
    pub cancelled: usize,
    pub matched_x: u128,
    pub matched_y: u128,
}

/// Fill of one order at the clearing price
struct Fill {
    direction: SwapDirection,
    exchanged: u128,
    offer_fee: u128,
    demand_fee: u128,
    payout: u128,
}

fn compute_fill(
    state: &SwapMsgState,
    direction: SwapDirection,
    clearing: &ClearingResult,
    swap_fee_rate: Decimal,
) -> LiquidityResult<Fill> {
    let remaining = state.remaining_offer_coin.amount;
    let ratio = clearing.fill_ratio(direction, state.msg.order_price);
    let exchanged = if ratio >= Decimal::ONE {
        remaining
    } else {
        mul_amount(remaining, ratio, Rounding::Down)?
    };

    if exchanged == 0 {
        return Ok(Fill { direction, exchanged: 0, offer_fee: 0, demand_fee: 0, payout: 0 });
    }

    // The reserved fee covers the whole remainder; charge the filled share
    let reserved_fee = state.reserved_offer_coin_fee.amount;
    let offer_fee = if exchanged == remaining {
        reserved_fee
    } else {
        proportional_share(reserved_fee, exchanged, remaining)?
    };

    let gross = match direction {
        SwapDirection::XtoY => div_amount(exchanged, clearing.price, Rounding::Down)?,
        SwapDirection::YtoX => mul_amount(exchanged, clearing.price, Rounding::Down)?,
    };
    let demand_fee = half_fee(gross, swap_fee_rate)?;

    Ok(Fill {
        direction,
        exchanged,
        offer_fee,
        demand_fee,
        payout: gross - demand_fee,
    })
}

fn refund_remainder(store: &mut dyn KvStore, ctx: &SettlementContext, state: &SwapMsgState) -> LiquidityResult<()> {
    let mut refund = Coins::new();
    refund.add_coin(&state.remaining_offer_coin)?;
    refund.add_coin(&state.reserved_offer_coin_fee)?;
    bank::send(
        store,
        &ctx.pool.reserve_account_address,
        &state.msg.swap_requester_address,
        &refund,
    )
}

fn cancel(store: &mut dyn KvStore, ctx: &mut SettlementContext, state: &mut SwapMsgState) -> LiquidityResult<()> {
    refund_remainder(store, ctx, state)?;
    state.finish(false);
    ctx.events.push(
        Event::new(EventKind::SwapCancelled)
            .attr("pool_id", ctx.pool.id)
            .attr("msg_index", state.msg_index)
            .attr("swap_requester", &state.msg.swap_requester_address)
            .attr("refunded_offer_coin", &state.remaining_offer_coin)
            .attr("refunded_offer_coin_fee", &state.reserved_offer_coin_fee),
    );
    Ok(())
}

/// Match and settle every live swap order of the pool
pub(super) fn settle_swaps(store: &mut dyn KvStore, ctx: &mut SettlementContext) -> LiquidityResult<SwapSummary> {
    let mut states: Vec<SwapMsgState> = ledger::pending_msgs::<SwapMsgState>(store, ctx.pool.id)?
        .into_iter()
        .filter(SwapMsgState::is_live)
        .collect();
    let mut summary = SwapSummary::default();
    if states.is_empty() {
        return Ok(summary);
    }

    for state in &states {
        state.check_conservation()?;
    }

    // A depleted pool cannot price anything; every order goes back
    if ctx.metadata.is_depleted(&ctx.pool) {
        log::warn!(
            "Pool {} is depleted, cancelling {} swap orders",
            ctx.pool.id,
            states.len()
        );
        for state in states.iter_mut() {
            cancel(store, ctx, state)?;
            ledger::set_msg(store, state)?;
            summary.cancelled += 1;
        }
        return Ok(summary);
    }

    let directions = states
        .iter()
        .map(|s| SwapDirection::of(&ctx.pool, &s.msg.offer_coin.denom, &s.msg.demand_coin_denom))
        .collect::<LiquidityResult<Vec<_>>>()?;
    let orders: Vec<ClearingOrder> = states
        .iter()
        .zip(&directions)
        .map(|(s, direction)| ClearingOrder {
            direction: *direction,
            order_price: s.msg.order_price,
            amount: s.remaining_offer_coin.amount,
        })
        .collect();

    let denom_x = ctx.pool.denom_x().to_string();
    let denom_y = ctx.pool.denom_y().to_string();
    let clearing = find_clearing_price(
        ctx.reserve(&denom_x),
        ctx.reserve(&denom_y),
        &orders,
        ctx.params.max_order_amount_ratio,
    )?;
    summary.price = Some(clearing.price);
    log::debug!(
        "Pool {} clearing: kind={:?} price={} marginal_x={} marginal_y={}",
        ctx.pool.id,
        clearing.kind,
        clearing.price,
        clearing.marginal_x_fill,
        clearing.marginal_y_fill
    );
    if clearing.kind == ClearingKind::Capped {
        log::info!(
            "Pool {} absorption bound reached, clearing at {} with partial fills",
            ctx.pool.id,
            clearing.price
        );
    }

    let fills = states
        .iter()
        .zip(&directions)
        .map(|(s, direction)| compute_fill(s, *direction, &clearing, ctx.params.swap_fee_rate))
        .collect::<LiquidityResult<Vec<_>>>()?;

    // Net effect on the reserves: offers and offer fees in, payouts out
    let mut inflow_x = 0u128;
    let mut inflow_y = 0u128;
    let mut payout_x = 0u128;
    let mut payout_y = 0u128;
    for fill in &fills {
        let incoming = safe_add_u128(fill.exchanged, fill.offer_fee)?;
        match fill.direction {
            SwapDirection::XtoY => {
                inflow_x = safe_add_u128(inflow_x, incoming)?;
                payout_y = safe_add_u128(payout_y, fill.payout)?;
                summary.matched_x = safe_add_u128(summary.matched_x, fill.exchanged)?;
            }
            SwapDirection::YtoX => {
                inflow_y = safe_add_u128(inflow_y, incoming)?;
                payout_x = safe_add_u128(payout_x, fill.payout)?;
                summary.matched_y = safe_add_u128(summary.matched_y, fill.exchanged)?;
            }
        }
    }
    ctx.add_reserve(&Coin::new(denom_x.clone(), inflow_x))?;
    ctx.add_reserve(&Coin::new(denom_y.clone(), inflow_y))?;
    ctx.sub_reserve(&Coin::new(denom_x.clone(), payout_x))?;
    ctx.sub_reserve(&Coin::new(denom_y.clone(), payout_y))?;

    for (state, fill) in states.iter_mut().zip(&fills) {
        if fill.exchanged > 0 {
            let demand_denom = match fill.direction {
                SwapDirection::XtoY => &denom_y,
                SwapDirection::YtoX => &denom_x,
            };
            let payout = Coin::new(demand_denom.clone(), fill.payout);
            bank::send_coin(
                store,
                &ctx.pool.reserve_account_address,
                &state.msg.swap_requester_address,
                &payout,
            )?;

            state.exchanged_offer_coin = state.exchanged_offer_coin.checked_add(fill.exchanged)?;
            state.remaining_offer_coin = state.remaining_offer_coin.checked_sub(fill.exchanged)?;
            state.reserved_offer_coin_fee = state.reserved_offer_coin_fee.checked_sub(fill.offer_fee)?;
            state.check_conservation()?;

            ctx.events.push(
                Event::new(EventKind::SwapTransacted)
                    .attr("pool_id", ctx.pool.id)
                    .attr("msg_index", state.msg_index)
                    .attr("swap_requester", &state.msg.swap_requester_address)
                    .attr("swap_price", clearing.price)
                    .attr("exchanged_offer_coin", Coin::new(state.msg.offer_coin.denom.clone(), fill.exchanged))
                    .attr("exchanged_demand_coin", &payout)
                    .attr("offer_coin_fee", Coin::new(state.msg.offer_coin.denom.clone(), fill.offer_fee))
                    .attr("demand_coin_fee", Coin::new(demand_denom.clone(), fill.demand_fee))
                    .attr("remaining_offer_coin", &state.remaining_offer_coin),
            );
        }

        if state.remaining_offer_coin.is_zero() {
            state.finish(true);
            summary.filled += 1;
        } else if ctx.height >= state.order_expiry_height {
            cancel(store, ctx, state)?;
            summary.cancelled += 1;
        } else {
            state.executed = true;
            state.succeeded = true;
            summary.carried += 1;
        }
        ledger::set_msg(store, state)?;
    }

    Ok(summary)
}
