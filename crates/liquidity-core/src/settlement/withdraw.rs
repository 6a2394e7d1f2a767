//! Withdraw phase

use liquidity_math::{mul_amount, proportional_share, Rounding};
use liquidity_types::*;
use rust_decimal::Decimal;

use super::SettlementContext;
use crate::bank;
use crate::events::{Event, EventKind};
use crate::ledger;
use crate::store::KvStore;

/// Reserve coins released for `pool_coin_amount`, after the withdraw fee
///
/// Redeeming the whole supply empties the pool and pays no fee.
fn withdraw_payout(ctx: &SettlementContext, pool_coin_amount: u128) -> LiquidityResult<Coins> {
    let supply = ctx.metadata.pool_coin_total_supply;
    let keep_rate = Decimal::ONE - ctx.params.withdraw_fee_rate;

    let mut payout = Coins::new();
    for denom in &ctx.pool.reserve_coin_denoms {
        let share = proportional_share(ctx.reserve(denom), pool_coin_amount, supply)?;
        let amount = if pool_coin_amount == supply {
            share
        } else {
            mul_amount(share, keep_rate, Rounding::Down)?
        };
        payout.add_coin(&Coin::new(denom.clone(), amount))?;
    }
    Ok(payout)
}

/// Execute every pending withdrawal, returning (succeeded, failed)
pub(super) fn settle_withdraws(store: &mut dyn KvStore, ctx: &mut SettlementContext) -> LiquidityResult<(usize, usize)> {
    let mut succeeded = 0;
    let mut failed = 0;

    for mut state in ledger::pending_msgs::<WithdrawMsgState>(store, ctx.pool.id)? {
        let withdrawer = state.msg.withdrawer_address.clone();
        let pool_coin = state.msg.pool_coin.clone();
        let supply = ctx.metadata.pool_coin_total_supply;

        let payout = if pool_coin.amount <= supply && supply > 0 {
            withdraw_payout(ctx, pool_coin.amount)?
        } else {
            Coins::new()
        };

        if payout.is_empty() {
            log::warn!(
                "Withdraw {} from pool {} of {} releases nothing, refunding",
                state.msg_index,
                ctx.pool.id,
                pool_coin
            );
            bank::send_coin(store, &ctx.pool.reserve_account_address, &withdrawer, &pool_coin)?;
            state.finish(false);
            failed += 1;
            ctx.events.push(
                Event::new(EventKind::WithdrawFromPool)
                    .attr("pool_id", ctx.pool.id)
                    .attr("msg_index", state.msg_index)
                    .attr("withdrawer", &withdrawer)
                    .attr("refunded_pool_coin", &pool_coin)
                    .attr("success", false),
            );
        } else {
            for coin in payout.iter() {
                ctx.sub_reserve(&coin)?;
            }
            bank::send(store, &ctx.pool.reserve_account_address, &withdrawer, &payout)?;
            bank::burn(
                store,
                &ctx.pool.reserve_account_address,
                &Coins::from_vec(vec![pool_coin.clone()])?,
            )?;
            ctx.metadata.pool_coin_total_supply = supply - pool_coin.amount;

            state.finish(true);
            succeeded += 1;
            ctx.events.push(
                Event::new(EventKind::WithdrawFromPool)
                    .attr("pool_id", ctx.pool.id)
                    .attr("msg_index", state.msg_index)
                    .attr("withdrawer", &withdrawer)
                    .attr("pool_coin", &pool_coin)
                    .attr("withdrawn_coins", &payout)
                    .attr("success", true),
            );
        }

        ledger::set_msg(store, &state)?;
    }

    Ok((succeeded, failed))
}
