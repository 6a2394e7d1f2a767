//! Deposit phase

use liquidity_math::{mul_div, Rounding};
use liquidity_types::*;

use super::SettlementContext;
use crate::bank;
use crate::events::{Event, EventKind};
use crate::ledger;
use crate::store::KvStore;

/// Accepted part of a deposit and the pool coins it mints
struct DepositPlan {
    accepted: Coins,
    minted: u128,
}

/// Why a deposit is refunded instead of executed
enum Rejection {
    NothingMinted,
    ExceedsMaxReserve(Coin),
}

fn plan_deposit(ctx: &SettlementContext, deposit: &Coins) -> LiquidityResult<Result<DepositPlan, Rejection>> {
    let supply = ctx.metadata.pool_coin_total_supply;

    let plan = if ctx.metadata.is_depleted(&ctx.pool) {
        DepositPlan { accepted: deposit.clone(), minted: ctx.params.init_pool_coin_mint_amount }
    } else {
        // Mint against the scarcer side, take only what that share is worth
        let mut minted = u128::MAX;
        for denom in &ctx.pool.reserve_coin_denoms {
            let share = mul_div(deposit.amount_of(denom), supply, ctx.reserve(denom), Rounding::Down)?;
            minted = minted.min(share);
        }
        if minted == 0 {
            return Ok(Err(Rejection::NothingMinted));
        }

        let mut accepted = Coins::new();
        for denom in &ctx.pool.reserve_coin_denoms {
            let worth = mul_div(minted, ctx.reserve(denom), supply, Rounding::Up)?;
            accepted.add_coin(&Coin::new(denom.clone(), worth.min(deposit.amount_of(denom))))?;
        }
        DepositPlan { accepted, minted }
    };

    let max_reserve = ctx.params.max_reserve_coin_amount;
    if max_reserve > 0 {
        for coin in plan.accepted.iter() {
            let after = ctx
                .reserve(&coin.denom)
                .checked_add(coin.amount)
                .ok_or_else(|| LiquidityError::math_overflow("deposit reserve"))?;
            if after > max_reserve {
                return Ok(Err(Rejection::ExceedsMaxReserve(Coin::new(coin.denom, after))));
            }
        }
    }

    Ok(Ok(plan))
}

/// Execute every pending deposit, returning (succeeded, failed)
pub(super) fn settle_deposits(store: &mut dyn KvStore, ctx: &mut SettlementContext) -> LiquidityResult<(usize, usize)> {
    let mut succeeded = 0;
    let mut failed = 0;

    for mut state in ledger::pending_msgs::<DepositMsgState>(store, ctx.pool.id)? {
        let depositor = state.msg.depositor_address.clone();
        let deposit = state.msg.deposit_coins.clone();

        match plan_deposit(ctx, &deposit)? {
            Ok(plan) => {
                let refund = deposit.checked_sub(&plan.accepted)?;
                if !refund.is_empty() {
                    bank::send(store, &ctx.pool.reserve_account_address, &depositor, &refund)?;
                }
                let pool_coin = Coin::new(ctx.pool.pool_coin_denom.clone(), plan.minted);
                bank::mint(store, &depositor, &Coins::from_vec(vec![pool_coin.clone()])?)?;

                for coin in plan.accepted.iter() {
                    ctx.add_reserve(&coin)?;
                }
                ctx.metadata.pool_coin_total_supply = ctx
                    .metadata
                    .pool_coin_total_supply
                    .checked_add(plan.minted)
                    .ok_or_else(|| LiquidityError::math_overflow("pool coin supply"))?;

                state.finish(true);
                succeeded += 1;
                ctx.events.push(
                    Event::new(EventKind::DepositToPool)
                        .attr("pool_id", ctx.pool.id)
                        .attr("msg_index", state.msg_index)
                        .attr("depositor", &depositor)
                        .attr("accepted_coins", &plan.accepted)
                        .attr("refunded_coins", &refund)
                        .attr("pool_coin", &pool_coin)
                        .attr("success", true),
                );
            }
            Err(rejection) => {
                match &rejection {
                    Rejection::NothingMinted => log::warn!(
                        "Deposit {} to pool {} too small to mint pool coins, refunding {}",
                        state.msg_index,
                        ctx.pool.id,
                        deposit
                    ),
                    Rejection::ExceedsMaxReserve(after) => log::warn!(
                        "Deposit {} to pool {} would raise reserve to {}, above {}; refunding",
                        state.msg_index,
                        ctx.pool.id,
                        after,
                        ctx.params.max_reserve_coin_amount
                    ),
                }
                bank::send(store, &ctx.pool.reserve_account_address, &depositor, &deposit)?;
                state.finish(false);
                failed += 1;
                ctx.events.push(
                    Event::new(EventKind::DepositToPool)
                        .attr("pool_id", ctx.pool.id)
                        .attr("msg_index", state.msg_index)
                        .attr("depositor", &depositor)
                        .attr("refunded_coins", &deposit)
                        .attr("success", false),
                );
            }
        }

        ledger::set_msg(store, &state)?;
    }

    Ok((succeeded, failed))
}
