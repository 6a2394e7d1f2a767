//! # Settlement Engine
//!
//! Executes one pool's batch: swaps at a single clearing price, then
//! deposits, then withdrawals, each in message index order. Reserve and
//! supply changes accumulate in a working copy of the pool metadata that
//! is written once at the end.
//!
//! The caller runs settlement over a cache store and commits it only when
//! [`execute_batch`] returns `Ok`. Any error leaves the pool untouched.

mod deposit;
mod invariants;
mod swap;
mod withdraw;

pub use invariants::check_pool_consistency;
pub use swap::SwapSummary;

use liquidity_types::*;
use rust_decimal::Decimal;

use crate::batch;
use crate::events::{Event, EventKind};
use crate::registry;
use crate::store::KvStore;

/// Pool state shared by the settlement phases
pub(crate) struct SettlementContext {
    pub pool: Pool,
    pub params: Params,
    pub metadata: PoolMetadata,
    pub height: i64,
    pub events: Vec<Event>,
}

impl SettlementContext {
    pub fn reserve(&self, denom: &str) -> u128 {
        self.metadata.reserve_of(denom)
    }

    pub fn add_reserve(&mut self, coin: &Coin) -> LiquidityResult<()> {
        self.metadata.reserve_coins.add_coin(coin)
    }

    pub fn sub_reserve(&mut self, coin: &Coin) -> LiquidityResult<()> {
        let available = self.reserve(&coin.denom);
        if available < coin.amount {
            return Err(LiquidityError::InsufficientReserve {
                pool_id: self.pool.id,
                denom: coin.denom.clone(),
                required: coin.amount,
                available,
            });
        }
        self.metadata.reserve_coins.sub_coin(coin)
    }
}

/// Outcome of one pool's batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub pool_id: u64,
    pub batch_index: u64,
    pub height: i64,
    /// Clearing price, absent when no swaps were pending
    pub swap_price: Option<Decimal>,
    pub swaps: SwapSummary,
    pub deposits_succeeded: usize,
    pub deposits_failed: usize,
    pub withdraws_succeeded: usize,
    pub withdraws_failed: usize,
    pub metadata: PoolMetadata,
    pub events: Vec<Event>,
}

/// Settle the pool's open batch at `height`
pub fn execute_batch(store: &mut dyn KvStore, pool_id: u64, height: i64) -> LiquidityResult<BatchReport> {
    let pool = registry::get_pool(store, pool_id)?;
    registry::ensure_active(store, pool_id)?;
    let pool_batch = batch::get_batch(store, pool_id)?;
    if pool_batch.executed {
        return Err(LiquidityError::inconsistent(
            pool_id,
            &format!("batch {} already executed", pool_batch.index),
        ));
    }

    let metadata = registry::get_metadata(store, pool_id)?;
    check_pool_consistency(store, &pool, &metadata)?;

    let mut ctx = SettlementContext {
        params: batch::window_params(store, pool_id)?,
        pool,
        metadata,
        height,
        events: Vec::new(),
    };

    let swaps = swap::settle_swaps(store, &mut ctx)?;
    let (deposits_succeeded, deposits_failed) = deposit::settle_deposits(store, &mut ctx)?;
    let (withdraws_succeeded, withdraws_failed) = withdraw::settle_withdraws(store, &mut ctx)?;

    registry::set_metadata(store, &ctx.metadata)?;
    check_pool_consistency(store, &ctx.pool, &ctx.metadata)?;
    batch::mark_executed(store, pool_id)?;

    let swap_price = swaps.price;
    log::info!(
        "Executed batch {} of pool {} at height {}: price={}, swaps filled={} carried={} cancelled={}, deposits {}/{}, withdraws {}/{}",
        pool_batch.index,
        pool_id,
        height,
        swap_price.map_or_else(|| "-".to_string(), |p| p.to_string()),
        swaps.filled,
        swaps.carried,
        swaps.cancelled,
        deposits_succeeded,
        deposits_succeeded + deposits_failed,
        withdraws_succeeded,
        withdraws_succeeded + withdraws_failed,
    );

    let mut event = Event::new(EventKind::BatchExecuted)
        .attr("pool_id", pool_id)
        .attr("batch_index", pool_batch.index)
        .attr("height", height)
        .attr("reserve_coins", &ctx.metadata.reserve_coins)
        .attr("pool_coin_total_supply", ctx.metadata.pool_coin_total_supply);
    if let Some(price) = swap_price {
        event = event.attr("swap_price", price);
    }
    ctx.events.push(event);

    Ok(BatchReport {
        pool_id,
        batch_index: pool_batch.index,
        height,
        swap_price,
        swaps,
        deposits_succeeded,
        deposits_failed,
        withdraws_succeeded,
        withdraws_failed,
        metadata: ctx.metadata,
        events: ctx.events,
    })
}
