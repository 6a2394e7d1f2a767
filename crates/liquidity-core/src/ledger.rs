//! # Order Ledger
//!
//! Durable per-pool records of deposit, withdraw and swap messages waiting
//! for, or settled by, a batch. Appending a message validates it, escrows
//! its funds into the pool's reserve account and assigns the next message
//! index from the pool's batch, all against the same store so the caller's
//! cache commits or drops them together.

use liquidity_math::{half_fee, mul_amount, Rounding};
use liquidity_types::*;

use crate::bank;
use crate::batch;
use crate::pagination::{paginate, PageRequest, PageResponse};
use crate::registry;
use crate::store::keys;
use crate::store::{get_json, scan_json, set_json, KvStore};

// ============================================================================
// Record Access
// ============================================================================

pub fn get_msg<T: BatchMsgState>(store: &dyn KvStore, pool_id: u64, msg_index: u64) -> LiquidityResult<Option<T>> {
    get_json(store, &keys::msg_key(T::KIND, pool_id, msg_index))
}

pub fn must_get_msg<T: BatchMsgState>(store: &dyn KvStore, pool_id: u64, msg_index: u64) -> LiquidityResult<T> {
    get_msg(store, pool_id, msg_index)?.ok_or_else(|| LiquidityError::MsgNotFound {
        pool_id,
        kind: T::KIND.to_string(),
        msg_index,
    })
}

pub fn set_msg<T: BatchMsgState>(store: &mut dyn KvStore, state: &T) -> LiquidityResult<()> {
    state.validate_status()?;
    set_json(store, keys::msg_key(T::KIND, state.pool_id(), state.msg_index()), state)
}

/// Every record of one kind in a pool, ascending by message index
pub fn all_msgs<T: BatchMsgState>(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<Vec<T>> {
    Ok(scan_json::<T>(store, &keys::msg_prefix(T::KIND, pool_id))?
        .into_iter()
        .map(|(_, state)| state)
        .collect())
}

/// Records still awaiting settlement, ascending by message index
pub fn pending_msgs<T: BatchMsgState>(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<Vec<T>> {
    Ok(all_msgs::<T>(store, pool_id)?
        .into_iter()
        .filter(|state| !state.to_be_deleted())
        .collect())
}

/// One page of every record of a kind, settled-but-unpurged included
pub fn list_msgs<T: BatchMsgState>(
    store: &dyn KvStore,
    pool_id: u64,
    page: &PageRequest,
) -> LiquidityResult<(Vec<T>, PageResponse)> {
    let entries = all_msgs::<T>(store, pool_id)?
        .into_iter()
        .map(|state| (state.msg_index(), state))
        .collect();
    paginate(entries, page)
}

/// One page of the records still awaiting settlement
pub fn list_pending<T: BatchMsgState>(
    store: &dyn KvStore,
    pool_id: u64,
    page: &PageRequest,
) -> LiquidityResult<(Vec<T>, PageResponse)> {
    let entries = pending_msgs::<T>(store, pool_id)?
        .into_iter()
        .map(|state| (state.msg_index(), state))
        .collect();
    paginate(entries, page)
}

/// Whether any message of the pool still awaits settlement
pub fn has_pending(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<bool> {
    Ok(!pending_msgs::<SwapMsgState>(store, pool_id)?.is_empty()
        || !pending_msgs::<DepositMsgState>(store, pool_id)?.is_empty()
        || !pending_msgs::<WithdrawMsgState>(store, pool_id)?.is_empty())
}

fn purge_kind<T: BatchMsgState>(store: &mut dyn KvStore, pool_id: u64) -> LiquidityResult<usize> {
    let settled: Vec<u64> = all_msgs::<T>(store, pool_id)?
        .into_iter()
        .filter(|state| state.to_be_deleted())
        .map(|state| state.msg_index())
        .collect();
    for msg_index in &settled {
        store.delete(&keys::msg_key(T::KIND, pool_id, *msg_index));
    }
    Ok(settled.len())
}

/// Remove every record marked for deletion, returning how many
pub fn purge(store: &mut dyn KvStore, pool_id: u64) -> LiquidityResult<usize> {
    Ok(purge_kind::<DepositMsgState>(store, pool_id)?
        + purge_kind::<WithdrawMsgState>(store, pool_id)?
        + purge_kind::<SwapMsgState>(store, pool_id)?)
}

/// Funds held in the reserve account on behalf of unsettled messages
pub fn escrowed_coins(store: &dyn KvStore, pool: &Pool) -> LiquidityResult<Coins> {
    let mut escrow = Coins::new();
    for state in pending_msgs::<DepositMsgState>(store, pool.id)? {
        escrow = escrow.checked_add(&state.msg.deposit_coins)?;
    }
    for state in pending_msgs::<WithdrawMsgState>(store, pool.id)? {
        escrow.add_coin(&state.msg.pool_coin)?;
    }
    for state in pending_msgs::<SwapMsgState>(store, pool.id)? {
        escrow.add_coin(&state.remaining_offer_coin)?;
        escrow.add_coin(&state.reserved_offer_coin_fee)?;
    }
    Ok(escrow)
}

// ============================================================================
// Appends
// ============================================================================

/// Pool, metadata and window params for a message, failing on halted pools
fn load_target(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<(Pool, PoolMetadata, Params)> {
    let pool = registry::get_pool(store, pool_id)?;
    registry::ensure_active(store, pool_id)?;
    let metadata = registry::get_metadata(store, pool_id)?;
    let params = batch::window_params(store, pool_id)?;
    Ok((pool, metadata, params))
}

fn take_msg_index(store: &mut dyn KvStore, pool_id: u64, kind: MsgKind) -> LiquidityResult<u64> {
    let mut pool_batch = batch::get_batch(store, pool_id)?;
    let msg_index = pool_batch.take_msg_index(kind)?;
    batch::set_batch(store, &pool_batch)?;
    Ok(msg_index)
}

/// Validate, escrow and record a deposit
pub fn append_deposit(store: &mut dyn KvStore, msg: MsgDepositWithinBatch, height: i64) -> LiquidityResult<u64> {
    msg.validate_basic()?;
    let (pool, metadata, params) = load_target(store, msg.pool_id)?;

    if msg.deposit_coins.denoms() != pool.reserve_coin_denoms.to_vec() {
        return Err(LiquidityError::invalid_denom(&format!(
            "deposit {} does not match pool {}",
            msg.deposit_coins,
            pool.name()
        )));
    }

    // Refilling a depleted pool sets its price, so it needs the initial minimum
    if metadata.is_depleted(&pool) {
        for coin in msg.deposit_coins.iter() {
            if coin.amount < params.min_init_deposit_amount {
                return Err(LiquidityError::BelowMinimum {
                    denom: coin.denom,
                    amount: coin.amount,
                    minimum: params.min_init_deposit_amount,
                });
            }
        }
    }

    bank::send(store, &msg.depositor_address, &pool.reserve_account_address, &msg.deposit_coins)?;
    let msg_index = take_msg_index(store, pool.id, MsgKind::Deposit)?;
    set_msg(store, &DepositMsgState::new(msg, height, msg_index))?;

    log::debug!("Appended deposit {} to pool {} at height {}", msg_index, pool.id, height);
    Ok(msg_index)
}

/// Validate, escrow and record a withdrawal
pub fn append_withdraw(store: &mut dyn KvStore, msg: MsgWithdrawWithinBatch, height: i64) -> LiquidityResult<u64> {
    msg.validate_basic()?;
    let (pool, _, _) = load_target(store, msg.pool_id)?;

    if msg.pool_coin.denom != pool.pool_coin_denom {
        return Err(LiquidityError::InvalidPoolCoinDenom {
            expected: pool.pool_coin_denom.clone(),
            actual: msg.pool_coin.denom.clone(),
        });
    }

    bank::send_coin(store, &msg.withdrawer_address, &pool.reserve_account_address, &msg.pool_coin)?;
    let msg_index = take_msg_index(store, pool.id, MsgKind::Withdraw)?;
    set_msg(store, &WithdrawMsgState::new(msg, height, msg_index))?;

    log::debug!("Appended withdraw {} to pool {} at height {}", msg_index, pool.id, height);
    Ok(msg_index)
}

/// Validate, escrow and record a swap order
pub fn append_swap(store: &mut dyn KvStore, msg: MsgSwapWithinBatch, height: i64) -> LiquidityResult<u64> {
    msg.validate_basic()?;
    let (pool, metadata, params) = load_target(store, msg.pool_id)?;
    SwapDirection::of(&pool, &msg.offer_coin.denom, &msg.demand_coin_denom)?;

    if metadata.is_depleted(&pool) {
        return Err(LiquidityError::PoolDepleted { pool_id: pool.id });
    }

    let expected_fee = half_fee(msg.offer_coin.amount, params.swap_fee_rate)?;
    if msg.offer_coin_fee.amount != expected_fee {
        return Err(LiquidityError::BadOfferCoinFee {
            expected: Coin::new(msg.offer_coin.denom.clone(), expected_fee).to_string(),
            actual: msg.offer_coin_fee.to_string(),
        });
    }

    let limit = mul_amount(
        metadata.reserve_of(&msg.offer_coin.denom),
        params.max_order_amount_ratio,
        Rounding::Down,
    )?;
    if msg.offer_coin.amount > limit {
        return Err(LiquidityError::OrderAmountLimitExceeded { amount: msg.offer_coin.amount, limit });
    }

    let mut escrow = Coins::new();
    escrow.add_coin(&msg.offer_coin)?;
    escrow.add_coin(&msg.offer_coin_fee)?;
    bank::send(store, &msg.swap_requester_address, &pool.reserve_account_address, &escrow)?;

    let life_span = i64::try_from(params.cancel_order_life_span)
        .map_err(|_| LiquidityError::math_overflow("order life span"))?;
    let order_expiry_height = height
        .checked_add(life_span)
        .ok_or_else(|| LiquidityError::math_overflow("order expiry height"))?;

    let msg_index = take_msg_index(store, pool.id, MsgKind::Swap)?;
    set_msg(store, &SwapMsgState::new(msg, height, msg_index, order_expiry_height))?;

    log::debug!(
        "Appended swap {} to pool {} at height {}, expiring at {}",
        msg_index,
        pool.id,
        height,
        order_expiry_height
    );
    Ok(msg_index)
}
