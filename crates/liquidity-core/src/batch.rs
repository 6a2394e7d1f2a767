//! # Batch Controller
//!
//! Per-pool batch windows and module parameters. Each open window carries a
//! snapshot of the params it was opened with; staged parameter changes are
//! applied at the start of a block and only reach windows opened afterwards.
//!
//! Window lifecycle:
//! `Open -> (height >= begin_height + unit_batch_height) -> settled, executed
//! -> next begin_block -> Open (index + 1, begin_height = height)`

use liquidity_types::*;

use crate::ledger;
use crate::registry;
use crate::store::keys;
use crate::store::{get_json, scan_json, set_json, KvStore};

// ============================================================================
// Params
// ============================================================================

/// Active module params
pub fn get_params(store: &dyn KvStore) -> LiquidityResult<Params> {
    Ok(get_json(store, keys::PARAMS_KEY)?.unwrap_or_default())
}

pub fn set_params(store: &mut dyn KvStore, params: &Params) -> LiquidityResult<()> {
    params.validate()?;
    set_json(store, keys::PARAMS_KEY.to_vec(), params)
}

/// Queue a parameter change for the next `begin_block`
pub fn stage_params(store: &mut dyn KvStore, params: &Params) -> LiquidityResult<()> {
    params.validate()?;
    set_json(store, keys::PENDING_PARAMS_KEY.to_vec(), params)
}

pub fn pending_params(store: &dyn KvStore) -> LiquidityResult<Option<Params>> {
    get_json(store, keys::PENDING_PARAMS_KEY)
}

/// Promote staged params, returning whether anything changed
pub fn apply_staged_params(store: &mut dyn KvStore) -> LiquidityResult<bool> {
    match pending_params(store)? {
        Some(params) => {
            set_params(store, &params)?;
            store.delete(keys::PENDING_PARAMS_KEY);
            log::info!(
                "Applied staged params: unit_batch_height={}, swap_fee_rate={}, withdraw_fee_rate={}",
                params.unit_batch_height,
                params.swap_fee_rate,
                params.withdraw_fee_rate
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Params in force for the pool's open window
pub fn window_params(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<Params> {
    match get_json(store, &keys::batch_params_key(pool_id))? {
        Some(params) => Ok(params),
        None => get_params(store),
    }
}

fn snapshot_params(store: &mut dyn KvStore, pool_id: u64) -> LiquidityResult<()> {
    let params = get_params(store)?;
    set_json(store, keys::batch_params_key(pool_id), &params)
}

// ============================================================================
// Batches
// ============================================================================

pub fn get_batch(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<PoolBatch> {
    get_json(store, &keys::pool_batch_key(pool_id))?.ok_or(LiquidityError::BatchNotFound { pool_id })
}

pub fn set_batch(store: &mut dyn KvStore, batch: &PoolBatch) -> LiquidityResult<()> {
    set_json(store, keys::pool_batch_key(batch.pool_id), batch)
}

/// All batches, ascending by pool id
pub fn all_batches(store: &dyn KvStore) -> LiquidityResult<Vec<PoolBatch>> {
    Ok(scan_json::<PoolBatch>(store, &[keys::POOL_BATCH_PREFIX])?
        .into_iter()
        .map(|(_, batch)| batch)
        .collect())
}

/// Open batch 0 of a new pool
pub fn open_first_window(store: &mut dyn KvStore, pool_id: u64, height: i64) -> LiquidityResult<PoolBatch> {
    let batch = PoolBatch::new(pool_id, height);
    set_batch(store, &batch)?;
    snapshot_params(store, pool_id)?;
    Ok(batch)
}

/// Reinstate an imported window under the current params
pub fn restore_window(store: &mut dyn KvStore, batch: &PoolBatch) -> LiquidityResult<()> {
    set_batch(store, batch)?;
    snapshot_params(store, batch.pool_id)
}

/// Whether the pool's batch is due at `height`
///
/// Read-only; stays false for the rest of the window once settled.
pub fn should_execute(store: &dyn KvStore, pool_id: u64, height: i64) -> LiquidityResult<bool> {
    let batch = get_batch(store, pool_id)?;
    if batch.executed {
        return Ok(false);
    }
    let params = window_params(store, pool_id)?;
    let due = batch
        .begin_height
        .checked_add(i64::from(params.unit_batch_height))
        .ok_or_else(|| LiquidityError::math_overflow("batch due height"))?;
    Ok(height >= due)
}

/// Pools whose batch settles at `height`, ascending by pool id
///
/// Halted pools and pools without pending messages are skipped.
pub fn pools_due(store: &dyn KvStore, height: i64) -> LiquidityResult<Vec<u64>> {
    let mut due = Vec::new();
    for batch in all_batches(store)? {
        let pool_id = batch.pool_id;
        if registry::halted_reason(store, pool_id)?.is_some() {
            continue;
        }
        if !ledger::has_pending(store, pool_id)? {
            continue;
        }
        if should_execute(store, pool_id, height)? {
            due.push(pool_id);
        }
    }
    Ok(due)
}

pub fn mark_executed(store: &mut dyn KvStore, pool_id: u64) -> LiquidityResult<()> {
    let mut batch = get_batch(store, pool_id)?;
    batch.executed = true;
    set_batch(store, &batch)
}

/// Start the next window after an executed batch
///
/// Purges settled messages, bumps the index and snapshots current params.
/// Returns false when the batch has not executed yet.
pub fn open_next_window(store: &mut dyn KvStore, pool_id: u64, height: i64) -> LiquidityResult<bool> {
    let mut batch = get_batch(store, pool_id)?;
    if !batch.executed {
        return Ok(false);
    }

    let purged = ledger::purge(store, pool_id)?;
    batch.index = batch
        .index
        .checked_add(1)
        .ok_or_else(|| LiquidityError::math_overflow("batch index"))?;
    batch.begin_height = height;
    batch.executed = false;
    set_batch(store, &batch)?;
    snapshot_params(store, pool_id)?;

    log::debug!(
        "Opened batch {} of pool {} at height {} ({} settled messages purged)",
        batch.index,
        pool_id,
        height,
        purged
    );
    Ok(true)
}

/// Block start: apply staged params, then reopen every executed window
///
/// Returns the pools whose window was reopened.
pub fn begin_block(store: &mut dyn KvStore, height: i64) -> LiquidityResult<Vec<u64>> {
    apply_staged_params(store)?;

    let mut reopened = Vec::new();
    for batch in all_batches(store)? {
        if registry::halted_reason(store, batch.pool_id)?.is_some() {
            continue;
        }
        if open_next_window(store, batch.pool_id, height)? {
            reopened.push(batch.pool_id);
        }
    }
    Ok(reopened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_should_execute_is_idempotent() {
        let mut store = MemStore::new();
        set_params(&mut store, &Params { unit_batch_height: 2, ..Params::default() }).unwrap();
        open_first_window(&mut store, 1, 10).unwrap();

        assert!(!should_execute(&store, 1, 11).unwrap());
        assert!(should_execute(&store, 1, 12).unwrap());
        assert!(should_execute(&store, 1, 12).unwrap());

        mark_executed(&mut store, 1).unwrap();
        for _ in 0..3 {
            assert!(!should_execute(&store, 1, 12).unwrap());
        }
    }

    #[test]
    fn test_open_next_window() {
        let mut store = MemStore::new();
        set_params(&mut store, &Params::default()).unwrap();
        open_first_window(&mut store, 1, 1).unwrap();

        assert!(!open_next_window(&mut store, 1, 2).unwrap());

        mark_executed(&mut store, 1).unwrap();
        assert!(open_next_window(&mut store, 1, 3).unwrap());

        let batch = get_batch(&store, 1).unwrap();
        assert_eq!(batch.index, 1);
        assert_eq!(batch.begin_height, 3);
        assert!(!batch.executed);
    }

    #[test]
    fn test_staged_params_reach_only_new_windows() {
        let mut store = MemStore::new();
        set_params(&mut store, &Params::default()).unwrap();
        open_first_window(&mut store, 1, 1).unwrap();
        open_first_window(&mut store, 2, 1).unwrap();
        mark_executed(&mut store, 1).unwrap();

        let changed = Params { swap_fee_rate: dec!(0.01), ..Params::default() };
        stage_params(&mut store, &changed).unwrap();
        assert_eq!(get_params(&store).unwrap().swap_fee_rate, dec!(0.003));

        let reopened = begin_block(&mut store, 2).unwrap();
        assert_eq!(reopened, vec![1]);
        assert_eq!(get_params(&store).unwrap().swap_fee_rate, dec!(0.01));
        assert!(pending_params(&store).unwrap().is_none());

        // Pool 1 opened a new window, pool 2 keeps its snapshot
        assert_eq!(window_params(&store, 1).unwrap().swap_fee_rate, dec!(0.01));
        assert_eq!(window_params(&store, 2).unwrap().swap_fee_rate, dec!(0.003));
    }

    #[test]
    fn test_stage_params_rejects_invalid() {
        let mut store = MemStore::new();
        let invalid = Params { unit_batch_height: 0, ..Params::default() };
        assert!(stage_params(&mut store, &invalid).is_err());
        assert!(pending_params(&store).unwrap().is_none());
    }

    #[test]
    fn test_missing_batch() {
        let store = MemStore::new();
        assert!(matches!(should_execute(&store, 9, 1), Err(LiquidityError::BatchNotFound { pool_id: 9 })));
    }
}
