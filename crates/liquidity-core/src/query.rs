//! # Query Surface
//!
//! Read-only projections over committed state. List results are ordered by
//! ascending pool id or message index.

use liquidity_types::*;
use serde::{Deserialize, Serialize};

use crate::batch;
use crate::ledger;
use crate::pagination::{paginate, PageRequest, PageResponse};
use crate::registry;
use crate::store::KvStore;

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub pagination: PageResponse,
}

impl<T> PagedResponse<T> {
    fn from_parts((items, pagination): (Vec<T>, PageResponse)) -> Self {
        Self { items, pagination }
    }
}

/// Query handle over a store
pub struct Querier<'a> {
    store: &'a dyn KvStore,
}

impl<'a> Querier<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    pub fn params(&self) -> LiquidityResult<Params> {
        batch::get_params(self.store)
    }

    pub fn liquidity_pools(&self, page: &PageRequest) -> LiquidityResult<PagedResponse<Pool>> {
        let entries = registry::all_pools(self.store)?
            .into_iter()
            .map(|pool| (pool.id, pool))
            .collect();
        paginate(entries, page).map(PagedResponse::from_parts)
    }

    pub fn liquidity_pool(&self, pool_id: u64) -> LiquidityResult<Pool> {
        registry::get_pool(self.store, pool_id)
    }

    pub fn liquidity_pool_by_reserve_acc(&self, address: &Address) -> LiquidityResult<Option<Pool>> {
        registry::pool_by_reserve_account(self.store, address)
    }

    pub fn liquidity_pool_by_pool_coin_denom(&self, denom: &str) -> LiquidityResult<Option<Pool>> {
        registry::pool_by_pool_coin_denom(self.store, denom)
    }

    pub fn pool_metadata(&self, pool_id: u64) -> LiquidityResult<PoolMetadata> {
        registry::get_metadata(self.store, pool_id)
    }

    pub fn liquidity_pool_batch(&self, pool_id: u64) -> LiquidityResult<PoolBatch> {
        registry::get_pool(self.store, pool_id)?;
        batch::get_batch(self.store, pool_id)
    }

    /// Halt reason, when settlement of the pool has been stopped
    pub fn pool_halted(&self, pool_id: u64) -> LiquidityResult<Option<String>> {
        registry::halted_reason(self.store, pool_id)
    }

    fn batch_msgs<T: BatchMsgState>(&self, pool_id: u64, page: &PageRequest) -> LiquidityResult<PagedResponse<T>> {
        registry::get_pool(self.store, pool_id)?;
        ledger::list_msgs::<T>(self.store, pool_id, page).map(PagedResponse::from_parts)
    }

    pub fn pool_batch_swap_msgs(&self, pool_id: u64, page: &PageRequest) -> LiquidityResult<PagedResponse<SwapMsgState>> {
        self.batch_msgs(pool_id, page)
    }

    pub fn pool_batch_deposit_msgs(
        &self,
        pool_id: u64,
        page: &PageRequest,
    ) -> LiquidityResult<PagedResponse<DepositMsgState>> {
        self.batch_msgs(pool_id, page)
    }

    pub fn pool_batch_withdraw_msgs(
        &self,
        pool_id: u64,
        page: &PageRequest,
    ) -> LiquidityResult<PagedResponse<WithdrawMsgState>> {
        self.batch_msgs(pool_id, page)
    }

    pub fn pool_batch_swap_msg(&self, pool_id: u64, msg_index: u64) -> LiquidityResult<SwapMsgState> {
        ledger::must_get_msg(self.store, pool_id, msg_index)
    }

    pub fn pool_batch_deposit_msg(&self, pool_id: u64, msg_index: u64) -> LiquidityResult<DepositMsgState> {
        ledger::must_get_msg(self.store, pool_id, msg_index)
    }

    pub fn pool_batch_withdraw_msg(&self, pool_id: u64, msg_index: u64) -> LiquidityResult<WithdrawMsgState> {
        ledger::must_get_msg(self.store, pool_id, msg_index)
    }
}
