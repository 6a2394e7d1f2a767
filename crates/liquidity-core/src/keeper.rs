//! # Liquidity Keeper
//!
//! Entry points the host chain drives: `begin_block`, the four message
//! handlers, `end_block`, parameter staging and queries. Every handler runs
//! over a cache layer and commits only on success, so a rejected message
//! leaves no trace. Each pool's settlement gets its own cache; a failure
//! there drops that pool's batch and lets the others settle. Consistency
//! failures also halt the pool, any other failure leaves the batch due so
//! the next block retries it.

use liquidity_types::*;

use crate::bank;
use crate::batch;
use crate::events::{Event, EventKind};
use crate::genesis::{self, GenesisState};
use crate::ledger;
use crate::query::Querier;
use crate::registry;
use crate::settlement::{self, BatchReport};
use crate::store::{CacheStore, KvStore};

/// Pool halted by a consistency failure this block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltedPool {
    pub pool_id: u64,
    pub error: LiquidityError,
}

/// Pool whose batch was dropped this block and stays due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedBatch {
    pub pool_id: u64,
    pub error: LiquidityError,
}

/// Result of one `end_block`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlockReport {
    pub height: i64,
    /// Settled batches, ascending by pool id
    pub executed: Vec<BatchReport>,
    pub halted: Vec<HaltedPool>,
    pub failed: Vec<FailedBatch>,
}

pub struct LiquidityKeeper<S: KvStore> {
    store: S,
    height: i64,
    events: Vec<Event>,
}

impl<S: KvStore> LiquidityKeeper<S> {
    /// Keeper over an existing store
    pub fn new(store: S) -> Self {
        Self { store, height: 0, events: Vec::new() }
    }

    /// Keeper over a fresh store loaded from genesis
    pub fn with_genesis(store: S, genesis: &GenesisState, height: i64) -> LiquidityResult<Self> {
        let mut keeper = Self::new(store);
        keeper.init_genesis(genesis)?;
        keeper.height = height;
        Ok(keeper)
    }

    pub fn init_genesis(&mut self, genesis: &GenesisState) -> LiquidityResult<()> {
        let mut cache = CacheStore::new(&mut self.store);
        genesis::init_genesis(&mut cache, genesis)?;
        cache.write();
        Ok(())
    }

    pub fn export_genesis(&self) -> LiquidityResult<GenesisState> {
        genesis::export_genesis(&self.store)
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn querier(&self) -> Querier<'_> {
        Querier::new(&self.store)
    }

    /// Drain events from committed work
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn balance(&self, address: &Address, denom: &str) -> LiquidityResult<u128> {
        bank::balance(&self.store, address, denom)
    }

    pub fn balances(&self, address: &Address) -> LiquidityResult<Coins> {
        bank::balances(&self.store, address)
    }

    /// Queue a parameter change for the next block
    pub fn stage_params(&mut self, params: Params) -> LiquidityResult<()> {
        batch::stage_params(&mut self.store, &params)?;
        log::info!("Staged params change for the next block after height {}", self.height);
        Ok(())
    }

    /// Whether the pool's batch settles at the current height
    pub fn should_execute(&self, pool_id: u64) -> LiquidityResult<bool> {
        batch::should_execute(&self.store, pool_id, self.height)
    }

    // ========================================================================
    // Block Hooks
    // ========================================================================

    /// Apply staged params and reopen windows settled in the previous block
    pub fn begin_block(&mut self, height: i64) -> LiquidityResult<Vec<u64>> {
        self.height = height;
        let mut cache = CacheStore::new(&mut self.store);
        let reopened = batch::begin_block(&mut cache, height)?;
        cache.write();
        if !reopened.is_empty() {
            log::debug!("Height {}: reopened batches of pools {:?}", height, reopened);
        }
        Ok(reopened)
    }

    /// Settle every due batch in ascending pool order
    pub fn end_block(&mut self, height: i64) -> LiquidityResult<EndBlockReport> {
        self.height = height;
        let mut report = EndBlockReport { height, ..EndBlockReport::default() };

        for pool_id in batch::pools_due(&self.store, height)? {
            let mut cache = CacheStore::new(&mut self.store);
            match settlement::execute_batch(&mut cache, pool_id, height) {
                Ok(batch_report) => {
                    cache.write();
                    self.events.extend(batch_report.events.iter().cloned());
                    report.executed.push(batch_report);
                }
                Err(error) if error.is_fatal() => {
                    drop(cache);
                    log::error!("Consistency failure in pool {} at height {}: {}", pool_id, height, error);
                    registry::halt_pool(&mut self.store, pool_id, &error.to_string())?;
                    self.events.push(
                        Event::new(EventKind::PoolHalted)
                            .attr("pool_id", pool_id)
                            .attr("height", height)
                            .attr("reason", &error),
                    );
                    report.halted.push(HaltedPool { pool_id, error });
                }
                Err(error) => {
                    drop(cache);
                    log::error!("Settlement of pool {} failed at height {}, retrying next block: {}", pool_id, height, error);
                    self.events.push(
                        Event::new(EventKind::BatchFailed)
                            .attr("pool_id", pool_id)
                            .attr("height", height)
                            .attr("reason", &error),
                    );
                    report.failed.push(FailedBatch { pool_id, error });
                }
            }
        }

        Ok(report)
    }

    // ========================================================================
    // Message Handlers
    // ========================================================================

    /// Create a pool; the creation fee stays charged even if the deposit fails
    pub fn create_pool(&mut self, msg: MsgCreatePool) -> LiquidityResult<Pool> {
        let prepared = registry::prepare_pool(&self.store, &msg)?;

        let mut cache = CacheStore::new(&mut self.store);
        registry::charge_creation_fee(&mut cache, &msg.pool_creator_address, &prepared.params)?;
        cache.write();

        let mut cache = CacheStore::new(&mut self.store);
        let pool = registry::open_pool(&mut cache, &msg, &prepared, self.height)?;
        cache.write();

        self.events.push(
            Event::new(EventKind::CreatePool)
                .attr("pool_id", pool.id)
                .attr("pool_type_id", pool.type_id)
                .attr("pool_name", pool.name())
                .attr("reserve_account", &pool.reserve_account_address)
                .attr("deposit_coins", &msg.deposit_coins)
                .attr("pool_coin_denom", &pool.pool_coin_denom),
        );
        Ok(pool)
    }

    pub fn deposit_within_batch(&mut self, msg: MsgDepositWithinBatch) -> LiquidityResult<u64> {
        let pool_id = msg.pool_id;
        let depositor = msg.depositor_address.clone();
        let coins = msg.deposit_coins.clone();

        let mut cache = CacheStore::new(&mut self.store);
        let msg_index = ledger::append_deposit(&mut cache, msg, self.height)?;
        cache.write();

        self.events.push(
            Event::new(EventKind::DepositWithinBatch)
                .attr("pool_id", pool_id)
                .attr("msg_index", msg_index)
                .attr("depositor", &depositor)
                .attr("deposit_coins", &coins),
        );
        Ok(msg_index)
    }

    pub fn withdraw_within_batch(&mut self, msg: MsgWithdrawWithinBatch) -> LiquidityResult<u64> {
        let pool_id = msg.pool_id;
        let withdrawer = msg.withdrawer_address.clone();
        let pool_coin = msg.pool_coin.clone();

        let mut cache = CacheStore::new(&mut self.store);
        let msg_index = ledger::append_withdraw(&mut cache, msg, self.height)?;
        cache.write();

        self.events.push(
            Event::new(EventKind::WithdrawWithinBatch)
                .attr("pool_id", pool_id)
                .attr("msg_index", msg_index)
                .attr("withdrawer", &withdrawer)
                .attr("pool_coin", &pool_coin),
        );
        Ok(msg_index)
    }

    pub fn swap_within_batch(&mut self, msg: MsgSwapWithinBatch) -> LiquidityResult<u64> {
        let pool_id = msg.pool_id;
        let requester = msg.swap_requester_address.clone();
        let offer = msg.offer_coin.clone();
        let price = msg.order_price;

        let mut cache = CacheStore::new(&mut self.store);
        let msg_index = ledger::append_swap(&mut cache, msg, self.height)?;
        cache.write();

        self.events.push(
            Event::new(EventKind::SwapWithinBatch)
                .attr("pool_id", pool_id)
                .attr("msg_index", msg_index)
                .attr("swap_requester", &requester)
                .attr("offer_coin", &offer)
                .attr("order_price", price),
        );
        Ok(msg_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::Balance;
    use crate::store::MemStore;

    fn keeper() -> LiquidityKeeper<MemStore> {
        let mut genesis = GenesisState::new(Params::default());
        genesis.balances.push(Balance {
            address: Address::new("creator").unwrap(),
            coins: "1000000denomA,1000000denomB,40000000stake".parse().unwrap(),
        });
        LiquidityKeeper::with_genesis(MemStore::new(), &genesis, 1).unwrap()
    }

    #[test]
    fn test_failed_deposit_keeps_creation_fee() {
        let mut keeper = keeper();
        let creator = Address::new("creator").unwrap();
        // Enough for the minimum but more than the creator holds
        let msg = MsgCreatePool {
            pool_creator_address: creator.clone(),
            pool_type_id: 1,
            deposit_coins: "1000000denomA,2000000denomB".parse().unwrap(),
        };
        let err = keeper.create_pool(msg).unwrap_err();
        assert!(matches!(err, LiquidityError::InsufficientBalance { .. }));

        assert_eq!(keeper.balance(&creator, "stake").unwrap(), 0);
        assert_eq!(keeper.balance(&creator, "denomA").unwrap(), 1_000_000);
        assert!(keeper.querier().liquidity_pool(1).is_err());
        assert!(keeper.take_events().is_empty());
    }

    #[test]
    fn test_create_pool_emits_event() {
        let mut keeper = keeper();
        let msg = MsgCreatePool {
            pool_creator_address: Address::new("creator").unwrap(),
            pool_type_id: 1,
            deposit_coins: "1000000denomA,1000000denomB".parse().unwrap(),
        };
        let pool = keeper.create_pool(msg).unwrap();
        let events = keeper.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CreatePool);
        assert_eq!(events[0].get("pool_id"), Some("1"));
        assert_eq!(keeper.querier().liquidity_pool_batch(pool.id).unwrap().begin_height, 1);
    }

    #[test]
    fn test_end_block_without_pools() {
        let mut keeper = keeper();
        keeper.begin_block(2).unwrap();
        let report = keeper.end_block(2).unwrap();
        assert!(report.executed.is_empty());
        assert!(report.halted.is_empty());
        assert!(report.failed.is_empty());
    }
}
