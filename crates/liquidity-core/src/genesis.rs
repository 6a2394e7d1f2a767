//! # Genesis
//!
//! Import and export of the whole module state. Import rebuilds every pool
//! from its record and refuses state whose reserve accounts or pool coin
//! supply disagree with the recorded metadata.

use std::collections::BTreeSet;

use liquidity_types::*;
use serde::{Deserialize, Serialize};

use crate::bank;
use crate::batch;
use crate::ledger;
use crate::registry;
use crate::settlement::check_pool_consistency;
use crate::store::KvStore;

/// Account balance at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: Address,
    pub coins: Coins,
}

/// Everything stored for one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub pool: Pool,
    pub pool_metadata: PoolMetadata,
    pub pool_batch: PoolBatch,
    #[serde(default)]
    pub deposit_msg_states: Vec<DepositMsgState>,
    #[serde(default)]
    pub withdraw_msg_states: Vec<WithdrawMsgState>,
    #[serde(default)]
    pub swap_msg_states: Vec<SwapMsgState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub pool_records: Vec<PoolRecord>,
}

fn invalid(reason: String) -> LiquidityError {
    LiquidityError::invalid_genesis(&reason)
}

fn validate_states<T: BatchMsgState>(pool_id: u64, next_index: u64, states: &[T]) -> LiquidityResult<()> {
    let mut seen = BTreeSet::new();
    for state in states {
        if state.pool_id() != pool_id {
            return Err(invalid(format!(
                "{} message {} belongs to pool {}, found under pool {}",
                T::KIND,
                state.msg_index(),
                state.pool_id(),
                pool_id
            )));
        }
        if state.msg_index() == 0 || state.msg_index() >= next_index {
            return Err(invalid(format!(
                "{} message index {} of pool {} outside 1..{}",
                T::KIND,
                state.msg_index(),
                pool_id,
                next_index
            )));
        }
        if !seen.insert(state.msg_index()) {
            return Err(invalid(format!("duplicate {} message index {} in pool {}", T::KIND, state.msg_index(), pool_id)));
        }
        state.validate_status()?;
    }
    Ok(())
}

impl PoolRecord {
    pub fn validate(&self) -> LiquidityResult<()> {
        let pool_id = self.pool.id;
        self.pool.validate()?;
        if self.pool_metadata.pool_id != pool_id || self.pool_batch.pool_id != pool_id {
            return Err(invalid(format!("metadata or batch of pool {} carries another pool id", pool_id)));
        }
        for denom in self.pool_metadata.reserve_coins.denoms() {
            if !self.pool.has_denom(&denom) {
                return Err(invalid(format!("pool {} reserves hold foreign denom {}", pool_id, denom)));
            }
        }
        validate_states(pool_id, self.pool_batch.deposit_msg_index, &self.deposit_msg_states)?;
        validate_states(pool_id, self.pool_batch.withdraw_msg_index, &self.withdraw_msg_states)?;
        validate_states(pool_id, self.pool_batch.swap_msg_index, &self.swap_msg_states)?;
        for state in &self.swap_msg_states {
            state.check_conservation()?;
        }
        Ok(())
    }
}

impl GenesisState {
    pub fn new(params: Params) -> Self {
        Self { params, balances: Vec::new(), pool_records: Vec::new() }
    }

    pub fn validate(&self) -> LiquidityResult<()> {
        self.params.validate()?;

        let mut addresses = BTreeSet::new();
        for balance in &self.balances {
            if !addresses.insert(balance.address.clone()) {
                return Err(invalid(format!("duplicate balance for {}", balance.address)));
            }
        }

        let mut ids = BTreeSet::new();
        let mut pairs = BTreeSet::new();
        for record in &self.pool_records {
            record.validate()?;
            self.params.pool_type(record.pool.type_id)?;
            if !ids.insert(record.pool.id) {
                return Err(invalid(format!("duplicate pool id {}", record.pool.id)));
            }
            if !pairs.insert(record.pool.reserve_coin_denoms.clone()) {
                return Err(invalid(format!("duplicate reserve denom pair {}", record.pool.name())));
            }
        }
        Ok(())
    }
}

/// Load a validated genesis into an empty store
pub fn init_genesis(store: &mut dyn KvStore, genesis: &GenesisState) -> LiquidityResult<()> {
    genesis.validate()?;
    batch::set_params(store, &genesis.params)?;

    for balance in &genesis.balances {
        bank::mint(store, &balance.address, &balance.coins)?;
    }

    let mut next_pool_id = 1u64;
    for record in &genesis.pool_records {
        registry::set_pool(store, &record.pool)?;
        registry::set_metadata(store, &record.pool_metadata)?;
        batch::restore_window(store, &record.pool_batch)?;
        for state in &record.deposit_msg_states {
            ledger::set_msg(store, state)?;
        }
        for state in &record.withdraw_msg_states {
            ledger::set_msg(store, state)?;
        }
        for state in &record.swap_msg_states {
            ledger::set_msg(store, state)?;
        }
        next_pool_id = next_pool_id.max(record.pool.id.saturating_add(1));
    }
    registry::set_next_pool_id(store, next_pool_id)?;

    for record in &genesis.pool_records {
        check_pool_consistency(store, &record.pool, &record.pool_metadata)
            .map_err(|e| invalid(e.to_string()))?;
    }

    log::info!(
        "Initialized genesis with {} pools and {} funded accounts",
        genesis.pool_records.len(),
        genesis.balances.len()
    );
    Ok(())
}

/// Snapshot the whole module state
pub fn export_genesis(store: &dyn KvStore) -> LiquidityResult<GenesisState> {
    let balances = bank::all_balances(store)?
        .into_iter()
        .map(|(address, coins)| Balance { address, coins })
        .collect();

    let mut pool_records = Vec::new();
    for pool in registry::all_pools(store)? {
        pool_records.push(PoolRecord {
            pool_metadata: registry::get_metadata(store, pool.id)?,
            pool_batch: batch::get_batch(store, pool.id)?,
            deposit_msg_states: ledger::all_msgs(store, pool.id)?,
            withdraw_msg_states: ledger::all_msgs(store, pool.id)?,
            swap_msg_states: ledger::all_msgs(store, pool.id)?,
            pool,
        });
    }

    Ok(GenesisState { params: batch::get_params(store)?, balances, pool_records })
}
