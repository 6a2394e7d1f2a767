//! Replays a scenario through the keeper block by block

use liquidity_core::{Balance, GenesisState, LiquidityKeeper, MemStore, PageRequest};
use liquidity_math::half_fee;
use liquidity_types::*;
use serde::Serialize;
use serde_json::json;

use crate::config::{parse_coin, parse_coins, BlockConfig, ScenarioConfig, ScenarioMsg};
use crate::error::{SimulationError, SimulationResult};

/// Counters over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub blocks: usize,
    pub msgs_accepted: usize,
    pub msgs_rejected: usize,
    pub batches_executed: usize,
    /// Batches dropped and left due, by pool
    pub batches_failed: Vec<u64>,
    pub pools_halted: Vec<u64>,
}

pub struct ScenarioRunner {
    config: ScenarioConfig,
    keeper: LiquidityKeeper<MemStore>,
}

impl ScenarioRunner {
    /// Build the genesis state from the scenario accounts
    pub fn new(config: ScenarioConfig) -> SimulationResult<Self> {
        config.validate()?;

        let mut genesis = GenesisState::new(config.params.clone());
        for account in &config.accounts {
            genesis.balances.push(Balance {
                address: Address::new(account.address.clone())?,
                coins: parse_coins("accounts.coins", &account.coins)?,
            });
        }
        let keeper = LiquidityKeeper::with_genesis(MemStore::new(), &genesis, 0)?;

        log::info!(
            "Scenario '{}': {} accounts, {} blocks",
            config.name,
            config.accounts.len(),
            config.blocks.len()
        );
        Ok(Self { config, keeper })
    }

    pub fn keeper(&self) -> &LiquidityKeeper<MemStore> {
        &self.keeper
    }

    /// Run every block of the scenario
    pub fn run(&mut self) -> SimulationResult<RunSummary> {
        let mut summary = RunSummary::default();
        let blocks = self.config.blocks.clone();
        for block in &blocks {
            self.run_block(block, &mut summary)?;
        }

        log::info!(
            "Scenario '{}' finished: {} blocks, {} messages accepted, {} rejected, {} batches executed",
            self.config.name,
            summary.blocks,
            summary.msgs_accepted,
            summary.msgs_rejected,
            summary.batches_executed
        );
        if !summary.pools_halted.is_empty() {
            log::warn!("Halted pools: {:?}", summary.pools_halted);
        }
        Ok(summary)
    }

    fn run_block(&mut self, block: &BlockConfig, summary: &mut RunSummary) -> SimulationResult<()> {
        let height = block.height;
        self.keeper.begin_block(height)?;

        for (i, msg) in block.msgs.iter().enumerate() {
            match self.deliver(msg) {
                Ok(outcome) => {
                    summary.msgs_accepted += 1;
                    log::info!("Height {} msg {}: {}", height, i, outcome);
                }
                // Rejections are part of the scenario, anything else aborts it
                Err(SimulationError::Module(e)) => {
                    summary.msgs_rejected += 1;
                    log::warn!("Height {} msg {} rejected: {}", height, i, e);
                }
                Err(e) => return Err(e),
            }
        }

        let report = self.keeper.end_block(height)?;
        for batch in &report.executed {
            log::info!(
                "Height {}: pool {} batch {} settled at {} (swaps {}/{}/{} filled/carried/cancelled, deposits {}/{}, withdraws {}/{})",
                height,
                batch.pool_id,
                batch.batch_index,
                batch.swap_price.map_or_else(|| "-".to_string(), |p| p.to_string()),
                batch.swaps.filled,
                batch.swaps.carried,
                batch.swaps.cancelled,
                batch.deposits_succeeded,
                batch.deposits_succeeded + batch.deposits_failed,
                batch.withdraws_succeeded,
                batch.withdraws_succeeded + batch.withdraws_failed,
            );
        }
        for failed in &report.failed {
            log::warn!("Height {}: pool {} batch failed, retrying: {}", height, failed.pool_id, failed.error);
            summary.batches_failed.push(failed.pool_id);
        }
        for halted in &report.halted {
            log::error!("Height {}: pool {} halted: {}", height, halted.pool_id, halted.error);
            summary.pools_halted.push(halted.pool_id);
        }
        for event in self.keeper.take_events() {
            log::debug!("{}", event);
        }

        summary.blocks += 1;
        summary.batches_executed += report.executed.len();
        Ok(())
    }

    /// Deliver one message, describing the outcome
    fn deliver(&mut self, msg: &ScenarioMsg) -> SimulationResult<String> {
        match msg {
            ScenarioMsg::CreatePool { creator, deposit } => {
                let pool = self.keeper.create_pool(MsgCreatePool {
                    pool_creator_address: Address::new(creator.clone())?,
                    pool_type_id: DEFAULT_POOL_TYPE_ID,
                    deposit_coins: parse_coins("create_pool.deposit", deposit)?,
                })?;
                Ok(format!("created pool {} ({}) with {}", pool.id, pool.name(), deposit))
            }
            ScenarioMsg::Deposit { depositor, pool_id, coins } => {
                let index = self.keeper.deposit_within_batch(MsgDepositWithinBatch {
                    depositor_address: Address::new(depositor.clone())?,
                    pool_id: *pool_id,
                    deposit_coins: parse_coins("deposit.coins", coins)?,
                })?;
                Ok(format!("deposit {} queued in pool {}", index, pool_id))
            }
            ScenarioMsg::Withdraw { withdrawer, pool_id, pool_coin_amount } => {
                let pool = self.keeper.querier().liquidity_pool(*pool_id)?;
                let index = self.keeper.withdraw_within_batch(MsgWithdrawWithinBatch {
                    withdrawer_address: Address::new(withdrawer.clone())?,
                    pool_id: *pool_id,
                    pool_coin: Coin::new(pool.pool_coin_denom, u128::from(*pool_coin_amount)),
                })?;
                Ok(format!("withdraw {} queued in pool {}", index, pool_id))
            }
            ScenarioMsg::Swap { requester, pool_id, offer, demand_denom, price, offer_fee } => {
                let offer_coin = parse_coin("swap.offer", offer)?;
                let offer_coin_fee = match offer_fee {
                    Some(fee) => parse_coin("swap.offer_fee", fee)?,
                    None => {
                        let params = liquidity_core::batch::window_params(self.keeper.store(), *pool_id)?;
                        Coin::new(offer_coin.denom.clone(), half_fee(offer_coin.amount, params.swap_fee_rate)?)
                    }
                };
                let index = self.keeper.swap_within_batch(MsgSwapWithinBatch {
                    swap_requester_address: Address::new(requester.clone())?,
                    pool_id: *pool_id,
                    swap_type_id: DEFAULT_SWAP_TYPE_ID,
                    offer_coin,
                    demand_coin_denom: demand_denom.clone(),
                    offer_coin_fee,
                    order_price: *price,
                })?;
                Ok(format!("swap {} queued in pool {} at {}", index, pool_id, price))
            }
        }
    }

    /// Pools with their metadata and batch, as JSON
    pub fn final_state(&self) -> SimulationResult<serde_json::Value> {
        let querier = self.keeper.querier();
        let mut pools = Vec::new();
        let mut page = PageRequest::with_limit(MAX_PAGE_LIMIT);
        loop {
            let response = querier.liquidity_pools(&page)?;
            for pool in response.items {
                pools.push(json!({
                    "metadata": querier.pool_metadata(pool.id)?,
                    "batch": querier.liquidity_pool_batch(pool.id)?,
                    "halted": querier.pool_halted(pool.id)?,
                    "pool": pool,
                }));
            }
            match response.pagination.next_key {
                Some(key) => page = PageRequest::after(key, MAX_PAGE_LIMIT),
                None => break,
            }
        }

        Ok(json!({
            "scenario": self.config.name,
            "height": self.keeper.height(),
            "params": querier.params()?,
            "pools": pools,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_example_scenario_runs_clean() {
        let mut runner = ScenarioRunner::new(ScenarioConfig::example()).unwrap();
        let summary = runner.run().unwrap();

        assert_eq!(summary.blocks, 4);
        assert_eq!(summary.msgs_rejected, 0);
        assert_eq!(summary.msgs_accepted, 5);
        assert!(summary.pools_halted.is_empty());
        assert!(summary.batches_failed.is_empty());
        // Height 2 settles swaps and the deposit, height 4 the withdrawal
        assert_eq!(summary.batches_executed, 2);

        let state = runner.final_state().unwrap();
        assert_eq!(state["pools"].as_array().map(Vec::len), Some(1));
        assert_eq!(state["height"], 4);
    }

    #[test]
    fn test_rejected_messages_are_counted() {
        let mut config = ScenarioConfig::example();
        config.blocks[1].msgs.push(ScenarioMsg::Swap {
            requester: "alice".to_string(),
            pool_id: 9,
            offer: "1000denomA".to_string(),
            demand_denom: "denomB".to_string(),
            price: Decimal::ONE,
            offer_fee: None,
        });

        let mut runner = ScenarioRunner::new(config).unwrap();
        let summary = runner.run().unwrap();
        assert_eq!(summary.msgs_rejected, 1);
        assert_eq!(summary.msgs_accepted, 5);
    }
}
