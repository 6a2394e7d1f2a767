//! Shared fixtures for the settlement integration tests

#![allow(dead_code)]

use liquidity_core::*;
use liquidity_types::*;
use rust_decimal::Decimal;

pub const FUNDED: u128 = 5_000_000;

pub fn addr(name: &str) -> Address {
    Address::new(name).unwrap()
}

pub fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

/// Keeper at height 1 with a funded creator and two funded traders
pub fn keeper_with(params: Params) -> LiquidityKeeper<MemStore> {
    let mut genesis = GenesisState::new(params);
    genesis.balances.push(Balance {
        address: addr("creator"),
        coins: coins("10000000denomA,10000000denomB,10000000denomC,200000000stake"),
    });
    for trader in ["alice", "bob"] {
        genesis.balances.push(Balance {
            address: addr(trader),
            coins: coins("5000000denomA,5000000denomB,5000000denomC"),
        });
    }
    LiquidityKeeper::with_genesis(MemStore::new(), &genesis, 1).unwrap()
}

/// Keeper with default params and a 1M/1M denomA/denomB pool (id 1)
pub fn keeper_with_pool() -> (LiquidityKeeper<MemStore>, Pool) {
    keeper_with_pool_params(Params::default())
}

pub fn keeper_with_pool_params(params: Params) -> (LiquidityKeeper<MemStore>, Pool) {
    let mut keeper = keeper_with(params);
    let pool = create_pool(&mut keeper, "1000000denomA,1000000denomB");
    (keeper, pool)
}

pub fn create_pool(keeper: &mut LiquidityKeeper<MemStore>, deposit: &str) -> Pool {
    keeper
        .create_pool(MsgCreatePool {
            pool_creator_address: addr("creator"),
            pool_type_id: DEFAULT_POOL_TYPE_ID,
            deposit_coins: coins(deposit),
        })
        .unwrap()
}

/// Swap order with the exact half fee for the given rate
pub fn swap_msg(
    requester: &str,
    pool_id: u64,
    offer: Coin,
    demand_denom: &str,
    price: Decimal,
    fee_rate: Decimal,
) -> MsgSwapWithinBatch {
    let fee = liquidity_math::half_fee(offer.amount, fee_rate).unwrap();
    MsgSwapWithinBatch {
        swap_requester_address: addr(requester),
        pool_id,
        swap_type_id: DEFAULT_SWAP_TYPE_ID,
        offer_coin_fee: Coin::new(offer.denom.clone(), fee),
        offer_coin: offer,
        demand_coin_denom: demand_denom.to_string(),
        order_price: price,
    }
}

/// Run begin and end block at `height`
pub fn run_block(keeper: &mut LiquidityKeeper<MemStore>, height: i64) -> EndBlockReport {
    keeper.begin_block(height).unwrap();
    keeper.end_block(height).unwrap()
}
