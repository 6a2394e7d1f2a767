//! # Pool Registry
//!
//! Canonical pool records, their lookup indexes and the reserve/supply
//! snapshot stored after each executed batch. Pool creation runs in three
//! steps so the keeper can commit the creation fee on its own:
//!
//! 1. [`prepare_pool`] validates the request without touching state
//! 2. [`charge_creation_fee`] moves the fee to the fee collector
//! 3. [`open_pool`] escrows the deposit, mints pool coins and opens batch 0

use liquidity_types::*;

use crate::bank;
use crate::batch;
use crate::store::keys;
use crate::store::{get_json, scan_json, set_json, KvStore};

// ============================================================================
// Reads
// ============================================================================

pub fn try_get_pool(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<Option<Pool>> {
    get_json(store, &keys::pool_key(pool_id))
}

pub fn get_pool(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<Pool> {
    try_get_pool(store, pool_id)?.ok_or(LiquidityError::PoolNotFound { pool_id })
}

pub fn get_metadata(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<PoolMetadata> {
    get_json(store, &keys::pool_metadata_key(pool_id))?.ok_or(LiquidityError::PoolNotFound { pool_id })
}

/// All pools, ascending by id
pub fn all_pools(store: &dyn KvStore) -> LiquidityResult<Vec<Pool>> {
    Ok(scan_json::<Pool>(store, &[keys::POOL_PREFIX])?
        .into_iter()
        .map(|(_, pool)| pool)
        .collect())
}

fn pool_by_index(store: &dyn KvStore, index_key: &[u8]) -> LiquidityResult<Option<Pool>> {
    match get_json::<u64>(store, index_key)? {
        Some(pool_id) => try_get_pool(store, pool_id),
        None => Ok(None),
    }
}

pub fn pool_by_denom_pair(store: &dyn KvStore, denom_a: &str, denom_b: &str) -> LiquidityResult<Option<Pool>> {
    pool_by_index(store, &keys::pool_by_denom_pair_key(&sort_denoms(denom_a, denom_b)))
}

pub fn pool_by_reserve_account(store: &dyn KvStore, address: &Address) -> LiquidityResult<Option<Pool>> {
    pool_by_index(store, &keys::pool_by_reserve_acc_key(address))
}

pub fn pool_by_pool_coin_denom(store: &dyn KvStore, denom: &str) -> LiquidityResult<Option<Pool>> {
    pool_by_index(store, &keys::pool_by_pool_coin_denom_key(denom))
}

/// Id the next created pool receives
pub fn next_pool_id(store: &dyn KvStore) -> LiquidityResult<u64> {
    Ok(get_json::<u64>(store, keys::NEXT_POOL_ID_KEY)?.unwrap_or(1))
}

/// Reason a pool was halted, if it was
pub fn halted_reason(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<Option<String>> {
    get_json(store, &keys::halted_pool_key(pool_id))
}

/// Fail with `PoolHalted` when the pool no longer settles
pub fn ensure_active(store: &dyn KvStore, pool_id: u64) -> LiquidityResult<()> {
    match halted_reason(store, pool_id)? {
        Some(reason) => Err(LiquidityError::PoolHalted { pool_id, reason }),
        None => Ok(()),
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Store a pool together with its lookup indexes
pub fn set_pool(store: &mut dyn KvStore, pool: &Pool) -> LiquidityResult<()> {
    set_json(store, keys::pool_key(pool.id), pool)?;
    set_json(store, keys::pool_by_denom_pair_key(&pool.reserve_coin_denoms), &pool.id)?;
    set_json(store, keys::pool_by_reserve_acc_key(&pool.reserve_account_address), &pool.id)?;
    set_json(store, keys::pool_by_pool_coin_denom_key(&pool.pool_coin_denom), &pool.id)
}

pub fn set_metadata(store: &mut dyn KvStore, metadata: &PoolMetadata) -> LiquidityResult<()> {
    set_json(store, keys::pool_metadata_key(metadata.pool_id), metadata)
}

pub fn set_next_pool_id(store: &mut dyn KvStore, pool_id: u64) -> LiquidityResult<()> {
    set_json(store, keys::NEXT_POOL_ID_KEY.to_vec(), &pool_id)
}

pub fn halt_pool(store: &mut dyn KvStore, pool_id: u64, reason: &str) -> LiquidityResult<()> {
    log::error!("Halting settlement of pool {}: {}", pool_id, reason);
    set_json(store, keys::halted_pool_key(pool_id), &reason.to_string())
}

// ============================================================================
// Pool Creation
// ============================================================================

/// Validated pool creation request
#[derive(Debug, Clone)]
pub struct PreparedPool {
    pub params: Params,
    pub reserve_coin_denoms: [String; 2],
}

/// Validate a creation request against params and existing pools
pub fn prepare_pool(store: &dyn KvStore, msg: &MsgCreatePool) -> LiquidityResult<PreparedPool> {
    msg.validate_basic()?;
    let params = batch::get_params(store)?;
    params.pool_type(msg.pool_type_id)?;

    let denoms = msg.deposit_coins.denoms();
    let reserve_coin_denoms = sort_denoms(&denoms[0], &denoms[1]);

    if let Some(existing) = pool_by_denom_pair(store, &reserve_coin_denoms[0], &reserve_coin_denoms[1])? {
        return Err(LiquidityError::DuplicateReserveDenomPair {
            pool_id: existing.id,
            denom_a: reserve_coin_denoms[0].clone(),
            denom_b: reserve_coin_denoms[1].clone(),
        });
    }

    for coin in msg.deposit_coins.iter() {
        if coin.amount < params.min_init_deposit_amount {
            return Err(LiquidityError::InsufficientDepositAmount {
                denom: coin.denom,
                amount: coin.amount,
                minimum: params.min_init_deposit_amount,
            });
        }
        if params.max_reserve_coin_amount > 0 && coin.amount > params.max_reserve_coin_amount {
            return Err(LiquidityError::ExceedMaxReserve {
                denom: coin.denom,
                amount: coin.amount,
                maximum: params.max_reserve_coin_amount,
            });
        }
    }

    Ok(PreparedPool { params, reserve_coin_denoms })
}

/// Charge the non-refundable pool creation fee
pub fn charge_creation_fee(store: &mut dyn KvStore, creator: &Address, params: &Params) -> LiquidityResult<()> {
    if params.pool_creation_fee.is_empty() {
        return Ok(());
    }
    bank::send(store, creator, &fee_collector_address()?, &params.pool_creation_fee)
}

/// Escrow the initial deposit, mint pool coins and open the first batch
pub fn open_pool(
    store: &mut dyn KvStore,
    msg: &MsgCreatePool,
    prepared: &PreparedPool,
    height: i64,
) -> LiquidityResult<Pool> {
    let pool_id = next_pool_id(store)?;
    let pool = Pool::new(
        pool_id,
        msg.pool_type_id,
        &prepared.reserve_coin_denoms[0],
        &prepared.reserve_coin_denoms[1],
    )?;

    bank::send(store, &msg.pool_creator_address, &pool.reserve_account_address, &msg.deposit_coins)?;

    let mint_amount = prepared.params.init_pool_coin_mint_amount;
    let pool_coins = Coins::from_vec(vec![Coin::new(pool.pool_coin_denom.clone(), mint_amount)])?;
    bank::mint(store, &msg.pool_creator_address, &pool_coins)?;

    set_pool(store, &pool)?;
    set_metadata(
        store,
        &PoolMetadata {
            pool_id,
            pool_coin_total_supply: mint_amount,
            reserve_coins: msg.deposit_coins.clone(),
        },
    )?;
    batch::open_first_window(store, pool_id, height)?;

    let next = pool_id
        .checked_add(1)
        .ok_or_else(|| LiquidityError::math_overflow("next pool id"))?;
    set_next_pool_id(store, next)?;

    log::info!(
        "Created pool {} ({}) with reserves {}, reserve account {}",
        pool_id,
        pool.name(),
        msg.deposit_coins,
        pool.reserve_account_address
    );
    Ok(pool)
}

/// Run all creation steps against one store
pub fn create_pool(store: &mut dyn KvStore, msg: &MsgCreatePool, height: i64) -> LiquidityResult<Pool> {
    let prepared = prepare_pool(store, msg)?;
    charge_creation_fee(store, &msg.pool_creator_address, &prepared.params)?;
    open_pool(store, msg, &prepared, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn setup() -> (MemStore, Address) {
        let mut store = MemStore::new();
        batch::set_params(&mut store, &Params::default()).unwrap();
        let creator = Address::new("creator").unwrap();
        let funds: Coins = "10000000000denomA,10000000000denomB,100000000stake".parse().unwrap();
        bank::mint(&mut store, &creator, &funds).unwrap();
        (store, creator)
    }

    fn create_msg(creator: &Address, deposit: &str) -> MsgCreatePool {
        MsgCreatePool {
            pool_creator_address: creator.clone(),
            pool_type_id: DEFAULT_POOL_TYPE_ID,
            deposit_coins: deposit.parse().unwrap(),
        }
    }

    #[test]
    fn test_create_pool() {
        let (mut store, creator) = setup();
        let pool = create_pool(&mut store, &create_msg(&creator, "2000000denomB,1000000denomA"), 5).unwrap();

        assert_eq!(pool.id, 1);
        assert_eq!(pool.reserve_coin_denoms, ["denomA".to_string(), "denomB".to_string()]);
        assert!(pool.pool_coin_denom.starts_with(POOL_COIN_DENOM_PREFIX));

        let metadata = get_metadata(&store, 1).unwrap();
        assert_eq!(metadata.pool_coin_total_supply, DEFAULT_INIT_POOL_COIN_MINT_AMOUNT);
        assert_eq!(metadata.reserve_of("denomA"), 1_000_000);
        assert_eq!(metadata.reserve_of("denomB"), 2_000_000);

        assert_eq!(
            bank::balance(&store, &creator, &pool.pool_coin_denom).unwrap(),
            DEFAULT_INIT_POOL_COIN_MINT_AMOUNT
        );
        assert_eq!(
            bank::balance(&store, &fee_collector_address().unwrap(), "stake").unwrap(),
            DEFAULT_POOL_CREATION_FEE_AMOUNT
        );
        assert_eq!(bank::balance(&store, &pool.reserve_account_address, "denomA").unwrap(), 1_000_000);

        let batch = batch::get_batch(&store, 1).unwrap();
        assert_eq!(batch.index, 0);
        assert_eq!(batch.begin_height, 5);

        assert_eq!(pool_by_denom_pair(&store, "denomB", "denomA").unwrap(), Some(pool.clone()));
        assert_eq!(pool_by_reserve_account(&store, &pool.reserve_account_address).unwrap(), Some(pool.clone()));
        assert_eq!(pool_by_pool_coin_denom(&store, &pool.pool_coin_denom).unwrap(), Some(pool));
        assert_eq!(next_pool_id(&store).unwrap(), 2);
    }

    #[test]
    fn test_create_pool_rejections() {
        let (mut store, creator) = setup();
        create_pool(&mut store, &create_msg(&creator, "1000000denomA,1000000denomB"), 1).unwrap();

        let duplicate = create_pool(&mut store, &create_msg(&creator, "1000000denomA,1000000denomB"), 1);
        assert!(matches!(duplicate, Err(LiquidityError::DuplicateReserveDenomPair { pool_id: 1, .. })));

        let small = create_pool(&mut store, &create_msg(&creator, "999999denomA,1000000stake"), 1);
        assert!(matches!(small, Err(LiquidityError::InsufficientDepositAmount { amount: 999_999, .. })));

        let mut msg = create_msg(&creator, "1000000denomA,1000000stake");
        msg.pool_type_id = 2;
        assert!(matches!(
            create_pool(&mut store, &msg, 1),
            Err(LiquidityError::UnsupportedPoolType { type_id: 2 })
        ));

        let single = create_pool(&mut store, &create_msg(&creator, "1000000denomA"), 1);
        assert!(matches!(single, Err(LiquidityError::InvalidCoinDenom { .. })));
    }

    #[test]
    fn test_reserve_cap_enforced_at_creation() {
        let (mut store, creator) = setup();
        let params = Params { max_reserve_coin_amount: 1_500_000, ..Params::default() };
        batch::set_params(&mut store, &params).unwrap();

        let result = create_pool(&mut store, &create_msg(&creator, "2000000denomA,1000000denomB"), 1);
        assert!(matches!(result, Err(LiquidityError::ExceedMaxReserve { maximum: 1_500_000, .. })));
    }

    #[test]
    fn test_halting() {
        let (mut store, _) = setup();
        assert!(ensure_active(&store, 3).is_ok());
        halt_pool(&mut store, 3, "reserve mismatch").unwrap();
        assert!(matches!(ensure_active(&store, 3), Err(LiquidityError::PoolHalted { pool_id: 3, .. })));
    }
}
