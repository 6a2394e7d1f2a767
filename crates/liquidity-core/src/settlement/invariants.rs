//! Pool consistency checks run around every settlement

use liquidity_types::*;

use crate::bank;
use crate::ledger;
use crate::store::KvStore;

/// Verify the reserve account against the stored snapshot
///
/// The reserve account must hold exactly the metadata reserves plus the
/// escrow of unsettled messages, and the pool coin supply must match the
/// recorded total. A mismatch is fatal for the pool.
pub fn check_pool_consistency(store: &dyn KvStore, pool: &Pool, metadata: &PoolMetadata) -> LiquidityResult<()> {
    let escrow = ledger::escrowed_coins(store, pool)?;
    let expected = metadata.reserve_coins.checked_add(&escrow)?;

    let denoms = [pool.denom_x(), pool.denom_y(), pool.pool_coin_denom.as_str()];
    for denom in denoms {
        let held = bank::balance(store, &pool.reserve_account_address, denom)?;
        let wanted = expected.amount_of(denom);
        if held != wanted {
            return Err(LiquidityError::inconsistent(
                pool.id,
                &format!(
                    "reserve account holds {}{} but reserves plus escrow are {}{}",
                    held, denom, wanted, denom
                ),
            ));
        }
    }

    let supply = bank::supply(store, &pool.pool_coin_denom)?;
    if supply != metadata.pool_coin_total_supply {
        return Err(LiquidityError::inconsistent(
            pool.id,
            &format!(
                "pool coin supply {} differs from recorded {}",
                supply, metadata.pool_coin_total_supply
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch;
    use crate::registry;
    use crate::store::MemStore;

    #[test]
    fn test_detects_reserve_mismatch() {
        let mut store = MemStore::new();
        batch::set_params(&mut store, &Params::default()).unwrap();
        let creator = Address::new("creator").unwrap();
        bank::mint(&mut store, &creator, &"2000000denomA,1000000denomB,40000000stake".parse().unwrap()).unwrap();
        let msg = MsgCreatePool {
            pool_creator_address: creator.clone(),
            pool_type_id: 1,
            deposit_coins: "1000000denomA,1000000denomB".parse().unwrap(),
        };
        let pool = registry::create_pool(&mut store, &msg, 1).unwrap();
        let metadata = registry::get_metadata(&store, pool.id).unwrap();
        assert!(check_pool_consistency(&store, &pool, &metadata).is_ok());

        // Funds arriving outside settlement break the identity
        bank::send_coin(&mut store, &creator, &pool.reserve_account_address, &Coin::new("denomA", 5)).unwrap();
        let err = check_pool_consistency(&store, &pool, &metadata).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_detects_supply_mismatch() {
        let mut store = MemStore::new();
        batch::set_params(&mut store, &Params::default()).unwrap();
        let creator = Address::new("creator").unwrap();
        bank::mint(&mut store, &creator, &"1000000denomA,1000000denomB,40000000stake".parse().unwrap()).unwrap();
        let msg = MsgCreatePool {
            pool_creator_address: creator.clone(),
            pool_type_id: 1,
            deposit_coins: "1000000denomA,1000000denomB".parse().unwrap(),
        };
        let pool = registry::create_pool(&mut store, &msg, 1).unwrap();
        let metadata = registry::get_metadata(&store, pool.id).unwrap();

        let extra = Coins::from_vec(vec![Coin::new(pool.pool_coin_denom.clone(), 1)]).unwrap();
        bank::mint(&mut store, &creator, &extra).unwrap();
        assert!(matches!(
            check_pool_consistency(&store, &pool, &metadata),
            Err(LiquidityError::InconsistentPoolState { .. })
        ));
    }
}
