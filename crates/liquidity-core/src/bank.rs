//! # Bank
//!
//! Account balances and per-denom supply kept in the module store, so an
//! escrow or a settlement payout commits together with the ledger and pool
//! records it belongs to.

use liquidity_types::{amount_serde, Address, Coin, Coins, LiquidityError, LiquidityResult};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{get_json, set_json, KvStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
struct StoredAmount(#[serde(with = "amount_serde")] u128);

fn read_amount(store: &dyn KvStore, key: &[u8]) -> LiquidityResult<u128> {
    Ok(get_json::<StoredAmount>(store, key)?.map(|a| a.0).unwrap_or(0))
}

fn write_amount(store: &mut dyn KvStore, key: Vec<u8>, amount: u128) -> LiquidityResult<()> {
    if amount == 0 {
        store.delete(&key);
        Ok(())
    } else {
        set_json(store, key, &StoredAmount(amount))
    }
}

// ============================================================================
// Reads
// ============================================================================

pub fn balance(store: &dyn KvStore, address: &Address, denom: &str) -> LiquidityResult<u128> {
    read_amount(store, &keys::balance_key(address, denom)?)
}

/// Every non-zero balance of an account
pub fn balances(store: &dyn KvStore, address: &Address) -> LiquidityResult<Coins> {
    let prefix = keys::account_balance_prefix(address)?;
    let mut coins = Coins::new();
    for (key, bytes) in store.prefix_scan(&prefix) {
        let denom = std::str::from_utf8(&key[prefix.len()..])
            .map_err(|e| LiquidityError::codec(&hex::encode(&key), &e.to_string()))?;
        let amount: StoredAmount = serde_json::from_slice(&bytes)?;
        coins.add_coin(&Coin::new(denom, amount.0))?;
    }
    Ok(coins)
}

/// Balances of every account holding anything, ordered by key
pub fn all_balances(store: &dyn KvStore) -> LiquidityResult<Vec<(Address, Coins)>> {
    let mut accounts: Vec<(Address, Coins)> = Vec::new();
    for (key, bytes) in store.prefix_scan(&[keys::BALANCE_PREFIX]) {
        let malformed = || LiquidityError::codec(&hex::encode(&key), "malformed balance key");
        let len = *key.get(1).ok_or_else(malformed)? as usize;
        let address_bytes = key.get(2..2 + len).ok_or_else(malformed)?;
        let denom_bytes = key.get(2 + len..).ok_or_else(malformed)?;
        let address = std::str::from_utf8(address_bytes).map_err(|_| malformed())?;
        let denom = std::str::from_utf8(denom_bytes).map_err(|_| malformed())?;
        let amount: StoredAmount = serde_json::from_slice(&bytes)?;

        let coin = Coin::new(denom, amount.0);
        match accounts.last_mut() {
            Some((last, coins)) if last.as_str() == address => coins.add_coin(&coin)?,
            _ => {
                let mut coins = Coins::new();
                coins.add_coin(&coin)?;
                accounts.push((Address::new(address)?, coins));
            }
        }
    }
    Ok(accounts)
}

pub fn supply(store: &dyn KvStore, denom: &str) -> LiquidityResult<u128> {
    read_amount(store, &keys::supply_key(denom))
}

// ============================================================================
// Transfers
// ============================================================================

fn add_balance(store: &mut dyn KvStore, address: &Address, coin: &Coin) -> LiquidityResult<()> {
    let key = keys::balance_key(address, &coin.denom)?;
    let current = read_amount(store, &key)?;
    let updated = current
        .checked_add(coin.amount)
        .ok_or_else(|| LiquidityError::math_overflow("balance add"))?;
    write_amount(store, key, updated)
}

fn sub_balance(store: &mut dyn KvStore, address: &Address, coin: &Coin) -> LiquidityResult<()> {
    let key = keys::balance_key(address, &coin.denom)?;
    let current = read_amount(store, &key)?;
    if current < coin.amount {
        return Err(LiquidityError::insufficient_balance(
            address.as_str(),
            &coin.denom,
            coin.amount,
            current,
        ));
    }
    write_amount(store, key, current - coin.amount)
}

/// Move coins between accounts, all or nothing
pub fn send(store: &mut dyn KvStore, from: &Address, to: &Address, coins: &Coins) -> LiquidityResult<()> {
    for coin in coins.iter() {
        let available = balance(store, from, &coin.denom)?;
        if available < coin.amount {
            return Err(LiquidityError::insufficient_balance(from.as_str(), &coin.denom, coin.amount, available));
        }
    }
    for coin in coins.iter() {
        sub_balance(store, from, &coin)?;
        add_balance(store, to, &coin)?;
    }
    log::trace!("send {} from {} to {}", coins, from, to);
    Ok(())
}

pub fn send_coin(store: &mut dyn KvStore, from: &Address, to: &Address, coin: &Coin) -> LiquidityResult<()> {
    let mut coins = Coins::new();
    coins.add_coin(coin)?;
    send(store, from, to, &coins)
}

/// Create coins in an account, growing supply
pub fn mint(store: &mut dyn KvStore, to: &Address, coins: &Coins) -> LiquidityResult<()> {
    for coin in coins.iter() {
        let key = keys::supply_key(&coin.denom);
        let updated = read_amount(store, &key)?
            .checked_add(coin.amount)
            .ok_or_else(|| LiquidityError::math_overflow("supply add"))?;
        write_amount(store, key, updated)?;
        add_balance(store, to, &coin)?;
    }
    Ok(())
}

/// Destroy coins held by an account, shrinking supply
pub fn burn(store: &mut dyn KvStore, from: &Address, coins: &Coins) -> LiquidityResult<()> {
    for coin in coins.iter() {
        sub_balance(store, from, &coin)?;
        let key = keys::supply_key(&coin.denom);
        let updated = read_amount(store, &key)?
            .checked_sub(coin.amount)
            .ok_or_else(|| LiquidityError::math_underflow("supply sub"))?;
        write_amount(store, key, updated)?;
    }
    Ok(())
}
