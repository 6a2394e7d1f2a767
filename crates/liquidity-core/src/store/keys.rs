//! Store key layout
//!
//! Ids are encoded big-endian so lexicographic key order equals numeric
//! order and prefix scans come back ascending by pool id and message index.

use liquidity_types::{Address, LiquidityError, LiquidityResult, MsgKind};

pub const POOL_PREFIX: u8 = 0x01;
pub const POOL_BY_DENOM_PAIR_PREFIX: u8 = 0x02;
pub const NEXT_POOL_ID_KEY: &[u8] = &[0x03];
pub const POOL_METADATA_PREFIX: u8 = 0x04;
pub const POOL_BATCH_PREFIX: u8 = 0x05;
pub const BATCH_PARAMS_PREFIX: u8 = 0x06;
pub const POOL_BY_RESERVE_ACC_PREFIX: u8 = 0x07;
pub const POOL_BY_POOL_COIN_DENOM_PREFIX: u8 = 0x08;

pub const DEPOSIT_MSG_PREFIX: u8 = 0x10;
pub const WITHDRAW_MSG_PREFIX: u8 = 0x11;
pub const SWAP_MSG_PREFIX: u8 = 0x12;

pub const PARAMS_KEY: &[u8] = &[0x20];
pub const PENDING_PARAMS_KEY: &[u8] = &[0x21];

pub const HALTED_POOL_PREFIX: u8 = 0x30;

pub const BALANCE_PREFIX: u8 = 0x40;
pub const SUPPLY_PREFIX: u8 = 0x41;

fn with_id(prefix: u8, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn with_str(prefix: u8, value: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + value.len());
    key.push(prefix);
    key.extend_from_slice(value.as_bytes());
    key
}

/// Trailing big-endian u64 of a key
pub fn trailing_id(key: &[u8]) -> LiquidityResult<u64> {
    if key.len() < 8 {
        return Err(LiquidityError::codec(&hex::encode(key), "key too short for an id"));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[key.len() - 8..]);
    Ok(u64::from_be_bytes(bytes))
}

pub fn pool_key(pool_id: u64) -> Vec<u8> {
    with_id(POOL_PREFIX, pool_id)
}

pub fn pool_metadata_key(pool_id: u64) -> Vec<u8> {
    with_id(POOL_METADATA_PREFIX, pool_id)
}

pub fn pool_batch_key(pool_id: u64) -> Vec<u8> {
    with_id(POOL_BATCH_PREFIX, pool_id)
}

pub fn batch_params_key(pool_id: u64) -> Vec<u8> {
    with_id(BATCH_PARAMS_PREFIX, pool_id)
}

pub fn halted_pool_key(pool_id: u64) -> Vec<u8> {
    with_id(HALTED_POOL_PREFIX, pool_id)
}

/// Sorted denom pair, separated by a zero byte denoms never contain
pub fn pool_by_denom_pair_key(denoms: &[String; 2]) -> Vec<u8> {
    let mut key = with_str(POOL_BY_DENOM_PAIR_PREFIX, &denoms[0]);
    key.push(0);
    key.extend_from_slice(denoms[1].as_bytes());
    key
}

pub fn pool_by_reserve_acc_key(address: &Address) -> Vec<u8> {
    with_str(POOL_BY_RESERVE_ACC_PREFIX, address.as_str())
}

pub fn pool_by_pool_coin_denom_key(denom: &str) -> Vec<u8> {
    with_str(POOL_BY_POOL_COIN_DENOM_PREFIX, denom)
}

fn msg_prefix_byte(kind: MsgKind) -> u8 {
    match kind {
        MsgKind::Deposit => DEPOSIT_MSG_PREFIX,
        MsgKind::Withdraw => WITHDRAW_MSG_PREFIX,
        MsgKind::Swap => SWAP_MSG_PREFIX,
    }
}

/// Prefix of all message states of one kind in one pool
pub fn msg_prefix(kind: MsgKind, pool_id: u64) -> Vec<u8> {
    with_id(msg_prefix_byte(kind), pool_id)
}

pub fn msg_key(kind: MsgKind, pool_id: u64, msg_index: u64) -> Vec<u8> {
    let mut key = msg_prefix(kind, pool_id);
    key.extend_from_slice(&msg_index.to_be_bytes());
    key
}

/// Prefix of all balances of one account
///
/// The address is length-prefixed so no address is a prefix of another.
pub fn account_balance_prefix(address: &Address) -> LiquidityResult<Vec<u8>> {
    let bytes = address.as_str().as_bytes();
    let len = u8::try_from(bytes.len())
        .map_err(|_| LiquidityError::InvalidAddress { address: address.to_string() })?;
    let mut key = Vec::with_capacity(2 + bytes.len());
    key.push(BALANCE_PREFIX);
    key.push(len);
    key.extend_from_slice(bytes);
    Ok(key)
}

pub fn balance_key(address: &Address, denom: &str) -> LiquidityResult<Vec<u8>> {
    let mut key = account_balance_prefix(address)?;
    key.extend_from_slice(denom.as_bytes());
    Ok(key)
}

pub fn supply_key(denom: &str) -> Vec<u8> {
    with_str(SUPPLY_PREFIX, denom)
}
