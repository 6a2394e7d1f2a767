//! # Pool Types
//!
//! Pool identity, pool metadata snapshots and per-pool batch windows, plus
//! the deterministic derivation of reserve accounts and pool coin denoms.

use std::fmt;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::*;
use crate::{Coin, Coins, LiquidityError, LiquidityResult};

// ============================================================================
// Addresses
// ============================================================================

/// Account address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a string, rejecting empty or whitespace-containing values
    pub fn new(address: impl Into<String>) -> LiquidityResult<Self> {
        let address = address.into();
        if address.is_empty() || address.chars().any(char::is_whitespace) {
            return Err(LiquidityError::InvalidAddress { address });
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive a module-owned account address from path segments
pub fn derive_module_address(segments: &[&str]) -> LiquidityResult<Address> {
    let digest = Sha256::digest(segments.join("/").as_bytes());
    let hrp = Hrp::parse(ADDRESS_HRP).map_err(|e| LiquidityError::InvalidAddress {
        address: format!("{}: {}", ADDRESS_HRP, e),
    })?;
    let encoded = bech32::encode::<Bech32>(hrp, &digest[..ADDRESS_LEN]).map_err(|e| {
        LiquidityError::InvalidAddress { address: e.to_string() }
    })?;
    Address::new(encoded)
}

/// Account collecting pool creation fees
pub fn fee_collector_address() -> LiquidityResult<Address> {
    derive_module_address(&[FEE_COLLECTOR_NAME])
}

// ============================================================================
// Pool
// ============================================================================

/// Sort a denom pair into X/Y order
pub fn sort_denoms(a: &str, b: &str) -> [String; 2] {
    if a <= b {
        [a.to_string(), b.to_string()]
    } else {
        [b.to_string(), a.to_string()]
    }
}

/// Reserve account of a pool, reproducible from its id and sorted denoms
pub fn derive_reserve_account(pool_id: u64, denoms: &[String; 2]) -> LiquidityResult<Address> {
    derive_module_address(&[MODULE_NAME, "reserve", &pool_id.to_string(), &denoms[0], &denoms[1]])
}

/// Pool coin denom, reproducible from the pool id, sorted denoms and type
pub fn derive_pool_coin_denom(pool_id: u64, denoms: &[String; 2], type_id: u32) -> String {
    let key = format!("{}/{}/{}/{}", pool_id, denoms[0], denoms[1], type_id);
    let digest = Sha256::digest(key.as_bytes());
    format!("{}{}", POOL_COIN_DENOM_PREFIX, hex::encode_upper(digest))
}

/// Liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub type_id: u32,
    /// Sorted reserve denoms, X first
    pub reserve_coin_denoms: [String; 2],
    pub reserve_account_address: Address,
    pub pool_coin_denom: String,
}

impl Pool {
    /// Build a pool with all derived fields filled in
    pub fn new(id: u64, type_id: u32, denom_a: &str, denom_b: &str) -> LiquidityResult<Self> {
        if denom_a == denom_b {
            return Err(LiquidityError::invalid_denom("reserve denoms must differ"));
        }
        Coin::validate_denom(denom_a)?;
        Coin::validate_denom(denom_b)?;
        let reserve_coin_denoms = sort_denoms(denom_a, denom_b);
        Ok(Self {
            id,
            type_id,
            reserve_account_address: derive_reserve_account(id, &reserve_coin_denoms)?,
            pool_coin_denom: derive_pool_coin_denom(id, &reserve_coin_denoms, type_id),
            reserve_coin_denoms,
        })
    }

    /// Human readable pool name, `"{x}/{y}/{type_id}"`
    pub fn name(&self) -> String {
        format!("{}/{}/{}", self.reserve_coin_denoms[0], self.reserve_coin_denoms[1], self.type_id)
    }

    pub fn denom_x(&self) -> &str {
        &self.reserve_coin_denoms[0]
    }

    pub fn denom_y(&self) -> &str {
        &self.reserve_coin_denoms[1]
    }

    pub fn has_denom(&self, denom: &str) -> bool {
        self.reserve_coin_denoms.iter().any(|d| d == denom)
    }

    /// Check that the derived fields match the pool contents
    pub fn validate(&self) -> LiquidityResult<()> {
        let expected = Pool::new(self.id, self.type_id, &self.reserve_coin_denoms[0], &self.reserve_coin_denoms[1])?;
        if expected != *self {
            return Err(LiquidityError::inconsistent(self.id, "derived pool fields do not match"));
        }
        Ok(())
    }
}

/// Snapshot of pool reserves and pool coin supply after the latest batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub pool_id: u64,
    #[serde(with = "crate::coin::amount_serde")]
    pub pool_coin_total_supply: u128,
    pub reserve_coins: Coins,
}

impl PoolMetadata {
    pub fn reserve_of(&self, denom: &str) -> u128 {
        self.reserve_coins.amount_of(denom)
    }

    /// A pool with no supply or an empty reserve side cannot price swaps
    pub fn is_depleted(&self, pool: &Pool) -> bool {
        self.pool_coin_total_supply == 0
            || self.reserve_of(pool.denom_x()) == 0
            || self.reserve_of(pool.denom_y()) == 0
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Message kinds collected in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgKind {
    Deposit,
    Withdraw,
    Swap,
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgKind::Deposit => f.write_str("deposit"),
            MsgKind::Withdraw => f.write_str("withdraw"),
            MsgKind::Swap => f.write_str("swap"),
        }
    }
}

/// Batch window state of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBatch {
    pub pool_id: u64,
    /// Number of batches fully executed before this window
    pub index: u64,
    pub begin_height: i64,
    /// Next index to assign, never reused
    pub deposit_msg_index: u64,
    pub withdraw_msg_index: u64,
    pub swap_msg_index: u64,
    pub executed: bool,
}

impl PoolBatch {
    /// First window of a freshly created pool
    pub fn new(pool_id: u64, begin_height: i64) -> Self {
        Self {
            pool_id,
            index: 0,
            begin_height,
            deposit_msg_index: 1,
            withdraw_msg_index: 1,
            swap_msg_index: 1,
            executed: false,
        }
    }

    /// Take the next message index for a kind
    pub fn take_msg_index(&mut self, kind: MsgKind) -> LiquidityResult<u64> {
        let counter = match kind {
            MsgKind::Deposit => &mut self.deposit_msg_index,
            MsgKind::Withdraw => &mut self.withdraw_msg_index,
            MsgKind::Swap => &mut self.swap_msg_index,
        };
        let index = *counter;
        *counter = index
            .checked_add(1)
            .ok_or_else(|| LiquidityError::math_overflow("msg index"))?;
        Ok(index)
    }
}
