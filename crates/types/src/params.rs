//! # Module Parameters
//!
//! Module-wide configuration. Parameters are fixed for the lifetime of a
//! batch window; a change only reaches windows opened after it is applied.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{Coin, Coins, LiquidityError, LiquidityResult};

/// Registered pool type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolType {
    pub id: u32,
    pub name: String,
    pub min_reserve_coin_num: u32,
    pub max_reserve_coin_num: u32,
    pub description: String,
}

impl PoolType {
    /// The standard two-coin constant product pool
    pub fn standard() -> Self {
        Self {
            id: DEFAULT_POOL_TYPE_ID,
            name: "StandardLiquidityPool".to_string(),
            min_reserve_coin_num: RESERVE_COIN_NUM,
            max_reserve_coin_num: RESERVE_COIN_NUM,
            description: "Standard liquidity pool with pool price function X/Y, ESPM, constant product amm"
                .to_string(),
        }
    }
}

/// Module parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Registered pool types
    pub pool_types: Vec<PoolType>,

    /// Minimum amount of each reserve coin for an initial deposit
    #[serde(with = "crate::coin::amount_serde")]
    pub min_init_deposit_amount: u128,

    /// Pool coins minted on creation or when refilling a depleted pool
    #[serde(with = "crate::coin::amount_serde")]
    pub init_pool_coin_mint_amount: u128,

    /// Cap on each reserve coin, 0 means unlimited
    #[serde(with = "crate::coin::amount_serde")]
    pub max_reserve_coin_amount: u128,

    /// Fee charged to the pool creator, never refunded
    pub pool_creation_fee: Coins,

    /// Swap fee rate, split half on the offer coin and half on the demand coin
    pub swap_fee_rate: Decimal,

    /// Fee rate kept by the pool on withdrawals
    pub withdraw_fee_rate: Decimal,

    /// Largest order allowed as a fraction of the offered reserve coin
    pub max_order_amount_ratio: Decimal,

    /// Number of blocks in a batch window
    pub unit_batch_height: u32,

    /// Blocks an order stays live after submission
    #[serde(default)]
    pub cancel_order_life_span: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            pool_types: vec![PoolType::standard()],
            min_init_deposit_amount: DEFAULT_MIN_INIT_DEPOSIT_AMOUNT,
            init_pool_coin_mint_amount: DEFAULT_INIT_POOL_COIN_MINT_AMOUNT,
            max_reserve_coin_amount: DEFAULT_MAX_RESERVE_COIN_AMOUNT,
            pool_creation_fee: Coins::from_vec(vec![Coin::new(
                DEFAULT_POOL_CREATION_FEE_DENOM,
                DEFAULT_POOL_CREATION_FEE_AMOUNT,
            )])
            .unwrap_or_default(),
            swap_fee_rate: decimal_const(DEFAULT_SWAP_FEE_RATE),
            withdraw_fee_rate: decimal_const(DEFAULT_WITHDRAW_FEE_RATE),
            max_order_amount_ratio: decimal_const(DEFAULT_MAX_ORDER_AMOUNT_RATIO),
            unit_batch_height: DEFAULT_UNIT_BATCH_HEIGHT,
            cancel_order_life_span: DEFAULT_CANCEL_ORDER_LIFE_SPAN,
        }
    }
}

fn decimal_const(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or(Decimal::ZERO)
}

impl Params {
    /// Validate parameters
    pub fn validate(&self) -> LiquidityResult<()> {
        if self.pool_types.is_empty() {
            return Err(LiquidityError::invalid_parameter("pool_types", "empty", "at least one pool type"));
        }

        for (i, pool_type) in self.pool_types.iter().enumerate() {
            if pool_type.id != (i as u32) + 1 {
                return Err(LiquidityError::invalid_parameter(
                    "pool_types.id",
                    &pool_type.id.to_string(),
                    &format!("{} (ids are sequential from 1)", i + 1),
                ));
            }
            if pool_type.name.is_empty() {
                return Err(LiquidityError::invalid_parameter("pool_types.name", "empty", "non-empty string"));
            }
            if pool_type.min_reserve_coin_num != RESERVE_COIN_NUM
                || pool_type.max_reserve_coin_num != RESERVE_COIN_NUM
            {
                return Err(LiquidityError::invalid_parameter(
                    "pool_types.reserve_coin_num",
                    &format!("{}..{}", pool_type.min_reserve_coin_num, pool_type.max_reserve_coin_num),
                    &format!("exactly {}", RESERVE_COIN_NUM),
                ));
            }
        }

        if self.min_init_deposit_amount == 0 {
            return Err(LiquidityError::invalid_parameter("min_init_deposit_amount", "0", "greater than 0"));
        }

        if self.init_pool_coin_mint_amount == 0 {
            return Err(LiquidityError::invalid_parameter("init_pool_coin_mint_amount", "0", "greater than 0"));
        }

        if self.max_reserve_coin_amount != 0 && self.max_reserve_coin_amount < self.min_init_deposit_amount {
            return Err(LiquidityError::invalid_parameter(
                "max_reserve_coin_amount",
                &self.max_reserve_coin_amount.to_string(),
                "0 or at least min_init_deposit_amount",
            ));
        }

        validate_rate("swap_fee_rate", self.swap_fee_rate, false)?;
        validate_rate("withdraw_fee_rate", self.withdraw_fee_rate, false)?;
        validate_rate("max_order_amount_ratio", self.max_order_amount_ratio, true)?;

        if self.unit_batch_height == 0 {
            return Err(LiquidityError::invalid_parameter("unit_batch_height", "0", "greater than 0"));
        }

        Ok(())
    }

    /// Look up a registered pool type
    pub fn pool_type(&self, type_id: u32) -> LiquidityResult<&PoolType> {
        self.pool_types
            .iter()
            .find(|t| t.id == type_id)
            .ok_or(LiquidityError::UnsupportedPoolType { type_id })
    }

    /// Half of the swap fee rate, charged on each side of a swap
    pub fn half_swap_fee_rate(&self) -> Decimal {
        self.swap_fee_rate / Decimal::TWO
    }
}

fn validate_rate(name: &str, rate: Decimal, must_be_positive: bool) -> LiquidityResult<()> {
    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(LiquidityError::invalid_parameter(name, &rate.to_string(), "within [0, 1]"));
    }
    if must_be_positive && rate.is_zero() {
        return Err(LiquidityError::invalid_parameter(name, "0", "greater than 0"));
    }
    Ok(())
}
