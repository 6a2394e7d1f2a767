//! # Messages and Message States
//!
//! Client messages accepted by the module and the per-batch state records
//! the order ledger keeps for them.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{Address, Coin, Coins, LiquidityError, LiquidityResult, MsgKind, Pool};

// ============================================================================
// Messages
// ============================================================================

/// Create a pool with an initial deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreatePool {
    pub pool_creator_address: Address,
    pub pool_type_id: u32,
    pub deposit_coins: Coins,
}

impl MsgCreatePool {
    pub fn validate_basic(&self) -> LiquidityResult<()> {
        if self.deposit_coins.len() != RESERVE_COIN_NUM as usize {
            return Err(LiquidityError::invalid_denom(&format!(
                "expected {} distinct deposit coins, got '{}'",
                RESERVE_COIN_NUM, self.deposit_coins
            )));
        }
        Ok(())
    }
}

/// Deposit reserve coins into a pool at the next batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDepositWithinBatch {
    pub depositor_address: Address,
    pub pool_id: u64,
    pub deposit_coins: Coins,
}

impl MsgDepositWithinBatch {
    pub fn validate_basic(&self) -> LiquidityResult<()> {
        if self.deposit_coins.len() != RESERVE_COIN_NUM as usize {
            return Err(LiquidityError::invalid_denom(&format!(
                "expected {} non-zero deposit coins, got '{}'",
                RESERVE_COIN_NUM, self.deposit_coins
            )));
        }
        Ok(())
    }
}

/// Redeem pool coins for reserve coins at the next batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawWithinBatch {
    pub withdrawer_address: Address,
    pub pool_id: u64,
    pub pool_coin: Coin,
}

impl MsgWithdrawWithinBatch {
    pub fn validate_basic(&self) -> LiquidityResult<()> {
        Coin::validate_denom(&self.pool_coin.denom)?;
        if self.pool_coin.is_zero() {
            return Err(LiquidityError::BelowMinimum {
                denom: self.pool_coin.denom.clone(),
                amount: 0,
                minimum: 1,
            });
        }
        Ok(())
    }
}

/// Swap order executed at the batch clearing price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSwapWithinBatch {
    pub swap_requester_address: Address,
    pub pool_id: u64,
    pub swap_type_id: u32,
    pub offer_coin: Coin,
    pub demand_coin_denom: String,
    pub offer_coin_fee: Coin,
    /// Limit price, in X per Y of the pool
    pub order_price: Decimal,
}

impl MsgSwapWithinBatch {
    pub fn validate_basic(&self) -> LiquidityResult<()> {
        if self.swap_type_id != DEFAULT_SWAP_TYPE_ID {
            return Err(LiquidityError::InvalidSwapType { swap_type_id: self.swap_type_id });
        }
        Coin::validate_denom(&self.offer_coin.denom)?;
        Coin::validate_denom(&self.demand_coin_denom)?;
        if self.offer_coin.denom == self.demand_coin_denom {
            return Err(LiquidityError::invalid_denom("offer and demand denoms must differ"));
        }
        if self.offer_coin_fee.denom != self.offer_coin.denom {
            return Err(LiquidityError::invalid_denom("offer coin fee must be in the offer denom"));
        }
        if self.offer_coin.amount < MIN_OFFER_COIN_AMOUNT {
            return Err(LiquidityError::BelowMinimum {
                denom: self.offer_coin.denom.clone(),
                amount: self.offer_coin.amount,
                minimum: MIN_OFFER_COIN_AMOUNT,
            });
        }
        if self.order_price <= Decimal::ZERO {
            return Err(LiquidityError::InvalidOrderPrice { price: self.order_price.to_string() });
        }
        Ok(())
    }
}

/// Direction of a swap relative to the pool's sorted X/Y denoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Offer X, demand Y
    XtoY,
    /// Offer Y, demand X
    YtoX,
}

impl SwapDirection {
    /// Direction of an order offering `offer_denom` for `demand_denom`
    pub fn of(pool: &Pool, offer_denom: &str, demand_denom: &str) -> LiquidityResult<Self> {
        if offer_denom == pool.denom_x() && demand_denom == pool.denom_y() {
            Ok(SwapDirection::XtoY)
        } else if offer_denom == pool.denom_y() && demand_denom == pool.denom_x() {
            Ok(SwapDirection::YtoX)
        } else {
            Err(LiquidityError::invalid_denom(&format!(
                "{} -> {} does not match pool {}",
                offer_denom,
                demand_denom,
                pool.name()
            )))
        }
    }
}

// ============================================================================
// Message States
// ============================================================================

/// Common view over the three message state records
pub trait BatchMsgState: Clone + Serialize + DeserializeOwned {
    const KIND: MsgKind;

    fn pool_id(&self) -> u64;
    fn msg_index(&self) -> u64;
    fn msg_height(&self) -> i64;
    fn executed(&self) -> bool;
    fn succeeded(&self) -> bool;
    fn to_be_deleted(&self) -> bool;

    /// Not executed implies neither succeeded nor marked for deletion
    fn validate_status(&self) -> LiquidityResult<()> {
        if !self.executed() && (self.succeeded() || self.to_be_deleted()) {
            return Err(LiquidityError::inconsistent(
                self.pool_id(),
                &format!("{} message {} has an outcome without being executed", Self::KIND, self.msg_index()),
            ));
        }
        Ok(())
    }
}

macro_rules! impl_batch_msg_state {
    ($state:ty, $kind:expr) => {
        impl BatchMsgState for $state {
            const KIND: MsgKind = $kind;

            fn pool_id(&self) -> u64 {
                self.msg.pool_id
            }
            fn msg_index(&self) -> u64 {
                self.msg_index
            }
            fn msg_height(&self) -> i64 {
                self.msg_height
            }
            fn executed(&self) -> bool {
                self.executed
            }
            fn succeeded(&self) -> bool {
                self.succeeded
            }
            fn to_be_deleted(&self) -> bool {
                self.to_be_deleted
            }
        }

        impl $state {
            /// Record the final outcome of the message
            pub fn finish(&mut self, succeeded: bool) {
                self.executed = true;
                self.succeeded = succeeded;
                self.to_be_deleted = true;
            }
        }
    };
}

/// Deposit waiting for, or settled by, a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMsgState {
    pub msg_height: i64,
    pub msg_index: u64,
    pub executed: bool,
    pub succeeded: bool,
    pub to_be_deleted: bool,
    pub msg: MsgDepositWithinBatch,
}

/// Withdrawal waiting for, or settled by, a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawMsgState {
    pub msg_height: i64,
    pub msg_index: u64,
    pub executed: bool,
    pub succeeded: bool,
    pub to_be_deleted: bool,
    pub msg: MsgWithdrawWithinBatch,
}

/// Swap order waiting for, partially filled by, or settled by a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapMsgState {
    pub msg_height: i64,
    pub msg_index: u64,
    pub executed: bool,
    pub succeeded: bool,
    pub to_be_deleted: bool,
    /// Orders with a remainder at this height are cancelled and refunded
    pub order_expiry_height: i64,
    pub exchanged_offer_coin: Coin,
    pub remaining_offer_coin: Coin,
    pub reserved_offer_coin_fee: Coin,
    pub msg: MsgSwapWithinBatch,
}

impl_batch_msg_state!(DepositMsgState, MsgKind::Deposit);
impl_batch_msg_state!(WithdrawMsgState, MsgKind::Withdraw);
impl_batch_msg_state!(SwapMsgState, MsgKind::Swap);

impl SwapMsgState {
    /// Fresh state for an accepted order
    pub fn new(msg: MsgSwapWithinBatch, msg_height: i64, msg_index: u64, order_expiry_height: i64) -> Self {
        Self {
            msg_height,
            msg_index,
            executed: false,
            succeeded: false,
            to_be_deleted: false,
            order_expiry_height,
            exchanged_offer_coin: Coin::zero(msg.offer_coin.denom.clone()),
            remaining_offer_coin: msg.offer_coin.clone(),
            reserved_offer_coin_fee: msg.offer_coin_fee.clone(),
            msg,
        }
    }

    /// Order still takes part in matching
    pub fn is_live(&self) -> bool {
        !self.to_be_deleted && self.remaining_offer_coin.amount > 0
    }

    /// `exchanged + remaining == offer`
    pub fn check_conservation(&self) -> LiquidityResult<()> {
        let total = self
            .exchanged_offer_coin
            .amount
            .checked_add(self.remaining_offer_coin.amount)
            .ok_or_else(|| LiquidityError::math_overflow("swap conservation"))?;
        if total != self.msg.offer_coin.amount {
            return Err(LiquidityError::inconsistent(
                self.msg.pool_id,
                &format!(
                    "swap message {}: exchanged {} + remaining {} != offer {}",
                    self.msg_index, self.exchanged_offer_coin, self.remaining_offer_coin, self.msg.offer_coin
                ),
            ));
        }
        Ok(())
    }
}

impl DepositMsgState {
    pub fn new(msg: MsgDepositWithinBatch, msg_height: i64, msg_index: u64) -> Self {
        Self { msg_height, msg_index, executed: false, succeeded: false, to_be_deleted: false, msg }
    }
}

impl WithdrawMsgState {
    pub fn new(msg: MsgWithdrawWithinBatch, msg_height: i64, msg_index: u64) -> Self {
        Self { msg_height, msg_index, executed: false, succeeded: false, to_be_deleted: false, msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn swap_msg(offer: u128, fee: u128) -> MsgSwapWithinBatch {
        MsgSwapWithinBatch {
            swap_requester_address: Address::new("cosmos1trader").unwrap(),
            pool_id: 1,
            swap_type_id: DEFAULT_SWAP_TYPE_ID,
            offer_coin: Coin::new("denomA", offer),
            demand_coin_denom: "denomB".to_string(),
            offer_coin_fee: Coin::new("denomA", fee),
            order_price: dec!(1.0),
        }
    }

    #[test]
    fn test_swap_validate_basic() {
        assert!(swap_msg(1_000, 1).validate_basic().is_ok());

        let mut msg = swap_msg(1_000, 1);
        msg.swap_type_id = 2;
        assert!(matches!(msg.validate_basic(), Err(LiquidityError::InvalidSwapType { .. })));

        let msg = swap_msg(99, 0);
        assert!(matches!(msg.validate_basic(), Err(LiquidityError::BelowMinimum { .. })));

        let mut msg = swap_msg(1_000, 1);
        msg.order_price = Decimal::ZERO;
        assert!(matches!(msg.validate_basic(), Err(LiquidityError::InvalidOrderPrice { .. })));

        let mut msg = swap_msg(1_000, 1);
        msg.demand_coin_denom = "denomA".to_string();
        assert!(msg.validate_basic().is_err());
    }

    #[test]
    fn test_swap_direction() {
        let pool = Pool::new(1, 1, "denomA", "denomB").unwrap();
        assert_eq!(SwapDirection::of(&pool, "denomA", "denomB").unwrap(), SwapDirection::XtoY);
        assert_eq!(SwapDirection::of(&pool, "denomB", "denomA").unwrap(), SwapDirection::YtoX);
        assert!(SwapDirection::of(&pool, "denomA", "denomC").is_err());
    }

    #[test]
    fn test_swap_state_status_and_conservation() {
        let mut state = SwapMsgState::new(swap_msg(1_000, 1), 5, 1, 5);
        assert!(state.validate_status().is_ok());
        assert!(state.check_conservation().is_ok());
        assert!(state.is_live());

        state.succeeded = true;
        assert!(state.validate_status().is_err());

        state.finish(true);
        assert!(state.validate_status().is_ok());
        assert!(!state.is_live());

        state.exchanged_offer_coin.amount = 10;
        assert!(state.check_conservation().is_err());
    }
}
