use thiserror::Error;

// ============================================================================
// Error Classes
// ============================================================================

/// How an error propagates through the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected at submission, never reaches the order ledger
    Validation,
    /// Recorded on a single message state, funds refunded, batch continues
    SettlementLocal,
    /// Aborts the settlement of one pool and halts it
    ConsistencyFatal,
    /// Storage, codec or arithmetic failure outside the other classes
    Internal,
}

// ============================================================================
// Main Error Enum
// ============================================================================

/// Error enum for the liquidity module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiquidityError {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Pool type is not registered in params
    #[error("Unsupported pool type {type_id}")]
    UnsupportedPoolType { type_id: u32 },

    /// Swap type is not supported
    #[error("Invalid swap type {swap_type_id}")]
    InvalidSwapType { swap_type_id: u32 },

    /// Coin denoms do not match what the operation expects
    #[error("Invalid coin denom: {reason}")]
    InvalidCoinDenom { reason: String },

    /// Pool coin denom does not belong to the pool
    #[error("Invalid pool coin denom: expected {expected}, got {actual}")]
    InvalidPoolCoinDenom { expected: String, actual: String },

    /// An active pool already holds the denom pair
    #[error("Pool {pool_id} already exists for reserve denom pair {denom_a}/{denom_b}")]
    DuplicateReserveDenomPair { pool_id: u64, denom_a: String, denom_b: String },

    /// Initial deposit below the configured minimum
    #[error("Insufficient deposit amount {amount}{denom}: minimum {minimum}")]
    InsufficientDepositAmount { denom: String, amount: u128, minimum: u128 },

    /// Amount below the floor accepted by the ledger
    #[error("Amount {amount}{denom} below minimum {minimum}")]
    BelowMinimum { denom: String, amount: u128, minimum: u128 },

    /// Reserve cap would be exceeded
    #[error("Reserve coin {denom} would reach {amount}, above maximum {maximum}")]
    ExceedMaxReserve { denom: String, amount: u128, maximum: u128 },

    /// Order price is zero or negative
    #[error("Invalid order price {price}")]
    InvalidOrderPrice { price: String },

    /// Offer coin fee does not match the reserved fee formula
    #[error("Bad offer coin fee: expected {expected}, got {actual}")]
    BadOfferCoinFee { expected: String, actual: String },

    /// Order is larger than the pool allows per order
    #[error("Order amount {amount} exceeds limit {limit}")]
    OrderAmountLimitExceeded { amount: u128, limit: u128 },

    /// Pool has no pool coin supply or no reserves
    #[error("Pool {pool_id} is depleted")]
    PoolDepleted { pool_id: u64 },

    /// Address is empty or malformed
    #[error("Invalid address '{address}'")]
    InvalidAddress { address: String },

    /// Invalid parameter
    #[error("Invalid parameter '{parameter}': got '{value}', expected '{expected}'")]
    InvalidParameter { parameter: String, value: String, expected: String },

    // ========================================================================
    // Lookup Errors
    // ========================================================================

    /// Pool does not exist
    #[error("Pool {pool_id} not found")]
    PoolNotFound { pool_id: u64 },

    /// Batch does not exist for the pool
    #[error("Batch for pool {pool_id} not found")]
    BatchNotFound { pool_id: u64 },

    /// Message state does not exist
    #[error("{kind} message {msg_index} not found in pool {pool_id}")]
    MsgNotFound { pool_id: u64, kind: String, msg_index: u64 },

    /// Pool settlement was halted by an earlier consistency error
    #[error("Pool {pool_id} is halted: {reason}")]
    PoolHalted { pool_id: u64, reason: String },

    // ========================================================================
    // Balance Errors
    // ========================================================================

    /// Account lacks the funds for the transfer
    #[error("Insufficient balance for {address}: need {required}{denom}, have {available}{denom}")]
    InsufficientBalance { address: String, denom: String, required: u128, available: u128 },

    /// Reserve account lacks the funds for a payout
    #[error("Insufficient reserve in pool {pool_id}: need {required}{denom}, have {available}{denom}")]
    InsufficientReserve { pool_id: u64, denom: String, required: u128, available: u128 },

    // ========================================================================
    // Math Errors
    // ========================================================================

    /// Arithmetic overflow occurred
    #[error("Math overflow in '{operation}'")]
    MathOverflow { operation: String },

    /// Arithmetic underflow occurred
    #[error("Math underflow in '{operation}'")]
    MathUnderflow { operation: String },

    /// Division by zero
    #[error("Division by zero in '{operation}'")]
    DivisionByZero { operation: String },

    // ========================================================================
    // Consistency Errors
    // ========================================================================

    /// Stored pool state disagrees with balances
    #[error("Inconsistent state in pool {pool_id}: {reason}")]
    InconsistentPoolState { pool_id: u64, reason: String },

    /// Genesis file rejected
    #[error("Invalid genesis: {reason}")]
    InvalidGenesis { reason: String },

    // ========================================================================
    // Storage Errors
    // ========================================================================

    /// Stored bytes could not be encoded or decoded
    #[error("Codec error for '{key}': {reason}")]
    Codec { key: String, reason: String },
}

impl LiquidityError {
    /// Class of the error, deciding how it propagates
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InconsistentPoolState { .. } => ErrorClass::ConsistencyFatal,
            Self::InsufficientReserve { .. } | Self::ExceedMaxReserve { .. } => {
                ErrorClass::SettlementLocal
            }
            Self::MathOverflow { .. }
            | Self::MathUnderflow { .. }
            | Self::DivisionByZero { .. }
            | Self::Codec { .. }
            | Self::InvalidGenesis { .. } => ErrorClass::Internal,
            _ => ErrorClass::Validation,
        }
    }

    /// Whether this error must stop settlement of the pool
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::ConsistencyFatal
    }

    /// Create a math overflow error
    pub fn math_overflow(operation: &str) -> Self {
        Self::MathOverflow { operation: operation.to_string() }
    }

    /// Create a math underflow error
    pub fn math_underflow(operation: &str) -> Self {
        Self::MathUnderflow { operation: operation.to_string() }
    }

    /// Create a division by zero error
    pub fn division_by_zero(operation: &str) -> Self {
        Self::DivisionByZero { operation: operation.to_string() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, value: &str, expected: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Create an invalid coin denom error
    pub fn invalid_denom(reason: &str) -> Self {
        Self::InvalidCoinDenom { reason: reason.to_string() }
    }

    /// Create an insufficient balance error
    pub fn insufficient_balance(address: &str, denom: &str, required: u128, available: u128) -> Self {
        Self::InsufficientBalance {
            address: address.to_string(),
            denom: denom.to_string(),
            required,
            available,
        }
    }

    /// Create a consistency error for a pool
    pub fn inconsistent(pool_id: u64, reason: &str) -> Self {
        Self::InconsistentPoolState { pool_id, reason: reason.to_string() }
    }

    /// Create a codec error
    pub fn codec(key: &str, reason: &str) -> Self {
        Self::Codec { key: key.to_string(), reason: reason.to_string() }
    }

    /// Create an invalid genesis error
    pub fn invalid_genesis(reason: &str) -> Self {
        Self::InvalidGenesis { reason: reason.to_string() }
    }
}

impl From<serde_json::Error> for LiquidityError {
    fn from(err: serde_json::Error) -> Self {
        LiquidityError::codec("json", &err.to_string())
    }
}
