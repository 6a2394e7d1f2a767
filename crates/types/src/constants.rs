/// Module constants used across the liquidity workspace

// ============================================================================
// Module Identity
// ============================================================================

/// Module name, used as a namespace for derived addresses
pub const MODULE_NAME: &str = "liquidity";

/// Human readable part of every bech32 address produced by the module
pub const ADDRESS_HRP: &str = "cosmos";

/// Number of hash bytes kept for a derived account address
pub const ADDRESS_LEN: usize = 20;

/// Prefix of every pool coin denom
pub const POOL_COIN_DENOM_PREFIX: &str = "pool";

/// Name of the module account receiving pool creation fees
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";

// ============================================================================
// Pool Types
// ============================================================================

/// The only supported pool type
pub const DEFAULT_POOL_TYPE_ID: u32 = 1;

/// Number of reserve coins in a pool of the default type
pub const RESERVE_COIN_NUM: u32 = 2;

// ============================================================================
// Swap Constants
// ============================================================================

/// Instant swap, the only supported swap type
pub const DEFAULT_SWAP_TYPE_ID: u32 = 1;

/// Smallest accepted offer amount for a swap order
pub const MIN_OFFER_COIN_AMOUNT: u128 = 100;

// ============================================================================
// Parameter Defaults
// ============================================================================

/// Default number of blocks per batch window
pub const DEFAULT_UNIT_BATCH_HEIGHT: u32 = 1;

/// Default minimum amount of each reserve coin for the initial deposit
pub const DEFAULT_MIN_INIT_DEPOSIT_AMOUNT: u128 = 1_000_000;

/// Default pool coin amount minted on creation or on refill of a depleted pool
pub const DEFAULT_INIT_POOL_COIN_MINT_AMOUNT: u128 = 1_000_000;

/// Default cap for each reserve coin (0 = unlimited)
pub const DEFAULT_MAX_RESERVE_COIN_AMOUNT: u128 = 0;

/// Default pool creation fee denom
pub const DEFAULT_POOL_CREATION_FEE_DENOM: &str = "stake";

/// Default pool creation fee amount
pub const DEFAULT_POOL_CREATION_FEE_AMOUNT: u128 = 40_000_000;

/// Default swap fee rate, 0.3%
pub const DEFAULT_SWAP_FEE_RATE: &str = "0.003";

/// Default withdraw fee rate, 0.3%
pub const DEFAULT_WITHDRAW_FEE_RATE: &str = "0.003";

/// Default cap of a single order against the offered reserve, 10%
pub const DEFAULT_MAX_ORDER_AMOUNT_RATIO: &str = "0.1";

/// Default order life span in blocks after submission
pub const DEFAULT_CANCEL_ORDER_LIFE_SPAN: u64 = 0;

// ============================================================================
// Query Constants
// ============================================================================

/// Page size when a request does not set one
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Largest page a single request may ask for
pub const MAX_PAGE_LIMIT: u64 = 1_000;
