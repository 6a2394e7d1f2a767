/// Shared types for the batch-auction liquidity module
///
/// This crate provides the data model (pools, batches, message states),
/// coin and parameter types, constants, and the error type used across the
/// math crate, the settlement core and the simulation driver.

pub mod coin;
pub mod constants;
pub mod errors;
pub mod msgs;
pub mod params;
pub mod pool;

// Re-export all public types
pub use coin::*;
pub use constants::*;
pub use errors::*;
pub use msgs::*;
pub use params::*;
pub use pool::*;

/// Result type alias using the shared error type
pub type LiquidityResult<T> = std::result::Result<T, LiquidityError>;
