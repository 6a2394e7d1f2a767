/// Mathematical utilities for the liquidity module
///
/// This crate provides overflow-checked integer arithmetic, deterministic
/// decimal helpers for rates and prices, and the batch clearing-price solver
/// used by the settlement engine.

pub mod clearing;
pub mod decimal;
pub mod safe;

// Re-export commonly used functions
pub use clearing::*;
pub use decimal::*;
pub use safe::*;
