//! # Liquidity Core - Batch Settlement Engine
//!
//! Collects deposit, withdraw and swap messages into per-pool batches and
//! settles each batch at the end of its window. It provides:
//!
//! - A key-value store abstraction with a committing cache layer
//! - Pool registry, order ledger and batch controller over that store
//! - The settlement engine with its consistency checks
//! - Paginated queries and genesis import/export
//!
//! [`LiquidityKeeper`] is the entry point the host chain drives.

pub mod bank;
pub mod batch;
pub mod events;
pub mod genesis;
pub mod keeper;
pub mod ledger;
pub mod pagination;
pub mod query;
pub mod registry;
pub mod settlement;
pub mod store;

// Re-export commonly used items
pub use events::{Event, EventKind};
pub use genesis::{Balance, GenesisState, PoolRecord};
pub use keeper::{EndBlockReport, FailedBatch, HaltedPool, LiquidityKeeper};
pub use pagination::{PageRequest, PageResponse};
pub use query::{PagedResponse, Querier};
pub use settlement::{BatchReport, SwapSummary};
pub use store::{CacheStore, KvStore, MemStore};
