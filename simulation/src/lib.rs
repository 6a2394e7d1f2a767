//! Scenario driver for the liquidity module
//!
//! Loads a TOML scenario, replays its blocks through an in-memory keeper and
//! reports what settled.

pub mod config;
pub mod error;
pub mod runner;

pub use config::{create_example_config, AccountConfig, BlockConfig, ScenarioConfig, ScenarioMsg};
pub use error::{SimulationError, SimulationResult};
pub use runner::{RunSummary, ScenarioRunner};
