//! Error types for the scenario driver

use liquidity_types::LiquidityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Module error: {0}")]
    Module(#[from] LiquidityError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulationError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidScenario(reason.into())
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(err: serde_json::Error) -> Self {
        SimulationError::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for SimulationError {
    fn from(err: toml::ser::Error) -> Self {
        SimulationError::SerializationError(err.to_string())
    }
}

pub type SimulationResult<T> = std::result::Result<T, SimulationError>;
