use std::collections::BTreeSet;
use std::fs;
use std::str::FromStr;

use config::{Config, Environment, File, FileFormat};
use liquidity_types::{Coin, Coins, Params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};

/// Environment prefix for overrides, e.g. `LIQSIM__PARAMS__SWAP_FEE_RATE`
pub const ENV_PREFIX: &str = "LIQSIM";

/// Scenario loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Scenario name for logging
    pub name: String,

    /// Module params at genesis
    #[serde(default)]
    pub params: Params,

    /// Funded accounts at genesis
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Blocks to run, in ascending height
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
}

/// Genesis balance of one account
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    pub address: String,
    /// Coins as `"100denomA,100denomB"`
    pub coins: String,
}

/// Messages delivered in one block
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockConfig {
    pub height: i64,
    #[serde(default)]
    pub msgs: Vec<ScenarioMsg>,
}

/// One message of a block
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioMsg {
    CreatePool {
        creator: String,
        deposit: String,
    },
    Deposit {
        depositor: String,
        pool_id: u64,
        coins: String,
    },
    Withdraw {
        withdrawer: String,
        pool_id: u64,
        /// Pool coins to redeem; the denom is looked up from the pool
        pool_coin_amount: u64,
    },
    Swap {
        requester: String,
        pool_id: u64,
        offer: String,
        demand_denom: String,
        price: Decimal,
        /// Explicit offer fee; defaults to half the swap fee on the offer
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offer_fee: Option<String>,
    },
}

pub(crate) fn parse_coins(field: &str, value: &str) -> SimulationResult<Coins> {
    Coins::from_str(value).map_err(|e| SimulationError::invalid(format!("{}: '{}': {}", field, value, e)))
}

pub(crate) fn parse_coin(field: &str, value: &str) -> SimulationResult<Coin> {
    Coin::from_str(value).map_err(|e| SimulationError::invalid(format!("{}: '{}': {}", field, value, e)))
}

impl ScenarioConfig {
    /// Load a scenario file, applying `LIQSIM__*` environment overrides
    pub fn load(path: &str) -> SimulationResult<Self> {
        let config: ScenarioConfig = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::debug!("Loaded scenario '{}' from {}", config.name, path);
        Ok(config)
    }

    /// Parse a scenario from TOML text
    pub fn from_toml_str(content: &str) -> SimulationResult<Self> {
        let config: ScenarioConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save the scenario as TOML
    pub fn save(&self, path: &str) -> SimulationResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate the scenario
    pub fn validate(&self) -> SimulationResult<()> {
        if self.name.is_empty() {
            return Err(SimulationError::invalid("name must not be empty"));
        }

        self.params
            .validate()
            .map_err(|e| SimulationError::invalid(format!("params: {}", e)))?;

        let mut addresses = BTreeSet::new();
        for account in &self.accounts {
            if account.address.is_empty() {
                return Err(SimulationError::invalid("account address must not be empty"));
            }
            if !addresses.insert(account.address.as_str()) {
                return Err(SimulationError::invalid(format!("duplicate account {}", account.address)));
            }
            parse_coins("accounts.coins", &account.coins)?;
        }

        let mut last_height = 0;
        for block in &self.blocks {
            if block.height <= last_height {
                return Err(SimulationError::invalid(format!(
                    "block heights must be positive and increasing, found {} after {}",
                    block.height, last_height
                )));
            }
            last_height = block.height;
            for msg in &block.msgs {
                msg.validate()?;
            }
        }

        Ok(())
    }

    /// Two traders swapping against one pool over a few blocks
    pub fn example() -> Self {
        let swap = |requester: &str, offer: &str, demand: &str, price: Decimal| ScenarioMsg::Swap {
            requester: requester.to_string(),
            pool_id: 1,
            offer: offer.to_string(),
            demand_denom: demand.to_string(),
            price,
            offer_fee: None,
        };

        Self {
            name: "basic".to_string(),
            params: Params::default(),
            accounts: vec![
                AccountConfig {
                    address: "creator".to_string(),
                    coins: "10000000denomA,10000000denomB,100000000stake".to_string(),
                },
                AccountConfig {
                    address: "alice".to_string(),
                    coins: "5000000denomA,5000000denomB".to_string(),
                },
                AccountConfig {
                    address: "bob".to_string(),
                    coins: "5000000denomA,5000000denomB".to_string(),
                },
            ],
            blocks: vec![
                BlockConfig {
                    height: 1,
                    msgs: vec![ScenarioMsg::CreatePool {
                        creator: "creator".to_string(),
                        deposit: "1000000denomA,1000000denomB".to_string(),
                    }],
                },
                BlockConfig {
                    height: 2,
                    msgs: vec![
                        swap("alice", "100000denomA", "denomB", Decimal::ONE),
                        swap("bob", "100000denomB", "denomA", Decimal::ONE),
                        ScenarioMsg::Deposit {
                            depositor: "alice".to_string(),
                            pool_id: 1,
                            coins: "50000denomA,50000denomB".to_string(),
                        },
                    ],
                },
                BlockConfig {
                    height: 3,
                    msgs: vec![ScenarioMsg::Withdraw {
                        withdrawer: "alice".to_string(),
                        pool_id: 1,
                        pool_coin_amount: 10_000,
                    }],
                },
                BlockConfig { height: 4, msgs: vec![] },
            ],
        }
    }
}

impl ScenarioMsg {
    /// Check that the coin strings parse
    fn validate(&self) -> SimulationResult<()> {
        match self {
            ScenarioMsg::CreatePool { deposit, .. } => {
                parse_coins("create_pool.deposit", deposit)?;
            }
            ScenarioMsg::Deposit { coins, .. } => {
                parse_coins("deposit.coins", coins)?;
            }
            ScenarioMsg::Withdraw { pool_coin_amount, .. } => {
                if *pool_coin_amount == 0 {
                    return Err(SimulationError::invalid("withdraw.pool_coin_amount must be positive"));
                }
            }
            ScenarioMsg::Swap { offer, offer_fee, .. } => {
                parse_coin("swap.offer", offer)?;
                if let Some(fee) = offer_fee {
                    parse_coin("swap.offer_fee", fee)?;
                }
            }
        }
        Ok(())
    }
}

/// Write the example scenario to `path`
pub fn create_example_config(path: &str) -> SimulationResult<()> {
    ScenarioConfig::example().save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_is_valid() {
        assert!(ScenarioConfig::example().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let example = ScenarioConfig::example();
        let content = toml::to_string_pretty(&example).unwrap();
        let parsed = ScenarioConfig::from_toml_str(&content).unwrap();

        assert_eq!(parsed.name, example.name);
        assert_eq!(parsed.params, example.params);
        assert_eq!(parsed.blocks.len(), example.blocks.len());
        assert_eq!(parsed.blocks[1].msgs, example.blocks[1].msgs);
    }

    #[test]
    fn test_validation() {
        let mut config = ScenarioConfig::example();
        config.blocks[1].height = 1;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::example();
        config.accounts.push(config.accounts[0].clone());
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::example();
        config.accounts[0].coins = "lots of coins".to_string();
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::example();
        config.params.unit_batch_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bundled_scenario_matches_example() {
        let bundled = ScenarioConfig::from_toml_str(include_str!("../scenarios/basic.toml")).unwrap();
        let example = ScenarioConfig::example();
        assert_eq!(bundled.params, example.params);
        assert_eq!(bundled.blocks.len(), example.blocks.len());
        for (a, b) in bundled.blocks.iter().zip(&example.blocks) {
            assert_eq!(a.height, b.height);
            assert_eq!(a.msgs, b.msgs);
        }
    }

    #[test]
    fn test_minimal_scenario_uses_default_params() {
        let content = r#"
            name = "minimal"

            [[accounts]]
            address = "alice"
            coins = "1000denomA"
        "#;
        let config = ScenarioConfig::from_toml_str(content).unwrap();
        assert_eq!(config.params, Params::default());
        assert!(config.blocks.is_empty());
    }
}
