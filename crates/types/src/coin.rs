//! # Coins
//!
//! Denominated amounts. Amounts are `u128` with checked arithmetic and
//! serialise as decimal strings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LiquidityError, LiquidityResult};

/// A single denominated amount
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_serde")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self { denom: denom.into(), amount }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Check the denom is a plausible bank denom
    pub fn validate_denom(denom: &str) -> LiquidityResult<()> {
        let valid = (2..=128).contains(&denom.len())
            && denom.chars().next().map_or(false, |c| c.is_ascii_alphabetic())
            && denom
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
        if !valid {
            return Err(LiquidityError::invalid_denom(&format!("malformed denom '{}'", denom)));
        }
        Ok(())
    }

    pub fn checked_add(&self, amount: u128) -> LiquidityResult<Coin> {
        let amount = self
            .amount
            .checked_add(amount)
            .ok_or_else(|| LiquidityError::math_overflow("coin add"))?;
        Ok(Coin::new(self.denom.clone(), amount))
    }

    pub fn checked_sub(&self, amount: u128) -> LiquidityResult<Coin> {
        let amount = self
            .amount
            .checked_sub(amount)
            .ok_or_else(|| LiquidityError::math_underflow("coin sub"))?;
        Ok(Coin::new(self.denom.clone(), amount))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = LiquidityError;

    /// Parse `"100uatom"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(LiquidityError::invalid_denom(&format!("missing amount in '{}'", s)));
        }
        let amount = amount
            .parse::<u128>()
            .map_err(|_| LiquidityError::math_overflow("coin parse"))?;
        Coin::validate_denom(denom)?;
        Ok(Coin::new(denom, amount))
    }
}

/// Sorted set of coins with unique denoms and no zero amounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(BTreeMap<String, u128>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, rejecting duplicates; zero amounts are dropped
    pub fn from_vec(coins: Vec<Coin>) -> LiquidityResult<Self> {
        let mut map = BTreeMap::new();
        for coin in coins {
            Coin::validate_denom(&coin.denom)?;
            if map.contains_key(&coin.denom) {
                return Err(LiquidityError::invalid_denom(&format!("duplicate denom '{}'", coin.denom)));
            }
            if coin.amount > 0 {
                map.insert(coin.denom, coin.amount);
            }
        }
        Ok(Self(map))
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn denoms(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0.iter().map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    pub fn to_vec(&self) -> Vec<Coin> {
        self.iter().collect()
    }

    pub fn add_coin(&mut self, coin: &Coin) -> LiquidityResult<()> {
        if coin.amount == 0 {
            return Ok(());
        }
        let entry = self.0.entry(coin.denom.clone()).or_insert(0);
        *entry = entry
            .checked_add(coin.amount)
            .ok_or_else(|| LiquidityError::math_overflow("coins add"))?;
        Ok(())
    }

    pub fn sub_coin(&mut self, coin: &Coin) -> LiquidityResult<()> {
        if coin.amount == 0 {
            return Ok(());
        }
        let current = self.amount_of(&coin.denom);
        let remaining = current
            .checked_sub(coin.amount)
            .ok_or_else(|| LiquidityError::math_underflow("coins sub"))?;
        if remaining == 0 {
            self.0.remove(&coin.denom);
        } else {
            self.0.insert(coin.denom.clone(), remaining);
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Coins) -> LiquidityResult<Coins> {
        let mut sum = self.clone();
        for coin in other.iter() {
            sum.add_coin(&coin)?;
        }
        Ok(sum)
    }

    pub fn checked_sub(&self, other: &Coins) -> LiquidityResult<Coins> {
        let mut diff = self.clone();
        for coin in other.iter() {
            diff.sub_coin(&coin)?;
        }
        Ok(diff)
    }

    /// True when every coin of `other` is covered by `self`
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.iter().all(|coin| self.amount_of(&coin.denom) >= coin.amount)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = LiquidityError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Coins::from_vec(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.to_vec()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = LiquidityError;

    /// Parse `"100denomA,100denomB"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Coins::new());
        }
        let coins = s
            .split(',')
            .map(Coin::from_str)
            .collect::<LiquidityResult<Vec<_>>>()?;
        Coins::from_vec(coins)
    }
}

/// Serialize a `u128` amount as a decimal string
pub mod amount_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_parse_and_display() {
        let coin: Coin = "1500uatom".parse().unwrap();
        assert_eq!(coin, Coin::new("uatom", 1500));
        assert_eq!(coin.to_string(), "1500uatom");

        assert!("uatom".parse::<Coin>().is_err());
        assert!("10".parse::<Coin>().is_err());
    }

    #[test]
    fn test_coins_sorted_and_merged() {
        let mut coins: Coins = "100denomB,50denomA".parse().unwrap();
        assert_eq!(coins.to_string(), "50denomA,100denomB");

        coins.add_coin(&Coin::new("denomA", 25)).unwrap();
        assert_eq!(coins.amount_of("denomA"), 75);

        coins.sub_coin(&Coin::new("denomB", 100)).unwrap();
        assert_eq!(coins.len(), 1);
        assert!(coins.sub_coin(&Coin::new("denomA", 76)).is_err());
    }

    #[test]
    fn test_coins_reject_duplicates() {
        assert!("1denomA,2denomA".parse::<Coins>().is_err());
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let coin = Coin::new("uatom", 340282366920938463463374607431768211455);
        let json = serde_json::to_string(&coin).unwrap();
        assert_eq!(json, r#"{"denom":"uatom","amount":"340282366920938463463374607431768211455"}"#);
        let back: Coin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coin);
    }
}
