//! Market and network selection.
//!
//! Aave V2 runs several markets per network, each rooted at its own
//! `LendingPoolAddressesProvider`. Governance is shared per network.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// Aave V2 market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Main (proto) market
    #[default]
    #[serde(alias = "MAIN", alias = "proto")]
    Main,
    /// AMM market (Uniswap/Balancer LP collateral)
    #[serde(alias = "AMM")]
    Amm,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Amm => "AMM",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "main" | "proto" => Ok(Self::Main),
            "amm" => Ok(Self::Amm),
            _ => Err(ConfigError::Invalid(format!("unknown market '{s}'"))),
        }
    }
}

/// Network the market is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    #[serde(alias = "MAINNET")]
    Mainnet,
    #[serde(alias = "KOVAN")]
    Kovan,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET",
            Self::Kovan => "KOVAN",
        }
    }

    /// Chain ID of the network.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Kovan => 42,
        }
    }

    /// Aave Governance V2 contract.
    pub fn governance_v2(&self) -> Address {
        match self {
            Self::Mainnet => address!("ec568fffba86c094cf06b22134b23074dfe2252c"),
            Self::Kovan => address!("c2ebab3bac8f2f5028f5c7317027a41ebfca31d2"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "kovan" => Ok(Self::Kovan),
            _ => Err(ConfigError::Invalid(format!("unknown network '{s}'"))),
        }
    }
}

/// `LendingPoolAddressesProvider` of a market on a network.
pub fn addresses_provider(market: Market, network: Network) -> Address {
    match (market, network) {
        (Market::Main, Network::Mainnet) => address!("b53c1a33016b2dc2ff3653530bff1848a515c8c5"),
        (Market::Amm, Network::Mainnet) => address!("acc030ef66f9dfeae9cbb0cd1b25654b82cfa8d5"),
        (Market::Main, Network::Kovan) => address!("88757f2f99175387ab4c6a4b3067c77a695b0349"),
        (Market::Amm, Network::Kovan) => address!("67fb118a780fd740c8936511947cc4be7bb7730c"),
    }
}
