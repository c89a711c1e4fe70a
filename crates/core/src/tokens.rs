//! Token registry per market.
//!
//! The intended source is a TOML file with `[[main]]` / `[[amm]]` entries,
//! set through `tokens_file`. Without one, a compiled-in list is used. That
//! list is a partial set of the Aave V2 mainnet reserves (14 main-market
//! and 5 AMM-market tokens, no LP reserves), so the deviation checker only
//! covers those tokens. Reserves such as TUSD, BUSD, sUSD, KNC, BAL or
//! xSUSHI and the AMM LP tokens need a tokens file.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::config::{ConfigError, Market};

/// A reserve token and the symbol of its aToken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub symbol: String,
    pub address: Address,
    pub a_token_symbol: String,
}

impl TokenDescriptor {
    pub fn new(symbol: &str, address: Address, a_token_symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            address,
            a_token_symbol: a_token_symbol.to_string(),
        }
    }
}

/// Token file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokensFile {
    #[serde(default, alias = "proto")]
    pub main: Vec<TokenEntry>,
    #[serde(default)]
    pub amm: Vec<TokenEntry>,
}

/// Individual token entry (TOML-loadable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    /// Token contract address (as hex string)
    pub address: String,
    #[serde(alias = "aTokenSymbol")]
    pub a_token_symbol: String,
}

impl TokenEntry {
    fn resolve(&self) -> Result<TokenDescriptor, ConfigError> {
        let address = self.address.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "invalid address '{}' for token {}: {}",
                self.address, self.symbol, e
            ))
        })?;
        Ok(TokenDescriptor {
            symbol: self.symbol.clone(),
            address,
            a_token_symbol: self.a_token_symbol.clone(),
        })
    }
}

/// Ordered token list of one market.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    market: Market,
    tokens: Vec<TokenDescriptor>,
}

impl TokenRegistry {
    pub fn new(market: Market, tokens: Vec<TokenDescriptor>) -> Self {
        Self { market, tokens }
    }

    /// Compiled-in mainnet registry. Partial, see the module docs.
    pub fn builtin(market: Market) -> Self {
        let tokens = match market {
            Market::Main => vec![
                TokenDescriptor::new("USDT", address!("dac17f958d2ee523a2206206994597c13d831ec7"), "aUSDT"),
                TokenDescriptor::new("WBTC", address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599"), "aWBTC"),
                TokenDescriptor::new("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "aWETH"),
                TokenDescriptor::new("YFI", address!("0bc529c00c6401aef6d220be8c6ea1667f6ad93e"), "aYFI"),
                TokenDescriptor::new("UNI", address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984"), "aUNI"),
                TokenDescriptor::new("AAVE", address!("7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9"), "aAAVE"),
                TokenDescriptor::new("DAI", address!("6b175474e89094c44da98b954eedeac495271d0f"), "aDAI"),
                TokenDescriptor::new("LINK", address!("514910771af9ca656af840dff83e8264ecf986ca"), "aLINK"),
                TokenDescriptor::new("MKR", address!("9f8f72aa9304c8b593d555f12ef6589cc3a579a2"), "aMKR"),
                TokenDescriptor::new("SNX", address!("c011a73ee8576fb46f5e1c5751ca3b9fe0af2a6f"), "aSNX"),
                TokenDescriptor::new("USDC", address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "aUSDC"),
                TokenDescriptor::new("CRV", address!("d533a949740bb3306d119cc777fa900ba034cd52"), "aCRV"),
                TokenDescriptor::new("BAT", address!("0d8775f648430679a709e98d2b0cb6250d2887ef"), "aBAT"),
                TokenDescriptor::new("ZRX", address!("e41d2489571d322189246dafa5ebde1f4699f498"), "aZRX"),
            ],
            Market::Amm => vec![
                TokenDescriptor::new("USDT", address!("dac17f958d2ee523a2206206994597c13d831ec7"), "aAmmUSDT"),
                TokenDescriptor::new("WBTC", address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599"), "aAmmWBTC"),
                TokenDescriptor::new("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "aAmmWETH"),
                TokenDescriptor::new("DAI", address!("6b175474e89094c44da98b954eedeac495271d0f"), "aAmmDAI"),
                TokenDescriptor::new("USDC", address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "aAmmUSDC"),
            ],
        };
        Self { market, tokens }
    }

    /// Load the registry of `market` from a TOML file.
    pub fn from_file(path: impl AsRef<Path>, market: Market) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content, market)
    }

    pub fn from_toml(content: &str, market: Market) -> Result<Self, ConfigError> {
        let file: TokensFile = toml::from_str(content)?;
        let entries = match market {
            Market::Main => &file.main,
            Market::Amm => &file.amm,
        };
        let tokens = entries
            .iter()
            .map(TokenEntry::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { market, tokens })
    }

    /// Registry from an optional file, defaulting to the built-in one.
    pub fn load(path: Option<&str>, market: Market) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path, market),
            None => {
                let registry = Self::builtin(market);
                info!(
                    %market,
                    tokens = registry.len(),
                    "No tokens_file set, using the built-in partial reserve list"
                );
                Ok(registry)
            }
        }
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenDescriptor> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    pub fn by_a_token_symbol(&self, a_token_symbol: &str) -> Option<&TokenDescriptor> {
        self.tokens.iter().find(|t| t.a_token_symbol == a_token_symbol)
    }

    /// Look up a token by symbol, failing with [`ConfigError::UnknownToken`].
    pub fn require(&self, symbol: &str) -> Result<&TokenDescriptor, ConfigError> {
        self.by_symbol(symbol).ok_or_else(|| ConfigError::UnknownToken {
            symbol: symbol.to_string(),
            market: self.market,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenDescriptor> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
