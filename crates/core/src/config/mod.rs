//! Configuration system for the Aave monitoring agents.
//!
//! This module provides:
//! - Runtime configuration (profiles, thresholds, timing)
//! - Market and network selection with their contract roots

mod market;
mod sentinel;

pub use market::{addresses_provider, Market, Network};
pub use sentinel::{
    AlertsConfig, ExchangeRateConfig, FallbackOracleCallConfig, FlashLoanConfig,
    GovernanceConfig, PriceDeviationConfig, RpcConfig, SentinelConfig,
};

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unknown token '{symbol}' in {market} market")]
    UnknownToken { symbol: String, market: Market },
}

/// Expand ${VAR_NAME} patterns with environment variable values.
///
/// Unset variables are left in place.
pub(crate) fn expand_env(s: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return s.to_string();
    };

    let mut result = s.to_string();
    for cap in re.captures_iter(s) {
        if let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) {
            if let Ok(value) = std::env::var(var_match.as_str()) {
                result = result.replace(full_match.as_str(), &value);
            }
        }
    }

    result
}
