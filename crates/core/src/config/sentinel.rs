//! Runtime configuration with profile support.
//!
//! Every field has a serde default so a TOML file only needs to name what it
//! overrides. Profiles are selected with `SENTINEL_PROFILE`; a file given in
//! `SENTINEL_CONFIG` takes precedence.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::{expand_env, ConfigError, Market, Network};
use crate::tiers::SeverityTiers;
use crate::u256_math::f64_to_wad;
use alloy::primitives::U256;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Profile name (for logging/identification)
    #[serde(default = "default_profile_name")]
    pub profile: String,

    /// Market monitored by default
    #[serde(default)]
    pub market: Market,

    /// Network the market lives on
    #[serde(default)]
    pub network: Network,

    /// Optional TOML token registry replacing the built-in one
    #[serde(default)]
    pub tokens_file: Option<String>,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub exchange_rate: ExchangeRateConfig,

    #[serde(default)]
    pub price_deviation: PriceDeviationConfig,

    #[serde(default)]
    pub fallback_oracle_call: FallbackOracleCallConfig,

    #[serde(default)]
    pub flash_loan: FlashLoanConfig,

    #[serde(default)]
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,
}

fn default_profile_name() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// RPC endpoint and polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// HTTP endpoint, `${VAR}` patterns are expanded from the environment
    #[serde(default = "default_http_url")]
    pub http_url: String,

    /// Block polling interval (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Fetch callTracer traces so internal calls reach the transaction agents
    #[serde(default = "default_true")]
    pub trace_calls: bool,
}

fn default_http_url() -> String {
    "${RPC_URL}".to_string()
}
fn default_poll_interval() -> u64 {
    12_000
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_url: default_http_url(),
            poll_interval_ms: default_poll_interval(),
            trace_calls: true,
        }
    }
}

impl RpcConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Exchange-rate tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRateConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Market override (defaults to the global market)
    #[serde(default)]
    pub market: Option<Market>,

    /// Numerator token symbol
    #[serde(default = "default_token1")]
    pub token1: String,

    /// Denominator token symbol
    #[serde(default = "default_token2")]
    pub token2: String,

    /// Ratio drop at which severity becomes High
    #[serde(default = "default_high_difference")]
    pub high_difference: f64,

    /// Ratio drop at which severity becomes Critical
    #[serde(default = "default_critical_difference")]
    pub critical_difference: f64,
}

fn default_token1() -> String {
    "USDC".to_string()
}
fn default_token2() -> String {
    "DAI".to_string()
}
fn default_high_difference() -> f64 {
    0.02
}
fn default_critical_difference() -> f64 {
    0.1
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            market: None,
            token1: default_token1(),
            token2: default_token2(),
            high_difference: default_high_difference(),
            critical_difference: default_critical_difference(),
        }
    }
}

impl ExchangeRateConfig {
    /// Tiers on the WAD-scaled ratio difference.
    pub fn tiers(&self) -> SeverityTiers<U256> {
        SeverityTiers::new(
            f64_to_wad(self.high_difference),
            f64_to_wad(self.critical_difference),
        )
    }
}

/// Oracle deviation checker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceDeviationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub market: Option<Market>,

    /// Minimum seconds between two scans
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Absolute deviation (price units) above which a token is reported
    #[serde(default = "default_absolute_threshold")]
    pub absolute_threshold: f64,

    /// Relative deviation (%) at which severity becomes High
    #[serde(default = "default_high_pct")]
    pub high_pct: f64,

    /// Relative deviation (%) at which severity becomes Critical
    #[serde(default = "default_critical_pct")]
    pub critical_pct: f64,
}

fn default_cooldown() -> u64 {
    1200
}
fn default_absolute_threshold() -> f64 {
    10.0
}
fn default_high_pct() -> f64 {
    20.0
}
fn default_critical_pct() -> f64 {
    30.0
}

impl Default for PriceDeviationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            market: None,
            cooldown_secs: default_cooldown(),
            absolute_threshold: default_absolute_threshold(),
            high_pct: default_high_pct(),
            critical_pct: default_critical_pct(),
        }
    }
}

impl PriceDeviationConfig {
    pub fn tiers(&self) -> SeverityTiers<f64> {
        SeverityTiers::new(self.high_pct, self.critical_pct)
    }
}

/// Fallback-oracle call detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackOracleCallConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub market: Option<Market>,
}

impl Default for FallbackOracleCallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            market: None,
        }
    }
}

/// Flash-loan size detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashLoanConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub market: Option<Market>,

    /// aToken symbol of the token used as the USD reference
    #[serde(default = "default_reference_a_token")]
    pub reference_a_token: String,

    /// Minimum notional (USD) reported
    #[serde(default = "default_min_usd")]
    pub min_usd: f64,

    /// Notional (USD) at which severity becomes High
    #[serde(default = "default_high_usd")]
    pub high_usd: f64,

    /// Notional (USD) at which severity becomes Critical
    #[serde(default = "default_critical_usd")]
    pub critical_usd: f64,
}

fn default_reference_a_token() -> String {
    "aUSDT".to_string()
}
fn default_min_usd() -> f64 {
    10_000_000.0
}
fn default_high_usd() -> f64 {
    30_000_000.0
}
fn default_critical_usd() -> f64 {
    50_000_000.0
}

impl Default for FlashLoanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            market: None,
            reference_a_token: default_reference_a_token(),
            min_usd: default_min_usd(),
            high_usd: default_high_usd(),
            critical_usd: default_critical_usd(),
        }
    }
}

impl FlashLoanConfig {
    pub fn tiers(&self) -> SeverityTiers<f64> {
        SeverityTiers::new(self.high_usd, self.critical_usd)
    }
}

/// Governance execution detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Alert delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// JSON webhook receiving alert batches, `${VAR}` patterns are expanded
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            market: Market::default(),
            network: Network::default(),
            tokens_file: None,
            rpc: RpcConfig::default(),
            exchange_rate: ExchangeRateConfig::default(),
            price_deviation: PriceDeviationConfig::default(),
            fallback_oracle_call: FallbackOracleCallConfig::default(),
            flash_loan: FlashLoanConfig::default(),
            governance: GovernanceConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

impl SentinelConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Profile for local runs: short cooldown, lower reporting floors.
    pub fn testing() -> Self {
        Self {
            profile: "testing".to_string(),
            rpc: RpcConfig {
                poll_interval_ms: 4_000,
                ..Default::default()
            },
            price_deviation: PriceDeviationConfig {
                cooldown_secs: 60,
                ..Default::default()
            },
            flash_loan: FlashLoanConfig {
                min_usd: 100_000.0,
                high_usd: 1_000_000.0,
                critical_usd: 10_000_000.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Select configuration from the environment.
    ///
    /// `SENTINEL_CONFIG` names a TOML file; otherwise `SENTINEL_PROFILE`
    /// selects a built-in profile (`default`, `testing`).
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("SENTINEL_CONFIG") {
            return Self::from_file(path);
        }

        let profile = std::env::var("SENTINEL_PROFILE").unwrap_or_else(|_| "default".to_string());
        let mut config = match profile.to_lowercase().as_str() {
            "testing" | "test" => Self::testing(),
            _ => Self::default(),
        };
        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Market used by an agent, falling back to the global one.
    pub fn market_for(&self, override_market: Option<Market>) -> Market {
        override_market.unwrap_or(self.market)
    }

    /// Expand `${VAR}` patterns in URLs.
    pub fn expand_env_vars(&mut self) {
        self.rpc.http_url = expand_env(&self.rpc.http_url);
        if let Some(url) = self.alerts.webhook_url.as_mut() {
            *url = expand_env(url);
        }
    }

    /// Check threshold ordering and token pair consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "rpc.poll_interval_ms must be positive".to_string(),
            ));
        }

        // Built-in token addresses are mainnet deployments
        if self.network != Network::Mainnet && self.tokens_file.is_none() {
            return Err(ConfigError::Invalid(format!(
                "network '{}' requires tokens_file",
                self.network
            )));
        }

        let er = &self.exchange_rate;
        if er.token1 == er.token2 {
            return Err(ConfigError::Invalid(format!(
                "exchange_rate token pair must differ (both '{}')",
                er.token1
            )));
        }
        if er.high_difference > er.critical_difference {
            return Err(ConfigError::Invalid(
                "exchange_rate.high_difference exceeds critical_difference".to_string(),
            ));
        }

        let pd = &self.price_deviation;
        if pd.high_pct > pd.critical_pct {
            return Err(ConfigError::Invalid(
                "price_deviation.high_pct exceeds critical_pct".to_string(),
            ));
        }

        let fl = &self.flash_loan;
        if !(fl.min_usd <= fl.high_usd && fl.high_usd <= fl.critical_usd) {
            return Err(ConfigError::Invalid(
                "flash_loan thresholds must satisfy min_usd <= high_usd <= critical_usd".to_string(),
            ));
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(
            profile = %self.profile,
            market = %self.market,
            network = %self.network,
            trace_calls = self.rpc.trace_calls,
            "Sentinel configuration loaded"
        );
        tracing::info!(
            enabled = self.exchange_rate.enabled,
            pair = %format!("{}/{}", self.exchange_rate.token1, self.exchange_rate.token2),
            high = self.exchange_rate.high_difference,
            critical = self.exchange_rate.critical_difference,
            "Exchange-rate tracker"
        );
        tracing::info!(
            enabled = self.price_deviation.enabled,
            cooldown_secs = self.price_deviation.cooldown_secs,
            threshold = self.price_deviation.absolute_threshold,
            high_pct = self.price_deviation.high_pct,
            critical_pct = self.price_deviation.critical_pct,
            "Oracle deviation checker"
        );
        tracing::info!(
            enabled = self.flash_loan.enabled,
            reference = %self.flash_loan.reference_a_token,
            min_usd = self.flash_loan.min_usd,
            high_usd = self.flash_loan.high_usd,
            critical_usd = self.flash_loan.critical_usd,
            "Flash-loan detector"
        );
        tracing::info!(
            fallback_oracle_call = self.fallback_oracle_call.enabled,
            governance = self.governance.enabled,
            webhook = self.alerts.webhook_url.is_some(),
            "Filters and delivery"
        );
    }
}
