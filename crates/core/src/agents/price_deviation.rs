//! Oracle deviation checker.
//!
//! Periodically compares every token's price on the Aave price oracle with
//! the price reported by its fallback oracle.

use alloy::primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use sentinel_chain::{BlockEvent, PriceOracle};
use std::sync::Arc;
use tracing::{debug, info};

use super::BlockAgent;
use crate::alert::{Alert, AlertType};
use crate::clock::Clock;
use crate::config::{Market, PriceDeviationConfig};
use crate::tiers::SeverityTiers;
use crate::tokens::{TokenDescriptor, TokenRegistry};
use crate::u256_math::u256_to_f64;

pub const ALERT_ID: &str = "AAVE-OPD";

/// Spread between a primary and a fallback price.
///
/// `sigma` is the sum of absolute distances to the mean and `relative` is
/// `sigma` as a percentage of the mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub average: f64,
    pub sigma: f64,
    pub relative: f64,
}

impl Deviation {
    /// None when both prices are zero.
    pub fn between(primary: U256, fallback: U256) -> Option<Self> {
        let p = u256_to_f64(primary);
        let f = u256_to_f64(fallback);
        let average = (p + f) / 2.0;
        if average == 0.0 {
            return None;
        }
        let sigma = (p - average).abs() + (f - average).abs();
        Some(Self {
            average,
            sigma,
            relative: 100.0 * sigma / average,
        })
    }
}

pub struct PriceDeviationAgent {
    oracle: Arc<dyn PriceOracle>,
    market: Market,
    tokens: Vec<TokenDescriptor>,
    cooldown_secs: u64,
    absolute_threshold: f64,
    tiers: SeverityTiers<f64>,
    clock: Arc<dyn Clock>,
    /// Unix seconds of the last completed scan
    last_check: u64,
}

impl PriceDeviationAgent {
    pub fn new(
        oracle: Arc<dyn PriceOracle>,
        tokens: &TokenRegistry,
        config: &PriceDeviationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            oracle,
            market: tokens.market(),
            tokens: tokens.iter().cloned().collect(),
            cooldown_secs: config.cooldown_secs,
            absolute_threshold: config.absolute_threshold,
            tiers: config.tiers(),
            clock,
            last_check: 0,
        }
    }

    pub fn last_check(&self) -> u64 {
        self.last_check
    }

    pub fn reset(&mut self) {
        self.last_check = 0;
    }

    fn cooling_down(&self, now: u64) -> bool {
        now <= self.last_check.saturating_add(self.cooldown_secs)
    }
}

#[async_trait]
impl BlockAgent for PriceDeviationAgent {
    fn name(&self) -> &'static str {
        "price-deviation"
    }

    async fn handle_block(&mut self, block: &BlockEvent) -> Result<Vec<Alert>> {
        let now = self.clock.now();
        if self.cooling_down(now) {
            return Ok(Vec::new());
        }

        let price_oracle = self.oracle.price_oracle().await?;
        let fallback_oracle = self.oracle.fallback_oracle(price_oracle).await?;
        debug!(block = block.number, %price_oracle, %fallback_oracle, "Scanning oracle deviations");

        let mut alerts = Vec::new();
        for token in &self.tokens {
            let primary = self
                .oracle
                .asset_price(price_oracle, token.address, Some(block.number))
                .await?;
            let fallback = self
                .oracle
                .fallback_price(fallback_oracle, token.address, Some(block.number))
                .await?;

            // Fallback oracle does not quote every reserve
            if primary.is_zero() || fallback.is_zero() {
                continue;
            }

            let Some(deviation) = Deviation::between(primary, fallback) else {
                continue;
            };
            if deviation.sigma <= self.absolute_threshold {
                continue;
            }

            info!(
                token = %token.symbol,
                %primary,
                %fallback,
                relative = deviation.relative,
                "Oracle prices deviate"
            );

            alerts.push(
                Alert::new(
                    ALERT_ID,
                    "Aave Oracles Price Deviation",
                    format!(
                        "FallbackOracle price for {} deviates from PriceOracle by {}%",
                        token.symbol, deviation.relative as u64
                    ),
                    AlertType::Suspicious,
                    self.tiers.classify(deviation.relative),
                )
                .with_u256("price_oracle_price", primary)
                .with_u256("fallback_oracle_price", fallback)
                .with("relative_standard_deviation", deviation.relative)
                .with("token_symbol", token.symbol.as_str())
                .with_address("actual_price_oracle_address", price_oracle)
                .with_address("actual_fallback_oracle_address", fallback_oracle)
                .with("block_number", block.number)
                .with("market", self.market.as_str()),
            );
        }

        self.last_check = now;
        Ok(alerts)
    }
}
