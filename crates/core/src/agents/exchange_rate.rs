//! Exchange-rate tracker.
//!
//! Watches the oracle ratio of a token pair and alerts when it falls below
//! the previously observed value.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use sentinel_chain::{BlockEvent, ChainError, PriceOracle};
use std::sync::Arc;
use tracing::{debug, info};

use super::BlockAgent;
use crate::alert::{Alert, AlertType};
use crate::config::{ExchangeRateConfig, Market};
use crate::tiers::SeverityTiers;
use crate::tokens::{TokenDescriptor, TokenRegistry};
use crate::u256_math::{wad_div, wad_to_f64};

pub const ALERT_ID: &str = "AAVE-EXR";

pub struct ExchangeRateAgent {
    oracle: Arc<dyn PriceOracle>,
    /// Price oracle resolved at startup
    price_oracle: Address,
    market: Market,
    token1: TokenDescriptor,
    token2: TokenDescriptor,
    tiers: SeverityTiers<U256>,
    /// Observed WAD ratios, seeded with 0
    history: Vec<U256>,
}

impl ExchangeRateAgent {
    /// Resolve the price oracle and build the tracker.
    pub async fn connect(
        oracle: Arc<dyn PriceOracle>,
        tokens: &TokenRegistry,
        config: &ExchangeRateConfig,
    ) -> Result<Self> {
        let token1 = tokens.require(&config.token1)?.clone();
        let token2 = tokens.require(&config.token2)?.clone();
        let price_oracle = oracle.price_oracle().await?;

        info!(
            market = %tokens.market(),
            %price_oracle,
            pair = %format!("{}/{}", token1.symbol, token2.symbol),
            "Exchange-rate tracker ready"
        );

        Ok(Self {
            oracle,
            price_oracle,
            market: tokens.market(),
            token1,
            token2,
            tiers: config.tiers(),
            history: vec![U256::ZERO],
        })
    }

    /// Ratio history, oldest first.
    pub fn history(&self) -> &[U256] {
        &self.history
    }

    /// Restore the initial history.
    pub fn reset(&mut self) {
        self.history = vec![U256::ZERO];
    }

    /// Record one observation, returning the alert if the ratio dropped.
    pub fn observe(&mut self, price1: U256, price2: U256) -> Result<Option<Alert>> {
        let ratio = wad_div(price1, price2).ok_or(ChainError::ZeroPrice {
            asset: self.token2.address,
        })?;
        let last = self.history.last().copied().unwrap_or_default();

        let alert = (ratio < last).then(|| {
            let difference = last - ratio;
            Alert::new(
                ALERT_ID,
                "Aave Exchange Rate Down",
                format!("{}/{} Exchange Rate Goes Down", self.token1.symbol, self.token2.symbol),
                AlertType::Info,
                self.tiers.classify(difference),
            )
            .with("difference", wad_to_f64(difference))
            .with("1st_token", self.token1.symbol.as_str())
            .with("2nd_token", self.token2.symbol.as_str())
            .with("market", self.market.as_str())
        });

        self.history.push(ratio);
        Ok(alert)
    }
}

#[async_trait]
impl BlockAgent for ExchangeRateAgent {
    fn name(&self) -> &'static str {
        "exchange-rate"
    }

    async fn handle_block(&mut self, block: &BlockEvent) -> Result<Vec<Alert>> {
        let prices = self
            .oracle
            .assets_prices(
                self.price_oracle,
                &[self.token1.address, self.token2.address],
                Some(block.number),
            )
            .await?;

        let [price1, price2] = prices[..] else {
            return Err(ChainError::PriceCountMismatch {
                oracle: self.price_oracle,
                expected: 2,
                got: prices.len(),
            }
            .into());
        };

        debug!(block = block.number, %price1, %price2, "Pair prices");
        Ok(self.observe(price1, price2)?.into_iter().collect())
    }
}
