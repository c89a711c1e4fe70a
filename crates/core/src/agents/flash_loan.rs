//! Flash-loan size detector.
//!
//! Values every `flashLoan` call on the lending pool in USD, using the
//! oracle price of a stablecoin reserve as the USD reference, and alerts on
//! large loans.

use alloy::primitives::{Address, U256};
use anyhow::{bail, Result};
use async_trait::async_trait;
use sentinel_chain::contracts::ILendingPool::flashLoanCall;
use sentinel_chain::{ChainError, PriceOracle, TransactionEvent};
use std::sync::Arc;
use tracing::{debug, info};

use super::TransactionAgent;
use crate::alert::{Alert, AlertType};
use crate::config::{ConfigError, FlashLoanConfig, Market};
use crate::tiers::SeverityTiers;
use crate::tokens::{TokenDescriptor, TokenRegistry};
use crate::u256_math::u256_to_f64;

pub const ALERT_ID: &str = "AAVE-FL";

pub struct FlashLoanAgent {
    oracle: Arc<dyn PriceOracle>,
    market: Market,
    price_oracle: Address,
    lending_pool: Address,
    reference: TokenDescriptor,
    min_usd: f64,
    tiers: SeverityTiers<f64>,
}

/// Reference token by aToken symbol, or by the underlying symbol when the
/// market prefixes its aTokens differently (`aAmmUSDT`).
fn reference_token(tokens: &TokenRegistry, a_token_symbol: &str) -> Result<TokenDescriptor, ConfigError> {
    tokens
        .by_a_token_symbol(a_token_symbol)
        .or_else(|| {
            a_token_symbol
                .strip_prefix('a')
                .and_then(|symbol| tokens.by_symbol(symbol))
        })
        .cloned()
        .ok_or_else(|| ConfigError::UnknownToken {
            symbol: a_token_symbol.to_string(),
            market: tokens.market(),
        })
}

impl FlashLoanAgent {
    /// Resolve the lending pool and price oracle and build the detector.
    pub async fn connect(
        oracle: Arc<dyn PriceOracle>,
        tokens: &TokenRegistry,
        config: &FlashLoanConfig,
    ) -> Result<Self> {
        let reference = reference_token(tokens, &config.reference_a_token)?;
        let lending_pool = oracle.lending_pool().await?;
        let price_oracle = oracle.price_oracle().await?;

        info!(
            market = %tokens.market(),
            %lending_pool,
            %price_oracle,
            reference = %reference.symbol,
            min_usd = config.min_usd,
            "Flash-loan detector ready"
        );

        Ok(Self {
            oracle,
            market: tokens.market(),
            price_oracle,
            lending_pool,
            reference,
            min_usd: config.min_usd,
            tiers: config.tiers(),
        })
    }

    /// Σ(price × amount) / reference price, prices pinned to `block`.
    pub async fn total_usd(&self, assets: &[Address], amounts: &[U256], block: u64) -> Result<f64> {
        if assets.len() != amounts.len() {
            bail!(
                "flash loan has {} assets but {} amounts",
                assets.len(),
                amounts.len()
            );
        }

        let mut notional = U256::ZERO;
        for (asset, amount) in assets.iter().zip(amounts) {
            let price = self
                .oracle
                .asset_price(self.price_oracle, *asset, Some(block))
                .await?;
            notional = notional.saturating_add(price.saturating_mul(*amount));
        }

        let reference_price = self
            .oracle
            .asset_price(self.price_oracle, self.reference.address, Some(block))
            .await?;
        if reference_price.is_zero() {
            return Err(ChainError::ZeroPrice {
                asset: self.reference.address,
            }
            .into());
        }

        Ok(u256_to_f64(notional) / u256_to_f64(reference_price))
    }
}

#[async_trait]
impl TransactionAgent for FlashLoanAgent {
    fn name(&self) -> &'static str {
        "flash-loan"
    }

    async fn handle_transaction(&mut self, tx: &TransactionEvent) -> Result<Vec<Alert>> {
        let mut alerts = Vec::new();

        for call in tx.filter_function::<flashLoanCall>(self.lending_pool) {
            let total = self
                .total_usd(&call.assets, &call.amounts, tx.block_number)
                .await?;
            debug!(tx = %tx.hash, total_usd = total, assets = call.assets.len(), "Flash loan valued");

            if total < self.min_usd {
                continue;
            }

            alerts.push(
                Alert::new(
                    ALERT_ID,
                    "AAVE FlashLoan Transaction",
                    format!("FlashLoan transaction value ${}", total as u64),
                    AlertType::Info,
                    self.tiers.classify(total),
                )
                .with("transaction_amount", total)
                .with("market", self.market.as_str())
                .with("tx_hash", tx.hash.to_string())
                .with_address("receiver", call.receiverAddress),
            );
        }

        Ok(alerts)
    }
}
