//! Detects `getFallbackOracle()` calls on the current price oracle, whether
//! sent by an account or made from another contract.

use alloy::sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use sentinel_chain::contracts::IPriceOracle::getFallbackOracleCall;
use sentinel_chain::{PriceOracle, TransactionEvent};
use std::sync::Arc;

use super::TransactionAgent;
use crate::alert::{Alert, AlertType, Severity};

pub const ALERT_ID: &str = "AAVE-SFO";

pub struct FallbackOracleCallAgent {
    oracle: Arc<dyn PriceOracle>,
}

impl FallbackOracleCallAgent {
    pub fn new(oracle: Arc<dyn PriceOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl TransactionAgent for FallbackOracleCallAgent {
    fn name(&self) -> &'static str {
        "fallback-oracle-call"
    }

    async fn handle_transaction(&mut self, tx: &TransactionEvent) -> Result<Vec<Alert>> {
        if !tx.calls_selector(getFallbackOracleCall::SELECTOR) {
            return Ok(Vec::new());
        }

        // The oracle can be replaced through the addresses provider
        let price_oracle = self.oracle.price_oracle().await?;
        if tx.filter_function::<getFallbackOracleCall>(price_oracle).is_empty() {
            return Ok(Vec::new());
        }

        let alert = Alert::new(
            ALERT_ID,
            "GetFallbackOracle() Function",
            format!(
                "getFallbackOracle() function was called from {}",
                price_oracle.to_checksum(None)
            ),
            AlertType::Suspicious,
            Severity::Medium,
        )
        .with("tx_hash", tx.hash.to_string())
        .with_address("price_oracle", price_oracle);

        Ok(vec![alert])
    }
}
