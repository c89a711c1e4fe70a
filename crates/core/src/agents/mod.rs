//! Monitoring agents.
//!
//! Block agents run once per block, transaction agents once per transaction.
//! Each agent owns its state and is driven sequentially by the scanner, so
//! handlers take `&mut self` and need no locking.

mod exchange_rate;
mod fallback_oracle_call;
mod flash_loan;
mod governance;
mod price_deviation;

#[cfg(test)]
pub(crate) mod mock;

pub use exchange_rate::ExchangeRateAgent;
pub use fallback_oracle_call::FallbackOracleCallAgent;
pub use flash_loan::FlashLoanAgent;
pub use governance::GovernanceAgent;
pub use price_deviation::{Deviation, PriceDeviationAgent};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sentinel_chain::{BlockEvent, PriceOracle, TransactionEvent};
use std::sync::Arc;
use tracing::info;

use crate::alert::Alert;
use crate::clock::Clock;
use crate::config::{Market, SentinelConfig};
use crate::tokens::TokenRegistry;

/// Agent invoked once per block.
#[async_trait]
pub trait BlockAgent: Send {
    fn name(&self) -> &'static str;

    async fn handle_block(&mut self, block: &BlockEvent) -> Result<Vec<Alert>>;
}

/// Agent invoked once per transaction.
#[async_trait]
pub trait TransactionAgent: Send {
    fn name(&self) -> &'static str;

    async fn handle_transaction(&mut self, tx: &TransactionEvent) -> Result<Vec<Alert>>;
}

/// Enabled agents, in dispatch order.
#[derive(Default)]
pub struct AgentSet {
    pub block_agents: Vec<Box<dyn BlockAgent>>,
    pub transaction_agents: Vec<Box<dyn TransactionAgent>>,
}

impl AgentSet {
    /// Build every enabled agent.
    ///
    /// `oracle_for` supplies the oracle client of a market; agents that
    /// resolve contracts at construction do so here.
    pub async fn from_config<F>(
        config: &SentinelConfig,
        oracle_for: F,
        clock: Arc<dyn Clock>,
    ) -> Result<Self>
    where
        F: Fn(Market) -> Arc<dyn PriceOracle>,
    {
        let mut set = Self::default();
        let tokens = |market: Market| {
            TokenRegistry::load(config.tokens_file.as_deref(), market)
                .with_context(|| format!("loading {market} token registry"))
        };

        if config.exchange_rate.enabled {
            let market = config.market_for(config.exchange_rate.market);
            let agent = ExchangeRateAgent::connect(
                oracle_for(market),
                &tokens(market)?,
                &config.exchange_rate,
            )
            .await
            .context("starting exchange-rate tracker")?;
            set.block_agents.push(Box::new(agent));
        }

        if config.price_deviation.enabled {
            let market = config.market_for(config.price_deviation.market);
            let agent = PriceDeviationAgent::new(
                oracle_for(market),
                &tokens(market)?,
                &config.price_deviation,
                clock,
            );
            set.block_agents.push(Box::new(agent));
        }

        if config.fallback_oracle_call.enabled {
            let market = config.market_for(config.fallback_oracle_call.market);
            set.transaction_agents
                .push(Box::new(FallbackOracleCallAgent::new(oracle_for(market))));
        }

        if config.flash_loan.enabled {
            let market = config.market_for(config.flash_loan.market);
            let agent = FlashLoanAgent::connect(oracle_for(market), &tokens(market)?, &config.flash_loan)
                .await
                .context("starting flash-loan detector")?;
            set.transaction_agents.push(Box::new(agent));
        }

        if config.governance.enabled {
            set.transaction_agents
                .push(Box::new(GovernanceAgent::new(config.network.governance_v2())));
        }

        let block_agents: Vec<_> = set.block_agents.iter().map(|a| a.name()).collect();
        let transaction_agents: Vec<_> = set.transaction_agents.iter().map(|a| a.name()).collect();
        info!(?block_agents, ?transaction_agents, "Agents initialized");

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.block_agents.is_empty() && self.transaction_agents.is_empty()
    }
}
