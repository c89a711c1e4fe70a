//! Aave V2 Sentinel
//!
//! Block-polling monitor for the Aave V2 lending protocol.
//! Features:
//! - Exchange-rate drop detection for a configured token pair
//! - Price oracle vs fallback oracle deviation checks
//! - Flash-loan size, fallback-oracle call and governance execution alerts
//! - Alert delivery to the log and an optional JSON webhook

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentinel_api::WebhookPublisher;
use sentinel_chain::{AaveOracleClient, PriceOracle, ProviderManager};
use sentinel_core::{addresses_provider, AgentSet, LogSink, Market, Scanner, SentinelConfig, SystemClock};

/// Environment variable names.
mod env {
    pub const ALERT_WEBHOOK_URL: &str = "ALERT_WEBHOOK_URL";
    pub const START_BLOCK: &str = "START_BLOCK";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

const DEFAULT_FILTER: &str = "info,sentinel_core=debug,sentinel_chain=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    // SENTINEL_CONFIG selects a file, SENTINEL_PROFILE a built-in profile
    let mut config = SentinelConfig::from_env().context("loading configuration")?;
    if config.alerts.webhook_url.is_none() {
        config.alerts.webhook_url = std::env::var(env::ALERT_WEBHOOK_URL).ok();
    }
    config.log_config();

    info!("Starting Aave Sentinel");

    let provider = ProviderManager::new(&config.rpc.http_url)
        .await?
        .with_call_traces(config.rpc.trace_calls);
    let chain_id = provider.chain_id().await?;
    if chain_id != config.network.chain_id() {
        warn!(
            chain_id,
            expected = config.network.chain_id(),
            network = %config.network,
            "RPC endpoint is on a different chain than the configured network"
        );
    }

    let network = config.network;
    let rpc = provider.provider();
    let oracle_for = |market: Market| -> Arc<dyn PriceOracle> {
        Arc::new(AaveOracleClient::new(
            addresses_provider(market, network),
            rpc.clone(),
        ))
    };

    let agents = AgentSet::from_config(&config, oracle_for, Arc::new(SystemClock)).await?;
    if agents.is_empty() {
        warn!("All agents are disabled, nothing to do");
        return Ok(());
    }

    let mut scanner = Scanner::new(provider, agents, config.rpc.poll_interval()).with_sink(LogSink);

    if let Some(url) = &config.alerts.webhook_url {
        info!(url = %url, "Publishing alerts to webhook");
        scanner = scanner.with_sink(WebhookPublisher::new(url.clone())?);
    }

    if let Ok(start) = std::env::var(env::START_BLOCK) {
        let start: u64 = start
            .parse()
            .with_context(|| format!("invalid {}: {}", env::START_BLOCK, start))?;
        scanner = scanner.start_at(start);
    }

    tokio::select! {
        result = scanner.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}

/// Plain text logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(env::LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
