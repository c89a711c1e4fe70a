//! Scanner orchestration.
//!
//! Polls the chain for new blocks, turns each into a block event plus one
//! event per transaction, runs every agent over them in order and hands the
//! resulting alerts to the configured sinks.

use anyhow::Result;
use async_trait::async_trait;
use sentinel_api::WebhookPublisher;
use sentinel_chain::{BlockEvent, ProviderManager, TransactionEvent};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::agents::AgentSet;
use crate::alert::Alert;

/// Destination for alert batches.
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, alerts: &[Alert]) -> Result<()>;
}

/// Writes each alert to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, alerts: &[Alert]) -> Result<()> {
        for alert in alerts {
            let metadata = serde_json::to_string(&alert.metadata)?;
            warn!(
                alert_id = %alert.alert_id,
                severity = %alert.severity,
                alert_type = ?alert.alert_type,
                name = %alert.name,
                %metadata,
                "{}",
                alert.description
            );
        }
        Ok(())
    }
}

#[async_trait]
impl AlertSink for WebhookPublisher {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn publish(&self, alerts: &[Alert]) -> Result<()> {
        WebhookPublisher::publish(self, alerts).await?;
        Ok(())
    }
}

/// Source of blocks and their transaction events.
#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn latest_block(&self) -> Result<u64>;

    async fn fetch_events(&self, number: u64) -> Result<(BlockEvent, Vec<TransactionEvent>)>;
}

#[async_trait]
impl BlockSource for ProviderManager {
    async fn latest_block(&self) -> Result<u64> {
        self.block_number().await
    }

    async fn fetch_events(&self, number: u64) -> Result<(BlockEvent, Vec<TransactionEvent>)> {
        ProviderManager::fetch_events(self, number).await
    }
}

/// Block poller driving the agents.
pub struct Scanner<S> {
    source: S,
    agents: AgentSet,
    sinks: Vec<Box<dyn AlertSink>>,
    poll_interval: Duration,
    /// Next block to process; None starts at the chain head
    next_block: Option<u64>,
}

impl<S: BlockSource> Scanner<S> {
    pub fn new(source: S, agents: AgentSet, poll_interval: Duration) -> Self {
        Self {
            source,
            agents,
            sinks: Vec::new(),
            poll_interval,
            next_block: None,
        }
    }

    pub fn with_sink(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Start from `block` instead of the chain head.
    pub fn start_at(mut self, block: u64) -> Self {
        self.next_block = Some(block);
        self
    }

    pub fn next_block(&self) -> Option<u64> {
        self.next_block
    }

    /// Run every agent over one block and its transactions.
    ///
    /// A failing agent is logged and skipped; the others still run.
    pub async fn process(&mut self, block: &BlockEvent, transactions: &[TransactionEvent]) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for agent in self.agents.block_agents.iter_mut() {
            match agent.handle_block(block).await {
                Ok(found) => alerts.extend(found),
                Err(e) => warn!(
                    agent = agent.name(),
                    block = block.number,
                    error = %e,
                    "Block handler failed"
                ),
            }
        }

        for tx in transactions {
            for agent in self.agents.transaction_agents.iter_mut() {
                match agent.handle_transaction(tx).await {
                    Ok(found) => alerts.extend(found),
                    Err(e) => warn!(
                        agent = agent.name(),
                        tx = %tx.hash,
                        error = %e,
                        "Transaction handler failed"
                    ),
                }
            }
        }

        alerts
    }

    /// Deliver alerts to every sink. Sink failures are logged.
    pub async fn publish(&self, alerts: &[Alert]) {
        if alerts.is_empty() {
            return;
        }
        for sink in &self.sinks {
            if let Err(e) = sink.publish(alerts).await {
                error!(sink = sink.name(), count = alerts.len(), error = %e, "Failed to publish alerts");
            }
        }
    }

    /// Process every block between the last processed one and the head.
    ///
    /// Returns the number of blocks processed. A block that fails to fetch
    /// is retried on the next call.
    pub async fn poll_once(&mut self) -> Result<u64> {
        let head = self.source.latest_block().await?;
        let mut next = self.next_block.unwrap_or(head);
        let mut processed = 0;

        while next <= head {
            let (block, transactions) = self.source.fetch_events(next).await?;
            let alerts = self.process(&block, &transactions).await;
            debug!(
                block = next,
                tx_count = transactions.len(),
                alerts = alerts.len(),
                "Block processed"
            );
            self.publish(&alerts).await;

            next += 1;
            self.next_block = Some(next);
            processed += 1;
        }

        Ok(processed)
    }

    /// Poll forever at the configured interval.
    pub async fn run(mut self) -> Result<()> {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            start = ?self.next_block,
            sinks = self.sinks.len(),
            "Starting scanner loop"
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_once().await {
                error!(next_block = ?self.next_block, error = %e, "Poll failed, retrying next tick");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{BlockAgent, TransactionAgent};
    use crate::alert::{AlertType, Severity};
    use anyhow::bail;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct FakeChain {
        head: u64,
        txs_per_block: usize,
        missing: Option<u64>,
    }

    #[async_trait]
    impl BlockSource for FakeChain {
        async fn latest_block(&self) -> Result<u64> {
            Ok(self.head)
        }

        async fn fetch_events(&self, number: u64) -> Result<(BlockEvent, Vec<TransactionEvent>)> {
            if self.missing == Some(number) {
                bail!("block {number} unavailable");
            }
            let txs = (0..self.txs_per_block)
                .map(|_| TransactionEvent {
                    block_number: number,
                    ..Default::default()
                })
                .collect();
            Ok((BlockEvent::new(number, number * 12), txs))
        }
    }

    fn alert(id: &str) -> Alert {
        Alert::new(id, id, id, AlertType::Info, Severity::Info)
    }

    struct EveryBlock;

    #[async_trait]
    impl BlockAgent for EveryBlock {
        fn name(&self) -> &'static str {
            "every-block"
        }

        async fn handle_block(&mut self, _block: &BlockEvent) -> Result<Vec<Alert>> {
            Ok(vec![alert("BLOCK")])
        }
    }

    struct Broken;

    #[async_trait]
    impl BlockAgent for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn handle_block(&mut self, _block: &BlockEvent) -> Result<Vec<Alert>> {
            bail!("rpc down")
        }
    }

    struct EveryTx;

    #[async_trait]
    impl TransactionAgent for EveryTx {
        fn name(&self) -> &'static str {
            "every-tx"
        }

        async fn handle_transaction(&mut self, _tx: &TransactionEvent) -> Result<Vec<Alert>> {
            Ok(vec![alert("TX")])
        }
    }

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Alert>>>);

    #[async_trait]
    impl AlertSink for Collect {
        fn name(&self) -> &'static str {
            "collect"
        }

        async fn publish(&self, alerts: &[Alert]) -> Result<()> {
            self.0.lock().unwrap().extend_from_slice(alerts);
            Ok(())
        }
    }

    fn agents() -> AgentSet {
        AgentSet {
            block_agents: vec![Box::new(Broken), Box::new(EveryBlock)],
            transaction_agents: vec![Box::new(EveryTx)],
        }
    }

    #[tokio::test]
    async fn test_process_continues_after_agent_error() {
        let mut scanner = Scanner::new(FakeChain::default(), agents(), Duration::from_secs(1));
        let txs = vec![TransactionEvent::default(), TransactionEvent::default()];

        let alerts = scanner.process(&BlockEvent::new(1, 0), &txs).await;
        let ids: Vec<_> = alerts.iter().map(|a| a.alert_id.as_str()).collect();
        assert_eq!(ids, ["BLOCK", "TX", "TX"]);
    }

    #[tokio::test]
    async fn test_poll_once_catches_up_and_publishes() {
        let sink = Collect::default();
        let chain = FakeChain {
            head: 12,
            txs_per_block: 1,
            missing: None,
        };
        let mut scanner = Scanner::new(chain, agents(), Duration::from_secs(1))
            .with_sink(sink.clone())
            .with_sink(LogSink)
            .start_at(10);

        assert_eq!(scanner.poll_once().await.unwrap(), 3);
        assert_eq!(scanner.next_block(), Some(13));
        assert_eq!(sink.0.lock().unwrap().len(), 6);

        assert_eq!(scanner.poll_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_poll_starts_at_head_by_default() {
        let chain = FakeChain {
            head: 100,
            ..Default::default()
        };
        let mut scanner = Scanner::new(chain, AgentSet::default(), Duration::from_secs(1));
        assert_eq!(scanner.poll_once().await.unwrap(), 1);
        assert_eq!(scanner.next_block(), Some(101));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let chain = FakeChain {
            head: 5,
            txs_per_block: 0,
            missing: Some(4),
        };
        let mut scanner = Scanner::new(chain, agents(), Duration::from_secs(1)).start_at(3);

        assert!(scanner.poll_once().await.is_err());
        assert_eq!(scanner.next_block(), Some(4));
    }
}
