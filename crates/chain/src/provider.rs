//! Provider management and event extraction.
//! Uses Alloy providers for type-safe RPC interactions.

use alloy::consensus::Transaction;
use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::network::TransactionResponse;
use alloy::primitives::{Log, B256};
use alloy::providers::ext::DebugApi;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::trace::geth::{
    CallConfig, CallFrame as TracedCall, GethDebugTracingOptions, GethTrace, TraceResult,
};
use alloy::rpc::types::TransactionReceipt;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ChainError;
use crate::events::{BlockEvent, CallFrame, TransactionEvent};

/// HTTP provider used for all reads.
pub type HttpProvider = RootProvider;

/// Provider manager for the monitored chain.
#[derive(Clone)]
pub struct ProviderManager {
    /// HTTP URL
    http_url: String,
    /// Shared provider
    provider: Arc<HttpProvider>,
    /// Attach internal calls from `debug_traceBlockByNumber`
    trace_calls: bool,
}

impl ProviderManager {
    /// Connect to `http_url` and verify the endpoint answers.
    pub async fn new(http_url: &str) -> Result<Self> {
        let url = http_url
            .parse::<reqwest::Url>()
            .map_err(|e| ChainError::InvalidRpcUrl {
                url: http_url.to_string(),
                reason: e.to_string(),
            })?;

        info!(http = http_url, "Initializing provider manager");

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .on_http(url);
        let block = provider.get_block_number().await?;
        info!(block = block, "Provider connection verified");

        Ok(Self {
            http_url: http_url.to_string(),
            provider: Arc::new(provider),
            trace_calls: true,
        })
    }

    /// Enable or disable call tracing in [`Self::fetch_events`].
    pub fn with_call_traces(mut self, enabled: bool) -> Self {
        self.trace_calls = enabled;
        self
    }

    /// Get the HTTP URL.
    pub fn http_url(&self) -> &str {
        &self.http_url
    }

    /// Shared provider handle for contract calls.
    pub fn provider(&self) -> Arc<HttpProvider> {
        self.provider.clone()
    }

    /// Get current block number.
    pub async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    /// Get chain ID.
    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    /// Fetch a block with its transactions, receipts and call traces as agent
    /// events.
    ///
    /// Logs are taken from the block receipts and internal calls from a
    /// callTracer block trace, then attached to their transaction.
    pub async fn fetch_events(&self, number: u64) -> Result<(BlockEvent, Vec<TransactionEvent>)> {
        let block = self
            .provider
            .get_block_by_number(number.into())
            .full()
            .await?
            .ok_or(ChainError::BlockNotFound(number))?;
        let receipts = self
            .provider
            .get_block_receipts(BlockId::number(number))
            .await?
            .ok_or(ChainError::ReceiptsNotFound(number))?;
        let mut logs_by_tx = logs_by_transaction(receipts);

        let hashes: Vec<B256> = block
            .transactions
            .txns()
            .map(|tx| TransactionResponse::tx_hash(tx))
            .collect();
        let mut calls_by_tx = self.call_frames(number, &hashes).await;

        let block_event = BlockEvent::new(number, block.header.timestamp);

        let transactions: Vec<TransactionEvent> = block
            .transactions
            .txns()
            .map(|tx| {
                let hash = TransactionResponse::tx_hash(tx);
                TransactionEvent {
                    hash,
                    block_number: number,
                    from: TransactionResponse::from(tx),
                    to: Transaction::to(tx),
                    input: Transaction::input(tx).clone(),
                    calls: calls_by_tx.remove(&hash).unwrap_or_default(),
                    logs: logs_by_tx.remove(&hash).unwrap_or_default(),
                }
            })
            .collect();

        debug!(
            block = number,
            tx_count = transactions.len(),
            "Fetched block events"
        );

        Ok((block_event, transactions))
    }

    /// Internal calls of every transaction in block `number`, by hash.
    ///
    /// `hashes` are the block's transactions in order, used when the node
    /// omits `txHash` from trace results. Nodes without the debug namespace
    /// yield an empty map, leaving agents with top-level calls only.
    async fn call_frames(&self, number: u64, hashes: &[B256]) -> HashMap<B256, Vec<CallFrame>> {
        if !self.trace_calls || hashes.is_empty() {
            return HashMap::new();
        }

        let options = GethDebugTracingOptions::call_tracer(CallConfig::default());
        match self
            .provider
            .debug_trace_block_by_number(BlockNumberOrTag::Number(number), options)
            .await
        {
            Ok(traces) => calls_by_transaction(traces, hashes),
            Err(e) => {
                debug!(block = number, error = %e, "Call traces unavailable");
                HashMap::new()
            }
        }
    }

    /// Check if provider is healthy.
    pub async fn health_check(&self) -> Result<bool> {
        let block = self.block_number().await?;
        debug!(block = block, "Provider health check passed");
        Ok(block > 0)
    }
}

/// Group receipt logs by transaction hash, dropping RPC metadata.
fn logs_by_transaction(receipts: Vec<TransactionReceipt>) -> HashMap<B256, Vec<Log>> {
    receipts
        .into_iter()
        .map(|receipt| {
            let logs = receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect();
            (receipt.transaction_hash, logs)
        })
        .collect()
}

/// Pair block trace results with their transactions and flatten each call tree.
fn calls_by_transaction(traces: Vec<TraceResult>, hashes: &[B256]) -> HashMap<B256, Vec<CallFrame>> {
    traces
        .into_iter()
        .zip(hashes)
        .filter_map(|(trace, hash)| match trace {
            TraceResult::Success {
                result: GethTrace::CallTracer(root),
                tx_hash,
            } => {
                let mut calls = Vec::new();
                flatten_calls(root.calls, &mut calls);
                Some((tx_hash.unwrap_or(*hash), calls))
            }
            TraceResult::Success { tx_hash, .. } => {
                debug!(tx = %tx_hash.unwrap_or(*hash), "Unexpected tracer output");
                None
            }
            TraceResult::Error { error, tx_hash } => {
                debug!(tx = %tx_hash.unwrap_or(*hash), error = %error, "Transaction trace failed");
                None
            }
        })
        .collect()
}

/// Depth-first, parent before children, matching execution order.
fn flatten_calls(frames: Vec<TracedCall>, out: &mut Vec<CallFrame>) {
    for frame in frames {
        out.push(CallFrame {
            from: frame.from,
            to: frame.to,
            input: frame.input,
        });
        flatten_calls(frame.calls, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes};
    use alloy::transports::mock::Asserter;

    fn traced(to: u8, input: u8, calls: Vec<TracedCall>) -> TracedCall {
        TracedCall {
            from: Address::repeat_byte(0xEE),
            to: Some(Address::repeat_byte(to)),
            input: Bytes::from(vec![input; 4]),
            calls,
            typ: "CALL".to_string(),
            ..Default::default()
        }
    }

    fn mocked_manager(asserter: Asserter) -> ProviderManager {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .on_mocked_client(asserter);
        ProviderManager {
            http_url: "http://localhost:8545".to_string(),
            provider: Arc::new(provider),
            trace_calls: true,
        }
    }

    #[test]
    fn test_flatten_calls_in_execution_order() {
        // bot -> router -> { pool -> token, oracle }
        let root = traced(
            0xB0,
            0x00,
            vec![traced(
                0x01,
                0x01,
                vec![traced(0x02, 0x02, vec![traced(0x03, 0x03, vec![])]), traced(0x04, 0x04, vec![])],
            )],
        );

        let mut calls = Vec::new();
        flatten_calls(root.calls, &mut calls);

        let targets: Vec<u8> = calls.iter().map(|c| c.to.unwrap()[0]).collect();
        assert_eq!(targets, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(calls[2].input, Bytes::from(vec![0x03; 4]));
    }

    #[test]
    fn test_calls_by_transaction() {
        let first = B256::repeat_byte(0x01);
        let second = B256::repeat_byte(0x02);
        let third = B256::repeat_byte(0x03);

        let traces = vec![
            TraceResult::Success {
                result: GethTrace::CallTracer(traced(0xB0, 0x00, vec![traced(0x11, 0x11, vec![])])),
                tx_hash: Some(first),
            },
            // No txHash: paired by position
            TraceResult::Success {
                result: GethTrace::CallTracer(traced(0xB1, 0x00, vec![traced(0x22, 0x22, vec![])])),
                tx_hash: None,
            },
            TraceResult::Error {
                error: "execution timeout".to_string(),
                tx_hash: Some(third),
            },
        ];

        let calls = calls_by_transaction(traces, &[first, second, third]);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[&first][0].to, Some(Address::repeat_byte(0x11)));
        assert_eq!(calls[&second][0].to, Some(Address::repeat_byte(0x22)));
        assert!(!calls.contains_key(&third));
    }

    #[tokio::test]
    async fn test_call_frames_from_block_trace() {
        let hash = B256::repeat_byte(0x07);
        let asserter = Asserter::new();
        asserter.push_success(&vec![TraceResult::Success {
            result: GethTrace::CallTracer(traced(0xB0, 0x00, vec![traced(0x11, 0xAB, vec![])])),
            tx_hash: Some(hash),
        }]);
        let manager = mocked_manager(asserter);

        let calls = manager.call_frames(100, &[hash]).await;
        assert_eq!(
            calls[&hash],
            vec![CallFrame {
                from: Address::repeat_byte(0xEE),
                to: Some(Address::repeat_byte(0x11)),
                input: Bytes::from(vec![0xAB; 4]),
            }]
        );
    }

    #[tokio::test]
    async fn test_call_frames_without_debug_namespace() {
        let hash = B256::repeat_byte(0x07);
        let asserter = Asserter::new();
        asserter.push_failure_msg("the method debug_traceBlockByNumber does not exist");

        let calls = mocked_manager(asserter.clone()).call_frames(100, &[hash]).await;
        assert!(calls.is_empty());

        // Disabled tracing sends no request
        let manager = mocked_manager(asserter).with_call_traces(false);
        assert!(manager.call_frames(100, &[hash]).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let result = ProviderManager::new("not a url").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_fetch_events() {
        let url = std::env::var("RPC_URL").unwrap_or_else(|_| "https://eth.llamarpc.com".to_string());
        let manager = ProviderManager::new(&url).await.unwrap();
        let latest = manager.block_number().await.unwrap();

        let (block, txs) = manager.fetch_events(latest - 1).await.unwrap();
        assert_eq!(block.number, latest - 1);
        assert!(txs.iter().all(|tx| tx.block_number == latest - 1));
    }
}
