//! Error types for chain reads.

use alloy::primitives::Address;
use thiserror::Error;

/// Errors raised while reading oracle state or building events.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The oracle returned fewer prices than assets requested.
    #[error("oracle {oracle} returned {got} prices for {expected} assets")]
    PriceCountMismatch {
        oracle: Address,
        expected: usize,
        got: usize,
    },

    /// A price used as a divisor was zero.
    #[error("oracle returned a zero price for {asset}")]
    ZeroPrice { asset: Address },

    /// A block requested from the node does not exist (yet).
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// Receipts for a block could not be fetched.
    #[error("receipts for block {0} not available")]
    ReceiptsNotFound(u64),

    /// RPC URL could not be parsed.
    #[error("invalid rpc url '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },
}
