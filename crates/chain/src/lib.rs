//! Aave sentinel chain interaction layer.
//!
//! This crate provides:
//! - Contract bindings for the Aave V2 addresses provider, price oracles,
//!   lending pool and governance
//! - Block and transaction events, including traced internal calls, with
//!   typed call/log filters
//! - The `PriceOracle` capability and its RPC-backed implementation
//! - Provider management and block-to-event extraction

pub mod contracts;
mod error;
mod events;
mod oracle;
mod provider;

pub use error::ChainError;
pub use events::{BlockEvent, CallFrame, TransactionEvent};
pub use oracle::{AaveOracleClient, PriceOracle};
pub use provider::{HttpProvider, ProviderManager};
