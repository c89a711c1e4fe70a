//! Aave sentinel core logic.
//!
//! This crate provides the monitoring agents and the host that drives them:
//! - Alerts and threshold-based severity tiers
//! - Token registry per market
//! - Exchange-rate, oracle deviation, fallback-oracle call, flash-loan and
//!   governance agents
//! - Scanner orchestration and alert sinks
//!
//! Covers the Aave V2 main and AMM markets on mainnet and Kovan.

pub mod agents;
mod alert;
mod clock;
pub mod config;
mod scanner;
mod tiers;
mod tokens;
pub mod u256_math;

pub use agents::{AgentSet, BlockAgent, TransactionAgent};
pub use alert::{Alert, AlertType, Severity};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{addresses_provider, ConfigError, Market, Network, SentinelConfig};
pub use scanner::{AlertSink, BlockSource, LogSink, Scanner};
pub use tiers::SeverityTiers;
pub use tokens::{TokenDescriptor, TokenRegistry};
