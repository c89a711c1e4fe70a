//! Outbound HTTP integrations.
//!
//! This crate provides:
//! - Webhook publishing of alert batches as JSON

mod webhook;

pub use webhook::{ApiError, WebhookPublisher};
