//! JSON webhook publisher for alert batches.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while delivering to a webhook.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Request body: `{"alerts": [...]}`.
#[derive(Debug, Serialize)]
struct Envelope<'a, T> {
    alerts: &'a [T],
}

/// Posts batches of serializable items to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookPublisher {
    client: reqwest::Client,
    url: String,
}

impl WebhookPublisher {
    /// Create a publisher for `url` with the default 10s request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(url, Duration::from_secs(10))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `items` as one JSON batch. Empty batches are not sent.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn publish<T: Serialize + Sync>(&self, items: &[T]) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&Envelope { alerts: items })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        debug!(url = %self.url, "Alert batch delivered");
        Ok(())
    }
}
