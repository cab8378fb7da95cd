//! Report delivery
//!
//! Live runs POST the report to a chat webhook (Slack, Mattermost and
//! friends all accept the same `text`/`username` payload). Offline runs
//! print it instead. Delivery is attempted once; failures are returned to
//! the caller and never retried.

use crate::error::{ClusterbotError, ClusterbotResult};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// JSON body accepted by incoming webhooks
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub text: &'a str,
    pub username: &'a str,
}

/// Sends a finished report somewhere
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, body: &str, display_name: &str) -> ClusterbotResult<()>;
}

/// Incoming-webhook notifier with a bounded request timeout
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> ClusterbotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClusterbotError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    fn failure(&self, details: impl Into<String>) -> ClusterbotError {
        ClusterbotError::Delivery {
            endpoint: self.endpoint.clone(),
            details: details.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn post(&self, body: &str, display_name: &str) -> ClusterbotResult<()> {
        let payload = WebhookPayload {
            text: body,
            username: display_name,
        };
        debug!("Posting report to {} as '{}'", self.endpoint, display_name);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.failure(format!("request timed out: {}", e))
                } else {
                    self.failure(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("webhook answered {}: {}", status, detail.trim())));
        }

        info!("Report delivered to {}", self.endpoint);
        Ok(())
    }
}

/// Offline notifier: the report goes to stdout verbatim
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn post(&self, body: &str, display_name: &str) -> ClusterbotResult<()> {
        debug!("Printing report for '{}'", display_name);
        print!("{}", body);
        Ok(())
    }
}

/// A delivered message as seen by [`MockNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub body: String,
    pub display_name: String,
}

/// Mock implementation for testing
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    delivered: Arc<Mutex<Vec<DeliveredMessage>>>,
    fail_with: Option<String>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every post fails with a delivery error carrying `details`
    pub fn failing(details: impl Into<String>) -> Self {
        Self {
            delivered: Arc::default(),
            fail_with: Some(details.into()),
        }
    }

    pub async fn delivered(&self) -> Vec<DeliveredMessage> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn post(&self, body: &str, display_name: &str) -> ClusterbotResult<()> {
        if let Some(details) = &self.fail_with {
            return Err(ClusterbotError::Delivery {
                endpoint: "mock://webhook".to_string(),
                details: details.clone(),
            });
        }
        self.delivered.lock().await.push(DeliveredMessage {
            body: body.to_string(),
            display_name: display_name.to_string(),
        });
        Ok(())
    }
}
