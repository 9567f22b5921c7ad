// fieldguard-core/src/telemetry/sink.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use tokio::time::Duration;

use crate::telemetry::queue::QueueItem;

/// Destination for batches of detection events.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    fn name(&self) -> &str;

    /// Delivers one batch. An error drops the batch; there is no retry.
    async fn deliver(&self, batch: &[QueueItem]) -> Result<()>;
}

/// Posts each batch as a JSON array.
#[derive(Debug, Clone)]
pub struct HttpTelemetrySink {
    client: Client,
    endpoint: String,
}

impl HttpTelemetrySink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fieldguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build telemetry HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, batch: &[QueueItem]) -> Result<()> {
        debug!("Posting {} telemetry events to {}", batch.len(), self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .context("Telemetry request failed")?;
        if !response.status().is_success() {
            bail!("Telemetry endpoint answered HTTP {}", response.status());
        }
        Ok(())
    }
}
