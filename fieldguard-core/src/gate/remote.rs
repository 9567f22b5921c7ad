// fieldguard-core/src/gate/remote.rs
//! The remote classification contract and its bundled HTTP adapter.
//!
//! The classifier is an opaque oracle: it receives text and coarse context and
//! returns what it thinks is sensitive. Its output is filtered and merged by
//! the caller, never trusted verbatim.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;

use crate::category::Category;
use crate::field_context::CoarseKind;
use crate::span::{Span, SpanOrigin};

/// What the host sends to the remote classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub text: String,
    pub context: Option<String>,
    pub coarse_kind: CoarseKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// One finding reported by the remote classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDetection {
    #[serde(rename = "type", alias = "category")]
    pub category: String,
    pub value: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl RemoteDetection {
    /// Converts the finding into a span attributed to `classifier`, locating
    /// it in `text` when its value appears there verbatim.
    ///
    /// Confidence is accepted either as a 0-1 fraction or a 0-100 score.
    /// The free-text `reason` is not kept.
    pub fn into_span(self, text: &str, classifier: &str) -> Option<Span> {
        let confidence = if self.confidence <= 1.0 {
            self.confidence * 100.0
        } else {
            self.confidence
        };
        let confidence = confidence.round().clamp(0.0, 100.0) as u8;
        Span::unlocated(
            Category::from_label(&self.category),
            &self.value,
            confidence,
            Some(classifier.to_string()),
            SpanOrigin::Remote,
        )
        .map(|span| span.locate_in(text))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    #[serde(default, alias = "hasSensitiveData")]
    pub has_sensitive_data: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub detections: Vec<RemoteDetection>,
    #[serde(default, alias = "riskLevel")]
    pub risk_level: RiskLevel,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The account is out of quota or the subscription does not cover the call.
    #[error("Remote classification quota exhausted: {0}")]
    Quota(String),

    #[error("Remote classification timed out")]
    Timeout,

    #[error("Remote classification transport error: {0}")]
    Transport(String),

    #[error("Malformed remote classification response: {0}")]
    Malformed(String),
}

impl RemoteError {
    pub fn is_quota(&self) -> bool {
        matches!(self, RemoteError::Quota(_))
    }
}

#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, RemoteError>;
}

/// Posts requests as JSON to a classification endpoint.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fieldguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RemoteClassifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse, RemoteError> {
        debug!("Posting classification request to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout
                } else {
                    RemoteError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::FORBIDDEN
        {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Quota(if body.is_empty() {
                status.to_string()
            } else {
                body
            }));
        }
        if !status.is_success() {
            return Err(RemoteError::Transport(format!("HTTP {}", status)));
        }

        response
            .json::<ClassificationResponse>()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}
