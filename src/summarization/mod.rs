//! Client for the external summarization sidecar.
//!
//! The sidecar exposes `POST /summarize` (text in, `[{"summary_text": ...}]` out) and
//! `GET /health`. Every call is classified into a [`ServiceError`] variant instead of being
//! flattened into a string, so callers decide how each failure is rendered. No retries happen
//! here.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Placeholder used when the service answers successfully but without summary text.
pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary returned";

/// Classified failure of a call to the summarization service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The endpoint could not be reached (connection refused, DNS failure, ...).
    #[error("Summarization service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The service is up but its model is still loading.
    #[error("Summarization model is still loading: {0}")]
    ModelLoading(String),
    /// Any other transport or remote error, including timeouts.
    #[error("Summarization request failed: {0}")]
    GenericFailure(String),
}

impl ServiceError {
    /// Stable machine-readable tag for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::ModelLoading(_) => "model_loading",
            Self::GenericFailure(_) => "generic_failure",
        }
    }

    /// Diagnostic detail captured when the failure was classified.
    pub fn detail(&self) -> &str {
        match self {
            Self::ServiceUnavailable(detail)
            | Self::ModelLoading(detail)
            | Self::GenericFailure(detail) => detail,
        }
    }

    /// Whether callers should degrade in place rather than fail the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::ModelLoading(_))
    }
}

/// Fixed generation parameters forwarded with every summarization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationParameters {
    /// Upper bound on the generated summary length (model tokens).
    pub max_length: u32,
    /// Lower bound on the generated summary length (model tokens).
    pub min_length: u32,
    /// Sampling is always disabled so summaries are deterministic.
    pub do_sample: bool,
}

impl GenerationParameters {
    /// Build deterministic parameters from the configured length range.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_length: config.summary_max_length,
            min_length: config.summary_min_length,
            do_sample: false,
        }
    }
}

/// Readiness information reported by `GET /health`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthReport {
    /// Status string reported by the sidecar (`"healthy"` when ready).
    #[serde(default)]
    pub status: Option<String>,
    /// Model identifier loaded by the sidecar.
    #[serde(default)]
    pub model: Option<String>,
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait SummarizerClient: Send + Sync {
    /// Summarize a single chunk of text.
    async fn summarize(&self, text: &str) -> Result<String, ServiceError>;

    /// Check that the service is reachable and ready.
    async fn probe(&self) -> Result<HealthReport, ServiceError>;

    /// Base URL of the service, for diagnostics.
    fn service_url(&self) -> &str;
}

/// HTTP client for the summarization sidecar.
pub struct HttpSummarizerClient {
    http: Client,
    base_url: String,
    parameters: GenerationParameters,
    summarize_timeout: Duration,
    health_timeout: Duration,
}

#[derive(Serialize)]
struct SummarizePayload<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    #[serde(default)]
    summary_text: Option<String>,
}

impl HttpSummarizerClient {
    /// Build a client from the injected configuration.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .user_agent(concat!("comply-summarize/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                ServiceError::GenericFailure(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self {
            http,
            base_url: config.ai_service_url.trim_end_matches('/').to_string(),
            parameters: GenerationParameters::from_config(config),
            summarize_timeout: config.summarize_timeout,
            health_timeout: config.health_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn classify_transport(&self, error: reqwest::Error, timeout: Duration) -> ServiceError {
        if error.is_connect() {
            ServiceError::ServiceUnavailable(format!(
                "cannot connect to {}: {error}",
                self.base_url
            ))
        } else if error.is_timeout() {
            ServiceError::GenericFailure(format!(
                "no response from {} within {}s",
                self.base_url,
                timeout.as_secs()
            ))
        } else {
            ServiceError::GenericFailure(error.to_string())
        }
    }
}

/// Classify a non-success HTTP response from the sidecar.
fn classify_status(status: StatusCode, body: &str) -> ServiceError {
    let reports_loading = body.to_lowercase().contains("loading");
    if status == StatusCode::SERVICE_UNAVAILABLE || reports_loading {
        ServiceError::ModelLoading(format!("service returned {status}: {body}"))
    } else {
        ServiceError::GenericFailure(format!("service returned {status}: {body}"))
    }
}

/// Pull the first `summary_text` out of a sidecar response body.
fn extract_summary_text(body: &str) -> Result<String, ServiceError> {
    let items: Vec<SummaryItem> = serde_json::from_str(body).map_err(|error| {
        ServiceError::GenericFailure(format!("malformed summarization response: {error}"))
    })?;
    let summary = items
        .into_iter()
        .next()
        .and_then(|item| item.summary_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_SUMMARY_PLACEHOLDER.to_string());
    Ok(summary)
}

#[async_trait]
impl SummarizerClient for HttpSummarizerClient {
    async fn summarize(&self, text: &str) -> Result<String, ServiceError> {
        let payload = SummarizePayload {
            inputs: text,
            parameters: self.parameters,
        };
        tracing::debug!(
            words = text.split_whitespace().count(),
            max_length = self.parameters.max_length,
            min_length = self.parameters.min_length,
            "Requesting chunk summary"
        );

        let response = self
            .http
            .post(self.endpoint("summarize"))
            .timeout(self.summarize_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| self.classify_transport(error, self.summarize_timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| self.classify_transport(error, self.summarize_timeout))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let summary = extract_summary_text(&body)?;
        if summary == NO_SUMMARY_PLACEHOLDER {
            tracing::warn!("Summarization service returned no summary text");
        }
        Ok(summary)
    }

    async fn probe(&self) -> Result<HealthReport, ServiceError> {
        let response = self
            .http
            .get(self.endpoint("health"))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|error| self.classify_transport(error, self.health_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        // The sidecar's payload shape is informative only; reachability is what matters.
        let report = response.json::<HealthReport>().await.unwrap_or_default();
        Ok(report)
    }

    fn service_url(&self) -> &str {
        &self.base_url
    }
}
