//! Recommendation generator client
//!
//! Talks to an external text-generation endpoint: `POST {endpoint}` with
//! `{"prompt": ...}`, answered by `{"recommendations": "..."}`.

use async_trait::async_trait;
use dramawave_common::config::RecommendationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("DramaWave/", env!("CARGO_PKG_VERSION"));

/// Prompt for the daily card
pub const DAILY_PROMPT: &str = "You are a content recommendation expert. Research and list the \
popular K-dramas (doramas) that are currently airing, i.e. shows broadcasting new episodes now.";

/// Generator errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Recommendation endpoint not configured")]
    NotConfigured,
}

impl GeneratorError {
    /// Rate-limit or quota exhaustion, by status or by message
    pub fn is_quota(&self) -> bool {
        match self {
            GeneratorError::QuotaExceeded(_) => true,
            GeneratorError::Api(429, _) => true,
            GeneratorError::NotConfigured => false,
            other => {
                let message = other.to_string();
                message.contains("429")
                    || message.to_lowercase().contains("quota")
                    || message.contains("RESOURCE_EXHAUSTED")
            }
        }
    }
}

/// Produces the daily recommendation text
#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// False when calling `generate` can only fail
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    recommendations: String,
}

/// HTTP generator client
pub struct HttpRecommendationGenerator {
    http_client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl HttpRecommendationGenerator {
    pub fn new(config: &RecommendationConfig) -> Result<Self, GeneratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone().filter(|e| !e.trim().is_empty()),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl RecommendationGenerator for HttpRecommendationGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let endpoint = self.endpoint.as_deref().ok_or(GeneratorError::NotConfigured)?;

        tracing::debug!(endpoint = endpoint, "Requesting daily recommendation");

        let mut request = self
            .http_client
            .post(endpoint)
            .json(&GenerateRequest { prompt });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::QuotaExceeded(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api(status.as_u16(), body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        tracing::info!(
            chars = parsed.recommendations.len(),
            "Daily recommendation generated"
        );
        Ok(parsed.recommendations)
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}
