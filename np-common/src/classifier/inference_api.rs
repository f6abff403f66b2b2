//! HTTP inference backend
//!
//! Talks to a hosted-inference endpoint that accepts `{"inputs": "<text>"}` for
//! text models and raw bytes for audio/image models, and answers with
//! `[{label, score}]` or `[[{label, score}]]` (Hugging Face inference API shape).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{ClassifierInput, EmotionClassifier};
use crate::config::ModelConfig;
use crate::fusion::EmotionPrediction;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("NeuroPulse/", env!("CARGO_PKG_VERSION"));

/// Accepted response shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<EmotionPrediction>>),
    Flat(Vec<EmotionPrediction>),
    Failure { error: String },
}

/// Classifier backed by a remote inference endpoint
pub struct InferenceApiClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    model_name: String,
    labels: Vec<String>,
}

impl InferenceApiClassifier {
    /// Build the client; fails if no endpoint is configured
    pub fn new(config: &ModelConfig, api_token: Option<String>) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            Error::Config(format!("No inference endpoint configured for model {}", config.name))
        })?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            api_token,
            model_name: config.name.clone(),
            labels: config.labels.clone(),
        })
    }

    fn parse_response(body: &str) -> Result<Vec<EmotionPrediction>> {
        let parsed: InferenceResponse = serde_json::from_str(body)
            .map_err(|e| Error::Inference(format!("Unexpected response format: {}", e)))?;

        match parsed {
            InferenceResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(batches.swap_remove(0))
            }
            InferenceResponse::Flat(predictions) => Ok(predictions),
            InferenceResponse::Failure { error } => Err(Error::Inference(error)),
        }
    }
}

#[async_trait]
impl EmotionClassifier for InferenceApiClassifier {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn classify(&self, input: ClassifierInput) -> Result<Vec<EmotionPrediction>> {
        let mut request = self.http_client.post(&self.endpoint);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        request = match input {
            ClassifierInput::Text(text) => request.json(&json!({ "inputs": text })),
            ClassifierInput::Audio(bytes) | ClassifierInput::Image(bytes) => request
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model_name, "Calling inference endpoint");

        let response = request
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Inference request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Inference(format!("Failed to read inference response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Inference(format!(
                "Inference endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        Self::parse_response(&body)
    }
}
