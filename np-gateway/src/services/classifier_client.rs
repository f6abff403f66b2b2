//! Classifier service clients
//!
//! One [`ClassifierClient`] per service, all sharing a single `reqwest::Client`
//! connection pool. Every call carries its own timeout; there are no retries.

use np_common::{ClassifierOutput, Modality};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ServiceUrls;

/// Classifier client errors
#[derive(Debug, Error)]
pub enum ClassifierClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx answer; `message` is the service's `error` field when it sent one
    #[error("Service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// File forwarded to a classifier service
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Client for one classifier service
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    http_client: reqwest::Client,
    modality: Modality,
    base_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl ClassifierClient {
    pub fn new(
        http_client: reqwest::Client,
        modality: Modality,
        base_url: impl Into<String>,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            modality,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
            health_timeout,
        }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ClassifierOutput, ClassifierClientError> {
        self.send(self.http_client.post(self.url(path)).json(body))
            .await
    }

    /// POST a single file as multipart field `field`
    pub async fn post_file(
        &self,
        path: &str,
        field: &str,
        upload: Upload,
    ) -> Result<ClassifierOutput, ClassifierClientError> {
        let mut part = Part::bytes(upload.bytes);
        if let Some(filename) = upload.filename {
            part = part.file_name(filename);
        }
        if let Some(content_type) = upload.content_type {
            part = part
                .mime_str(&content_type)
                .map_err(|e| ClassifierClientError::Network(e.to_string()))?;
        }
        let form = Form::new().part(field.to_string(), part);

        self.send(self.http_client.post(self.url(path)).multipart(form))
            .await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ClassifierOutput, ClassifierClientError> {
        let response = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierClientError::Timeout(self.request_timeout)
                } else {
                    ClassifierClientError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierClientError::Timeout(self.request_timeout)
            } else {
                ClassifierClientError::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ClassifierOutput>(&body)
                .ok()
                .and_then(|output| output.error)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(ClassifierClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let output: ClassifierOutput = serde_json::from_str(&body)
            .map_err(|e| ClassifierClientError::Parse(e.to_string()))?;

        debug!(
            service = %self.modality,
            top_emotion = output.top_emotion.as_deref().unwrap_or(""),
            "Classifier responded"
        );

        Ok(output)
    }

    /// GET /api/health answered 200 within the health timeout
    pub async fn is_healthy(&self) -> bool {
        self.http_client
            .get(self.url("/api/health"))
            .timeout(self.health_timeout)
            .send()
            .await
            .map(|response| response.status() == reqwest::StatusCode::OK)
            .unwrap_or(false)
    }
}

#[derive(Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

/// Clients for the three classifier services
#[derive(Debug, Clone)]
pub struct ServiceClients {
    pub text: ClassifierClient,
    pub audio: ClassifierClient,
    pub face: ClassifierClient,
}

/// Liveness of each classifier service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub text_service: bool,
    pub audio_service: bool,
    pub face_service: bool,
}

impl ServiceClients {
    pub fn new(
        http_client: reqwest::Client,
        urls: &ServiceUrls,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> Self {
        let client = |modality, url: &str| {
            ClassifierClient::new(
                http_client.clone(),
                modality,
                url,
                request_timeout,
                health_timeout,
            )
        };

        Self {
            text: client(Modality::Text, &urls.text_url),
            audio: client(Modality::Audio, &urls.audio_url),
            face: client(Modality::Face, &urls.face_url),
        }
    }

    pub async fn analyze_text(&self, text: &str) -> Result<ClassifierOutput, ClassifierClientError> {
        self.text
            .post_json("/api/analyze-text", &TextPayload { text })
            .await
    }

    pub async fn analyze_audio(&self, upload: Upload) -> Result<ClassifierOutput, ClassifierClientError> {
        self.audio
            .post_file("/api/upload-and-predict", "audio", upload)
            .await
    }

    /// Forwarded as `image.jpg` unless the upload carries a name
    pub async fn analyze_face(&self, mut upload: Upload) -> Result<ClassifierOutput, ClassifierClientError> {
        if upload.filename.is_none() {
            upload.filename = Some("image.jpg".to_string());
        }
        self.face.post_file("/api/analyze-face", "image", upload).await
    }

    /// Probe all three services concurrently
    pub async fn health(&self) -> ServiceHealth {
        let (text_service, audio_service, face_service) = tokio::join!(
            self.text.is_healthy(),
            self.audio.is_healthy(),
            self.face.is_healthy(),
        );

        ServiceHealth {
            text_service,
            audio_service,
            face_service,
        }
    }
}
