//! Classifier service state, errors and metadata routes

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use super::types::{BuildInfo, EmotionsResponse, HealthResponse, ModelInfoResponse};
use crate::classifier::ModelHandle;
use crate::fusion::Modality;

/// Static identity of a classifier service
#[derive(Debug, Clone, Copy)]
pub struct ServiceIdentity {
    /// Module name reported by health (e.g. "np-text")
    pub module: &'static str,
    /// Health `type` field (e.g. "text-emotion-analysis")
    pub service_type: &'static str,
    pub modality: Modality,
}

/// Shared state of a classifier service
#[derive(Clone)]
pub struct ServiceState {
    /// `None` when the model failed to load; the service still answers health checks
    pub model: Option<Arc<ModelHandle>>,
    pub identity: ServiceIdentity,
    pub build: BuildInfo,
    pub startup_time: DateTime<Utc>,
}

impl ServiceState {
    pub fn new(identity: ServiceIdentity, model: Option<ModelHandle>, build: BuildInfo) -> Self {
        Self {
            model: model.map(Arc::new),
            identity,
            build,
            startup_time: Utc::now(),
        }
    }

    /// The loaded model, or the "Model not loaded" error
    pub fn require_model(&self) -> Result<&ModelHandle, ServiceError> {
        self.model.as_deref().ok_or(ServiceError::ModelNotLoaded)
    }

    fn labels(&self) -> Vec<String> {
        self.model
            .as_ref()
            .map(|m| m.labels().to_vec())
            .unwrap_or_default()
    }
}

/// Classifier service error, rendered as `{"success": false, "error": ...}`
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Model failed to load at startup (500)
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// Inference failed (500)
    #[error("{0}")]
    Inference(String),
}

impl From<crate::Error> for ServiceError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::InvalidInput(msg) => ServiceError::BadRequest(msg),
            crate::Error::Inference(msg) => ServiceError::Inference(msg),
            err @ (crate::Error::Io(_) | crate::Error::Config(_)) => {
                ServiceError::Inference(err.to_string())
            }
        }
    }
}

impl From<MultipartError> for ServiceError {
    fn from(err: MultipartError) -> Self {
        ServiceError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::ModelNotLoaded | ServiceError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        match &self {
            ServiceError::BadRequest(msg) => warn!("Rejected request: {}", msg),
            ServiceError::ModelNotLoaded => warn!("Request received but model is not loaded"),
            ServiceError::Inference(msg) => error!("Inference failed: {}", msg),
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// One uploaded multipart file
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Drain a multipart body into memory
pub async fn read_uploads(mut multipart: Multipart) -> Result<Vec<UploadedFile>, ServiceError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        files.push(UploadedFile {
            field: name,
            filename,
            content_type,
            bytes,
        });
    }
    Ok(files)
}

/// GET /api/health
pub async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    let uptime = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    let status = if state.model.is_some() {
        "healthy"
    } else {
        "model_not_loaded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: state.identity.module.to_string(),
        version: state.build.version.clone(),
        model: state.model.as_ref().map(|m| m.model_name().to_string()),
        emotions: state.labels(),
        timestamp: Utc::now(),
        service_type: state.identity.service_type.to_string(),
        uptime_seconds: uptime,
    })
}

/// GET /api/emotions
pub async fn emotions(State(state): State<ServiceState>) -> Json<EmotionsResponse> {
    let emotions = state.labels();
    Json(EmotionsResponse {
        success: true,
        count: emotions.len(),
        emotions,
    })
}

/// GET /api/model-info
pub async fn model_info(
    State(state): State<ServiceState>,
) -> Result<Json<ModelInfoResponse>, ServiceError> {
    let model = state.require_model()?;
    Ok(Json(ModelInfoResponse {
        success: true,
        model_name: model.model_name().to_string(),
        modality: state.identity.modality.to_string(),
        emotions: model.labels().to_vec(),
        description: model.description().to_string(),
        loaded_at: model.loaded_at(),
    }))
}

/// GET /api/buildinfo
pub async fn buildinfo(State(state): State<ServiceState>) -> Json<BuildInfo> {
    Json(state.build.clone())
}

/// Metadata routes common to every classifier service
pub fn model_routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/emotions", get(emotions))
        .route("/api/model-info", get(model_info))
        .route("/api/buildinfo", get(buildinfo))
}
