//! Shared API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build information response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// Classifier service health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "model_not_loaded"
    pub status: String,
    pub module: String,
    pub version: String,
    /// Loaded model name, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub emotions: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub uptime_seconds: u64,
}

/// GET /api/emotions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionsResponse {
    pub success: bool,
    pub emotions: Vec<String>,
    pub count: usize,
}

/// GET /api/model-info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub success: bool,
    pub model_name: String,
    pub modality: String,
    pub emotions: Vec<String>,
    pub description: String,
    pub loaded_at: DateTime<Utc>,
}
