//! Fusion endpoints
//!
//! `/api/fusion` fuses classifier results the client already holds;
//! `/api/analyze` fetches them itself, calling the requested services
//! concurrently before fusing.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use np_common::api::read_uploads;
use np_common::{ClassifierOutput, FusedResult, Modality, SourceResult, StressLevel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::{ClassifierClientError, SummaryInput, Upload};
use crate::AppState;

/// POST /api/fusion request body
///
/// Each field is a classifier-service response; missing, null or malformed
/// entries count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct FusionRequest {
    #[serde(default)]
    pub text_result: Option<Value>,
    #[serde(default)]
    pub face_result: Option<Value>,
    #[serde(default)]
    pub audio_result: Option<Value>,
}

/// Stress of each usable source on its own (display only)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceStress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<f64>,
}

/// Fused result plus presentation extras
#[derive(Debug, Clone, Serialize)]
pub struct FusionResponse {
    #[serde(flatten)]
    pub fused: FusedResult,
    pub stress_level: StressLevel,
    pub source_stress: SourceStress,
    /// Present only when at least one source contributed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_summary: Option<String>,
}

/// Fuse three sources and attach the stress band, per-source stress and summary
pub async fn fuse_sources(
    state: &AppState,
    text: SourceResult,
    face: SourceResult,
    audio: SourceResult,
) -> FusionResponse {
    let fused = state.fusion.fuse(&text, &face, &audio);

    let source_stress = SourceStress {
        text: state.fusion.source_stress(&text),
        face: state.fusion.source_stress(&face),
        audio: state.fusion.source_stress(&audio),
    };

    let llm_summary = if fused.has_signal() {
        let input = SummaryInput {
            text: text.output(),
            audio: audio.output(),
            face: face.output(),
            stress: fused.stress,
        };
        Some(state.advisor.emotion_summary(&input).await)
    } else {
        None
    };

    FusionResponse {
        stress_level: fused.stress_level(),
        fused,
        source_stress,
        llm_summary,
    }
}

/// POST /api/fusion
///
/// An empty body fuses nothing and yields the neutral default.
pub async fn fusion(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<FusionResponse>> {
    let request: FusionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FusionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid fusion request: {}", e)))?
    };

    let response = fuse_sources(
        &state,
        SourceResult::from_json(request.text_result),
        SourceResult::from_json(request.face_result),
        SourceResult::from_json(request.audio_result),
    )
    .await;

    Ok(Json(response))
}

/// Payloads collected from an `/api/analyze` multipart body
#[derive(Debug, Default)]
struct AnalyzeRequest {
    text: Option<String>,
    audio: Option<Upload>,
    image: Option<Upload>,
}

impl AnalyzeRequest {
    fn is_empty(&self) -> bool {
        self.text.is_none() && self.audio.is_none() && self.image.is_none()
    }
}

/// Await an optional classifier call; failures become `Absent`
async fn collect_source<F>(modality: Modality, call: Option<F>) -> SourceResult
where
    F: Future<Output = Result<ClassifierOutput, ClassifierClientError>>,
{
    let Some(call) = call else {
        return SourceResult::Absent;
    };

    match call.await {
        Ok(output) => SourceResult::Present(output),
        Err(e) => {
            warn!(service = %modality, "Source unavailable, excluded from fusion: {}", e);
            SourceResult::Absent
        }
    }
}

/// POST /api/analyze
///
/// Multipart with optional `text`, `audio` and `image` parts. Requested
/// services are called concurrently, each under its own timeout; whichever
/// complete are fused.
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<FusionResponse>> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let parts = read_uploads(multipart)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut request = AnalyzeRequest::default();
    for part in parts {
        if part.bytes.is_empty() {
            continue;
        }
        match part.field.as_str() {
            "text" => {
                let text = String::from_utf8_lossy(&part.bytes).trim().to_string();
                if !text.is_empty() {
                    request.text = Some(text);
                }
            }
            "audio" | "image" => {
                let upload = Upload {
                    filename: part.filename,
                    content_type: part.content_type,
                    bytes: part.bytes.to_vec(),
                };
                if part.field == "audio" {
                    request.audio = Some(upload);
                } else {
                    request.image = Some(upload);
                }
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    if request.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide at least one of 'text', 'audio' or 'image'".to_string(),
        ));
    }

    let analysis_id = Uuid::new_v4();
    info!(
        %analysis_id,
        text = request.text.is_some(),
        audio = request.audio.is_some(),
        image = request.image.is_some(),
        "Starting multi-modal analysis"
    );

    let services = &state.services;
    let (text, audio, face) = tokio::join!(
        collect_source(
            Modality::Text,
            request.text.as_deref().map(|t| services.analyze_text(t))
        ),
        collect_source(
            Modality::Audio,
            request.audio.map(|u| services.analyze_audio(u))
        ),
        collect_source(
            Modality::Face,
            request.image.map(|u| services.analyze_face(u))
        ),
    );

    let response = fuse_sources(&state, text, face, audio).await;

    info!(
        %analysis_id,
        combined_emotion = %response.fused.combined_emotion,
        stress = response.fused.stress,
        "Multi-modal analysis complete"
    );

    Ok(Json(response))
}
