//! Single-modality proxy endpoints
//!
//! Each forwards one payload to its classifier service and wraps the outcome
//! in a `{status, service, data|error}` envelope. Service failures are
//! reported in the envelope, never as HTTP errors.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Request, State},
    http::header,
    Form, Json,
};
use np_common::api::read_uploads;
use np_common::{ClassifierOutput, Modality};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::{ClassifierClientError, Upload};
use crate::AppState;

/// Outcome of one proxied classifier call
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProxyResult {
    Success {
        service: Modality,
        data: ClassifierOutput,
    },
    Error {
        service: Modality,
        error: String,
    },
}

impl ProxyResult {
    pub fn from_call(
        service: Modality,
        result: Result<ClassifierOutput, ClassifierClientError>,
    ) -> Self {
        match result {
            Ok(data) => ProxyResult::Success { service, data },
            Err(e) => {
                warn!(service = %service, "Proxied request failed: {}", e);
                ProxyResult::Error {
                    service,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Proxy endpoint response
#[derive(Debug, Clone, Serialize)]
pub struct ProxyResponse {
    #[serde(rename = "type")]
    pub kind: Modality,
    /// Submitted text (text endpoint only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Uploaded filename (audio/face endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub result: ProxyResult,
}

#[derive(Debug, Default, Deserialize)]
struct TextInput {
    #[serde(default)]
    text: Option<String>,
}

/// `text` from a JSON body, or from a url-encoded form
async fn read_text(request: Request) -> String {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    let input = if is_form {
        Form::<TextInput>::from_request(request, &())
            .await
            .map(|Form(input)| input)
            .unwrap_or_default()
    } else {
        match Bytes::from_request(request, &()).await {
            Ok(body) => serde_json::from_slice::<TextInput>(&body).unwrap_or_default(),
            Err(_) => TextInput::default(),
        }
    };

    input.text.unwrap_or_default()
}

/// POST /api/text
///
/// The text service performs validation; an empty text comes back as an
/// error envelope.
pub async fn proxy_text(State(state): State<AppState>, request: Request) -> Json<ProxyResponse> {
    let text = read_text(request).await;
    debug!(chars = text.chars().count(), "Proxying text analysis");

    let result = state.services.analyze_text(&text).await;

    Json(ProxyResponse {
        kind: Modality::Text,
        input: Some(text),
        filename: None,
        result: ProxyResult::from_call(Modality::Text, result),
    })
}

/// The multipart `file` part, required by the audio and face proxies
pub(crate) async fn required_file(
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Upload> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let file = read_uploads(multipart)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .into_iter()
        .find(|part| part.field == "file")
        .ok_or_else(|| ApiError::BadRequest("Missing multipart field 'file'".to_string()))?;

    Ok(Upload {
        filename: file.filename,
        content_type: file.content_type,
        bytes: file.bytes.to_vec(),
    })
}

/// POST /api/audio
pub async fn proxy_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ProxyResponse>> {
    let upload = required_file(multipart).await?;
    let filename = upload.filename.clone();
    debug!(bytes = upload.bytes.len(), "Proxying audio analysis");

    let result = state.services.analyze_audio(upload).await;

    Ok(Json(ProxyResponse {
        kind: Modality::Audio,
        input: None,
        filename,
        result: ProxyResult::from_call(Modality::Audio, result),
    }))
}

/// POST /api/face
pub async fn proxy_face(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ProxyResponse>> {
    let mut upload = required_file(multipart).await?;
    let filename = upload.filename.take();
    debug!(bytes = upload.bytes.len(), "Proxying face analysis");

    // Forwarded under a fixed name
    let result = state.services.analyze_face(upload).await;

    Ok(Json(ProxyResponse {
        kind: Modality::Face,
        input: None,
        filename,
        result: ProxyResult::from_call(Modality::Face, result),
    }))
}
