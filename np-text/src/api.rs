//! Text analysis endpoint

use axum::{body::Bytes, extract::State, Json};
use np_common::api::{ServiceError, ServiceState};
use np_common::classifier::ClassifierInput;
use np_common::ClassifierOutput;
use serde::Deserialize;
use tracing::debug;

/// Longest accepted input, in characters
pub const MAX_TEXT_CHARS: usize = 5000;

/// POST /api/analyze-text request body
#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Trim and bounds-check the submitted text
pub fn validate_text(text: Option<&str>) -> Result<&str, ServiceError> {
    let text = text.ok_or_else(|| {
        ServiceError::BadRequest("No text provided. Send JSON with \"text\" field.".to_string())
    })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::BadRequest("Text cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ServiceError::BadRequest(format!(
            "Text too long. Maximum {} characters.",
            MAX_TEXT_CHARS
        )));
    }

    Ok(text)
}

/// POST /api/analyze-text
///
/// Body is parsed by hand so a missing or non-JSON body gets the same
/// `{success: false, error}` shape as the other validation failures.
pub async fn analyze_text(
    State(state): State<ServiceState>,
    body: Bytes,
) -> Result<Json<ClassifierOutput>, ServiceError> {
    let model = state.require_model()?;

    let request: Option<AnalyzeTextRequest> = serde_json::from_slice(&body).ok();
    let text = validate_text(request.as_ref().and_then(|r| r.text.as_deref()))?;
    let text_length = text.chars().count();

    debug!(text_length, "Analyzing text");

    let output = model
        .predict(ClassifierInput::Text(text.to_string()))
        .await?
        .with_extra("text_length", text_length);

    Ok(Json(output))
}
