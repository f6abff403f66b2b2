//! Wellbeing tips endpoint

use axum::{body::Bytes, extract::State, Json};
use tracing::warn;

use crate::services::{TipsRequest, TipsResponse};
use crate::AppState;

/// POST /api/generate-tips
///
/// Always answers 200: an unreadable body or a failed generation yields the
/// canned tips.
pub async fn generate_tips(State(state): State<AppState>, body: Bytes) -> Json<TipsResponse> {
    let request: TipsRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unreadable tips request, returning fallback tips: {}", e);
            return Json(TipsResponse::fallback());
        }
    };

    Json(state.advisor.tips(&request).await)
}
