//! Integration tests for np-text API endpoints
//!
//! Tests cover:
//! - Text analysis with the lexicon backend
//! - Input validation (missing, blank, oversized, non-JSON)
//! - Model-not-loaded behavior
//! - Shared metadata endpoints

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use np_common::api::ServiceState;
use np_common::classifier::ModelHandle;
use np_text::{build_router, LexiconClassifier, IDENTITY, MAX_TEXT_CHARS};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: Create app backed by the lexicon classifier
fn setup_app() -> axum::Router {
    let model = ModelHandle::new(Arc::new(LexiconClassifier::new()), "test lexicon");
    build_router(ServiceState::new(IDENTITY, Some(model), np_common::build_info!()))
}

/// Test helper: Create app without a model
fn setup_app_without_model() -> axum::Router {
    build_router(ServiceState::new(IDENTITY, None, np_common::build_info!()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Analysis
// =============================================================================

#[tokio::test]
async fn test_analyze_text_success() {
    let app = setup_app();

    let response = app
        .oneshot(post_json(
            "/api/analyze-text",
            json!({"text": "  I feel so sad and lonely today  "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["top_emotion"], "sadness");
    // Trimmed length
    assert_eq!(body["text_length"], 30);

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 7);
    let scores: Vec<f64> = predictions
        .iter()
        .map(|p| p["score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "ranked descending");
    assert_eq!(body["confidence"].as_f64().unwrap(), scores[0]);
}

#[tokio::test]
async fn test_analyze_text_missing_field() {
    let app = setup_app();

    let response = app
        .oneshot(post_json("/api/analyze-text", json!({"message": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No text provided. Send JSON with \"text\" field.");
}

#[tokio::test]
async fn test_analyze_text_non_json_body() {
    let app = setup_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze-text")
        .body(Body::from("text=hello"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_text_empty() {
    let app = setup_app();

    let response = app
        .oneshot(post_json("/api/analyze-text", json!({"text": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Text cannot be empty");
}

#[tokio::test]
async fn test_analyze_text_too_long() {
    let app = setup_app();

    let text = "a".repeat(MAX_TEXT_CHARS + 1);
    let response = app
        .oneshot(post_json("/api/analyze-text", json!({ "text": text })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Text too long. Maximum 5000 characters.");
}

#[tokio::test]
async fn test_analyze_text_without_model() {
    let app = setup_app_without_model();

    let response = app
        .oneshot(post_json("/api/analyze-text", json!({"text": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Model not loaded");
}

// =============================================================================
// Metadata
// =============================================================================

#[tokio::test]
async fn test_health_reports_text_service() {
    let app = setup_app();

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "np-text");
    assert_eq!(body["type"], "text-emotion-analysis");
    assert_eq!(body["model"], "lexicon");
}

#[tokio::test]
async fn test_emotions_lists_seven_labels() {
    let app = setup_app();

    let request = Request::builder()
        .uri("/api/emotions")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 7);
    assert!(body["emotions"]
        .as_array()
        .unwrap()
        .contains(&json!("sadness")));
}

#[tokio::test]
async fn test_buildinfo() {
    let app = setup_app();

    let request = Request::builder()
        .uri("/api/buildinfo")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
}
