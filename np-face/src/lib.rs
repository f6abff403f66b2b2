//! np-face - Facial Emotion Analysis microservice
//!
//! **Module Identity:**
//! - Name: np-face (Face Emotion)
//! - Port: 5002
//!
//! Classifies face images (single or batch) with a ViT facial-expression
//! model. Images arrive as multipart uploads or base64 JSON (webcam frames).

use axum::{
    routing::{get, post},
    Router,
};
use np_common::api::{model_routes, with_http_layers, ServiceIdentity, ServiceState};
use np_common::Modality;

pub mod api;

pub use api::{decode_base64_image, MAX_BATCH_IMAGES};

/// Module name reported on health checks
pub const MODULE_NAME: &str = "np-face";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5002;

/// Model served by the inference backend unless configured otherwise
pub const DEFAULT_MODEL: &str = "dima806/facial_emotions_image_detection";

/// Label set of the default model
pub const FACE_LABELS: [&str; 7] = ["sad", "disgust", "angry", "neutral", "fear", "surprise", "happy"];

pub const IDENTITY: ServiceIdentity = ServiceIdentity {
    module: MODULE_NAME,
    service_type: "face-emotion-analysis",
    modality: Modality::Face,
};

/// Build the application router
pub fn build_router(state: ServiceState) -> Router {
    let router = model_routes()
        .route("/api/analyze-face", post(api::analyze_face))
        .route("/api/analyze-batch", post(api::analyze_batch))
        .route("/api/test-image", get(api::usage))
        .with_state(state);

    with_http_layers(router)
}
