//! np-text - Text Emotion Analysis microservice
//!
//! **Module Identity:**
//! - Name: np-text (Text Emotion)
//! - Port: 5001
//!
//! Classifies free text into the seven-label emotion set of the
//! DistilRoBERTa emotion model. The classifier is either the remote
//! inference backend or the offline [`lexicon::LexiconClassifier`].

use axum::{routing::post, Router};
use np_common::api::{model_routes, with_http_layers, ServiceIdentity, ServiceState};
use np_common::Modality;

pub mod api;
pub mod lexicon;

pub use api::{validate_text, MAX_TEXT_CHARS};
pub use lexicon::LexiconClassifier;

/// Module name reported on health checks
pub const MODULE_NAME: &str = "np-text";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5001;

/// Model served by the inference backend unless configured otherwise
pub const DEFAULT_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";

/// Label set of the default model
pub const TEXT_LABELS: [&str; 7] = [
    "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise",
];

pub const IDENTITY: ServiceIdentity = ServiceIdentity {
    module: MODULE_NAME,
    service_type: "text-emotion-analysis",
    modality: Modality::Text,
};

/// Build the application router
pub fn build_router(state: ServiceState) -> Router {
    let router = model_routes()
        .route("/api/analyze-text", post(api::analyze_text))
        .with_state(state);

    with_http_layers(router)
}
