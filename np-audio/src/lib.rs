//! np-audio - Voice Emotion Analysis microservice
//!
//! **Module Identity:**
//! - Name: np-audio (Audio Emotion)
//! - Port: 5000
//!
//! Classifies uploaded voice clips with a wav2vec2 speech-emotion model.
//! Audio bytes are forwarded to the inference backend as-is; decoding and
//! resampling happen there.

use axum::{routing::post, Router};
use np_common::api::{model_routes, with_http_layers, ServiceIdentity, ServiceState};
use np_common::Modality;

pub mod api;

/// Module name reported on health checks
pub const MODULE_NAME: &str = "np-audio";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Model served by the inference backend unless configured otherwise
pub const DEFAULT_MODEL: &str = "ehcalabres/wav2vec2-lg-xlsr-en-speech-emotion-recognition";

/// Label set of the default model
pub const AUDIO_LABELS: [&str; 8] = [
    "angry", "calm", "disgust", "fearful", "happy", "neutral", "sad", "surprised",
];

pub const IDENTITY: ServiceIdentity = ServiceIdentity {
    module: MODULE_NAME,
    service_type: "audio-emotion-analysis",
    modality: Modality::Audio,
};

/// Build the application router
pub fn build_router(state: ServiceState) -> Router {
    let router = model_routes()
        .route("/api/upload-and-predict", post(api::upload_and_predict))
        .route("/api/predict-from-data", post(api::predict_from_data))
        .with_state(state);

    with_http_layers(router)
}
