//! Shared HTTP API functionality
//!
//! Used by all NeuroPulse microservices:
//! - np-gateway (API Gateway)
//! - np-text (Text Emotion)
//! - np-audio (Audio Emotion)
//! - np-face (Face Emotion)
//!
//! The three classifier services expose an identical metadata surface
//! (`/api/health`, `/api/emotions`, `/api/model-info`, `/api/buildinfo`),
//! provided here by [`service::model_routes`].

pub mod server;
pub mod service;
pub mod types;

pub use server::{serve, shutdown_signal, with_http_layers, MAX_UPLOAD_BYTES};
pub use service::{
    model_routes, read_uploads, ServiceError, ServiceIdentity, ServiceState, UploadedFile,
};
pub use types::{BuildInfo, EmotionsResponse, HealthResponse, ModelInfoResponse};

/// Build identification of the calling crate
///
/// Expands in the caller so `CARGO_PKG_VERSION` and the `build.rs` values
/// (`GIT_HASH`, `BUILD_TIMESTAMP`, `BUILD_PROFILE`) belong to that binary.
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::api::BuildInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
            build_timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown").to_string(),
            build_profile: option_env!("BUILD_PROFILE").unwrap_or("unknown").to_string(),
        }
    };
}
