//! np-gateway - NeuroPulse API Gateway
//!
//! **Module Identity:**
//! - Name: np-gateway (API Gateway)
//! - Port: 8000
//!
//! Single entry point for the frontend: proxies single-modality requests to
//! the classifier services, fuses their results into one emotion/stress
//! estimate, and asks the LLM for a wellbeing summary and tips.

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use np_common::api::{with_http_layers, BuildInfo};
use np_common::FusionEngine;
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod services;

use config::GatewayToml;
use services::{Advisor, ServiceClients, TextGenerator};

/// Module name reported on health checks
pub const MODULE_NAME: &str = "np-gateway";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Classifier service clients (one shared connection pool)
    pub services: Arc<ServiceClients>,
    pub fusion: Arc<FusionEngine>,
    pub advisor: Arc<Advisor>,
    pub build: BuildInfo,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build the state from configuration and a text generator
    pub fn new(
        config: &GatewayToml,
        generator: Arc<dyn TextGenerator>,
        build: BuildInfo,
    ) -> np_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("NeuroPulse-Gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| np_common::Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let services = ServiceClients::new(
            http_client,
            &config.services,
            config.request_timeout(),
            config.health_timeout(),
        );

        Ok(Self {
            services: Arc::new(services),
            fusion: Arc::new(config.fusion.engine()?),
            advisor: Arc::new(Advisor::new(generator, config.llm.clone())),
            build,
            startup_time: Utc::now(),
        })
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(api::health::health))
        .route("/api/buildinfo", get(api::health::buildinfo))
        .route("/api/text", post(api::proxy::proxy_text))
        .route("/api/audio", post(api::proxy::proxy_audio))
        .route("/api/face", post(api::proxy::proxy_face))
        .route("/api/fusion", post(api::fusion::fusion))
        .route("/api/analyze", post(api::fusion::analyze))
        .route("/api/generate-tips", post(api::tips::generate_tips))
        .with_state(state);

    with_http_layers(router)
}
