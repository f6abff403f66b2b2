//! np-face - Facial Emotion Analysis microservice
//!
//! **Module Identity:**
//! - Name: np-face (Face Emotion)
//! - Port: 5002 (default)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use np_face::{build_router, DEFAULT_MODEL, DEFAULT_PORT, FACE_LABELS, IDENTITY};
use np_common::api::{serve, ServiceState};
use np_common::classifier::ModelHandle;
use np_common::config::{load_toml_config, resolve_config_path, ServiceToml};
use np_common::logging::init_tracing;
use tracing::{error, info, warn};

const MODEL_DESCRIPTION: &str = "Vision Transformer fine-tuned for facial expression recognition (7 labels)";

/// Command-line arguments for np-face
#[derive(Parser, Debug)]
#[command(name = "np-face")]
#[command(about = "Facial emotion analysis microservice for NeuroPulse")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NP_FACE_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "NP_FACE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "NP_CONFIG")]
    config: Option<PathBuf>,

    /// Inference endpoint URL (overrides `[model] endpoint`)
    #[arg(long, env = "NP_FACE_MODEL_ENDPOINT")]
    model_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), IDENTITY.module);
    let loaded = load_toml_config::<ServiceToml>(config_path.as_deref())
        .context("Failed to load configuration")?;
    let toml = loaded.config;

    init_tracing(&toml.logging);

    info!(
        "Starting NeuroPulse Face Emotion ({}) v{} [{}] built {} ({})",
        IDENTITY.module,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Configuration: {}", loaded.source);

    let port = args.port.or(toml.port).unwrap_or(DEFAULT_PORT);
    let bind_addr = args
        .bind_addr
        .or(toml.bind_addr)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let model_config = toml
        .model
        .resolve(DEFAULT_MODEL, &FACE_LABELS, args.model_endpoint);

    let model = match ModelHandle::from_inference_api(&model_config, MODEL_DESCRIPTION) {
        Ok(model) => {
            info!("✓ Model ready: {}", model.model_name());
            Some(model)
        }
        Err(e) => {
            error!("Failed to load model: {}", e);
            warn!("Starting without a model; analysis requests will fail until restart");
            None
        }
    };

    let state = ServiceState::new(IDENTITY, model, np_common::build_info!());
    let app = build_router(state);

    serve(app, &bind_addr, port).await.context("Server error")?;

    Ok(())
}
