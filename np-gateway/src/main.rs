//! np-gateway - NeuroPulse API Gateway
//!
//! **Module Identity:**
//! - Name: np-gateway (API Gateway)
//! - Port: 8000 (default)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use np_common::api::serve;
use np_common::config::{load_toml_config, resolve_config_path};
use np_common::logging::init_tracing;
use np_gateway::config::{GatewayToml, DEFAULT_PORT};
use np_gateway::services::OpenAiClient;
use np_gateway::{build_router, AppState, MODULE_NAME};
use tracing::{info, warn};

/// Command-line arguments for np-gateway
#[derive(Parser, Debug)]
#[command(name = "np-gateway")]
#[command(about = "API gateway and emotion fusion service for NeuroPulse")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NP_GATEWAY_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "NP_GATEWAY_BIND_ADDR")]
    bind_addr: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "NP_CONFIG")]
    config: Option<PathBuf>,

    /// Text emotion service base URL
    #[arg(long, env = "NP_TEXT_URL")]
    text_url: Option<String>,

    /// Audio emotion service base URL
    #[arg(long, env = "NP_AUDIO_URL")]
    audio_url: Option<String>,

    /// Face emotion service base URL
    #[arg(long, env = "NP_FACE_URL")]
    face_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let loaded = load_toml_config::<GatewayToml>(config_path.as_deref())
        .context("Failed to load configuration")?;
    let mut config = loaded.config;

    if let Some(url) = args.text_url {
        config.services.text_url = url;
    }
    if let Some(url) = args.audio_url {
        config.services.audio_url = url;
    }
    if let Some(url) = args.face_url {
        config.services.face_url = url;
    }

    init_tracing(&config.logging);

    info!(
        "Starting NeuroPulse Gateway ({}) v{} [{}] built {} ({})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Configuration: {}", loaded.source);
    info!(
        "Classifier services: text={} audio={} face={}",
        config.services.text_url, config.services.audio_url, config.services.face_url
    );
    info!(
        "Fusion weights: text={} face={} audio={}",
        config.fusion.weights.text, config.fusion.weights.face, config.fusion.weights.audio
    );

    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let bind_addr = args
        .bind_addr
        .or_else(|| config.bind_addr.clone())
        .unwrap_or_else(|| "127.0.0.1".to_string());

    let llm = OpenAiClient::new(&config.llm, config.llm.api_key())
        .context("Failed to create LLM client")?;
    if llm.has_api_key() {
        info!("✓ LLM ready: {} at {}", config.llm.model, config.llm.base_url);
    } else {
        warn!(
            "{} not set; summaries and tips will use canned fallbacks",
            config.llm.api_key_env
        );
    }

    let state = AppState::new(&config, Arc::new(llm), np_common::build_info!())
        .context("Failed to initialize gateway")?;
    let app = build_router(state);

    serve(app, &bind_addr, port).await.context("Server error")?;

    Ok(())
}
