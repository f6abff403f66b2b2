//! # NeuroPulse Common Library
//!
//! Shared code for all NeuroPulse microservices including:
//! - Emotion prediction types and the multi-source fusion engine
//! - The classifier model-handle abstraction used by the inference services
//! - Shared HTTP surface for classifier services (health, emotions, model info)
//! - Configuration loading and logging setup

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fusion;
pub mod logging;

pub use error::{Error, Result};
pub use fusion::{
    compute_stress, ClassifierOutput, EmotionPrediction, FusedResult, FusionEngine, Modality,
    SourceResult, SourceWeights, StressLevel,
};
