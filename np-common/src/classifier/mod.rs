//! Classifier model handles
//!
//! Each inference service owns one [`ModelHandle`], built once at startup and
//! shared read-only by every request for the lifetime of the process.

mod inference_api;

pub use inference_api::InferenceApiClassifier;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::fusion::{ClassifierOutput, EmotionPrediction};
use crate::{Error, Result};

/// Payload handed to a classifier
#[derive(Debug, Clone)]
pub enum ClassifierInput {
    Text(String),
    Audio(Vec<u8>),
    Image(Vec<u8>),
}

impl ClassifierInput {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierInput::Text(_) => "text",
            ClassifierInput::Audio(_) => "audio",
            ClassifierInput::Image(_) => "image",
        }
    }
}

/// Black-box emotion classifier returning one score per label
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Model identifier reported by the service
    fn model_name(&self) -> &str;

    /// Labels the model can emit (may be empty if unknown)
    fn labels(&self) -> &[String];

    /// Run inference; predictions may come back in any order
    async fn classify(&self, input: ClassifierInput) -> Result<Vec<EmotionPrediction>>;
}

/// Loaded model plus the metadata the service reports about it
pub struct ModelHandle {
    classifier: Arc<dyn EmotionClassifier>,
    description: String,
    loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    pub fn new(classifier: Arc<dyn EmotionClassifier>, description: impl Into<String>) -> Self {
        Self {
            classifier,
            description: description.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Handle over the HTTP inference backend described by `config`
    pub fn from_inference_api(config: &ModelConfig, description: impl Into<String>) -> Result<Self> {
        let classifier = InferenceApiClassifier::new(config, config.api_token())?;
        Ok(Self::new(Arc::new(classifier), description))
    }

    pub fn model_name(&self) -> &str {
        self.classifier.model_name()
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Classify and rank, producing the service response body
    pub async fn predict(&self, input: ClassifierInput) -> Result<ClassifierOutput> {
        let kind = input.kind();
        let predictions = self.classifier.classify(input).await?;
        let output = rank_predictions(predictions)?;

        tracing::debug!(
            input = kind,
            top_emotion = output.top_emotion.as_deref().unwrap_or(""),
            confidence = output.confidence.unwrap_or(0.0),
            "Prediction complete"
        );

        Ok(output)
    }
}

/// Sort by descending score (stable) and fill in the top emotion
pub fn rank_predictions(mut predictions: Vec<EmotionPrediction>) -> Result<ClassifierOutput> {
    if predictions.is_empty() {
        return Err(Error::Inference(
            "Unexpected result format from model".to_string(),
        ));
    }
    if let Some(bad) = predictions.iter().find(|p| !p.score.is_finite()) {
        return Err(Error::Inference(format!(
            "Model returned non-finite score for '{}'",
            bad.label
        )));
    }

    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ClassifierOutput::from_ranked(predictions))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        labels: Vec<String>,
        scores: Vec<f64>,
    }

    #[async_trait]
    impl EmotionClassifier for FixedClassifier {
        fn model_name(&self) -> &str {
            "fixed"
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        async fn classify(&self, _input: ClassifierInput) -> Result<Vec<EmotionPrediction>> {
            Ok(self
                .labels
                .iter()
                .zip(&self.scores)
                .map(|(label, score)| EmotionPrediction::new(label.clone(), *score))
                .collect())
        }
    }

    #[test]
    fn test_rank_predictions_sorts_descending() {
        let output = rank_predictions(vec![
            EmotionPrediction::new("neutral", 0.1),
            EmotionPrediction::new("anger", 0.7),
            EmotionPrediction::new("fear", 0.2),
        ])
        .unwrap();

        let labels: Vec<_> = output.predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["anger", "fear", "neutral"]);
        assert_eq!(output.top_emotion.as_deref(), Some("anger"));
        assert_eq!(output.confidence, Some(0.7));
    }

    #[test]
    fn test_rank_predictions_rejects_empty() {
        assert!(rank_predictions(vec![]).is_err());
    }

    #[test]
    fn test_rank_predictions_rejects_nan() {
        assert!(rank_predictions(vec![EmotionPrediction::new("joy", f64::NAN)]).is_err());
    }

    #[tokio::test]
    async fn test_model_handle_predict() {
        let classifier = FixedClassifier {
            labels: vec!["happy".to_string(), "sad".to_string()],
            scores: vec![0.24, 0.76],
        };
        let handle = ModelHandle::new(Arc::new(classifier), "test model");

        assert_eq!(handle.model_name(), "fixed");
        assert_eq!(handle.labels().len(), 2);

        let output = handle
            .predict(ClassifierInput::Image(vec![0u8; 4]))
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.top_emotion.as_deref(), Some("sad"));
    }
}
