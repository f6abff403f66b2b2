//! Multi-source emotion fusion
//!
//! Combines the label distributions reported by the text, face and audio
//! classifiers into a single distribution and derives a stress score from it.
//!
//! Flow: classifier JSON -> [`SourceResult`] -> [`FusionEngine::fuse`] -> [`FusedResult`]

pub mod engine;
pub mod labels;
pub mod stress;

pub use engine::{FusionEngine, FusionError};
pub use labels::LabelNormalizer;
pub use stress::{compute_stress, is_negative_emotion, StressLevel, NEGATIVE_EMOTIONS};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Label reported when no usable signal exists
pub const NEUTRAL_LABEL: &str = "neutral";

/// Confidence reported with the no-signal neutral default
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Analyzed signal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Face,
    Audio,
}

impl Modality {
    /// Fusion order: sources are accumulated in this order, which fixes tie-breaks
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Face, Modality::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Face => "face",
            Modality::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (label, score) pair emitted by a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

impl EmotionPrediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Response body of every classifier service
///
/// Unknown fields (`text_length`, `filename`, ...) are kept in `extra` so the
/// payload can be echoed back unchanged for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub predictions: Vec<EmotionPrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClassifierOutput {
    /// Successful output from predictions already ranked by descending score
    pub fn from_ranked(predictions: Vec<EmotionPrediction>) -> Self {
        let top = predictions.first();
        Self {
            success: true,
            top_emotion: top.map(|p| p.label.clone()),
            confidence: top.map(|p| p.score),
            predictions,
            error: None,
            extra: Map::new(),
        }
    }

    /// Failed output carrying an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            predictions: Vec::new(),
            top_emotion: None,
            confidence: None,
            error: Some(error.into()),
            extra: Map::new(),
        }
    }

    /// Attach an extra response field (e.g. `text_length`)
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One modality's contribution to a fusion call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SourceResult {
    /// Not requested, or the service call failed
    #[default]
    Absent,
    /// The service responded (possibly reporting failure)
    Present(ClassifierOutput),
}

impl SourceResult {
    /// Interpret a raw JSON payload; null and unparsable payloads become `Absent`
    pub fn from_json(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => SourceResult::Absent,
            Some(raw) => match serde_json::from_value::<ClassifierOutput>(raw) {
                Ok(output) => SourceResult::Present(output),
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed classifier payload treated as absent");
                    SourceResult::Absent
                }
            },
        }
    }

    pub fn from_output(output: Option<ClassifierOutput>) -> Self {
        output.map_or(SourceResult::Absent, SourceResult::Present)
    }

    pub fn output(&self) -> Option<&ClassifierOutput> {
        match self {
            SourceResult::Absent => None,
            SourceResult::Present(output) => Some(output),
        }
    }

    /// Predictions that may take part in fusion
    ///
    /// `None` for absent sources, sources reporting failure, and malformed
    /// sources (empty prediction list, an empty label, or a finite score
    /// outside [0, 1]). Non-finite scores are left to the engine, which
    /// reports them as a fusion error.
    pub fn usable_predictions(&self) -> Option<&[EmotionPrediction]> {
        let output = self.output()?;
        if !output.success || output.predictions.is_empty() {
            return None;
        }
        let malformed = output.predictions.iter().any(|p| {
            p.label.trim().is_empty() || (p.score.is_finite() && !(0.0..=1.0).contains(&p.score))
        });
        if malformed {
            return None;
        }
        Some(&output.predictions)
    }
}

/// Configured per-modality weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    pub text: f64,
    pub face: f64,
    pub audio: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            text: 0.4,
            face: 0.4,
            audio: 0.2,
        }
    }
}

impl SourceWeights {
    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text,
            Modality::Face => self.face,
            Modality::Audio => self.audio,
        }
    }

    /// Reject negative or non-finite weights
    pub fn validate(&self) -> crate::Result<()> {
        for modality in Modality::ALL {
            let weight = self.get(modality);
            if !weight.is_finite() || weight < 0.0 {
                return Err(crate::Error::Config(format!(
                    "{} weight must be a finite non-negative number, got {}",
                    modality, weight
                )));
            }
        }
        Ok(())
    }
}

/// Normalized weights reported with a fused result
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModalityWeights {
    pub text: f64,
    pub face: f64,
    pub audio: f64,
}

impl ModalityWeights {
    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text,
            Modality::Face => self.face,
            Modality::Audio => self.audio,
        }
    }

    pub fn set(&mut self, modality: Modality, weight: f64) {
        match modality {
            Modality::Text => self.text = weight,
            Modality::Face => self.face = weight,
            Modality::Audio => self.audio = weight,
        }
    }

    pub fn total(&self) -> f64 {
        self.text + self.face + self.audio
    }
}

/// Ranked label distribution
///
/// Serialized as a JSON object whose key order is the rank order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution(Vec<EmotionPrediction>);

impl Distribution {
    /// Wrap predictions that are already ranked
    pub fn from_ranked(predictions: Vec<EmotionPrediction>) -> Self {
        Self(predictions)
    }

    /// `{neutral: 1.0}`
    pub fn neutral() -> Self {
        Self(vec![EmotionPrediction::new(NEUTRAL_LABEL, 1.0)])
    }

    pub fn top(&self) -> Option<&EmotionPrediction> {
        self.0.first()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|p| p.label == label).map(|p| p.score)
    }

    pub fn as_slice(&self) -> &[EmotionPrediction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|p| p.score).sum()
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for prediction in &self.0 {
            map.serialize_entry(&prediction.label, &prediction.score)?;
        }
        map.end()
    }
}

/// Raw per-source payloads echoed back with the fused result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SourceTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<ClassifierOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<ClassifierOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<ClassifierOutput>,
}

impl SourceTrace {
    pub fn capture(text: &SourceResult, face: &SourceResult, audio: &SourceResult) -> Self {
        Self {
            text: text.output().cloned(),
            face: face.output().cloned(),
            audio: audio.output().cloned(),
        }
    }
}

/// Output of one fusion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedResult {
    pub success: bool,
    pub combined_emotion: String,
    pub confidence: f64,
    pub predictions: Distribution,
    pub stress: f64,
    pub weights: ModalityWeights,
    pub sources: SourceTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FusedResult {
    /// No usable source: explicit neutral default, distinguishable by
    /// `confidence == 0.5` and all-zero weights
    pub fn neutral(sources: SourceTrace) -> Self {
        Self {
            success: true,
            combined_emotion: NEUTRAL_LABEL.to_string(),
            confidence: NEUTRAL_CONFIDENCE,
            predictions: Distribution::neutral(),
            stress: 0.0,
            weights: ModalityWeights::default(),
            sources,
            error: None,
        }
    }

    /// Fusion could not be computed
    pub fn failed(error: impl Into<String>, sources: SourceTrace) -> Self {
        Self {
            success: false,
            combined_emotion: NEUTRAL_LABEL.to_string(),
            confidence: 0.0,
            predictions: Distribution::default(),
            stress: 0.0,
            weights: ModalityWeights::default(),
            sources,
            error: Some(error.into()),
        }
    }

    /// True when at least one source contributed weight
    pub fn has_signal(&self) -> bool {
        self.success && self.weights.total() > 0.0
    }

    pub fn stress_level(&self) -> StressLevel {
        StressLevel::from_score(self.stress)
    }
}
