//! Weighted fusion of per-modality emotion distributions
//!
//! Each usable source contributes `normalized_weight * score` to every label it
//! reports. Weights of missing or failed sources are dropped and the rest are
//! renormalized, so any subset of sources yields a distribution summing to the
//! weighted sum of the source distributions.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::{
    compute_stress, Distribution, EmotionPrediction, FusedResult, LabelNormalizer, Modality,
    ModalityWeights, SourceResult, SourceTrace, SourceWeights,
};

/// Reasons a fusion call falls back to the error result
#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    #[error("invalid {modality} weight: {weight}")]
    InvalidWeight { modality: Modality, weight: f64 },

    #[error("invalid score {score} for label '{label}' from {modality} source")]
    InvalidScore {
        modality: Modality,
        label: String,
        score: f64,
    },
}

/// Fusion engine: fixed weights plus label normalization
///
/// Stateless between calls; share it freely behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    weights: SourceWeights,
    normalizer: LabelNormalizer,
}

/// Insertion-ordered label accumulator
#[derive(Default)]
struct Accumulator {
    entries: Vec<EmotionPrediction>,
    index: HashMap<String, usize>,
}

impl Accumulator {
    fn add(&mut self, label: &str, contribution: f64) {
        match self.index.get(label) {
            Some(&position) => self.entries[position].score += contribution,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push(EmotionPrediction::new(label, contribution));
            }
        }
    }

    /// Descending by score; `sort_by` is stable so ties keep first-seen order
    fn into_ranked(mut self) -> Distribution {
        self.entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        Distribution::from_ranked(self.entries)
    }
}

impl FusionEngine {
    pub fn new(weights: SourceWeights, normalizer: LabelNormalizer) -> Self {
        Self {
            weights,
            normalizer,
        }
    }

    pub fn weights(&self) -> &SourceWeights {
        &self.weights
    }

    pub fn normalizer(&self) -> &LabelNormalizer {
        &self.normalizer
    }

    /// Stress of a single source on its own, after label normalization
    ///
    /// `None` when the source is not usable.
    pub fn source_stress(&self, source: &SourceResult) -> Option<f64> {
        let normalized: Vec<EmotionPrediction> = source
            .usable_predictions()?
            .iter()
            .map(|p| EmotionPrediction::new(self.normalizer.normalize(&p.label), p.score))
            .collect();
        Some(compute_stress(&normalized))
    }

    /// Fuse up to three sources into one result
    ///
    /// Never fails: no usable source yields the neutral default, invalid
    /// numeric input yields a `success: false` fallback carrying the error.
    pub fn fuse(&self, text: &SourceResult, face: &SourceResult, audio: &SourceResult) -> FusedResult {
        let sources = SourceTrace::capture(text, face, audio);
        let inputs = [
            (Modality::Text, text),
            (Modality::Face, face),
            (Modality::Audio, audio),
        ];

        match self.try_fuse(&inputs) {
            Ok(Some((predictions, weights))) => {
                let stress = compute_stress(predictions.as_slice());
                let (combined_emotion, confidence) = match predictions.top() {
                    Some(top) => (top.label.clone(), top.score),
                    None => return FusedResult::neutral(sources),
                };

                debug!(
                    combined_emotion = %combined_emotion,
                    confidence = confidence,
                    stress = stress,
                    labels = predictions.len(),
                    "Fusion complete"
                );

                FusedResult {
                    success: true,
                    combined_emotion,
                    confidence,
                    predictions,
                    stress,
                    weights,
                    sources,
                    error: None,
                }
            }
            Ok(None) => {
                debug!("No usable source, returning neutral default");
                FusedResult::neutral(sources)
            }
            Err(e) => {
                warn!(error = %e, "Fusion failed, returning fallback result");
                FusedResult::failed(e.to_string(), sources)
            }
        }
    }

    /// Active-weight normalization and accumulation
    ///
    /// `Ok(None)` when no source carries weight or nothing was accumulated.
    fn try_fuse(
        &self,
        inputs: &[(Modality, &SourceResult); 3],
    ) -> Result<Option<(Distribution, ModalityWeights)>, FusionError> {
        let mut active = ModalityWeights::default();
        for (modality, source) in inputs {
            if source.usable_predictions().is_none() {
                continue;
            }
            let weight = self.weights.get(*modality);
            if !weight.is_finite() || weight < 0.0 {
                return Err(FusionError::InvalidWeight {
                    modality: *modality,
                    weight,
                });
            }
            active.set(*modality, weight);
        }

        let total = active.total();
        if total <= 0.0 {
            return Ok(None);
        }

        let mut normalized = ModalityWeights::default();
        for modality in Modality::ALL {
            normalized.set(modality, active.get(modality) / total);
        }

        let mut accumulator = Accumulator::default();
        for (modality, source) in inputs {
            let weight = normalized.get(*modality);
            let Some(predictions) = source.usable_predictions() else {
                continue;
            };
            if weight == 0.0 {
                continue;
            }

            for prediction in predictions {
                if !prediction.score.is_finite() {
                    return Err(FusionError::InvalidScore {
                        modality: *modality,
                        label: prediction.label.clone(),
                        score: prediction.score,
                    });
                }
                let label = self.normalizer.normalize(&prediction.label);
                accumulator.add(&label, weight * prediction.score);
            }
        }

        let distribution = accumulator.into_ranked();
        if distribution.is_empty() {
            return Ok(None);
        }
        Ok(Some((distribution, normalized)))
    }
}
