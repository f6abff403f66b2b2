//! Stress scoring
//!
//! Stress is the probability mass a distribution assigns to the negative
//! emotion set, clamped to [0, 1]. The same function serves the fused stress
//! and the display-only per-source previews.

use serde::{Deserialize, Serialize};

use super::EmotionPrediction;

/// Labels counted toward stress (compared case-insensitively)
pub const NEGATIVE_EMOTIONS: [&str; 4] = ["sadness", "fear", "anger", "disgust"];

/// Low/moderate band boundary
const MODERATE_THRESHOLD: f64 = 0.3;

/// Moderate/high band boundary
const HIGH_THRESHOLD: f64 = 0.6;

pub fn is_negative_emotion(label: &str) -> bool {
    NEGATIVE_EMOTIONS
        .iter()
        .any(|negative| label.eq_ignore_ascii_case(negative))
}

/// Sum of scores on negative labels, clamped to [0, 1]
pub fn compute_stress(distribution: &[EmotionPrediction]) -> f64 {
    let stress: f64 = distribution
        .iter()
        .filter(|p| is_negative_emotion(&p.label))
        .map(|p| p.score)
        .sum();

    if stress.is_nan() {
        return 0.0;
    }
    stress.clamp(0.0, 1.0)
}

/// Coarse stress band shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub fn from_score(score: f64) -> Self {
        if score < MODERATE_THRESHOLD {
            StressLevel::Low
        } else if score < HIGH_THRESHOLD {
            StressLevel::Moderate
        } else {
            StressLevel::High
        }
    }
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StressLevel::Low => write!(f, "Low"),
            StressLevel::Moderate => write!(f, "Moderate"),
            StressLevel::High => write!(f, "High"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds(pairs: &[(&str, f64)]) -> Vec<EmotionPrediction> {
        pairs
            .iter()
            .map(|(label, score)| EmotionPrediction::new(*label, *score))
            .collect()
    }

    #[test]
    fn test_high_stress_face_result() {
        let stress = compute_stress(&preds(&[("sadness", 0.8), ("neutral", 0.2)]));
        assert!((stress - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_positive_labels_do_not_count() {
        let stress = compute_stress(&preds(&[("happy", 0.7), ("neutral", 0.3)]));
        assert_eq!(stress, 0.0);
    }

    #[test]
    fn test_label_match_ignores_case() {
        let stress = compute_stress(&preds(&[("Sadness", 0.25), ("FEAR", 0.25)]));
        assert!((stress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stress_is_clamped_to_one() {
        let stress = compute_stress(&preds(&[
            ("sadness", 0.71),
            ("fear", 0.22),
            ("anger", 0.05),
            ("disgust", 0.03),
        ]));
        assert_eq!(stress, 1.0);
    }

    #[test]
    fn test_audio_vocabulary_is_not_matched() {
        // "sad"/"angry"/"fearful" are different spellings and are not merged here
        let stress = compute_stress(&preds(&[("sad", 0.5), ("angry", 0.3), ("fearful", 0.2)]));
        assert_eq!(stress, 0.0);
    }

    #[test]
    fn test_nan_scores_yield_zero() {
        let stress = compute_stress(&preds(&[("anger", f64::NAN)]));
        assert_eq!(stress, 0.0);
    }

    #[test]
    fn test_empty_distribution() {
        assert_eq!(compute_stress(&[]), 0.0);
    }

    #[test]
    fn test_stress_level_bands() {
        assert_eq!(StressLevel::from_score(0.0), StressLevel::Low);
        assert_eq!(StressLevel::from_score(0.29), StressLevel::Low);
        assert_eq!(StressLevel::from_score(0.3), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(0.59), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(0.6), StressLevel::High);
        assert_eq!(StressLevel::from_score(1.0), StressLevel::High);
    }
}
