//! Offline keyword lexicon classifier
//!
//! Scores each label by counting lexicon hits in the lowercased input. Every
//! label receives a small smoothing mass and `neutral` a fixed prior, so input
//! without any hit classifies as `neutral`. Scores are normalized to sum to 1.
//!
//! Keyword matching only; used for development without an inference endpoint.

use async_trait::async_trait;
use np_common::classifier::{ClassifierInput, EmotionClassifier};
use np_common::{EmotionPrediction, Error, Result};

use crate::TEXT_LABELS;

/// Mass added to every label before normalization
const SMOOTHING: f64 = 0.1;

/// Extra mass for `neutral`, equal to one keyword hit
const NEUTRAL_PRIOR: f64 = 1.0;

/// Words inverting the next emotional keyword ("not happy")
const NEGATIONS: &[&str] = &["not", "no", "never", "don't", "dont", "isn't", "wasn't", "can't"];

const LEXICON: &[(&str, &[&str])] = &[
    (
        "anger",
        &[
            "angry", "anger", "furious", "mad", "rage", "annoyed", "irritated", "hate",
            "frustrated", "outraged", "livid", "resent",
        ],
    ),
    (
        "disgust",
        &[
            "disgust", "disgusted", "disgusting", "gross", "revolting", "nasty", "sickening",
            "repulsive", "vile",
        ],
    ),
    (
        "fear",
        &[
            "afraid", "scared", "fear", "terrified", "anxious", "anxiety", "worried", "worry",
            "nervous", "panic", "frightened", "dread", "stressed", "overwhelmed",
        ],
    ),
    (
        "joy",
        &[
            "happy", "joy", "glad", "great", "wonderful", "love", "excited", "delighted",
            "amazing", "grateful", "cheerful", "awesome", "fantastic", "proud",
        ],
    ),
    (
        "sadness",
        &[
            "sad", "sadness", "unhappy", "depressed", "lonely", "miserable", "cry", "crying",
            "heartbroken", "grief", "hopeless", "down", "upset", "hurt",
        ],
    ),
    (
        "surprise",
        &[
            "surprised", "surprise", "shocked", "astonished", "amazed", "unexpected", "wow",
            "suddenly", "stunned",
        ],
    ),
];

/// Keyword classifier over the text label set
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    labels: Vec<String>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            labels: TEXT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Score `text`; output follows the label order, unranked
    pub fn score(&self, text: &str) -> Vec<EmotionPrediction> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut hits = vec![0.0_f64; self.labels.len()];
        let mut negated = false;
        for token in &tokens {
            if NEGATIONS.contains(token) {
                negated = true;
                continue;
            }
            if let Some(label) = lexicon_label(token) {
                // "not happy" counts toward sadness, other negated hits are dropped
                let target = match (negated, label) {
                    (false, label) => Some(label),
                    (true, "joy") => Some("sadness"),
                    (true, _) => None,
                };
                if let Some(target) = target {
                    if let Some(i) = self.labels.iter().position(|l| l == target) {
                        hits[i] += 1.0;
                    }
                }
            }
            negated = false;
        }

        let raw: Vec<f64> = self
            .labels
            .iter()
            .zip(&hits)
            .map(|(label, hit)| {
                let prior = if label == "neutral" { NEUTRAL_PRIOR } else { 0.0 };
                hit + prior + SMOOTHING
            })
            .collect();
        let total: f64 = raw.iter().sum();

        self.labels
            .iter()
            .zip(raw)
            .map(|(label, mass)| EmotionPrediction::new(label.clone(), mass / total))
            .collect()
    }
}

fn lexicon_label(token: &str) -> Option<&'static str> {
    LEXICON
        .iter()
        .find(|(_, words)| words.contains(&token))
        .map(|(label, _)| *label)
}

#[async_trait]
impl EmotionClassifier for LexiconClassifier {
    fn model_name(&self) -> &str {
        "lexicon"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn classify(&self, input: ClassifierInput) -> Result<Vec<EmotionPrediction>> {
        match input {
            ClassifierInput::Text(text) => Ok(self.score(&text)),
            other => Err(Error::InvalidInput(format!(
                "Lexicon classifier cannot handle {} input",
                other.kind()
            ))),
        }
    }
}
