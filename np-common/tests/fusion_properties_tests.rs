//! Fusion engine properties across source combinations

use np_common::fusion::{ClassifierOutput, Distribution, NEUTRAL_CONFIDENCE};
use np_common::{
    compute_stress, EmotionPrediction, FusionEngine, Modality, SourceResult, SourceWeights,
};
use serde_json::json;

fn present(pairs: &[(&str, f64)]) -> SourceResult {
    let mut predictions: Vec<_> = pairs
        .iter()
        .map(|(label, score)| EmotionPrediction::new(*label, *score))
        .collect();
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    SourceResult::Present(ClassifierOutput::from_ranked(predictions))
}

/// Every subset of {text, face, audio}, as (text, face, audio) presence flags
fn subsets() -> Vec<[bool; 3]> {
    (0u8..8)
        .map(|mask| [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0])
        .collect()
}

fn source_for(flag: bool, pairs: &[(&str, f64)]) -> SourceResult {
    if flag {
        present(pairs)
    } else {
        SourceResult::Absent
    }
}

#[test]
fn test_normalized_weights_sum_to_one_for_every_subset() {
    let engine = FusionEngine::default();

    for [t, f, a] in subsets() {
        let text = source_for(t, &[("joy", 0.6), ("neutral", 0.4)]);
        let face = source_for(f, &[("sad", 0.7), ("neutral", 0.3)]);
        let audio = source_for(a, &[("calm", 0.9), ("angry", 0.1)]);

        let result = engine.fuse(&text, &face, &audio);
        let total = result.weights.total();

        if t || f || a {
            assert!((total - 1.0).abs() < 1e-9, "subset {:?}: total {}", [t, f, a], total);
            assert!(result.has_signal());
            assert!(
                (result.predictions.total() - 1.0).abs() < 1e-9,
                "distribution over a probability simplex stays on it"
            );
        } else {
            assert_eq!(total, 0.0);
            assert_eq!(result.confidence, NEUTRAL_CONFIDENCE);
        }
    }
}

#[test]
fn test_inactive_modalities_carry_zero_weight() {
    let engine = FusionEngine::default();
    let result = engine.fuse(
        &SourceResult::Absent,
        &present(&[("happy", 1.0)]),
        &present(&[("calm", 1.0)]),
    );

    assert_eq!(result.weights.get(Modality::Text), 0.0);
    assert!((result.weights.face - 0.4 / 0.6).abs() < 1e-9);
    assert!((result.weights.audio - 0.2 / 0.6).abs() < 1e-9);
}

#[test]
fn test_fusion_is_deterministic() {
    let engine = FusionEngine::default();
    let text = present(&[("sadness", 0.5), ("fear", 0.3), ("joy", 0.2)]);
    let face = present(&[("sad", 0.5), ("neutral", 0.5)]);
    let audio = present(&[("calm", 0.5), ("sad", 0.5)]);

    let first = serde_json::to_string(&engine.fuse(&text, &face, &audio)).unwrap();
    let second = serde_json::to_string(&engine.fuse(&text, &face, &audio)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_stress_never_decreases_when_negative_mass_grows() {
    let engine = FusionEngine::default();
    let mut previous = -1.0;

    for step in 0..=10 {
        let negative = step as f64 / 10.0;
        let text = present(&[("sadness", negative), ("joy", 1.0 - negative)]);
        let result = engine.fuse(&text, &SourceResult::Absent, &SourceResult::Absent);

        assert!(result.stress >= previous, "step {}", step);
        assert!((0.0..=1.0).contains(&result.stress));
        previous = result.stress;
    }
}

#[test]
fn test_stress_stays_in_range_when_negative_labels_overlap() {
    let engine = FusionEngine::default();
    // Every source is entirely negative and the labels overlap across sources
    let text = present(&[("sadness", 0.6), ("fear", 0.4)]);
    let face = present(&[("sadness", 0.7), ("anger", 0.3)]);
    let audio = present(&[("fear", 0.5), ("disgust", 0.5)]);

    let result = engine.fuse(&text, &face, &audio);
    assert!(result.success);
    assert!((0.0..=1.0).contains(&result.stress));
    assert!((result.stress - 1.0).abs() < 1e-9);
    assert_eq!(result.combined_emotion, "sadness");

    // Custom weights that do not sum to 1 are normalized before accumulation
    let skewed = FusionEngine::new(
        SourceWeights {
            text: 0.7,
            face: 0.7,
            audio: 0.3,
        },
        Default::default(),
    );
    let result = skewed.fuse(&text, &face, &audio);
    assert!((0.0..=1.0).contains(&result.stress));
    assert!((result.stress - 1.0).abs() < 1e-9);
}

#[test]
fn test_out_of_range_sources_are_treated_as_absent() {
    let engine = FusionEngine::default();
    let huge = present(&[("anger", f64::MAX)]);

    let result = engine.fuse(&huge, &huge, &SourceResult::Absent);
    assert!(result.success);
    assert_eq!(result.combined_emotion, "neutral");
    assert_eq!(result.confidence, NEUTRAL_CONFIDENCE);
    assert_eq!(result.stress, 0.0);
    assert_eq!(result.weights.total(), 0.0);

    // A well-formed source next to a malformed one carries all the weight
    let result = engine.fuse(
        &present(&[("sadness", -4.0)]),
        &present(&[("joy", 0.9), ("fear", 0.1)]),
        &SourceResult::Absent,
    );
    assert_eq!(result.weights.face, 1.0);
    assert_eq!(result.combined_emotion, "joy");
    assert!((result.stress - 0.1).abs() < 1e-9);
}

#[test]
fn test_all_absent_is_neutral_default() {
    let engine = FusionEngine::default();
    let result = engine.fuse(
        &SourceResult::Absent,
        &SourceResult::Absent,
        &SourceResult::Absent,
    );

    assert!(result.success);
    assert_eq!(result.combined_emotion, "neutral");
    assert_eq!(result.confidence, NEUTRAL_CONFIDENCE);
    assert_eq!(result.stress, 0.0);
    assert_eq!(result.predictions, Distribution::neutral());
    assert!(!result.has_signal());
}

#[test]
fn test_all_sources_failed_is_neutral_default() {
    let engine = FusionEngine::default();
    let failed = SourceResult::Present(ClassifierOutput::failure("Model not loaded"));
    let result = engine.fuse(&failed, &failed, &failed);

    assert_eq!(result.combined_emotion, "neutral");
    assert_eq!(result.confidence, NEUTRAL_CONFIDENCE);
    // Failed payloads are still echoed back
    assert!(result.sources.text.is_some());
}

#[test]
fn test_predictions_serialize_in_rank_order() {
    let engine = FusionEngine::default();
    let text = present(&[("joy", 0.2), ("anger", 0.5), ("fear", 0.3)]);
    let result = engine.fuse(&text, &SourceResult::Absent, &SourceResult::Absent);

    let json = serde_json::to_string(&result).unwrap();
    let anger = json.find("\"anger\"").unwrap();
    let fear = json.find("\"fear\"").unwrap();
    let joy = json.find("\"joy\"").unwrap();
    assert!(anger < fear && fear < joy);
}

#[test]
fn test_source_json_round_trip_through_fusion() {
    let engine = FusionEngine::default();
    let text = SourceResult::from_json(Some(json!({
        "success": true,
        "predictions": [{"label": "fear", "score": 0.8}, {"label": "joy", "score": 0.2}],
        "top_emotion": "fear",
        "confidence": 0.8,
        "text_length": 21
    })));
    let face = SourceResult::from_json(Some(json!("not an object")));

    let result = engine.fuse(&text, &face, &SourceResult::Absent);
    assert_eq!(result.combined_emotion, "fear");
    assert!((result.stress - 0.8).abs() < 1e-9);
    assert!(result.sources.face.is_none());

    let body = serde_json::to_value(&result).unwrap();
    assert_eq!(body["sources"]["text"]["text_length"], 21);
}

#[test]
fn test_custom_weights_shift_the_combined_emotion() {
    let text = present(&[("joy", 1.0)]);
    let face = present(&[("sad", 1.0)]);

    let default_engine = FusionEngine::default();
    let tie = default_engine.fuse(&text, &face, &SourceResult::Absent);
    // Equal weights: text accumulates first and wins the tie
    assert_eq!(tie.combined_emotion, "joy");

    let face_heavy = FusionEngine::new(
        SourceWeights {
            text: 0.2,
            face: 0.8,
            audio: 0.0,
        },
        Default::default(),
    );
    let result = face_heavy.fuse(&text, &face, &SourceResult::Absent);
    assert_eq!(result.combined_emotion, "sad");
    assert!((result.confidence - 0.8).abs() < 1e-9);
}

#[test]
fn test_compute_stress_matches_fused_distribution() {
    let engine = FusionEngine::default();
    let text = present(&[("disgust", 0.25), ("surprise", 0.75)]);
    let result = engine.fuse(&text, &SourceResult::Absent, &SourceResult::Absent);

    assert_eq!(result.stress, compute_stress(result.predictions.as_slice()));
}
