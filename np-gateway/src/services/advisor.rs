//! Wellbeing advisor
//!
//! Turns fused emotion results into a free-text summary and structured
//! self-care tips through a [`TextGenerator`]. Generator failures never reach
//! the caller: they are logged and replaced by canned content.

use np_common::{ClassifierOutput, EmotionPrediction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::llm::{CompletionRequest, TextGenerator};
use crate::config::LlmConfig;

/// Summary returned whenever the generator is unavailable
pub const FALLBACK_SUMMARY: &str = "We've analyzed your emotions and stress levels. Taking deep breaths, practicing mindfulness, and engaging in activities you enjoy can help improve your emotional wellbeing. If you're feeling overwhelmed, consider talking to a friend or mental health professional.";

const FALLBACK_TIPS_SUMMARY: &str = "We've analyzed your emotional state and provided personalized suggestions to support your wellbeing.";

const FALLBACK_TIPS: [&str; 5] = [
    "Practice deep breathing exercises for 5 minutes daily",
    "Engage in physical activity or stretching",
    "Connect with friends or family members",
    "Maintain a regular sleep schedule",
    "Try mindfulness or meditation techniques",
];

const FALLBACK_RESOURCES: [(&str, &str); 2] = [
    (
        "Crisis Text Line",
        "Text HOME to 741741 for free, 24/7 crisis support",
    ),
    (
        "National Suicide Prevention Lifeline",
        "Call 988 for 24/7 support",
    ),
];

/// Accepted tip count in a generated tips payload
pub const MIN_TIPS: usize = 4;
pub const MAX_TIPS: usize = 5;

/// Stress above which the tips prompt asks for crisis resources
const CRISIS_STRESS: f64 = 0.7;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful emotional wellbeing assistant that provides supportive and practical advice.";
const TIPS_SYSTEM_PROMPT: &str = "You are a mental health wellbeing expert providing practical, supportive advice.";

/// Input to [`Advisor::emotion_summary`]
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub text: Option<&'a ClassifierOutput>,
    pub audio: Option<&'a ClassifierOutput>,
    pub face: Option<&'a ClassifierOutput>,
    /// Fused stress in [0, 1]
    pub stress: f64,
}

/// POST /api/generate-tips request body (camelCase, as sent by the frontend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TipsRequest {
    pub stress_score: f64,
    pub primary_emotion: String,
    pub emotion_breakdown: Vec<EmotionPrediction>,
    pub has_text_analysis: bool,
    pub has_face_analysis: bool,
    pub text_stress: f64,
    pub face_stress: f64,
}

impl Default for TipsRequest {
    fn default() -> Self {
        Self {
            stress_score: 0.0,
            primary_emotion: "neutral".to_string(),
            emotion_breakdown: Vec::new(),
            has_text_analysis: false,
            has_face_analysis: false,
            text_stress: 0.0,
            face_stress: 0.0,
        }
    }
}

/// Help resource (hotline, service)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub description: String,
}

/// Structured tips payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsResponse {
    pub summary: String,
    pub tips: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl TipsResponse {
    /// Canned tips used whenever generation fails
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_TIPS_SUMMARY.to_string(),
            tips: FALLBACK_TIPS.iter().map(|t| t.to_string()).collect(),
            resources: FALLBACK_RESOURCES
                .iter()
                .map(|(title, description)| Resource {
                    title: title.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }
}

/// Parse and validate a generated tips payload
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence.
pub fn parse_tips(completion: &str) -> Result<TipsResponse, String> {
    let json = strip_code_fence(completion);
    let tips: TipsResponse =
        serde_json::from_str(json).map_err(|e| format!("Tips are not valid JSON: {}", e))?;

    if tips.summary.trim().is_empty() {
        return Err("Tips summary is empty".to_string());
    }
    if !(MIN_TIPS..=MAX_TIPS).contains(&tips.tips.len()) {
        return Err(format!(
            "Expected {}-{} tips, got {}",
            MIN_TIPS,
            MAX_TIPS,
            tips.tips.len()
        ));
    }
    if tips.tips.iter().any(|tip| tip.trim().is_empty()) {
        return Err("Tips contain an empty entry".to_string());
    }

    Ok(tips)
}

fn strip_code_fence(completion: &str) -> &str {
    let trimmed = completion.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let inner = inner.split_once('\n').map_or("", |(_, rest)| rest);
    inner.trim_end().trim_end_matches("```").trim()
}

fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

fn describe_source(output: Option<&ClassifierOutput>) -> String {
    match output {
        Some(output) => serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string()),
        None => "not provided".to_string(),
    }
}

fn describe_breakdown(breakdown: &[EmotionPrediction]) -> String {
    if breakdown.is_empty() {
        return "not available".to_string();
    }
    breakdown
        .iter()
        .map(|p| format!("{} {}", p.label, percent(p.score)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn stress_guidance(stress: f64) -> &'static str {
    if stress < 0.3 {
        "Stress is low: focus on maintaining positive habits."
    } else if stress <= CRISIS_STRESS {
        "Stress is moderate: provide practical coping strategies."
    } else {
        "Stress is high: include 2-3 crisis resources or helplines."
    }
}

fn summary_prompt(input: &SummaryInput<'_>) -> String {
    format!(
        "You are an emotion-analysis specialist and mental health wellbeing assistant.\n\
         \n\
         Here are the user's emotion analysis results:\n\
         - Overall Stress Level: {stress}\n\
         - Text Analysis: {text}\n\
         - Audio Analysis: {audio}\n\
         - Face Analysis: {face}\n\
         \n\
         Please provide:\n\
         1. A short emotional summary (2-3 sentences) that explains the user's overall emotional state\n\
         2. Stress level interpretation (what this stress level means for their wellbeing)\n\
         3. 3 personalized, actionable suggestions to improve their emotional state\n\
         4. Keep the tone supportive, friendly, and positive\n\
         5. Do not use technical terms or jargon\n\
         6. Focus on practical advice\n\
         \n\
         Format your response as plain text without markdown or special formatting.",
        stress = percent(input.stress),
        text = describe_source(input.text),
        audio = describe_source(input.audio),
        face = describe_source(input.face),
    )
}

fn tips_prompt(request: &TipsRequest) -> String {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    format!(
        "You are a mental health wellbeing expert. Based on the following emotional analysis:\n\
         \n\
         OVERALL RESULTS:\n\
         - Primary Emotion: {emotion}\n\
         - Overall Stress Level: {stress}\n\
         \n\
         DETAILED BREAKDOWN:\n\
         - Emotion Distribution: {breakdown}\n\
         - Text Analysis Performed: {has_text} (Stress: {text_stress})\n\
         - Face Analysis Performed: {has_face} (Stress: {face_stress})\n\
         \n\
         Please provide:\n\
         1. A brief, encouraging summary (1-2 sentences) about their emotional state\n\
         2. {min}-{max} personalized, practical tips for managing their emotions and stress\n\
         3. 2-3 professional resources or helplines if stress is high (>70%)\n\
         \n\
         Format your response as JSON with this exact structure:\n\
         {{\"summary\": \"string\", \"tips\": [\"string\", ...], \"resources\": [{{\"title\": \"string\", \"description\": \"string\"}}]}}\n\
         \n\
         Keep the tone supportive, non-clinical, and focused on self-care.\n\
         {guidance}",
        emotion = request.primary_emotion,
        stress = percent(request.stress_score),
        breakdown = describe_breakdown(&request.emotion_breakdown),
        has_text = yes_no(request.has_text_analysis),
        text_stress = percent(request.text_stress),
        has_face = yes_no(request.has_face_analysis),
        face_stress = percent(request.face_stress),
        min = MIN_TIPS,
        max = MAX_TIPS,
        guidance = stress_guidance(request.stress_score),
    )
}

/// Summary and tips generation with canned fallbacks
pub struct Advisor {
    generator: Arc<dyn TextGenerator>,
    config: LlmConfig,
}

impl Advisor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: LlmConfig) -> Self {
        Self { generator, config }
    }

    /// Free-text summary of a fused result
    pub async fn emotion_summary(&self, input: &SummaryInput<'_>) -> String {
        debug!(
            stress = input.stress,
            text = input.text.is_some(),
            face = input.face.is_some(),
            audio = input.audio.is_some(),
            "Generating emotion summary"
        );

        let request = CompletionRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            user: summary_prompt(input),
            temperature: self.config.summary_temperature,
            max_tokens: self.config.summary_max_tokens,
        };

        match self.generator.complete(request).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(generator = self.generator.name(), "Summary generation failed, using fallback: {}", e);
                FALLBACK_SUMMARY.to_string()
            }
        }
    }

    /// Structured tips; the canned payload on any failure
    pub async fn tips(&self, request: &TipsRequest) -> TipsResponse {
        debug!(
            primary_emotion = %request.primary_emotion,
            stress = request.stress_score,
            "Generating mental health tips"
        );

        let completion = CompletionRequest {
            system: TIPS_SYSTEM_PROMPT.to_string(),
            user: tips_prompt(request),
            temperature: self.config.tips_temperature,
            max_tokens: self.config.tips_max_tokens,
        };

        let generated = match self.generator.complete(completion).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(generator = self.generator.name(), "Tips generation failed, using fallback: {}", e);
                return TipsResponse::fallback();
            }
        };

        match parse_tips(&generated) {
            Ok(tips) => tips,
            Err(e) => {
                warn!("Generated tips rejected, using fallback: {}", e);
                TipsResponse::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed completion (or error) and records the prompts it saw
    struct ScriptedGenerator {
        reply: Option<String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGenerator {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.seen.lock().unwrap().last().unwrap().user.clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request);
            self.reply
                .clone()
                .ok_or_else(|| LlmError::NetworkError("connection refused".to_string()))
        }
    }

    fn tips_json(count: usize) -> String {
        let tips: Vec<String> = (0..count).map(|i| format!("Tip {}", i)).collect();
        serde_json::json!({
            "summary": "You seem a little tense today.",
            "tips": tips,
            "resources": []
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_summary_passes_generator_text_through() {
        let generator = ScriptedGenerator::replying("You seem calm.");
        let advisor = Advisor::new(generator.clone(), LlmConfig::default());

        let summary = advisor
            .emotion_summary(&SummaryInput {
                text: None,
                audio: None,
                face: None,
                stress: 0.68,
            })
            .await;

        assert_eq!(summary, "You seem calm.");
        let prompt = generator.last_prompt();
        assert!(prompt.contains("Overall Stress Level: 68%"));
        assert!(prompt.contains("Text Analysis: not provided"));
    }

    #[tokio::test]
    async fn test_summary_falls_back_on_error() {
        let advisor = Advisor::new(ScriptedGenerator::failing(), LlmConfig::default());
        let summary = advisor
            .emotion_summary(&SummaryInput {
                text: None,
                audio: None,
                face: None,
                stress: 0.1,
            })
            .await;
        assert_eq!(summary, FALLBACK_SUMMARY);
    }

    #[tokio::test]
    async fn test_tips_parsed_from_generator() {
        let advisor = Advisor::new(ScriptedGenerator::replying(&tips_json(4)), LlmConfig::default());
        let tips = advisor.tips(&TipsRequest::default()).await;
        assert_eq!(tips.tips.len(), 4);
        assert_eq!(tips.summary, "You seem a little tense today.");
    }

    #[tokio::test]
    async fn test_tips_with_wrong_count_fall_back() {
        let advisor = Advisor::new(ScriptedGenerator::replying(&tips_json(3)), LlmConfig::default());
        assert_eq!(advisor.tips(&TipsRequest::default()).await, TipsResponse::fallback());

        let advisor = Advisor::new(ScriptedGenerator::replying(&tips_json(6)), LlmConfig::default());
        assert_eq!(advisor.tips(&TipsRequest::default()).await, TipsResponse::fallback());
    }

    #[tokio::test]
    async fn test_tips_non_json_falls_back() {
        let advisor = Advisor::new(
            ScriptedGenerator::replying("Here are some tips: breathe."),
            LlmConfig::default(),
        );
        assert_eq!(advisor.tips(&TipsRequest::default()).await, TipsResponse::fallback());
    }

    #[tokio::test]
    async fn test_tips_prompt_varies_by_stress() {
        let generator = ScriptedGenerator::replying(&tips_json(5));
        let advisor = Advisor::new(generator.clone(), LlmConfig::default());

        let low = TipsRequest {
            stress_score: 0.1,
            ..Default::default()
        };
        advisor.tips(&low).await;
        assert!(generator.last_prompt().contains("maintaining positive habits"));

        let high = TipsRequest {
            stress_score: 0.85,
            primary_emotion: "fear".to_string(),
            has_text_analysis: true,
            text_stress: 0.9,
            ..Default::default()
        };
        advisor.tips(&high).await;
        let prompt = generator.last_prompt();
        assert!(prompt.contains("crisis resources"));
        assert!(prompt.contains("Primary Emotion: fear"));
        assert!(prompt.contains("Text Analysis Performed: Yes (Stress: 90%)"));
    }

    #[test]
    fn test_parse_tips_strips_code_fence() {
        let fenced = format!("```json\n{}\n```", tips_json(5));
        let tips = parse_tips(&fenced).unwrap();
        assert_eq!(tips.tips.len(), 5);
    }

    #[test]
    fn test_fallback_tips_shape() {
        let fallback = TipsResponse::fallback();
        assert_eq!(fallback.tips.len(), 5);
        assert_eq!(fallback.resources.len(), 2);
        assert_eq!(fallback.resources[0].title, "Crisis Text Line");
        assert!(parse_tips(&serde_json::to_string(&fallback).unwrap()).is_ok());
    }

    #[test]
    fn test_tips_request_camel_case() {
        let request: TipsRequest = serde_json::from_value(serde_json::json!({
            "stressScore": 0.42,
            "primaryEmotion": "sadness",
            "emotionBreakdown": [{"label": "sadness", "score": 0.42}],
            "hasTextAnalysis": true,
            "faceStress": 0.1
        }))
        .unwrap();

        assert_eq!(request.stress_score, 0.42);
        assert_eq!(request.primary_emotion, "sadness");
        assert_eq!(request.emotion_breakdown.len(), 1);
        assert!(request.has_text_analysis);
        assert!(!request.has_face_analysis);
        assert_eq!(request.face_stress, 0.1);
    }
}
