//! Outbound integrations: classifier services and the LLM

pub mod advisor;
pub mod classifier_client;
pub mod llm;

pub use advisor::{Advisor, SummaryInput, TipsRequest, TipsResponse, FALLBACK_SUMMARY};
pub use classifier_client::{
    ClassifierClient, ClassifierClientError, ServiceClients, ServiceHealth, Upload,
};
pub use llm::{CompletionRequest, LlmError, OpenAiClient, TextGenerator};
