pub mod api;
pub mod chunking;
pub mod client;
pub mod orchestrator;
pub mod prompts;
pub mod schema;

pub use api::{GenerationConfig, Part};
pub use chunking::{ChunkWindow, SubmissionMode, plan_chunks, submission_mode};
pub use client::GenerativeClient;
pub use orchestrator::{EvaluationInput, LlmOrchestrator};
pub use schema::{AiReport, AudioInteractionReport};

/// Remove markdown code fences the models like to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}
