mod dto;
pub mod gemini;

use async_trait::async_trait;

use crate::errors::LlmError;

pub use gemini::GeminiClient;

/// Sampling knobs forwarded to the backend. `None` keeps the backend default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub options: GenerationOptions,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Candidate texts in the order the backend returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub candidates: Vec<String>,
}

impl Completion {
    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Completion, LlmError>;
}
