use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::errors::AppError;
use crate::llm::{GenerateRequest, GenerationOptions, LanguageModel};

pub const DEFAULT_MAX_CHARS: usize = 800;
pub const REFUSAL: &str = "I can only answer questions about nutrition, food, diet, and health.";

const TEMPERATURE: f32 = 0.3;
/// Rough characters-per-token ratio used to size `maxOutputTokens`.
const CHARS_PER_TOKEN: f64 = 3.2;

#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer(&self, question: &str, max_chars: usize) -> Result<String, AppError>;
}

pub struct AnswerQueryClient {
    llm: Arc<dyn LanguageModel>,
}

impl AnswerQueryClient {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

pub(crate) fn token_budget(max_chars: usize) -> u32 {
    (max_chars as f64 / CHARS_PER_TOKEN).round() as u32
}

pub(crate) fn build_prompt(question: &str, max_chars: usize) -> String {
    format!(
        "You are a nutrition expert assistant. Answer this nutrition question concisely:\n\
         {question}\n\
         \n\
         CRITICAL: Your response MUST be under {max_chars} characters while remaining complete and coherent.\n\
         Prioritize the most important information and use concise language.\n\
         If you cannot provide a complete answer within {max_chars} characters, reshape your response to cover\n\
         the most essential points that will help the user.\n\
         \n\
         For non-nutrition based questions, simply respond: \"{REFUSAL}\""
    )
}

#[async_trait]
impl QuestionAnswerer for AnswerQueryClient {
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    async fn answer(&self, question: &str, max_chars: usize) -> Result<String, AppError> {
        let request = GenerateRequest::new(build_prompt(question, max_chars)).with_options(
            GenerationOptions {
                temperature: Some(TEMPERATURE),
                max_output_tokens: Some(token_budget(max_chars)),
            },
        );

        let completion = self.llm.generate(&request).await?;
        let text = completion
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::EmptyResponse)?;
        debug!(answer_len = text.chars().count(), "answer received");
        Ok(text.to_string())
    }
}
