use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::dto::NutritionEstimate;
use crate::errors::AppError;
use crate::llm::{GenerateRequest, LanguageModel};

#[async_trait]
pub trait NutritionEstimator: Send + Sync {
    async fn estimate(&self, food_description: &str) -> Result<NutritionEstimate, AppError>;
}

/// Asks the language model for a `{calories, protein}` estimate of one food item.
pub struct NutritionQueryClient {
    llm: Arc<dyn LanguageModel>,
}

impl NutritionQueryClient {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

pub(crate) fn build_prompt(food_description: &str) -> String {
    format!(
        "Please analyze this food item and provide its nutritional information:\n\
         Food: {food_description}\n\
         \n\
         Provide the response in this exact JSON format:\n\
         {{\n    \"calories\": number,\n    \"protein\": number in grams\n}}\n\
         Only provide the JSON, no other text."
    )
}

/// Drops one surrounding markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"(?s)^```[A-Za-z]*\s*\n?(.*?)\n?\s*```$").unwrap();
    }
    let trimmed = text.trim();
    FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

#[async_trait]
impl NutritionEstimator for NutritionQueryClient {
    #[instrument(skip(self))]
    async fn estimate(&self, food_description: &str) -> Result<NutritionEstimate, AppError> {
        let food_description = food_description.trim();
        if food_description.is_empty() {
            return Err(AppError::Validation("food description is empty".into()));
        }

        let completion = self
            .llm
            .generate(&GenerateRequest::new(build_prompt(food_description)))
            .await?;
        let raw = completion.first_text().ok_or(AppError::EmptyResponse)?;

        match NutritionEstimate::from_model_json(strip_code_fence(raw)) {
            Ok(est) => {
                debug!(calories = est.calories, protein = est.protein_grams, "estimate parsed");
                Ok(est)
            }
            Err(e) => {
                warn!(error = %e, raw = %raw, "unusable nutrition estimate");
                Err(e)
            }
        }
    }
}
