use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, instrument};

use super::dto::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use super::{Completion, GenerateRequest, LanguageModel};
use crate::config::GeminiConfig;
use crate::errors::LlmError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// `generateContent` client for the Gemini API.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("macromind/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            api_base: cfg.api_base.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
        let opts = request.options;
        let generation_config = (opts.temperature.is_some() || opts.max_output_tokens.is_some())
            .then_some(GenerationConfig {
                temperature: opts.temperature,
                max_output_tokens: opts.max_output_tokens,
            });
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(&self, request: &GenerateRequest) -> Result<Completion, LlmError> {
        let body = Self::build_body(request);

        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!(error = %e, "gemini request failed");
                LlmError::Backend(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(%status, body = %text, "gemini returned error status");
            return Err(LlmError::Backend(format!("HTTP {status}")));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!(error = %e, "gemini response not decodable");
            LlmError::Backend(format!("undecodable response: {e}"))
        })?;

        let candidates: Vec<String> = parsed.candidates.iter().filter_map(|c| c.text()).collect();
        if candidates.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        debug!(count = candidates.len(), "gemini completion received");
        Ok(Completion { candidates })
    }
}
