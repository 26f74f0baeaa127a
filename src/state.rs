use crate::answers::{AnswerQueryClient, QuestionAnswerer};
use crate::config::AppConfig;
use crate::ledger::{InMemoryStore, Ledger, SystemClock};
use crate::llm::{GeminiClient, LanguageModel};
use crate::nutrition::{NutritionEstimator, NutritionQueryClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<Ledger>,
    pub nutrition: Arc<dyn NutritionEstimator>,
    pub answers: Arc<dyn QuestionAnswerer>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let llm = Arc::new(GeminiClient::new(&config.gemini)?) as Arc<dyn LanguageModel>;

        let ledger = Arc::new(Ledger::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemClock),
        ));

        Ok(Self::from_parts(
            Arc::new(config),
            ledger,
            Arc::new(NutritionQueryClient::new(llm.clone())),
            Arc::new(AnswerQueryClient::new(llm)),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        ledger: Arc<Ledger>,
        nutrition: Arc<dyn NutritionEstimator>,
        answers: Arc<dyn QuestionAnswerer>,
    ) -> Self {
        Self {
            config,
            ledger,
            nutrition,
            answers,
        }
    }

    #[cfg(test)]
    pub fn fake(
        nutrition: Arc<dyn NutritionEstimator>,
        answers: Arc<dyn QuestionAnswerer>,
    ) -> Self {
        use crate::config::GeminiConfig;
        use crate::ledger::services::testing::ManualClock;

        let config = Arc::new(AppConfig {
            discord_token: "test".into(),
            gemini: GeminiConfig {
                api_key: "test".into(),
                model: "gemini-test".into(),
                api_base: "http://localhost:0".into(),
                timeout_secs: 1,
            },
            command_prefix: "!".into(),
            http_host: "127.0.0.1".into(),
            http_port: 0,
        });
        let ledger = Arc::new(Ledger::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new()),
        ));

        Self::from_parts(config, ledger, nutrition, answers)
    }
}
