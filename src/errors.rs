use thiserror::Error;

/// Failures talking to the generative-language backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("backend returned no completion candidate")]
    EmptyResponse,
}

/// Domain error taxonomy surfaced to the command router.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("empty response from backend")]
    EmptyResponse,
    #[error("could not parse model output: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Validation(String),
}

impl AppError {
    pub fn is_backend(&self) -> bool {
        matches!(self, AppError::Backend(_))
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Backend(msg) => AppError::Backend(msg),
            LlmError::EmptyResponse => AppError::EmptyResponse,
        }
    }
}
