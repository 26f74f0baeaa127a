pub mod services;

pub use services::{AnswerQueryClient, QuestionAnswerer, DEFAULT_MAX_CHARS};
