mod dto;
pub mod services;

pub use dto::NutritionEstimate;
pub use services::{NutritionEstimator, NutritionQueryClient};
