use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const MAX_CALORIES: f64 = 10_000.0;
const MAX_PROTEIN_G: f64 = 1_000.0;

/// Model-derived estimate for a single food item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: f64,
    #[serde(rename = "protein")]
    pub protein_grams: f64,
}

impl NutritionEstimate {
    /// Parses the model's JSON answer and checks the numbers are plausible.
    pub fn from_model_json(raw: &str) -> Result<Self, AppError> {
        let estimate: NutritionEstimate =
            serde_json::from_str(raw).map_err(|e| AppError::Parse(e.to_string()))?;
        estimate.validate()?;
        Ok(estimate)
    }

    fn validate(&self) -> Result<(), AppError> {
        check_range("calories", self.calories, MAX_CALORIES)?;
        check_range("protein", self.protein_grams, MAX_PROTEIN_G)
    }
}

fn check_range(field: &str, value: f64, max: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(AppError::Parse(format!(
            "{field} out of range: {value} (expected 0..={max})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_float_fields() {
        let est = NutritionEstimate::from_model_json(r#"{"calories": 70, "protein": 6.5}"#).unwrap();
        assert_eq!(est.calories, 70.0);
        assert_eq!(est.protein_grams, 6.5);
    }

    #[test]
    fn tolerates_extra_fields() {
        let est =
            NutritionEstimate::from_model_json(r#"{"calories": 120, "protein": 4, "fat": 2}"#).unwrap();
        assert_eq!(est.calories, 120.0);
    }

    #[test]
    fn rejects_missing_protein() {
        let err = NutritionEstimate::from_model_json(r#"{"calories": 120}"#).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn rejects_string_numbers() {
        let err =
            NutritionEstimate::from_model_json(r#"{"calories": "120", "protein": 4}"#).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn rejects_prose() {
        let err = NutritionEstimate::from_model_json("About 120 calories.").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn rejects_negative_and_absurd_values() {
        let neg = NutritionEstimate::from_model_json(r#"{"calories": -5, "protein": 4}"#).unwrap_err();
        assert!(neg.to_string().contains("calories"));
        let huge =
            NutritionEstimate::from_model_json(r#"{"calories": 100, "protein": 5000}"#).unwrap_err();
        assert!(huge.to_string().contains("protein"));
    }
}
