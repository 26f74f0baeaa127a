use std::fmt;

use time::OffsetDateTime;

use crate::nutrition::NutritionEstimate;

pub const DAILY_CALORIES: f64 = 2250.0;
pub const DAILY_PROTEIN: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One logged food item. Numbers are kept next to the rendered line so undo
/// never has to read them back out of display text.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub description: String,
    pub calories: f64,
    pub protein_grams: f64,
    pub rendered: String,
}

impl HistoryEntry {
    pub fn new(description: &str, estimate: NutritionEstimate) -> Self {
        let rendered = format!(
            "{} (**Calories:** {} kcal, **Protein:** {}g)",
            description,
            format_amount(estimate.calories),
            format_amount(estimate.protein_grams),
        );
        Self {
            description: description.to_string(),
            calories: estimate.calories,
            protein_grams: estimate.protein_grams,
            rendered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub calories: f64,
    pub protein_grams: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remaining {
    pub calories_left: f64,
    pub protein_left: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub calories_consumed: f64,
    pub protein_consumed_grams: f64,
    pub history: Vec<HistoryEntry>,
    pub last_reset: OffsetDateTime,
}

impl DailyRecord {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            calories_consumed: 0.0,
            protein_consumed_grams: 0.0,
            history: Vec::new(),
            last_reset: now,
        }
    }

    pub fn totals(&self) -> Totals {
        Totals {
            calories: self.calories_consumed,
            protein_grams: self.protein_consumed_grams,
        }
    }

    pub fn remaining(&self) -> Remaining {
        Remaining {
            calories_left: DAILY_CALORIES - self.calories_consumed,
            protein_left: DAILY_PROTEIN - self.protein_consumed_grams,
        }
    }

    /// Totals are always the in-order sum over `history`.
    pub(crate) fn recompute_totals(&mut self) {
        let (calories, protein) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(c, p), e| (c + e.calories, p + e.protein_grams));
        self.calories_consumed = calories;
        self.protein_consumed_grams = protein;
    }
}

/// Renders a quantity with at most one decimal place: `70`, `6.5`.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    // avoid printing "-0"
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}
