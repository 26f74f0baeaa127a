use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument};

use super::repo::RecordStore;
use super::repo_types::{DailyRecord, HistoryEntry, Remaining, Totals, UserId};
use crate::errors::AppError;
use crate::nutrition::NutritionEstimator;

pub const RESET_INTERVAL: Duration = Duration::hours(24);

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub entries: Vec<HistoryEntry>,
    pub totals: Totals,
}

/// Owns every user's daily record and the rules for changing it.
pub struct Ledger {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Check-and-reset. Callers must already hold the user's lock.
    async fn load(&self, user_id: UserId) -> DailyRecord {
        let now = self.clock.now();
        if let Some(rec) = self.store.get(user_id).await {
            if now - rec.last_reset < RESET_INTERVAL {
                return rec;
            }
            info!(%user_id, last_reset = %rec.last_reset, "daily record expired, resetting");
        }
        let fresh = DailyRecord::new(now);
        self.store.put(user_id, fresh.clone()).await;
        fresh
    }

    pub async fn get_or_reset_record(&self, user_id: UserId) -> DailyRecord {
        let _guard = self.store.lock(user_id).await;
        self.load(user_id).await
    }

    /// Estimates every item and commits them together. Any failed lookup
    /// aborts the whole call and leaves the record as it was.
    #[instrument(skip(self, items, estimator), fields(item_count = items.len()))]
    pub async fn add_entries(
        &self,
        user_id: UserId,
        items: &[String],
        estimator: &dyn NutritionEstimator,
    ) -> Result<AddOutcome, AppError> {
        if items.is_empty() {
            return Err(AppError::Validation("no food items given".into()));
        }

        let _guard = self.store.lock(user_id).await;
        let mut record = self.load(user_id).await;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let estimate = estimator.estimate(item).await?;
            entries.push(HistoryEntry::new(item, estimate));
        }

        record.history.extend(entries.iter().cloned());
        record.recompute_totals();
        let totals = record.totals();
        self.store.put(user_id, record).await;

        debug!(%user_id, calories = totals.calories, protein = totals.protein_grams, "entries added");
        Ok(AddOutcome { entries, totals })
    }

    pub async fn remaining_allowance(&self, user_id: UserId) -> Remaining {
        self.get_or_reset_record(user_id).await.remaining()
    }

    pub async fn totals(&self, user_id: UserId) -> Totals {
        self.get_or_reset_record(user_id).await.totals()
    }

    pub async fn undo_last(&self, user_id: UserId) -> Result<HistoryEntry, AppError> {
        let _guard = self.store.lock(user_id).await;
        let mut record = self.load(user_id).await;

        let removed = record
            .history
            .pop()
            .ok_or(AppError::NotFound("no entries to undo"))?;
        record.recompute_totals();
        self.store.put(user_id, record).await;

        debug!(%user_id, entry = %removed.description, "last entry undone");
        Ok(removed)
    }

    pub async fn clear_all(&self, user_id: UserId) {
        let _guard = self.store.lock(user_id).await;
        self.store
            .put(user_id, DailyRecord::new(self.clock.now()))
            .await;
        debug!(%user_id, "record cleared");
    }

    pub async fn history(&self, user_id: UserId) -> Vec<HistoryEntry> {
        self.get_or_reset_record(user_id).await.history
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::{Duration, OffsetDateTime};

    use super::Clock;
    use crate::errors::AppError;
    use crate::nutrition::{NutritionEstimate, NutritionEstimator};

    pub struct ManualClock(Mutex<OffsetDateTime>);

    impl ManualClock {
        pub fn new() -> Self {
            Self(Mutex::new(OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)))
        }

        pub fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    /// Looks items up in a fixed table; unknown items fail like a backend outage.
    #[derive(Default)]
    pub struct TableEstimator {
        table: HashMap<String, NutritionEstimate>,
        pub calls: Mutex<Vec<String>>,
    }

    impl TableEstimator {
        pub fn with(items: &[(&str, f64, f64)]) -> Self {
            let table = items
                .iter()
                .map(|(name, calories, protein)| {
                    (
                        name.to_string(),
                        NutritionEstimate { calories: *calories, protein_grams: *protein },
                    )
                })
                .collect();
            Self { table, calls: Mutex::default() }
        }
    }

    #[async_trait]
    impl NutritionEstimator for TableEstimator {
        async fn estimate(&self, food_description: &str) -> Result<NutritionEstimate, AppError> {
            self.calls.lock().unwrap().push(food_description.to_string());
            tokio::task::yield_now().await;
            self.table
                .get(food_description)
                .copied()
                .ok_or_else(|| AppError::Backend(format!("no estimate for {food_description}")))
        }
    }
}
