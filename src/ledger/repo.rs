use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::repo_types::{DailyRecord, UserId};

/// Keyed storage for daily records.
///
/// Callers take `lock(user)` and keep the guard for the whole
/// read-modify-write; `get`/`put` themselves only guard the map.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()>;
    async fn get(&self, user_id: UserId) -> Option<DailyRecord>;
    async fn put(&self, user_id: UserId, record: DailyRecord);
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<UserId, DailyRecord>>,
    locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let user_lock = {
            let mut locks = guard(&self.locks);
            // only the map holds an idle lock: nobody owns or waits on it
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(user_id).or_default().clone()
        };
        user_lock.lock_owned().await
    }

    async fn get(&self, user_id: UserId) -> Option<DailyRecord> {
        guard(&self.records).get(&user_id).cloned()
    }

    async fn put(&self, user_id: UserId, record: DailyRecord) {
        guard(&self.records).insert(user_id, record);
    }
}
