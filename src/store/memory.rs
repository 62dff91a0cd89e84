//! In-process condition store

use crate::codec::ConditionRecord;
use crate::store::{ConditionStore, StoreError};
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Default)]
struct Inner {
    records: AHashMap<i64, ConditionRecord>,
    next_id: i64,
    fail_next: Option<StoreError>,
    calls: Vec<StoreCall>,
}

/// Call log entry, for assertions on what reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create,
    Update(i64),
    Delete(i64),
}

/// Store keeping records in memory, with optional latency and one-shot
/// failure injection
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: StoreError) {
        self.inner.lock().fail_next = Some(error);
    }

    pub fn get(&self, id: i64) -> Option<ConditionRecord> {
        self.inner.lock().records.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    async fn round_trip(&self, call: StoreCall) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        match inner.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConditionStore for MemoryStore {
    async fn create(&self, record: &ConditionRecord) -> Result<ConditionRecord, StoreError> {
        self.round_trip(StoreCall::Create).await?;

        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let mut stored = record.clone();
        stored.id = Some(id);
        inner.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: i64,
        record: &ConditionRecord,
    ) -> Result<ConditionRecord, StoreError> {
        self.round_trip(StoreCall::Update(id)).await?;

        let mut inner = self.inner.lock();
        let stored = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *stored = ConditionRecord {
            id: Some(id),
            ..record.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.round_trip(StoreCall::Delete(id)).await?;

        let mut inner = self.inner.lock();
        inner
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
