//! Persistence collaborator
//!
//! The remote store keeps one record per condition. Calls are optimistic:
//! local edits never wait on them, except removal of a persisted node.

mod command;
mod memory;

pub use command::*;
pub use memory::*;

use crate::codec::ConditionRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Condition {0} not found")]
    NotFound(i64),

    #[error("Rejected by the server: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Create/update/delete of individual condition records
#[async_trait]
pub trait ConditionStore: Send + Sync {
    /// Persist a new record; the returned record carries its identity
    async fn create(&self, record: &ConditionRecord) -> Result<ConditionRecord, StoreError>;

    async fn update(&self, id: i64, record: &ConditionRecord)
        -> Result<ConditionRecord, StoreError>;

    /// Implementations may report unknown ids as `NotFound`; callers treat
    /// that as success
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Delete where an already-missing record counts as deleted
pub async fn delete_idempotent(store: &dyn ConditionStore, id: i64) -> Result<(), StoreError> {
    match store.delete(id).await {
        Err(err) if err.is_not_found() => {
            tracing::debug!(id, "delete of unknown condition treated as success");
            Ok(())
        }
        other => other,
    }
}
