//! Memoizing wrapper around [`operators_for`]
//!
//! Owned by the caller (one per editing session), so nothing leaks between
//! sessions.

use crate::field::FieldType;
use crate::operator::catalog::{operators_for, OperatorEntry};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Default)]
pub struct OperatorCache {
    catalogs: RwLock<AHashMap<FieldType, Arc<[OperatorEntry]>>>,
}

impl OperatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or build the catalog for a field type
    #[inline]
    pub fn get(&self, field_type: &FieldType) -> Arc<[OperatorEntry]> {
        // Fast path: check read lock first
        {
            let cache = self.catalogs.read();
            if let Some(catalog) = cache.get(field_type) {
                return catalog.clone();
            }
        }

        // Slow path: build and cache
        let catalog: Arc<[OperatorEntry]> = operators_for(field_type).into_iter().collect();

        {
            let mut cache = self.catalogs.write();
            cache.insert(field_type.clone(), catalog.clone());
        }

        catalog
    }

    pub fn clear(&self) {
        self.catalogs.write().clear();
    }

    pub fn len(&self) -> usize {
        self.catalogs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
