//! Field metadata provider and caller-side cache

use crate::error::{FilterError, Result};
use crate::field::{DataSourceId, FieldReference};
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Resolves the ordered fields available on a data source.
///
/// Implementations may be remote; callers cache the answer through
/// [`FieldCache`] so the provider is asked at most once per data source.
#[async_trait]
pub trait FieldProvider: Send + Sync {
    async fn fields(&self, data_source: &DataSourceId) -> Result<Vec<FieldReference>>;
}

/// Provider backed by catalogs known up front (configuration, fixtures)
#[derive(Debug, Clone, Default)]
pub struct StaticFieldProvider {
    catalogs: AHashMap<DataSourceId, Vec<FieldReference>>,
}

impl StaticFieldProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_source(
        mut self,
        data_source: DataSourceId,
        fields: Vec<FieldReference>,
    ) -> Self {
        self.catalogs.insert(data_source, fields);
        self
    }

    pub fn insert(&mut self, data_source: DataSourceId, fields: Vec<FieldReference>) {
        self.catalogs.insert(data_source, fields);
    }

    pub fn data_sources(&self) -> impl Iterator<Item = &DataSourceId> {
        self.catalogs.keys()
    }
}

#[async_trait]
impl FieldProvider for StaticFieldProvider {
    async fn fields(&self, data_source: &DataSourceId) -> Result<Vec<FieldReference>> {
        self.catalogs.get(data_source).cloned().ok_or_else(|| {
            FilterError::MetadataUnavailable(format!("unknown data source {}", data_source))
        })
    }
}

/// Resolved field lists keyed by data source.
///
/// Clones share the same storage. Lookups never block on the provider:
/// until [`FieldCache::load`] has completed for a data source, it simply
/// has no fields.
#[derive(Clone, Default)]
pub struct FieldCache {
    resolved: Arc<RwLock<AHashMap<DataSourceId, Arc<[FieldReference]>>>>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a data source through the provider, reusing a cached answer
    pub async fn load(
        &self,
        provider: &dyn FieldProvider,
        data_source: &DataSourceId,
    ) -> Result<Arc<[FieldReference]>> {
        // Fast path: already resolved
        if let Some(fields) = self.get(data_source) {
            return Ok(fields);
        }

        let fields: Arc<[FieldReference]> = provider.fields(data_source).await?.into();
        tracing::debug!(
            data_source = %data_source,
            count = fields.len(),
            "resolved field metadata"
        );

        let mut cache = self.resolved.write();
        // A concurrent load may have won; keep the first answer
        let entry = cache
            .entry(data_source.clone())
            .or_insert_with(|| fields.clone());
        Ok(entry.clone())
    }

    /// Seed the cache directly, e.g. with metadata fetched elsewhere
    pub fn insert(&self, data_source: DataSourceId, fields: Vec<FieldReference>) {
        self.resolved.write().insert(data_source, fields.into());
    }

    #[inline]
    pub fn get(&self, data_source: &DataSourceId) -> Option<Arc<[FieldReference]>> {
        self.resolved.read().get(data_source).cloned()
    }

    /// Look up a single field by path
    pub fn field(&self, data_source: &DataSourceId, path: &str) -> Option<FieldReference> {
        let cache = self.resolved.read();
        cache
            .get(data_source)?
            .iter()
            .find(|field| field.path == path)
            .cloned()
    }

    /// First field of a data source, used as the default for new conditions
    pub fn first_field(&self, data_source: &DataSourceId) -> Option<FieldReference> {
        let cache = self.resolved.read();
        cache.get(data_source)?.first().cloned()
    }

    pub fn is_loaded(&self, data_source: &DataSourceId) -> bool {
        self.resolved.read().contains_key(data_source)
    }

    pub fn len(&self) -> usize {
        self.resolved.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
