//! Static data-source catalogs

use crate::config::{from_json_file, from_json_str};
use crate::error::{FilterError, Result};
use crate::field::{DataSourceId, FieldReference, StaticFieldProvider};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One data source and its ordered fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub id: DataSourceId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldReference>,
}

/// Expected format: `{"data_sources": [{"id": ..., "fields": [...]}, ...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub data_sources: Vec<DataSourceConfig>,
}

impl CatalogConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = from_json_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let catalog: Self = from_json_file(path.as_ref())?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        for (index, source) in self.data_sources.iter().enumerate() {
            if self.data_sources[..index].iter().any(|s| s.id == source.id) {
                return Err(FilterError::Config(format!(
                    "duplicate data source {}",
                    source.id
                )));
            }
            for (i, field) in source.fields.iter().enumerate() {
                if field.path.is_empty() {
                    return Err(FilterError::Config(format!(
                        "empty field path in data source {}",
                        source.id
                    )));
                }
                if source.fields[..i].iter().any(|f| f.path == field.path) {
                    return Err(FilterError::Config(format!(
                        "duplicate field {} in data source {}",
                        field.path, source.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Data sources in declaration order
    pub fn ids(&self) -> Vec<DataSourceId> {
        self.data_sources.iter().map(|s| s.id.clone()).collect()
    }

    pub fn into_provider(self) -> StaticFieldProvider {
        let mut provider = StaticFieldProvider::new();
        for source in self.data_sources {
            let fields = source
                .fields
                .into_iter()
                .map(|mut field| {
                    // Relation flag follows the type unless set explicitly
                    field.is_relation |= field.field_type.is_relational();
                    field
                })
                .collect();
            provider.insert(source.id, fields);
        }
        provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldProvider, FieldType};

    const CATALOG: &str = r#"{
        "data_sources": [
            {
                "id": "orders",
                "label": "Orders",
                "fields": [
                    {"path": "status", "label": "Status", "type": "CharField"},
                    {"path": "total", "type": "DecimalField"},
                    {"path": "customer", "label": "Customer", "type": "ForeignKey"}
                ]
            },
            {"id": "customers"}
        ]
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = CatalogConfig::from_json_str(CATALOG).unwrap();
        assert_eq!(
            catalog.ids(),
            vec![DataSourceId::new("orders"), DataSourceId::new("customers")]
        );
        let orders = &catalog.data_sources[0];
        assert_eq!(orders.fields[1].field_type, FieldType::Decimal);
        assert_eq!(orders.fields[1].display_name(), "total");
        assert!(catalog.data_sources[1].fields.is_empty());
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let json = r#"{"data_sources": [{"id": "orders", "fields": [
            {"path": "a", "type": "CharField"},
            {"path": "a", "type": "IntegerField"}
        ]}]}"#;
        assert!(matches!(
            CatalogConfig::from_json_str(json),
            Err(FilterError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_into_provider_marks_relations() {
        let provider = CatalogConfig::from_json_str(CATALOG).unwrap().into_provider();
        let fields = provider.fields(&DataSourceId::new("orders")).await.unwrap();

        assert_eq!(fields.len(), 3);
        assert!(fields[2].is_relation);
        assert!(!fields[0].is_relation);
        assert!(provider
            .fields(&DataSourceId::new("customers"))
            .await
            .unwrap()
            .is_empty());
    }
}
