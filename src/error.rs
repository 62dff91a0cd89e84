//! Error types for the filter builder core

use crate::field::{DataSourceId, FieldType};
use crate::operator::Operator;
use crate::store::StoreError;
use crate::tree::{GroupId, NodeKey};
use crate::value::ValueKind;
use thiserror::Error;

/// Main error type for the filter builder core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("No data source is available yet")]
    NoDataSource,

    #[error("No fields are available for data source {0}")]
    NoFields(DataSourceId),

    #[error("Field not found: {path} in data source {data_source}")]
    FieldNotFound {
        data_source: DataSourceId,
        path: String,
    },

    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Condition not found: {0}")]
    ConditionNotFound(NodeKey),

    #[error("Operator {operator} is not allowed for field type {field_type}")]
    OperatorNotAllowed {
        operator: Operator,
        field_type: FieldType,
    },

    #[error("Value does not match the expected {expected} shape")]
    ValueShapeMismatch { expected: ValueKind },

    #[error("Reference key must be a string")]
    InvalidReferenceKey,

    #[error("Unknown dynamic value: {0}")]
    UnknownDynamicValue(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Group nesting limit of {0} levels reached")]
    DepthLimit(usize),

    #[error("No group ordinal is left to allocate")]
    GroupLimit,

    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Field metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FilterError {
    /// Configuration errors are recovered locally as a no-op plus a notice.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FilterError::NoDataSource
                | FilterError::NoFields(_)
                | FilterError::FieldNotFound { .. }
                | FilterError::DepthLimit(_)
                | FilterError::MetadataUnavailable(_)
        )
    }
}

/// Result type alias for the filter builder core
pub type Result<T> = std::result::Result<T, FilterError>;
