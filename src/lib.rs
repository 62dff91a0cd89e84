//! Report Filter Core - filter-expression builder for report templates
//!
//! This crate models a report's filter as a tree of AND/OR groups holding
//! field conditions, keeps it consistent under editing, and converts it to
//! and from the flat condition list that is persisted and executed.
//!
//! - [`operator`]: which operators a field type admits
//! - [`value`]: what an empty value looks like for an operator and type
//! - [`tree`]: the filter tree and its invariants
//! - [`codec`]: tree ↔ flat list
//! - [`editor`]: the mutation engine and its persistence steps

pub mod codec;
pub mod config;
pub mod editor;
pub mod error;
pub mod field;
pub mod operator;
pub mod store;
pub mod tree;
pub mod value;

pub use crate::codec::{flatten, flatten_for_execution, rebuild, rebuild_with_root, ConditionRecord};
pub use crate::config::{CatalogConfig, EditorConfig};
pub use crate::editor::{ChangeAction, ChangeEvent, FilterEditor, Notice, NoticeLevel};
pub use crate::error::{FilterError, Result};
pub use crate::field::{DataSourceId, FieldProvider, FieldReference, FieldType};
pub use crate::operator::{operators_for, Operator};
pub use crate::store::{ConditionStore, MemoryStore, StoreError};
pub use crate::tree::{Combinator, Condition, FilterTree, GroupId, NodeId, NodeKey};
pub use crate::value::{shape_for, ValueKind, ValueShape, ValueSource};
