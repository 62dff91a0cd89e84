//! Field type registry and field metadata
//!
//! This module maps declared field type tags to their category and holds the
//! field references resolved for each data source.

mod provider;
mod types;

pub use provider::*;
pub use types::*;
