//! Configuration module for the filter editor
//!
//! This module handles deserialization of editor settings and static
//! data-source catalogs from JSON.

mod data_source;
mod editor;

pub use data_source::*;
pub use editor::*;

use crate::error::{FilterError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a JSON document, reporting failures as configuration errors
fn from_json_str<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| FilterError::Config(e.to_string()))
}

fn from_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| FilterError::Config(format!("{}: {}", path.display(), e)))?;
    from_json_str(&json)
}
