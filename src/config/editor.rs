//! Editor settings

use crate::config::{from_json_file, from_json_str};
use crate::error::Result;
use crate::field::DataSourceId;
use crate::tree::Combinator;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Combinator of the root group for a new, empty filter
    pub root_combinator: Combinator,
    /// Deepest nesting allowed for groups, the root being level 0.
    /// Unlimited when absent.
    pub max_group_depth: Option<usize>,
    #[serde(default = "default_new_conditions_active")]
    pub new_conditions_active: bool,
    /// Data source used for new conditions when a group has none of its own
    pub primary_data_source: Option<DataSourceId>,
}

fn default_new_conditions_active() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            root_combinator: Combinator::And,
            max_group_depth: None,
            new_conditions_active: default_new_conditions_active(),
            primary_data_source: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        from_json_str(json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        from_json_file(path.as_ref())
    }

    /// Whether a group may be created below a group at `parent_depth`
    #[inline]
    pub fn allows_group_below(&self, parent_depth: usize) -> bool {
        self.max_group_depth
            .map_or(true, |limit| parent_depth < limit)
    }
}
