//! Change notifications and user-facing notices

use crate::codec::ConditionRecord;
use crate::error::FilterError;
use crate::tree::NodeId;
use serde::Serialize;
use std::fmt;

/// Action tag carried by every change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    AddFilter,
    AddGroup,
    ToggleLogic,
    DragDrop,
    Delete,
    ChangeField,
    ChangeOperator,
    ChangeValue,
    ChangeValueSource,
    ChangeFlags,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::AddFilter => "add_filter",
            ChangeAction::AddGroup => "add_group",
            ChangeAction::ToggleLogic => "toggle_logic",
            ChangeAction::DragDrop => "drag_drop",
            ChangeAction::Delete => "delete",
            ChangeAction::ChangeField => "change_field",
            ChangeAction::ChangeOperator => "change_operator",
            ChangeAction::ChangeValue => "change_value",
            ChangeAction::ChangeValueSource => "change_value_source",
            ChangeAction::ChangeFlags => "change_flags",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted after every successful mutation so a parent surface can persist
/// incrementally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub action: ChangeAction,
    pub node: NodeId,
    /// Record of the mutated condition; absent for group-level actions and
    /// for nodes no longer in the tree
    pub record: Option<ConditionRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// The edit was skipped; nothing is lost
    Warning,
    /// A store call failed
    Error,
}

/// Message for the user about an edit that could not be carried out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl From<&FilterError> for Notice {
    fn from(err: &FilterError) -> Self {
        let level = if err.is_configuration() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Error
        };
        Self {
            level,
            message: err.to_string(),
        }
    }
}
