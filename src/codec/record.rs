//! Persisted condition record

use crate::field::{DataSourceId, FieldType};
use crate::operator::Operator;
use crate::tree::{Combinator, Condition, GroupId, NodeKey};
use crate::value::ValueSource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One condition as the remote store and the report executor see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub data_source: DataSourceId,
    pub field_path: String,
    #[serde(default)]
    pub field_name: String,
    pub field_type: FieldType,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub value_type: ValueSource,
    #[serde(default)]
    pub logic_group: Combinator,
    #[serde(default)]
    pub group_order: u32,
    #[serde(default)]
    pub parent_group: Option<GroupId>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_required: bool,
}

fn default_is_active() -> bool {
    true
}

impl From<&Condition> for ConditionRecord {
    fn from(condition: &Condition) -> Self {
        Self {
            id: condition.id,
            data_source: condition.data_source.clone(),
            field_path: condition.field_path.clone(),
            field_name: condition.field_name.clone(),
            field_type: condition.field_type.clone(),
            operator: condition.operator,
            value: condition.value.clone(),
            value_type: condition.value_source,
            logic_group: condition.logic_group,
            group_order: condition.group_order,
            parent_group: condition.parent_group,
            is_active: condition.is_active,
            is_required: condition.is_required,
        }
    }
}

impl ConditionRecord {
    /// In-memory condition carrying this record's content under `key`
    pub fn to_condition(&self, key: NodeKey) -> Condition {
        Condition {
            key,
            id: self.id,
            data_source: self.data_source.clone(),
            field_path: self.field_path.clone(),
            field_name: self.field_name.clone(),
            field_type: self.field_type.clone(),
            operator: self.operator,
            value: self.value.clone(),
            value_source: self.value_type,
            logic_group: self.logic_group,
            group_order: self.group_order,
            parent_group: self.parent_group,
            is_active: self.is_active,
            is_required: self.is_required,
        }
    }
}
