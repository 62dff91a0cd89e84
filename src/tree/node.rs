//! Condition and group nodes

use crate::field::{DataSourceId, FieldReference, FieldType};
use crate::operator::{default_operator, Operator};
use crate::value::{shape_for, ValueKind, ValueShape, ValueSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Local identity of a condition, assigned at creation and stable for the
/// whole editing session whether or not the server knows the condition yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub u64);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Counter-based group token. The number is also the group's ordinal in the
/// flat encoding (`group_order`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    pub const ROOT: GroupId = GroupId(0);

    #[inline]
    pub fn is_root(self) -> bool {
        self == GroupId::ROOT
    }

    #[inline]
    pub fn ordinal(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Boolean combinator of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Combinator {
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Combinator::And => Combinator::Or,
            Combinator::Or => Combinator::And,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("AND"),
            Combinator::Or => f.write_str("OR"),
        }
    }
}

/// A single filter test: one field, one operator, one value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub key: NodeKey,
    /// Server identity, once persisted
    pub id: Option<i64>,
    pub data_source: DataSourceId,
    pub field_path: String,
    pub field_name: String,
    pub field_type: FieldType,
    pub operator: Operator,
    pub value: Value,
    pub value_source: ValueSource,
    // Derived from the parent group by `FilterTree::recompute_derived`
    pub logic_group: Combinator,
    pub group_order: u32,
    pub parent_group: Option<GroupId>,
    pub is_active: bool,
    pub is_required: bool,
}

impl Condition {
    /// Fresh condition on `field`: first legal operator, zero value, static source
    pub fn new(key: NodeKey, data_source: DataSourceId, field: &FieldReference) -> Self {
        let operator = default_operator(&field.field_type);
        let value = shape_for(operator, &field.field_type).zero_value;
        Self {
            key,
            id: None,
            data_source,
            field_path: field.path.clone(),
            field_name: field.display_name().to_string(),
            field_type: field.field_type.clone(),
            operator,
            value,
            value_source: ValueSource::Static,
            logic_group: Combinator::And,
            group_order: GroupId::ROOT.ordinal(),
            parent_group: None,
            is_active: true,
            is_required: false,
        }
    }

    /// Shape the value must currently have
    #[inline]
    pub fn shape(&self) -> ValueShape {
        shape_for(self.operator, &self.field_type)
    }

    /// Full reset onto another field: type, operator, value and source
    pub fn reset_for_field(&mut self, field: &FieldReference) {
        self.field_path = field.path.clone();
        self.field_name = field.display_name().to_string();
        self.field_type = field.field_type.clone();
        self.operator = default_operator(&self.field_type);
        self.value_source = ValueSource::Static;
        self.reset_value();
    }

    /// Switch operator and recompute the value; field and source are kept
    pub fn set_operator(&mut self, operator: Operator) {
        self.operator = operator;
        self.reset_value();
    }

    /// Switch value source and clear the value for it
    pub fn set_value_source(&mut self, source: ValueSource) {
        self.value_source = source;
        self.reset_value();
    }

    /// Replace the value with the empty value for the current operator,
    /// type and source.
    ///
    /// Reference sources get an empty key, except for operators that take
    /// no value at all.
    pub fn reset_value(&mut self) {
        let shape = self.shape();
        self.value = if self.value_source.is_static() || shape.kind == ValueKind::None {
            shape.zero_value
        } else {
            ValueSource::placeholder()
        };
    }

    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// AND/OR container of conditions and nested groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub combinator: Combinator,
    pub children: Vec<FilterNode>,
    pub parent: Option<GroupId>,
}

impl Group {
    pub fn new(id: GroupId, combinator: Combinator, parent: Option<GroupId>) -> Self {
        Self {
            id,
            combinator,
            children: Vec::new(),
            parent,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child conditions
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.children.iter().filter_map(FilterNode::as_condition)
    }

    /// Direct child groups
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.children.iter().filter_map(FilterNode::as_group)
    }

    pub fn find_group(&self, id: GroupId) -> Option<&Group> {
        if self.id == id {
            return Some(self);
        }
        self.groups().find_map(|group| group.find_group(id))
    }

    pub fn find_group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        if self.id == id {
            return Some(self);
        }
        for child in &mut self.children {
            if let FilterNode::Group(group) = child {
                if let Some(found) = group.find_group_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_condition(&self, key: NodeKey) -> Option<&Condition> {
        self.children.iter().find_map(|child| match child {
            FilterNode::Condition(condition) if condition.key == key => Some(condition),
            FilterNode::Condition(_) => None,
            FilterNode::Group(group) => group.find_condition(key),
        })
    }

    pub fn find_condition_mut(&mut self, key: NodeKey) -> Option<&mut Condition> {
        for child in &mut self.children {
            match child {
                FilterNode::Condition(condition) if condition.key == key => {
                    return Some(condition)
                }
                FilterNode::Condition(_) => {}
                FilterNode::Group(group) => {
                    if let Some(found) = group.find_condition_mut(key) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Parent group and index of a node within this subtree
    pub fn locate(&self, node: NodeId) -> Option<(GroupId, usize)> {
        for (index, child) in self.children.iter().enumerate() {
            if child.id() == node {
                return Some((self.id, index));
            }
            if let FilterNode::Group(group) = child {
                if let Some(found) = group.locate(node) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// All conditions of this subtree, in pre-order
    pub fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        for child in &self.children {
            match child {
                FilterNode::Condition(condition) => out.push(condition),
                FilterNode::Group(group) => group.collect_conditions(out),
            }
        }
    }

    /// Number of groups in this subtree, this one included
    pub fn group_count(&self) -> usize {
        1 + self.groups().map(Group::group_count).sum::<usize>()
    }

    /// Highest group number in this subtree
    pub fn max_group_id(&self) -> GroupId {
        self.groups()
            .map(Group::max_group_id)
            .fold(self.id, |max, id| max.max(id))
    }
}

/// Child of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterNode {
    Condition(Condition),
    Group(Group),
}

impl FilterNode {
    pub fn id(&self) -> NodeId {
        match self {
            FilterNode::Condition(condition) => NodeId::Condition(condition.key),
            FilterNode::Group(group) => NodeId::Group(group.id),
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            FilterNode::Condition(condition) => Some(condition),
            FilterNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            FilterNode::Group(group) => Some(group),
            FilterNode::Condition(_) => None,
        }
    }

    /// Conditions of this node: itself, or the whole subtree of a group
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            FilterNode::Condition(condition) => vec![condition],
            FilterNode::Group(group) => {
                let mut out = Vec::new();
                group.collect_conditions(&mut out);
                out
            }
        }
    }
}

/// Reference to a node of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum NodeId {
    Condition(NodeKey),
    Group(GroupId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Condition(key) => key.fmt(f),
            NodeId::Group(id) => id.fmt(f),
        }
    }
}
