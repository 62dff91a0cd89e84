//! Tree checks
//!
//! Invariant violations are programming defects the editor must make
//! unreachable; value issues are things the user still has to fix before
//! the report can run.

use crate::field::FieldType;
use crate::operator::{is_operator_allowed, Operator};
use crate::tree::filter::FilterTree;
use crate::tree::node::{Condition, FilterNode, Group, GroupId, NodeKey};
use crate::value::{dynamic_value, is_empty_value, ValueKind, ValueSource};
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    OperatorNotAllowed {
        key: NodeKey,
        operator: Operator,
        field_type: FieldType,
    },
    StaleValueShape {
        key: NodeKey,
        expected: ValueKind,
    },
    NonStringReference {
        key: NodeKey,
    },
    DerivedFieldsOutOfSync {
        key: NodeKey,
    },
    ParentOutOfSync {
        group: GroupId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueIssue {
    InvalidPattern { key: NodeKey, message: String },
    UnknownDynamicValue { key: NodeKey, reference: String },
    MissingRequiredValue { key: NodeKey },
}

impl Condition {
    /// Shape-invariant check for this condition alone
    pub fn shape_violation(&self) -> Option<InvariantViolation> {
        if !is_operator_allowed(self.operator, &self.field_type) {
            return Some(InvariantViolation::OperatorNotAllowed {
                key: self.key,
                operator: self.operator,
                field_type: self.field_type.clone(),
            });
        }

        let shape = self.shape();
        if shape.kind == ValueKind::None || self.value_source.is_static() {
            if !shape.kind.matches(&self.value) {
                return Some(InvariantViolation::StaleValueShape {
                    key: self.key,
                    expected: shape.kind,
                });
            }
        } else if !self.value.is_string() {
            return Some(InvariantViolation::NonStringReference { key: self.key });
        }
        None
    }

    fn value_issue(&self) -> Option<ValueIssue> {
        match self.value_source {
            ValueSource::Static if self.operator == Operator::Regex => {
                let pattern = self.value.as_str().unwrap_or_default();
                if let Err(err) = Regex::new(pattern) {
                    return Some(ValueIssue::InvalidPattern {
                        key: self.key,
                        message: err.to_string(),
                    });
                }
            }
            ValueSource::Dynamic => {
                let reference = self.value.as_str().unwrap_or_default();
                if !reference.is_empty() && dynamic_value(reference).is_none() {
                    return Some(ValueIssue::UnknownDynamicValue {
                        key: self.key,
                        reference: reference.to_string(),
                    });
                }
            }
            _ => {}
        }

        let takes_value = self.shape().kind != ValueKind::None;
        if self.is_required && self.is_active && takes_value && is_empty_value(&self.value) {
            return Some(ValueIssue::MissingRequiredValue { key: self.key });
        }
        None
    }
}

impl FilterTree {
    /// Every broken invariant in the tree; empty for any tree the editor produced
    pub fn invariant_violations(&self) -> Vec<InvariantViolation> {
        let mut out = Vec::new();
        check_group(self.root(), None, &mut out);
        out
    }

    /// Value problems of active conditions, in pre-order
    pub fn value_issues(&self) -> Vec<ValueIssue> {
        self.conditions()
            .into_iter()
            .filter(|condition| condition.is_active)
            .filter_map(Condition::value_issue)
            .collect()
    }
}

fn check_group(group: &Group, parent: Option<GroupId>, out: &mut Vec<InvariantViolation>) {
    if group.parent != parent {
        out.push(InvariantViolation::ParentOutOfSync { group: group.id });
    }
    let parent_group = parent.map(|_| group.id);

    for child in &group.children {
        match child {
            FilterNode::Condition(condition) => {
                if let Some(violation) = condition.shape_violation() {
                    out.push(violation);
                }
                if condition.logic_group != group.combinator
                    || condition.group_order != group.id.ordinal()
                    || condition.parent_group != parent_group
                {
                    out.push(InvariantViolation::DerivedFieldsOutOfSync { key: condition.key });
                }
            }
            FilterNode::Group(nested) => check_group(nested, Some(group.id), out),
        }
    }
}
