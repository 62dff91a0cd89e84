//! Value shape resolver
//!
//! The single source of truth for what an empty value looks like for a
//! given operator and field type. Operator rules take precedence over type
//! rules.

use crate::field::FieldType;
use crate::operator::Operator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Structural form of a condition value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// No value; always `null`
    None,
    /// A single string, number, boolean or `null`
    Scalar,
    /// Exactly two scalars
    Pair,
    /// Any number of scalars
    List,
    /// `{"start": .., "end": ..}`
    RangeObject,
}

impl ValueKind {
    /// Whether `value` has this shape
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ValueKind::None => value.is_null(),
            ValueKind::Scalar => is_scalar(value),
            ValueKind::Pair => value
                .as_array()
                .map_or(false, |items| items.len() == 2 && items.iter().all(is_scalar)),
            ValueKind::List => value
                .as_array()
                .map_or(false, |items| items.iter().all(is_scalar)),
            ValueKind::RangeObject => value.as_object().map_or(false, |object| {
                object.len() == 2
                    && object.get("start").map_or(false, is_scalar)
                    && object.get("end").map_or(false, is_scalar)
            }),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::None => "none",
            ValueKind::Scalar => "scalar",
            ValueKind::Pair => "pair",
            ValueKind::List => "list",
            ValueKind::RangeObject => "range",
        };
        f.write_str(name)
    }
}

#[inline]
fn is_scalar(value: &Value) -> bool {
    !value.is_array() && !value.is_object()
}

/// Shape a condition's value must take, with its zero value
#[derive(Debug, Clone, PartialEq)]
pub struct ValueShape {
    pub kind: ValueKind,
    pub zero_value: Value,
}

impl ValueShape {
    fn new(kind: ValueKind, zero_value: Value) -> Self {
        Self { kind, zero_value }
    }
}

/// Resolve the value shape for an operator applied to a field type
pub fn shape_for(operator: Operator, field_type: &FieldType) -> ValueShape {
    match operator {
        Operator::IsNull | Operator::IsNotNull => ValueShape::new(ValueKind::None, Value::Null),
        Operator::Between => {
            let zero = if field_type.is_numeric() {
                json!([0, 0])
            } else {
                json!([null, null])
            };
            ValueShape::new(ValueKind::Pair, zero)
        }
        Operator::DateRange => {
            ValueShape::new(ValueKind::RangeObject, json!({"start": null, "end": null}))
        }
        Operator::In | Operator::NotIn => ValueShape::new(ValueKind::List, json!([])),
        _ => ValueShape::new(ValueKind::Scalar, scalar_zero(field_type)),
    }
}

fn scalar_zero(field_type: &FieldType) -> Value {
    if field_type.is_boolean() {
        Value::Bool(false)
    } else if field_type.is_numeric() {
        json!(0)
    } else if field_type.is_temporal() {
        // Left to a date picker
        Value::Null
    } else {
        Value::String(String::new())
    }
}

/// Whether a value carries nothing the user entered
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty() || items.iter().all(Value::is_null),
        Value::Object(object) => object.values().all(Value::is_null),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
