//! Operator catalog per field type

use crate::field::{FieldCategory, FieldType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Comparison operators a condition can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "eq")]
    Eq,
    #[serde(rename = "ne")]
    Ne,
    #[serde(rename = "isnull")]
    IsNull,
    #[serde(rename = "isnotnull")]
    IsNotNull,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "lte")]
    Lte,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "icontains")]
    IContains,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "endswith")]
    EndsWith,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "date_range")]
    DateRange,
}

/// Grouping used when presenting operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCategory {
    Equality,
    Comparison,
    Text,
    List,
    NullCheck,
    DateRange,
}

impl Operator {
    pub const ALL: [Operator; 17] = [
        Operator::Eq,
        Operator::Ne,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Between,
        Operator::Contains,
        Operator::IContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Regex,
        Operator::In,
        Operator::NotIn,
        Operator::DateRange,
    ];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::IsNull => "isnull",
            Operator::IsNotNull => "isnotnull",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::Contains => "contains",
            Operator::IContains => "icontains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Regex => "regex",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::DateRange => "date_range",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operator::Eq => "Equals",
            Operator::Ne => "Not equals",
            Operator::IsNull => "Is empty",
            Operator::IsNotNull => "Is not empty",
            Operator::Gt => "Greater than",
            Operator::Gte => "Greater than or equal",
            Operator::Lt => "Less than",
            Operator::Lte => "Less than or equal",
            Operator::Between => "Between",
            Operator::Contains => "Contains",
            Operator::IContains => "Contains (case-insensitive)",
            Operator::StartsWith => "Starts with",
            Operator::EndsWith => "Ends with",
            Operator::Regex => "Matches pattern",
            Operator::In => "In list",
            Operator::NotIn => "Not in list",
            Operator::DateRange => "Date range",
        }
    }

    pub fn category(self) -> OperatorCategory {
        match self {
            Operator::Eq | Operator::Ne => OperatorCategory::Equality,
            Operator::IsNull | Operator::IsNotNull => OperatorCategory::NullCheck,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Between => {
                OperatorCategory::Comparison
            }
            Operator::Contains
            | Operator::IContains
            | Operator::StartsWith
            | Operator::EndsWith
            | Operator::Regex => OperatorCategory::Text,
            Operator::In | Operator::NotIn => OperatorCategory::List,
            Operator::DateRange => OperatorCategory::DateRange,
        }
    }

    pub fn parse(name: &str) -> Option<Operator> {
        Operator::ALL.iter().copied().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable entry of a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorEntry {
    pub operator: Operator,
    pub label: &'static str,
}

impl From<Operator> for OperatorEntry {
    fn from(operator: Operator) -> Self {
        Self {
            operator,
            label: operator.label(),
        }
    }
}

/// Ordered operator entries; the largest catalog fits inline
pub type OperatorList = SmallVec<[OperatorEntry; 12]>;

// Primitive operator sets the catalogs are assembled from
const BASE: [Operator; 4] = [
    Operator::Eq,
    Operator::Ne,
    Operator::IsNull,
    Operator::IsNotNull,
];
const NUMERIC: [Operator; 5] = [
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Between,
];
const TEXT: [Operator; 5] = [
    Operator::Contains,
    Operator::IContains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Regex,
];
const LIST: [Operator; 2] = [Operator::In, Operator::NotIn];
const BOOLEAN: [Operator; 2] = [Operator::Eq, Operator::Ne];
const FALLBACK: [Operator; 5] = [
    Operator::Eq,
    Operator::Ne,
    Operator::Contains,
    Operator::IsNull,
    Operator::IsNotNull,
];

/// Ordered operators legal for a field type. Never empty.
pub fn operators_for(field_type: &FieldType) -> OperatorList {
    let mut list = OperatorList::new();
    let mut extend = |set: &[Operator]| list.extend(set.iter().copied().map(OperatorEntry::from));

    match field_type.category() {
        FieldCategory::Numeric => {
            extend(&BASE);
            extend(&NUMERIC);
        }
        FieldCategory::Text => {
            extend(&BASE);
            extend(&TEXT);
            extend(&LIST);
        }
        FieldCategory::Temporal => {
            extend(&BASE);
            extend(&[Operator::DateRange]);
            extend(&NUMERIC);
        }
        FieldCategory::Boolean => extend(&BOOLEAN),
        FieldCategory::Relational => {
            extend(&BASE);
            extend(&LIST);
        }
        FieldCategory::Unknown => extend(&FALLBACK),
    }

    list
}

/// Whether `operator` belongs to the catalog of `field_type`
pub fn is_operator_allowed(operator: Operator, field_type: &FieldType) -> bool {
    operators_for(field_type)
        .iter()
        .any(|entry| entry.operator == operator)
}

/// First catalog entry, the operator new or re-typed conditions start with
pub fn default_operator(field_type: &FieldType) -> Operator {
    operators_for(field_type)
        .first()
        .map(|entry| entry.operator)
        .unwrap_or(Operator::Eq)
}
