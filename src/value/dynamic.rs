//! Registry of named computed values
//!
//! A condition whose value source is `dynamic` stores one of these keys; the
//! report backend computes the actual value when the report runs.

use crate::field::{FieldCategory, FieldType};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::Serialize;

/// A named computed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DynamicValue {
    pub key: &'static str,
    pub label: &'static str,
    /// Field categories the value makes sense for
    pub applies_to: &'static [FieldCategory],
}

const DATES: &[FieldCategory] = &[FieldCategory::Temporal];
const VIEWER_ID: &[FieldCategory] = &[FieldCategory::Numeric, FieldCategory::Relational];
const VIEWER_TEXT: &[FieldCategory] = &[FieldCategory::Text];

static DYNAMIC_VALUES: [DynamicValue; 13] = [
    DynamicValue { key: "today", label: "Today", applies_to: DATES },
    DynamicValue { key: "yesterday", label: "Yesterday", applies_to: DATES },
    DynamicValue { key: "tomorrow", label: "Tomorrow", applies_to: DATES },
    DynamicValue { key: "now", label: "Now", applies_to: DATES },
    DynamicValue { key: "start_of_week", label: "Start of current week", applies_to: DATES },
    DynamicValue { key: "end_of_week", label: "End of current week", applies_to: DATES },
    DynamicValue { key: "start_of_month", label: "Start of current month", applies_to: DATES },
    DynamicValue { key: "end_of_month", label: "End of current month", applies_to: DATES },
    DynamicValue { key: "start_of_year", label: "Start of current year", applies_to: DATES },
    DynamicValue { key: "end_of_year", label: "End of current year", applies_to: DATES },
    DynamicValue { key: "current_user_id", label: "Current viewer id", applies_to: VIEWER_ID },
    DynamicValue { key: "current_user_email", label: "Current viewer email", applies_to: VIEWER_TEXT },
    DynamicValue {
        key: "current_user_username",
        label: "Current viewer username",
        applies_to: VIEWER_TEXT,
    },
];

static DYNAMIC_INDEX: Lazy<AHashMap<&'static str, &'static DynamicValue>> =
    Lazy::new(|| DYNAMIC_VALUES.iter().map(|value| (value.key, value)).collect());

/// Every registered dynamic value, in presentation order
pub fn dynamic_values() -> &'static [DynamicValue] {
    &DYNAMIC_VALUES
}

pub fn dynamic_value(key: &str) -> Option<&'static DynamicValue> {
    DYNAMIC_INDEX.get(key).copied()
}

/// Dynamic values offered for a field of the given type
pub fn dynamic_values_for(field_type: &FieldType) -> impl Iterator<Item = &'static DynamicValue> {
    let category = field_type.category();
    DYNAMIC_VALUES
        .iter()
        .filter(move |value| value.applies_to.contains(&category))
}
