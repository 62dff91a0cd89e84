//! Where a condition's value comes from

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Value source of a condition.
///
/// For anything but `Static` the condition's value is a reference key: a
/// parameter name, a dynamic-value identifier or a viewer attribute name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    #[default]
    Static,
    Parameter,
    Dynamic,
    UserAttribute,
}

impl ValueSource {
    pub const ALL: [ValueSource; 4] = [
        ValueSource::Static,
        ValueSource::Parameter,
        ValueSource::Dynamic,
        ValueSource::UserAttribute,
    ];

    #[inline]
    pub fn is_static(self) -> bool {
        self == ValueSource::Static
    }

    /// Value held right after switching to this source, when it is a reference
    pub fn placeholder() -> Value {
        Value::String(String::new())
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueSource::Static => "static",
            ValueSource::Parameter => "parameter",
            ValueSource::Dynamic => "dynamic",
            ValueSource::UserAttribute => "user_attribute",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&ValueSource::UserAttribute).unwrap(),
            "\"user_attribute\""
        );
        let parsed: ValueSource = serde_json::from_str("\"dynamic\"").unwrap();
        assert_eq!(parsed, ValueSource::Dynamic);
        assert_eq!(ValueSource::default(), ValueSource::Static);
    }
}
