//! Field type tags, categories and references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad family a field type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Numeric,
    Text,
    Temporal,
    Boolean,
    Relational,
    Unknown,
}

/// Declared type of a field reachable from a data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Char,
    Text,
    Email,
    Url,
    Slug,
    Integer,
    BigInteger,
    SmallInteger,
    PositiveInteger,
    Auto,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    ForeignKey,
    OneToOne,
    ManyToMany,
    /// Tag not known to the registry, kept verbatim
    Other(String),
}

impl FieldType {
    /// Every type the registry knows about, in declaration order
    pub const KNOWN: [FieldType; 18] = [
        FieldType::Char,
        FieldType::Text,
        FieldType::Email,
        FieldType::Url,
        FieldType::Slug,
        FieldType::Integer,
        FieldType::BigInteger,
        FieldType::SmallInteger,
        FieldType::PositiveInteger,
        FieldType::Auto,
        FieldType::Float,
        FieldType::Decimal,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::ForeignKey,
        FieldType::OneToOne,
        FieldType::ManyToMany,
    ];

    /// Parse a declared type tag. Short lowercase aliases are accepted.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "CharField" | "char" | "text" | "string" => FieldType::Char,
            "TextField" => FieldType::Text,
            "EmailField" | "email" => FieldType::Email,
            "URLField" | "url" => FieldType::Url,
            "SlugField" | "slug" => FieldType::Slug,
            "IntegerField" | "integer" | "int" => FieldType::Integer,
            "BigIntegerField" => FieldType::BigInteger,
            "SmallIntegerField" => FieldType::SmallInteger,
            "PositiveIntegerField" => FieldType::PositiveInteger,
            "AutoField" | "BigAutoField" => FieldType::Auto,
            "FloatField" | "float" => FieldType::Float,
            "DecimalField" | "decimal" => FieldType::Decimal,
            "BooleanField" | "boolean" | "bool" => FieldType::Boolean,
            "DateField" | "date" => FieldType::Date,
            "DateTimeField" | "datetime" => FieldType::DateTime,
            "ForeignKey" | "relation" => FieldType::ForeignKey,
            "OneToOneField" => FieldType::OneToOne,
            "ManyToManyField" => FieldType::ManyToMany,
            other => FieldType::Other(other.to_string()),
        }
    }

    /// Canonical tag used on the wire
    pub fn tag(&self) -> &str {
        match self {
            FieldType::Char => "CharField",
            FieldType::Text => "TextField",
            FieldType::Email => "EmailField",
            FieldType::Url => "URLField",
            FieldType::Slug => "SlugField",
            FieldType::Integer => "IntegerField",
            FieldType::BigInteger => "BigIntegerField",
            FieldType::SmallInteger => "SmallIntegerField",
            FieldType::PositiveInteger => "PositiveIntegerField",
            FieldType::Auto => "AutoField",
            FieldType::Float => "FloatField",
            FieldType::Decimal => "DecimalField",
            FieldType::Boolean => "BooleanField",
            FieldType::Date => "DateField",
            FieldType::DateTime => "DateTimeField",
            FieldType::ForeignKey => "ForeignKey",
            FieldType::OneToOne => "OneToOneField",
            FieldType::ManyToMany => "ManyToManyField",
            FieldType::Other(tag) => tag,
        }
    }

    pub fn category(&self) -> FieldCategory {
        match self {
            FieldType::Integer
            | FieldType::BigInteger
            | FieldType::SmallInteger
            | FieldType::PositiveInteger
            | FieldType::Auto
            | FieldType::Float
            | FieldType::Decimal => FieldCategory::Numeric,
            FieldType::Char
            | FieldType::Text
            | FieldType::Email
            | FieldType::Url
            | FieldType::Slug => FieldCategory::Text,
            FieldType::Date | FieldType::DateTime => FieldCategory::Temporal,
            FieldType::Boolean => FieldCategory::Boolean,
            FieldType::ForeignKey | FieldType::OneToOne | FieldType::ManyToMany => {
                FieldCategory::Relational
            }
            FieldType::Other(_) => FieldCategory::Unknown,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.category() == FieldCategory::Numeric
    }

    #[inline]
    pub fn is_textual(&self) -> bool {
        self.category() == FieldCategory::Text
    }

    #[inline]
    pub fn is_temporal(&self) -> bool {
        self.category() == FieldCategory::Temporal
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        self.category() == FieldCategory::Boolean
    }

    #[inline]
    pub fn is_relational(&self) -> bool {
        self.category() == FieldCategory::Relational
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        FieldType::from_tag(&tag)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.tag().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of a resolved set of fields (a model or view the report reads from)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceId(pub String);

impl DataSourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column reachable from a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReference {
    /// Dotted path, relations separated by `__` or `.`
    pub path: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_relation: bool,
}

impl FieldReference {
    pub fn new(path: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        let is_relation = field_type.is_relational();
        Self {
            path: path.into(),
            label: label.into(),
            field_type,
            is_relation,
        }
    }

    /// Label shown to the user, falling back to the path
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.path
        } else {
            &self.label
        }
    }
}
