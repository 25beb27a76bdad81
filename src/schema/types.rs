//! Field type tags
//!
//! Supported types:
//! - string / text: UTF-8 string
//! - integer: 64-bit signed integer
//! - float: 64-bit floating point
//! - decimal: exact decimal
//! - boolean
//! - date: calendar date
//! - time: time of day
//! - datetime (alias date_time): UTC timestamp
//! - any: identity, no narrowing

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Declared type of a store field. Immutable once a field is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Time,
    #[serde(alias = "date_time")]
    DateTime,
    Any,
}

impl FieldType {
    /// Every supported type, in declaration-method order
    pub const ALL: [FieldType; 10] = [
        FieldType::String,
        FieldType::Text,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Decimal,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Time,
        FieldType::Boolean,
        FieldType::Any,
    ];

    /// Returns the type tag
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "datetime",
            FieldType::Any => "any",
        }
    }

    /// Whether the type is string-like (nil defaults stay nil)
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Text)
    }
}

impl FromStr for FieldType {
    type Err = StoreError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "string" => Ok(FieldType::String),
            "text" => Ok(FieldType::Text),
            "integer" => Ok(FieldType::Integer),
            "float" => Ok(FieldType::Float),
            "decimal" => Ok(FieldType::Decimal),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            "time" => Ok(FieldType::Time),
            "datetime" | "date_time" => Ok(FieldType::DateTime),
            "any" => Ok(FieldType::Any),
            other => Err(StoreError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_tag() {
        for field_type in FieldType::ALL {
            assert_eq!(field_type.type_name().parse::<FieldType>().unwrap(), field_type);
        }
        assert_eq!("date_time".parse::<FieldType>().unwrap(), FieldType::DateTime);
    }

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let err = "money".parse::<FieldType>().unwrap_err();
        assert_eq!(err, StoreError::UnsupportedType("money".into()));
    }

    #[test]
    fn test_serde_tags() {
        let parsed: FieldType = serde_json::from_str("\"date_time\"").unwrap();
        assert_eq!(parsed, FieldType::DateTime);
        assert_eq!(serde_json::to_string(&FieldType::DateTime).unwrap(), "\"datetime\"");
    }
}
