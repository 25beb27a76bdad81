//! Store field definitions
//!
//! A [`Field`] is one named, typed slot of a store. Defaults are cast
//! through the field's own coercion when the field is created, so a stored
//! default is always a canonical value of the field's type.

use serde::{Deserialize, Serialize};

use super::cast;
use super::types::FieldType;
use crate::error::StoreResult;
use crate::value::Value;

/// Options accepted when declaring a field
///
/// ```ignore
/// FieldOptions::new().with_default(12).null(false)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOptions {
    /// Initial value for records that never set the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether the field may hold nil (default: true)
    #[serde(default = "default_true")]
    pub null: bool,
    /// Whether the field may hold a blank value (default: true)
    #[serde(default = "default_true")]
    pub blank: bool,
    /// Whether the field holds an array of the declared type (default: false)
    #[serde(default)]
    pub array: bool,
    /// Whether a named accessor is generated (default: true)
    #[serde(default = "default_true")]
    pub accessor: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            default: None,
            null: true,
            blank: true,
            array: false,
            accessor: true,
        }
    }
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn blank(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    pub fn array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }

    pub fn accessor(mut self, accessor: bool) -> Self {
        self.accessor = accessor;
        self
    }
}

/// A named, typed slot within a store schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    field_type: FieldType,
    default: Option<Value>,
    null: bool,
    blank: bool,
    array: bool,
    accessor: bool,
}

impl Field {
    /// Create a field, casting the default through the field's own coercion
    pub fn new(name: impl Into<String>, field_type: FieldType, options: FieldOptions) -> Self {
        let mut field = Self {
            name: name.into(),
            field_type,
            default: None,
            null: options.null,
            blank: options.blank,
            array: options.array,
            accessor: options.accessor,
        };
        field.default = options.default.map(|raw| field.extract_default(raw));
        field
    }

    /// Create a field from a type tag
    ///
    /// # Errors
    ///
    /// `UnsupportedType` if the tag is not one of the supported types.
    pub fn define(name: impl Into<String>, type_tag: &str, options: FieldOptions) -> StoreResult<Self> {
        let field_type = type_tag.parse::<FieldType>()?;
        Ok(Self::new(name, field_type, options))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_nullable(&self) -> bool {
        self.null
    }

    pub fn is_blankable(&self) -> bool {
        self.blank
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn has_accessor(&self) -> bool {
        self.accessor
    }

    /// Casts `value` and applies the default substitution policy.
    ///
    /// - non-blankable with a default: blank results become the default
    /// - non-nullable with a default: nil results become the default
    /// - otherwise the cast result is kept as is
    ///
    /// Non-nullability of an array field applies to the array as a whole;
    /// nil elements inside it are kept.
    pub fn cast(&self, value: Value) -> Value {
        let casted = self.type_cast(value);
        let substitute = if !self.blank {
            casted.is_blank()
        } else {
            !self.null && casted.is_null()
        };

        match (&self.default, substitute) {
            (Some(default), true) => default.clone(),
            _ => casted,
        }
    }

    /// Casts `value` to the field's type without default substitution
    pub fn type_cast(&self, value: Value) -> Value {
        if self.array {
            return match value {
                Value::Array(items) => {
                    Value::Array(items.into_iter().map(|item| self.cast_element(item)).collect())
                }
                _ => Value::Array(Vec::new()),
            };
        }
        cast::cast(self.field_type, value, self.null)
    }

    // Nested arrays are mapped one level down, so ragged arrays survive
    fn cast_element(&self, value: Value) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.cast_element(item)).collect())
            }
            other => cast::cast(self.field_type, other, true),
        }
    }

    fn extract_default(&self, raw: Value) -> Value {
        if self.field_type.is_textual() && raw.is_null() {
            return Value::Null;
        }
        self.type_cast(raw)
    }
}
