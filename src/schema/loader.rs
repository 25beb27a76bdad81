//! Store declarations from JSON documents
//!
//! A declaration document names one store, its options and its fields:
//!
//! ```json
//! {
//!   "store": "settings",
//!   "options": {"codec": "tagged", "prefix": false},
//!   "fields": [
//!     {"name": "age", "type": "integer", "default": 12, "null": false},
//!     {"name": "tags", "type": "string", "array": true, "default": []}
//!   ]
//! }
//! ```
//!
//! Unknown type tags fail when the document is turned into a schema, before
//! anything is registered.

use serde::{Deserialize, Serialize};

use super::dsl::SchemaBuilder;
use super::field::FieldOptions;
use crate::config::StoreOptions;
use crate::error::{StoreError, StoreResult};

/// One field entry of a declaration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(flatten)]
    pub options: FieldOptions,
}

/// A whole store declaration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDeclaration {
    pub store: String,
    #[serde(default)]
    pub options: StoreOptions,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

impl StoreDeclaration {
    /// Parse a declaration document
    ///
    /// # Errors
    ///
    /// `InvalidDeclaration` for malformed JSON or an empty store name.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let declaration: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidDeclaration(format!("invalid JSON: {}", e)))?;
        if declaration.store.trim().is_empty() {
            return Err(StoreError::InvalidDeclaration(
                "store declared without a name".to_string(),
            ));
        }
        Ok(declaration)
    }

    /// Replay the field entries onto a builder, in document order
    ///
    /// # Errors
    ///
    /// `UnsupportedType` for the first unknown type tag.
    pub fn apply(&self, builder: &mut SchemaBuilder) -> StoreResult<()> {
        for field in &self.fields {
            builder.field(&field.name, &field.type_tag, field.options.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecKind;
    use crate::schema::FieldType;
    use crate::value::Value;

    const SETTINGS: &str = r#"{
        "store": "settings",
        "options": {"codec": "json"},
        "fields": [
            {"name": "age", "type": "integer", "default": "12", "null": false},
            {"name": "tags", "type": "string", "array": true, "default": []},
            {"name": "published_at", "type": "date_time"}
        ]
    }"#;

    #[test]
    fn test_parse_declaration() {
        let declaration = StoreDeclaration::from_json(SETTINGS).unwrap();
        assert_eq!(declaration.store, "settings");
        assert_eq!(declaration.options.codec, Some(CodecKind::Json));
        assert_eq!(declaration.fields.len(), 3);
        assert!(!declaration.fields[0].options.null);
        assert!(declaration.fields[1].options.array);
    }

    #[test]
    fn test_apply_builds_schema() {
        let declaration = StoreDeclaration::from_json(SETTINGS).unwrap();
        let mut builder = SchemaBuilder::new();
        declaration.apply(&mut builder).unwrap();
        let schema = builder.build().unwrap();

        let age = schema.get("age").unwrap();
        assert_eq!(age.field_type(), FieldType::Integer);
        assert_eq!(age.default_value(), Some(&Value::from(12)));
        assert_eq!(
            schema.get("published_at").unwrap().field_type(),
            FieldType::DateTime
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let declaration = StoreDeclaration::from_json(
            r#"{"store": "settings", "fields": [{"name": "price", "type": "money"}]}"#,
        )
        .unwrap();
        let err = declaration.apply(&mut SchemaBuilder::new()).unwrap_err();
        assert_eq!(err, StoreError::UnsupportedType("money".into()));
    }

    #[test]
    fn test_missing_store_name() {
        let err = StoreDeclaration::from_json(r#"{"store": " "}"#).unwrap_err();
        assert!(err.is_definition_error());
    }
}
