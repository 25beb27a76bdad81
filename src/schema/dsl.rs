//! Store schemas and the declaration builder
//!
//! A [`Schema`] is the insertion-ordered set of fields of one store. It is
//! built once per declaration through a [`SchemaBuilder`]; re-declaring a
//! store seeds the builder with the existing schema so fields are appended,
//! and a repeated field name replaces the earlier definition in place.

use indexmap::IndexMap;

use super::field::{Field, FieldOptions};
use super::types::FieldType;
use crate::error::{StoreError, StoreResult};
use crate::value::Map;

/// Ordered field schema of a single store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: IndexMap<String, Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field; a field with the same name is replaced in place.
    pub fn insert(&mut self, field: Field) -> Option<Field> {
        self.fields.insert(field.name().to_string(), field)
    }

    pub fn get(&self, name: impl AsRef<str>) -> Option<&Field> {
        self.fields.get(name.as_ref())
    }

    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.fields.contains_key(name.as_ref())
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Appends every field of `other`; fields of `other` win on name clashes.
    pub fn merge(&mut self, other: Schema) {
        for (_, field) in other.fields {
            self.insert(field);
        }
    }

    /// The default of every field that declares one, in declaration order.
    ///
    /// Each call returns fresh copies, so callers never share a mutable
    /// default.
    pub fn defaults(&self) -> Map {
        self.fields
            .values()
            .filter_map(|field| {
                field
                    .default_value()
                    .map(|default| (field.name().to_string(), default.clone()))
            })
            .collect()
    }
}

/// Declaration builder handed to store declaration callbacks
///
/// One registration method per type tag:
///
/// ```ignore
/// registry.declare_store("User", "settings", StoreOptions::default(), |s| {
///     s.integer("age", FieldOptions::new().with_default(12).null(false));
///     s.string("tags", FieldOptions::new().array(true).with_default(Vec::<String>::new()));
///     s.field("source", "any", FieldOptions::new())?;
///     Ok(())
/// })?;
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that extends an existing schema
    pub fn extending(schema: Schema) -> Self {
        Self { schema }
    }

    /// Declare a field from a type tag
    ///
    /// # Errors
    ///
    /// `UnsupportedType` for unknown tags, `InvalidDeclaration` for an empty
    /// field name.
    pub fn field(&mut self, name: &str, type_tag: &str, options: FieldOptions) -> StoreResult<&mut Self> {
        let field_type = type_tag.parse::<FieldType>()?;
        self.typed(name, field_type, options)
    }

    /// Declare a field of a known type
    ///
    /// # Errors
    ///
    /// `InvalidDeclaration` for an empty field name.
    pub fn typed(&mut self, name: &str, field_type: FieldType, options: FieldOptions) -> StoreResult<&mut Self> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidDeclaration(format!(
                "{} field declared without a name",
                field_type
            )));
        }
        self.schema.insert(Field::new(name, field_type, options));
        Ok(self)
    }

    fn push(&mut self, name: &str, field_type: FieldType, options: FieldOptions) -> &mut Self {
        self.schema.insert(Field::new(name, field_type, options));
        self
    }

    pub fn string(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::String, options)
    }

    pub fn text(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Text, options)
    }

    pub fn integer(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Integer, options)
    }

    pub fn float(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Float, options)
    }

    pub fn decimal(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Decimal, options)
    }

    pub fn date(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Date, options)
    }

    pub fn datetime(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::DateTime, options)
    }

    /// Alias of [`SchemaBuilder::datetime`]
    pub fn date_time(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.datetime(name, options)
    }

    pub fn time(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Time, options)
    }

    pub fn boolean(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Boolean, options)
    }

    pub fn any(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        self.push(name, FieldType::Any, options)
    }

    /// Finish the declaration
    ///
    /// # Errors
    ///
    /// `InvalidDeclaration` if a typed method was given an empty name.
    pub fn build(self) -> StoreResult<Schema> {
        if let Some(field) = self.schema.fields().find(|f| f.name().trim().is_empty()) {
            return Err(StoreError::InvalidDeclaration(format!(
                "{} field declared without a name",
                field.field_type()
            )));
        }
        Ok(self.schema)
    }
}
