//! Typed Map Semantics Tests
//!
//! Construction, casting on write and default substitution for single-field
//! schemas:
//! - nullable fields keep nil, with or without a default
//! - non-nullable fields with a default recover the default from nil
//! - non-blankable fields with a default recover the default from blanks
//! - unknown keys are stored as given
//! - mutable defaults are never shared between maps

use std::sync::Arc;

use typedstore::{FieldOptions, FieldType, Map, Schema, SchemaBuilder, TypedMap, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn schema_with(name: &str, field_type: FieldType, options: FieldOptions) -> Arc<Schema> {
    let mut builder = SchemaBuilder::new();
    builder.typed(name, field_type, options).unwrap();
    Arc::new(builder.build().unwrap())
}

fn seed(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Nullable Field Without Default
// =============================================================================

fn plain_age() -> Arc<Schema> {
    schema_with("age", FieldType::Integer, FieldOptions::new())
}

#[test]
fn test_nullable_construction_casts_seed() {
    let map = TypedMap::from_map(plain_age(), seed(&[("age", Value::from("24"))]));
    assert_eq!(map["age"], Value::from(24));
}

#[test]
fn test_nullable_has_nil_default() {
    let map = TypedMap::new(plain_age());
    assert_eq!(map["age"], Value::Null);
    assert!(map.is_empty());
}

#[test]
fn test_nullable_set_casts_and_accepts_nil() {
    let mut map = TypedMap::new(plain_age());
    map.set("age", "24");
    assert_eq!(map["age"], Value::from(24));
    map.set("age", Value::Null);
    assert_eq!(map["age"], Value::Null);
}

#[test]
fn test_nullable_merge_casts_and_accepts_nil() {
    let mut map = TypedMap::new(plain_age());
    map.merge_all([("age", "24")]);
    assert_eq!(map["age"], Value::from(24));
    map.merge_all([("age", Value::Null)]);
    assert_eq!(map["age"], Value::Null);
}

// =============================================================================
// Nullable Field With Default
// =============================================================================

fn defaulted_age() -> Arc<Schema> {
    schema_with("age", FieldType::Integer, FieldOptions::new().with_default(42))
}

#[test]
fn test_nullable_default_is_applied() {
    assert_eq!(TypedMap::new(defaulted_age())["age"], Value::from(42));
}

#[test]
fn test_nullable_default_does_not_replace_nil() {
    let mut map = TypedMap::new(defaulted_age());
    map.set("age", "24");
    assert_eq!(map["age"], Value::from(24));
    map.set("age", Value::Null);
    assert_eq!(map["age"], Value::Null);

    map.merge_all([("age", Value::Null)]);
    assert_eq!(map["age"], Value::Null);
}

// =============================================================================
// Non-Nullable Field With Default
// =============================================================================

fn strict_age() -> Arc<Schema> {
    schema_with(
        "age",
        FieldType::Integer,
        FieldOptions::new().null(false).with_default(42),
    )
}

#[test]
fn test_non_nullable_default_is_applied() {
    assert_eq!(TypedMap::new(strict_age())["age"], Value::from(42));
}

#[test]
fn test_non_nullable_set_nil_recovers_default() {
    let mut map = TypedMap::new(strict_age());
    map.set("age", "24");
    assert_eq!(map["age"], Value::from(24));
    map.set("age", Value::Null);
    assert_eq!(map["age"], Value::from(42));
}

#[test]
fn test_non_nullable_merge_nil_recovers_default() {
    let mut map = TypedMap::new(strict_age());
    map.merge_all([("age", Value::Null)]);
    assert_eq!(map["age"], Value::from(42));
}

#[test]
fn test_non_nullable_seed_nil_recovers_default() {
    let map = TypedMap::from_map(strict_age(), seed(&[("age", Value::Null)]));
    assert_eq!(map["age"], Value::from(42));
}

// =============================================================================
// Non-Blankable Field With Default
// =============================================================================

fn source() -> Arc<Schema> {
    schema_with(
        "source",
        FieldType::String,
        FieldOptions::new().blank(false).with_default("web"),
    )
}

#[test]
fn test_non_blankable_default_is_applied() {
    assert_eq!(TypedMap::new(source())["source"], Value::from("web"));
}

#[test]
fn test_non_blankable_set() {
    let mut map = TypedMap::new(source());
    map.set("source", "mailing");
    assert_eq!(map["source"], Value::from("mailing"));
    map.set("source", Value::Null);
    assert_eq!(map["source"], Value::from("web"));
    map.set("source", "mailing");
    map.set("source", "");
    assert_eq!(map["source"], Value::from("web"));
    map.set("source", "   ");
    assert_eq!(map["source"], Value::from("web"));
}

#[test]
fn test_non_blankable_merge() {
    let mut map = TypedMap::new(source());
    map.merge_all([("source", "mailing")]);
    assert_eq!(map["source"], Value::from("mailing"));
    map.merge_all([("source", "")]);
    assert_eq!(map["source"], Value::from("web"));
}

#[test]
fn test_except_does_not_reapply_defaults() {
    let map = TypedMap::from_map(source(), seed(&[("source", Value::from("foo"))]));
    assert!(!map.except(["source"]).contains_key("source"));
}

#[test]
fn test_slice_does_not_reapply_defaults() {
    let map = TypedMap::from_map(source(), seed(&[("source", Value::from("foo"))]));
    assert!(!map.slice(["not_source"]).contains_key("source"));
}

#[test]
fn test_any_field_blank_recovers_default() {
    let schema = schema_with(
        "source",
        FieldType::Any,
        FieldOptions::new().blank(false).with_default("web"),
    );
    let mut map = TypedMap::new(schema);
    map.set("source", "");
    assert_eq!(map["source"], Value::from("web"));
    map.set("source", Value::from(vec![1, 2]));
    assert_eq!(map["source"], Value::from(vec![1, 2]));
}

// =============================================================================
// Unknown Keys
// =============================================================================

#[test]
fn test_unknown_keys_are_stored_as_given() {
    let mut map = TypedMap::new(plain_age());
    map.set("unknown_key", 42);
    assert_eq!(map["unknown_key"], Value::from(42));
    map.set("other", "42");
    assert_eq!(map["other"], Value::from("42"));
}

#[test]
fn test_absent_keys_read_as_nil() {
    let map = TypedMap::new(plain_age());
    assert_eq!(map.get("missing"), None);
    assert_eq!(map["missing"], Value::Null);
}

// =============================================================================
// Arrays
// =============================================================================

fn tags() -> Arc<Schema> {
    schema_with(
        "tags",
        FieldType::String,
        FieldOptions::new()
            .array(true)
            .null(false)
            .with_default(vec!["article"]),
    )
}

#[test]
fn test_array_default() {
    assert_eq!(TypedMap::new(tags())["tags"], Value::from(vec!["article"]));
}

#[test]
fn test_array_non_array_input_becomes_empty() {
    let mut map = TypedMap::new(tags());
    map.set("tags", "foo");
    assert_eq!(map["tags"], Value::Array(vec![]));
}

#[test]
fn test_array_elements_are_cast() {
    let mut map = TypedMap::new(tags());
    map.set("tags", Value::from(vec![Value::from(1), Value::from(true)]));
    assert_eq!(map["tags"], Value::from(vec!["1", "true"]));
}

// =============================================================================
// Default Isolation
// =============================================================================

#[test]
fn test_mutable_defaults_are_not_shared() {
    let schema = schema_with(
        "signup",
        FieldType::Any,
        FieldOptions::new().with_default(Map::new()),
    );
    let mut first = TypedMap::new(Arc::clone(&schema));
    let second = TypedMap::new(Arc::clone(&schema));

    first
        .get_mut("signup")
        .and_then(Value::as_map_mut)
        .unwrap()
        .insert("source".into(), Value::from("web"));

    assert_eq!(second["signup"], Value::Map(Map::new()));
    assert_eq!(TypedMap::new(schema)["signup"], Value::Map(Map::new()));
    assert_eq!(first["signup"].as_map().unwrap().len(), 1);
}

#[test]
fn test_array_default_is_not_shared() {
    let schema = tags();
    let mut first = TypedMap::new(Arc::clone(&schema));
    first
        .get_mut("tags")
        .and_then(Value::as_array_mut)
        .unwrap()
        .push(Value::from("news"));

    assert_eq!(TypedMap::new(schema)["tags"], Value::from(vec!["article"]));
}

// =============================================================================
// Plain Form
// =============================================================================

#[test]
fn test_defaulting_is_idempotent() {
    let map = TypedMap::new(tags());
    let again = TypedMap::from_map(tags(), map.to_plain());
    assert_eq!(again.to_plain(), map.to_plain());
}

#[test]
fn test_nil_defaults_of_strict_text_fields_are_cast() {
    let mut builder = SchemaBuilder::new();
    builder
        .typed(
            "email",
            FieldType::String,
            FieldOptions::new().null(false).with_default(Value::Null),
        )
        .unwrap();
    builder
        .typed(
            "tags",
            FieldType::String,
            FieldOptions::new()
                .array(true)
                .null(false)
                .with_default(Value::Null),
        )
        .unwrap();
    let schema = Arc::new(builder.build().unwrap());

    let map = TypedMap::new(Arc::clone(&schema));
    assert_eq!(map["email"], Value::from(""));
    assert_eq!(map["tags"], Value::Array(vec![]));

    let again = TypedMap::from_map(schema, map.to_plain());
    assert_eq!(again.to_plain(), map.to_plain());
}

#[test]
fn test_serializes_to_plain_json() {
    let map = TypedMap::new(strict_age());
    assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"age":42}"#);
}
