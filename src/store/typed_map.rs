//! Typed map
//!
//! An insertion-ordered map bound to one store schema. Every write to a
//! declared key goes through the field's cast; undeclared keys are kept as
//! given. Construction fills in the default of every declared field that
//! the seed does not provide.
//!
//! Keys are canonicalized to `String`, so `&str`, `String` and anything else
//! implementing `AsRef<str>` address the same slot.

use std::ops::Index;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::codec::ToPlainMap;
use crate::error::StoreResult;
use crate::schema::Schema;
use crate::value::{Map, Value};

static NULL: Value = Value::Null;

/// Schema-bound map of store values
#[derive(Debug, Clone)]
pub struct TypedMap {
    schema: Arc<Schema>,
    values: Map,
}

impl TypedMap {
    /// Map holding only the schema defaults, each cast through its field
    pub fn new(schema: Arc<Schema>) -> Self {
        let defaults = schema.defaults();
        let mut map = Self {
            schema,
            values: Map::with_capacity(defaults.len()),
        };
        for (key, default) in defaults {
            map.set(key, default);
        }
        map
    }

    /// Defaults first, then every seed entry cast through its field
    pub fn from_map(schema: Arc<Schema>, seed: Map) -> Self {
        let mut map = Self::new(schema);
        map.merge_all(seed);
        map
    }

    /// Like [`TypedMap::from_map`]; a seed without a map form (nil or a
    /// scalar) contributes nothing beyond the defaults.
    pub fn from_value(schema: Arc<Schema>, seed: Value) -> Self {
        match seed {
            Value::Map(seed) => Self::from_map(schema, seed),
            _ => Self::new(schema),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Stored value, `None` when the key is absent
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.values.get(key.as_ref())
    }

    /// Stored value, `Null` when the key is absent
    pub fn value(&self, key: impl AsRef<str>) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }

    /// In-place access that bypasses casting
    ///
    /// Edits made through this reference are picked up by change tracking
    /// at comparison time.
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Value> {
        self.values.get_mut(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.values.contains_key(key.as_ref())
    }

    /// Cast `value` through the key's field (if declared) and store it
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = self.cast_value(&key, value.into());
        self.values.insert(key, value);
    }

    /// [`TypedMap::set`] for every entry; keys not in `entries` are kept.
    pub fn merge_all<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Merge where `resolve(key, current, incoming)` decides the value of
    /// keys already present. The resolved value is still cast.
    pub fn merge_with<I, K, V, F>(&mut self, entries: I, mut resolve: F)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        F: FnMut(&str, &Value, Value) -> Value,
    {
        for (key, value) in entries {
            let key = key.into();
            let value = match self.values.get(&key) {
                Some(current) => resolve(&key, current, value.into()),
                None => value.into(),
            };
            self.set(key, value);
        }
    }

    /// Removes a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Value> {
        self.values.shift_remove(key.as_ref())
    }

    /// Fresh copy of the schema defaults
    pub fn defaults(&self) -> Map {
        self.schema.defaults()
    }

    /// Whether the map holds exactly the schema defaults
    pub fn is_default(&self) -> bool {
        self.values == self.schema.defaults()
    }

    /// Plain map of the listed keys that are present
    pub fn slice<I, K>(&self, keys: I) -> Map
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter_map(|key| {
                self.values
                    .get_key_value(key.as_ref())
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect()
    }

    /// Plain map without the listed keys
    pub fn except<I, K>(&self, keys: I) -> Map
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut plain = self.values.clone();
        for key in keys {
            plain.shift_remove(key.as_ref());
        }
        plain
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Independent plain copy for serialization
    pub fn to_plain(&self) -> Map {
        self.values.clone()
    }

    pub fn into_plain(self) -> Map {
        self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Map(self.to_plain())
    }

    pub(crate) fn as_plain(&self) -> &Map {
        &self.values
    }

    fn cast_value(&self, key: &str, value: Value) -> Value {
        match self.schema.get(key) {
            Some(field) => field.cast(value),
            None => value,
        }
    }
}

impl<Q: AsRef<str>> Index<Q> for TypedMap {
    type Output = Value;

    /// Absent keys read as `Null`.
    fn index(&self, key: Q) -> &Value {
        self.value(key)
    }
}

impl PartialEq for TypedMap {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl PartialEq<Map> for TypedMap {
    fn eq(&self, other: &Map) -> bool {
        &self.values == other
    }
}

impl ToPlainMap for TypedMap {
    fn to_plain_map(&self) -> StoreResult<Map> {
        Ok(self.to_plain())
    }
}

impl Serialize for TypedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
