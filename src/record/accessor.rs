//! Named virtual accessors
//!
//! Each accessor key `k` answers six method names:
//!
//! | method        | kind                |
//! |---------------|---------------------|
//! | `k`           | read                |
//! | `k=`          | write (cast)        |
//! | `k?`          | presence predicate  |
//! | `k_changed?`  | dirty check         |
//! | `k_was`       | snapshot value      |
//! | `restore_k!`  | revert to snapshot  |
//!
//! The table is built when stores are declared and consulted by
//! [`crate::record::Record::call`]; nothing is generated at runtime.

use indexmap::IndexMap;

use crate::observability::{log_event_with_fields, Event};

/// Accessor method kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Get,
    Set,
    Query,
    Changed,
    Was,
    Restore,
}

impl AccessorKind {
    pub const ALL: [AccessorKind; 6] = [
        AccessorKind::Get,
        AccessorKind::Set,
        AccessorKind::Query,
        AccessorKind::Changed,
        AccessorKind::Was,
        AccessorKind::Restore,
    ];

    /// Method name of this kind for accessor key `key`
    pub fn method_name(self, key: &str) -> String {
        match self {
            AccessorKind::Get => key.to_string(),
            AccessorKind::Set => format!("{}=", key),
            AccessorKind::Query => format!("{}?", key),
            AccessorKind::Changed => format!("{}_changed?", key),
            AccessorKind::Was => format!("{}_was", key),
            AccessorKind::Restore => format!("restore_{}!", key),
        }
    }

    /// Accessor key embedded in `method` for this kind, if it matches
    fn strip<'a>(self, method: &'a str) -> Option<&'a str> {
        match self {
            AccessorKind::Get => Some(method),
            AccessorKind::Set => method.strip_suffix('='),
            AccessorKind::Query => method.strip_suffix('?'),
            AccessorKind::Changed => method.strip_suffix("_changed?"),
            AccessorKind::Was => method.strip_suffix("_was"),
            AccessorKind::Restore => method.strip_prefix("restore_")?.strip_suffix('!'),
        }
    }
}

/// Where an accessor key points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorBinding {
    store: String,
    field: String,
}

impl AccessorBinding {
    pub fn new(store: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            field: field.into(),
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Accessor key to (store, field) table of one record type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessorTable {
    bindings: IndexMap<String, AccessorBinding>,
}

impl AccessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key`. A key bound by an earlier store is taken over and the
    /// takeover is logged.
    pub(crate) fn bind(&mut self, record_type: &str, key: String, binding: AccessorBinding) {
        if let Some(previous) = self.bindings.get(&key) {
            if previous.store != binding.store {
                log_event_with_fields(
                    Event::AccessorShadowed,
                    &[
                        ("accessor", key.as_str()),
                        ("record_type", record_type),
                        ("shadowed_store", previous.store.as_str()),
                        ("store", binding.store.as_str()),
                    ],
                );
            }
        }
        self.bindings.insert(key, binding);
    }

    pub fn get(&self, key: &str) -> Option<&AccessorBinding> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// Accessor keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AccessorBinding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every method name answered by the table
    pub fn method_names(&self) -> Vec<String> {
        self.bindings
            .keys()
            .flat_map(|key| AccessorKind::ALL.iter().map(move |kind| kind.method_name(key)))
            .collect()
    }

    /// Resolve a method name to its kind and accessor key
    ///
    /// A key that is itself spelled like a method (`status_was`) is read
    /// as the plain key first.
    pub fn resolve<'a>(&self, method: &'a str) -> Option<(AccessorKind, &'a str)> {
        AccessorKind::ALL.iter().find_map(|kind| {
            kind.strip(method)
                .filter(|key| self.bindings.contains_key(*key))
                .map(|key| (*kind, key))
        })
    }
}
