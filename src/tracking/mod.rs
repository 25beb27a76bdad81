//! Change tracking against snapshots
//!
//! A [`Snapshot`] is a deep copy of a typed map's plain form, taken when the
//! owning record is clean (after load or persist). Dirtiness is never
//! recorded at write time: it is derived by comparing the current plain form
//! with the snapshot, so values mutated in place through
//! [`TypedMap::get_mut`] are detected as well.
//!
//! Comparison follows the serialized form: key order is irrelevant and NaN
//! equals NaN.

use crate::store::TypedMap;
use crate::value::{Map, Value};

/// Store state relative to its last snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    Clean,
    Dirty,
}

/// Comparison baseline for one store
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    plain: Map,
}

impl Snapshot {
    pub fn take(map: &TypedMap) -> Self {
        Self {
            plain: map.to_plain(),
        }
    }

    /// Snapshot value of `key`, `Null` when absent
    pub fn get(&self, key: impl AsRef<str>) -> Value {
        self.plain.get(key.as_ref()).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.plain.contains_key(key.as_ref())
    }

    pub fn as_map(&self) -> &Map {
        &self.plain
    }
}

/// Whether the store as a whole differs from the snapshot
pub fn is_changed(current: &TypedMap, snapshot: &Snapshot) -> bool {
    !same_map(current.as_plain(), &snapshot.plain)
}

pub fn state(current: &TypedMap, snapshot: &Snapshot) -> DirtyState {
    if is_changed(current, snapshot) {
        DirtyState::Dirty
    } else {
        DirtyState::Clean
    }
}

/// Whether `field` differs from its snapshot value
pub fn is_field_changed(field: &str, current: &TypedMap, snapshot: &Snapshot) -> bool {
    is_changed(current, snapshot) && !same_value(current.value(field), &snapshot.get(field))
}

pub fn field_was(field: &str, snapshot: &Snapshot) -> Value {
    snapshot.get(field)
}

/// Put `field` back to its snapshot value. A key the snapshot never had is
/// removed.
pub fn restore_field(field: &str, current: &mut TypedMap, snapshot: &Snapshot) {
    match snapshot.plain.get(field) {
        Some(value) => current.set(field, value.clone()),
        None => {
            current.remove(field);
        }
    }
}

/// Keys whose value differs between the current map and the snapshot,
/// current keys first, then keys only the snapshot has.
pub fn changed_fields(current: &TypedMap, snapshot: &Snapshot) -> Vec<String> {
    let mut changed: Vec<String> = current
        .iter()
        .filter(|(key, value)| {
            snapshot
                .plain
                .get(*key)
                .map_or(true, |was| !same_value(value, was))
        })
        .map(|(key, _)| key.to_string())
        .collect();
    changed.extend(
        snapshot
            .plain
            .keys()
            .filter(|key| !current.contains_key(key.as_str()))
            .cloned(),
    );
    changed
}

fn same_map(a: &Map, b: &Map) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| same_value(value, other)))
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Map(x), Value::Map(y)) => same_map(x, y),
        _ => a == b,
    }
}
