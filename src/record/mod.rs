//! Record boundary
//!
//! The host persistence layer owns records; this module holds the part of a
//! record that typed stores need and the explicit hooks the host calls:
//!
//! - materialize: [`Record::new`] / [`Record::load`] / [`Record::reload`]
//! - persist: [`Record::prepare_save`] then [`Record::mark_persisted`]
//!
//! Between those points the record exposes its virtual fields through the
//! accessor table of its record type. A record is owned by one thread of
//! control; it carries no locking.

mod accessor;

use std::sync::Arc;

use indexmap::IndexMap;

pub use accessor::{AccessorBinding, AccessorKind, AccessorTable};

use crate::codec::RawColumn;
use crate::error::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{RecordSchema, TypedMap};
use crate::tracking::{self, DirtyState, Snapshot};
use crate::value::Value;

/// Raw store columns keyed by store name
pub type Columns = IndexMap<String, RawColumn>;

/// Persistence hooks of one store
pub trait StoreHooks {
    /// Build the typed map from the raw column
    fn on_load(&self, raw: &RawColumn) -> StoreResult<TypedMap>;

    /// Produce the raw column for persisting `map`
    fn on_before_save(&self, map: &TypedMap) -> StoreResult<RawColumn>;
}

#[derive(Debug, Clone)]
struct StoreState {
    map: TypedMap,
    snapshot: Snapshot,
    raw: RawColumn,
}

/// Typed store state of one record instance
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    stores: IndexMap<String, StoreState>,
}

impl Record {
    /// New, unsaved record: every store starts from its defaults
    ///
    /// # Errors
    ///
    /// Codec errors from materializing the stores.
    pub fn new(schema: Arc<RecordSchema>) -> StoreResult<Self> {
        Self::load(schema, Columns::new())
    }

    /// Record read from storage. Stores missing from `columns` read as
    /// NULL columns.
    ///
    /// # Errors
    ///
    /// `UnknownStore` for columns the record type does not declare, codec
    /// errors for corrupt columns.
    pub fn load<I, K>(schema: Arc<RecordSchema>, columns: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (K, RawColumn)>,
        K: Into<String>,
    {
        let stores = materialize(&schema, columns)?;
        Ok(Self { schema, stores })
    }

    /// Re-read every store from `columns`. A failed reload leaves the
    /// record untouched.
    ///
    /// # Errors
    ///
    /// As [`Record::load`].
    pub fn reload<I, K>(&mut self, columns: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (K, RawColumn)>,
        K: Into<String>,
    {
        self.stores = materialize(&self.schema, columns)?;
        log_event_with_fields(
            Event::StoreReloaded,
            &[("record_type", self.schema.record_type())],
        );
        Ok(())
    }

    pub fn record_type(&self) -> &str {
        self.schema.record_type()
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Current typed map of a store
    ///
    /// # Errors
    ///
    /// `UnknownStore`.
    pub fn store(&self, store: &str) -> StoreResult<&TypedMap> {
        self.state(store).map(|state| &state.map)
    }

    /// Mutable typed map of a store, for bulk writes and in-place edits
    ///
    /// # Errors
    ///
    /// `UnknownStore`.
    pub fn store_mut(&mut self, store: &str) -> StoreResult<&mut TypedMap> {
        self.state_mut(store).map(|state| &mut state.map)
    }

    /// Snapshot a store is compared against
    ///
    /// # Errors
    ///
    /// `UnknownStore`.
    pub fn snapshot(&self, store: &str) -> StoreResult<&Snapshot> {
        self.state(store).map(|state| &state.snapshot)
    }

    /// Raw column last read or written for a store
    ///
    /// # Errors
    ///
    /// `UnknownStore`.
    pub fn raw_column(&self, store: &str) -> StoreResult<&RawColumn> {
        self.state(store).map(|state| &state.raw)
    }

    // Named accessors

    /// `k`
    pub fn get(&self, accessor: &str) -> StoreResult<&Value> {
        let (state, field) = self.bound(accessor)?;
        Ok(state.map.value(field))
    }

    /// `k=`
    pub fn set(&mut self, accessor: &str, value: impl Into<Value>) -> StoreResult<()> {
        let (state, field) = self.bound_mut(accessor)?;
        state.map.set(field, value);
        Ok(())
    }

    /// `k?`: false for nil, false, zero and blank values
    pub fn is_present(&self, accessor: &str) -> StoreResult<bool> {
        self.get(accessor).map(Value::is_truthy)
    }

    /// `k_changed?`
    pub fn is_changed(&self, accessor: &str) -> StoreResult<bool> {
        let (state, field) = self.bound(accessor)?;
        Ok(tracking::is_field_changed(field, &state.map, &state.snapshot))
    }

    /// `k_was`
    pub fn was(&self, accessor: &str) -> StoreResult<Value> {
        let (state, field) = self.bound(accessor)?;
        Ok(tracking::field_was(field, &state.snapshot))
    }

    /// `restore_k!`
    pub fn restore(&mut self, accessor: &str) -> StoreResult<()> {
        let (state, field) = self.bound_mut(accessor)?;
        tracking::restore_field(&field, &mut state.map, &state.snapshot);
        Ok(())
    }

    /// Dispatch an accessor method by name (`age`, `age=`, `age?`,
    /// `age_changed?`, `age_was`, `restore_age!`).
    ///
    /// Reads return the value, predicates a boolean, writes and restores
    /// `Null`. A write without an argument writes `Null`.
    ///
    /// # Errors
    ///
    /// `NoSuchAccessor` for names the record type does not answer.
    pub fn call(&mut self, method: &str, arg: Option<Value>) -> StoreResult<Value> {
        let (kind, key) = self
            .schema
            .accessors()
            .resolve(method)
            .map(|(kind, key)| (kind, key.to_string()))
            .ok_or_else(|| self.no_such_accessor(method))?;

        match kind {
            AccessorKind::Get => self.get(&key).cloned(),
            AccessorKind::Set => self.set(&key, arg.unwrap_or_default()).map(|_| Value::Null),
            AccessorKind::Query => self.is_present(&key).map(Value::Bool),
            AccessorKind::Changed => self.is_changed(&key).map(Value::Bool),
            AccessorKind::Was => self.was(&key),
            AccessorKind::Restore => self.restore(&key).map(|_| Value::Null),
        }
    }

    /// Whether the record answers `method`
    pub fn responds_to(&self, method: &str) -> bool {
        self.schema.accessors().resolve(method).is_some()
    }

    /// Mass assignment through the named accessors. Every name is checked
    /// before anything is written.
    ///
    /// # Errors
    ///
    /// `UnknownAttribute` for names that are not accessors.
    pub fn assign_attributes<I, K, V>(&mut self, attributes: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let attributes: Vec<(K, V)> = attributes.into_iter().collect();
        if let Some((name, _)) = attributes
            .iter()
            .find(|(name, _)| !self.schema.accessors().contains(name.as_ref()))
        {
            return Err(StoreError::UnknownAttribute {
                record_type: self.record_type().to_string(),
                name: name.as_ref().to_string(),
            });
        }
        for (name, value) in attributes {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// `(was, now)` of every changed accessor, in accessor order
    pub fn changes(&self) -> IndexMap<String, (Value, Value)> {
        let mut changes = IndexMap::new();
        for (key, binding) in self.schema.accessors().iter() {
            let Some(state) = self.stores.get(binding.store()) else {
                continue;
            };
            if tracking::is_field_changed(binding.field(), &state.map, &state.snapshot) {
                changes.insert(
                    key.to_string(),
                    (
                        tracking::field_was(binding.field(), &state.snapshot),
                        state.map.value(binding.field()).clone(),
                    ),
                );
            }
        }
        changes
    }

    /// Whether any store differs from its snapshot
    pub fn is_dirty(&self) -> bool {
        self.stores
            .values()
            .any(|state| tracking::is_changed(&state.map, &state.snapshot))
    }

    /// Clean or dirty state of one store
    ///
    /// # Errors
    ///
    /// `UnknownStore`.
    pub fn store_state(&self, store: &str) -> StoreResult<DirtyState> {
        self.state(store)
            .map(|state| tracking::state(&state.map, &state.snapshot))
    }

    /// Whether the store's codec output differs from the column last read
    /// or written
    ///
    /// # Errors
    ///
    /// `UnknownStore`, codec errors.
    pub fn is_store_changed_in_place(&self, store: &str) -> StoreResult<bool> {
        let state = self.state(store)?;
        let dumped = self.schema.store(store)?.on_before_save(&state.map)?;
        Ok(dumped != state.raw)
    }

    /// Raw columns for every store. The record is not modified, so a failed
    /// save can be retried or abandoned.
    ///
    /// # Errors
    ///
    /// Codec errors.
    pub fn prepare_save(&self) -> StoreResult<Columns> {
        self.schema
            .stores()
            .map(|definition| {
                let state = self.state(definition.name())?;
                let raw = definition.on_before_save(&state.map)?;
                Ok((definition.name().to_string(), raw))
            })
            .collect()
    }

    /// The host persisted the record: snapshots are refreshed and
    /// `columns` become the last written raw values. Stores missing from
    /// `columns` keep their previous raw value.
    pub fn mark_persisted(&mut self, columns: Columns) {
        let mut columns = columns;
        for (name, state) in self.stores.iter_mut() {
            state.snapshot = Snapshot::take(&state.map);
            if let Some(raw) = columns.shift_remove(name) {
                state.raw = raw;
            }
        }
        log_event_with_fields(
            Event::SnapshotRefreshed,
            &[("record_type", self.schema.record_type())],
        );
    }

    /// Stores written on insert: all of them, since a store's defaults
    /// differ from the column default
    pub fn stores_for_insert(&self) -> Vec<&str> {
        self.schema.store_names().collect()
    }

    /// Stores written on update: changed stores, plus stores whose column
    /// is still blank so legacy NULL columns get backfilled
    pub fn stores_for_update(&self) -> Vec<&str> {
        self.stores
            .iter()
            .filter(|(_, state)| {
                state.raw.is_blank() || tracking::is_changed(&state.map, &state.snapshot)
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn state(&self, store: &str) -> StoreResult<&StoreState> {
        self.stores.get(store).ok_or_else(|| self.unknown_store(store))
    }

    fn state_mut(&mut self, store: &str) -> StoreResult<&mut StoreState> {
        let Self { schema, stores } = self;
        stores.get_mut(store).ok_or_else(|| StoreError::UnknownStore {
            record_type: schema.record_type().to_string(),
            store: store.to_string(),
        })
    }

    fn bound(&self, accessor: &str) -> StoreResult<(&StoreState, &str)> {
        let binding = self
            .schema
            .accessors()
            .get(accessor)
            .ok_or_else(|| self.no_such_accessor(accessor))?;
        let state = self.state(binding.store())?;
        Ok((state, binding.field()))
    }

    fn bound_mut(&mut self, accessor: &str) -> StoreResult<(&mut StoreState, String)> {
        let binding = self
            .schema
            .accessors()
            .get(accessor)
            .cloned()
            .ok_or_else(|| self.no_such_accessor(accessor))?;
        let state = self.state_mut(binding.store())?;
        Ok((state, binding.field().to_string()))
    }

    fn unknown_store(&self, store: &str) -> StoreError {
        StoreError::UnknownStore {
            record_type: self.record_type().to_string(),
            store: store.to_string(),
        }
    }

    fn no_such_accessor(&self, name: &str) -> StoreError {
        StoreError::NoSuchAccessor {
            record_type: self.record_type().to_string(),
            name: name.to_string(),
        }
    }
}

fn materialize<I, K>(schema: &RecordSchema, columns: I) -> StoreResult<IndexMap<String, StoreState>>
where
    I: IntoIterator<Item = (K, RawColumn)>,
    K: Into<String>,
{
    let mut columns: Columns = columns.into_iter().map(|(k, v)| (k.into(), v)).collect();
    if let Some(unknown) = columns.keys().find(|name| !schema.has_store(name.as_str())) {
        return Err(StoreError::UnknownStore {
            record_type: schema.record_type().to_string(),
            store: unknown.clone(),
        });
    }

    schema
        .stores()
        .map(|definition| {
            let raw = columns.shift_remove(definition.name()).unwrap_or_default();
            let map = definition.on_load(&raw)?;
            let snapshot = Snapshot::take(&map);
            Ok((definition.name().to_string(), StoreState { map, snapshot, raw }))
        })
        .collect()
}
