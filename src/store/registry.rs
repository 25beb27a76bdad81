//! Store registry
//!
//! Process-wide map from record type to its declared stores. Declaration
//! happens during startup; afterwards the registry is only read and can be
//! shared across threads (`StoreRegistry: Send + Sync`).
//!
//! - Re-declaring a store appends fields; a repeated field name replaces the
//!   earlier definition
//! - `inherit` gives a child type its own deep copy of the parent's stores
//! - Records hold an `Arc<RecordSchema>` snapshot, so later declarations
//!   never change the schema under a live record

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::codec::{Codec, RawColumn};
use crate::config::{AccessorPolicy, StoreOptions};
use crate::error::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{AccessorBinding, AccessorTable, StoreHooks};
use crate::schema::{Schema, SchemaBuilder, StoreDeclaration};
use crate::store::TypedMap;

/// One declared store: schema, codec and accessor options
#[derive(Debug, Clone)]
pub struct StoreDefinition {
    name: String,
    schema: Arc<Schema>,
    options: StoreOptions,
    codec: Arc<dyn Codec>,
}

impl StoreDefinition {
    fn new(name: &str, schema: Schema, options: StoreOptions) -> Self {
        let codec = options.codec();
        Self {
            name: name.to_string(),
            schema: Arc::new(schema),
            options,
            codec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Fresh typed map holding the store defaults
    pub fn new_map(&self) -> TypedMap {
        TypedMap::new(Arc::clone(&self.schema))
    }

    /// `(field, accessor key)` pairs generated for this store
    pub fn accessors(&self) -> Vec<(String, String)> {
        let fields: Vec<String> = match &self.options.accessors {
            AccessorPolicy::None => Vec::new(),
            AccessorPolicy::Only(names) => names.clone(),
            AccessorPolicy::Fields => self
                .schema
                .fields()
                .filter(|field| field.has_accessor())
                .map(|field| field.name().to_string())
                .collect(),
        };
        fields
            .into_iter()
            .map(|field| {
                let key = self.options.accessor_key(&self.name, &field);
                (field, key)
            })
            .collect()
    }

    /// Definition after a later declaration of the same store
    ///
    /// The accessor policy and codec stay as first declared; the affixes
    /// are taken from the latest declaration.
    fn redeclared(&self, schema: Schema, options: StoreOptions) -> StoreResult<Self> {
        if options.names_codec() {
            let requested = options.codec();
            if requested.name() != self.codec.name() {
                return Err(StoreError::InvalidDeclaration(format!(
                    "store '{}' uses codec '{}', cannot switch to '{}'",
                    self.name,
                    self.codec.name(),
                    requested.name()
                )));
            }
        }
        Ok(Self {
            name: self.name.clone(),
            schema: Arc::new(schema),
            options: StoreOptions {
                prefix: options.prefix,
                suffix: options.suffix,
                ..self.options.clone()
            },
            codec: Arc::clone(&self.codec),
        })
    }

    fn deep_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema: Arc::new(Schema::clone(&self.schema)),
            options: self.options.clone(),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl StoreHooks for StoreDefinition {
    /// Decode the column and re-apply the current defaults, so fields added
    /// after the column was written read as their default.
    fn on_load(&self, raw: &RawColumn) -> StoreResult<TypedMap> {
        let plain = self.codec.load(raw)?;
        Ok(TypedMap::from_map(Arc::clone(&self.schema), plain))
    }

    fn on_before_save(&self, map: &TypedMap) -> StoreResult<RawColumn> {
        self.codec.dump(map)
    }
}

/// All stores of one record type, plus its accessor table
#[derive(Debug, Clone)]
pub struct RecordSchema {
    record_type: String,
    stores: IndexMap<String, StoreDefinition>,
    accessors: AccessorTable,
}

impl RecordSchema {
    fn new(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            stores: IndexMap::new(),
            accessors: AccessorTable::new(),
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Store definition by name
    ///
    /// # Errors
    ///
    /// `UnknownStore` when the record type declares no such store.
    pub fn store(&self, name: &str) -> StoreResult<&StoreDefinition> {
        self.stores.get(name).ok_or_else(|| StoreError::UnknownStore {
            record_type: self.record_type.clone(),
            store: name.to_string(),
        })
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    /// Stores in declaration order
    pub fn stores(&self) -> impl Iterator<Item = &StoreDefinition> {
        self.stores.values()
    }

    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn accessors(&self) -> &AccessorTable {
        &self.accessors
    }

    fn rebuild_accessors(&mut self) {
        let mut table = AccessorTable::new();
        for store in self.stores.values() {
            for (field, key) in store.accessors() {
                table.bind(&self.record_type, key, AccessorBinding::new(store.name(), field));
            }
        }
        self.accessors = table;
    }
}

/// Record type to stores registry
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    records: HashMap<String, Arc<RecordSchema>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or extend) a store on a record type
    ///
    /// The builder callback receives one registration method per type tag.
    /// Re-declaring an existing store appends the new fields and applies the
    /// new accessor prefix and suffix; its accessor policy and codec stay. Nothing is registered when the callback or
    /// the options fail.
    ///
    /// # Errors
    ///
    /// `InvalidDeclaration` for invalid names or options, or for a codec
    /// that differs from the one the store was declared with.
    /// `UnsupportedType` from the callback.
    pub fn declare_store<F>(
        &mut self,
        record_type: &str,
        store: &str,
        options: StoreOptions,
        define: F,
    ) -> StoreResult<()>
    where
        F: FnOnce(&mut SchemaBuilder) -> StoreResult<()>,
    {
        if record_type.trim().is_empty() || store.trim().is_empty() {
            return Err(StoreError::InvalidDeclaration(
                "record type and store name are required".to_string(),
            ));
        }
        options.validate()?;

        let existing = self
            .records
            .get(record_type)
            .and_then(|record| record.stores.get(store));

        let mut builder = match existing {
            Some(definition) => SchemaBuilder::extending(Schema::clone(&definition.schema)),
            None => SchemaBuilder::new(),
        };
        define(&mut builder)?;
        let schema = builder.build()?;

        let definition = match existing {
            Some(definition) => definition.redeclared(schema, options)?,
            None => StoreDefinition::new(store, schema, options),
        };
        let event = if existing.is_some() {
            Event::StoreExtended
        } else {
            Event::StoreDeclared
        };
        let field_count = definition.schema.len().to_string();
        let codec = definition.codec.name();

        let record = self
            .records
            .entry(record_type.to_string())
            .or_insert_with(|| Arc::new(RecordSchema::new(record_type)));
        let record = Arc::make_mut(record);
        record.stores.insert(store.to_string(), definition);
        record.rebuild_accessors();

        log_event_with_fields(
            event,
            &[
                ("codec", codec),
                ("fields", field_count.as_str()),
                ("record_type", record_type),
                ("store", store),
            ],
        );
        Ok(())
    }

    /// Declare a store from a JSON declaration document
    ///
    /// # Errors
    ///
    /// As [`StoreRegistry::declare_store`], plus `InvalidDeclaration` for
    /// malformed documents.
    pub fn declare_from_json(&mut self, record_type: &str, json: &str) -> StoreResult<()> {
        let declaration = StoreDeclaration::from_json(json)?;
        self.declare_store(
            record_type,
            &declaration.store,
            declaration.options.clone(),
            |builder| declaration.apply(builder),
        )
    }

    /// Give `child` an independent copy of every store of `parent`
    ///
    /// An unknown parent registers `child` with no stores.
    ///
    /// # Errors
    ///
    /// `RecordTypeExists` when `child` already has stores.
    pub fn inherit(&mut self, parent: &str, child: &str) -> StoreResult<()> {
        if self
            .records
            .get(child)
            .is_some_and(|record| !record.stores.is_empty())
        {
            return Err(StoreError::RecordTypeExists(child.to_string()));
        }

        let mut copy = RecordSchema::new(child);
        if let Some(record) = self.records.get(parent) {
            copy.stores = record
                .stores
                .iter()
                .map(|(name, definition)| (name.clone(), definition.deep_copy()))
                .collect();
            copy.rebuild_accessors();
        }
        let store_count = copy.stores.len().to_string();
        self.records.insert(child.to_string(), Arc::new(copy));

        log_event_with_fields(
            Event::StoreInherited,
            &[
                ("child", child),
                ("parent", parent),
                ("stores", store_count.as_str()),
            ],
        );
        Ok(())
    }

    /// Schema snapshot of a record type
    ///
    /// # Errors
    ///
    /// `UnknownRecordType` when nothing was declared for `record_type`.
    pub fn record(&self, record_type: &str) -> StoreResult<Arc<RecordSchema>> {
        self.records
            .get(record_type)
            .cloned()
            .ok_or_else(|| StoreError::UnknownRecordType(record_type.to_string()))
    }

    pub fn get(&self, record_type: &str) -> Option<&Arc<RecordSchema>> {
        self.records.get(record_type)
    }

    /// Store definition of a record type
    ///
    /// # Errors
    ///
    /// `UnknownRecordType` or `UnknownStore`.
    pub fn store(&self, record_type: &str, store: &str) -> StoreResult<&StoreDefinition> {
        self.records
            .get(record_type)
            .ok_or_else(|| StoreError::UnknownRecordType(record_type.to_string()))?
            .store(store)
    }

    pub fn contains(&self, record_type: &str) -> bool {
        self.records.contains_key(record_type)
    }

    pub fn record_types(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}
