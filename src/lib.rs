//! typedstore - typed, schema-validated key-value stores kept in a single
//! record column
//!
//! A store is one opaque column of a record. Its content is declared as a
//! schema of typed fields with defaults, read and written through a typed
//! map that casts every value, serialized by a pluggable codec and tracked
//! for changes against a snapshot.
//!
//! ```ignore
//! use typedstore::{FieldOptions, Record, StoreOptions, StoreRegistry};
//!
//! let mut registry = StoreRegistry::new();
//! registry.declare_store("User", "settings", StoreOptions::default(), |s| {
//!     s.integer("age", FieldOptions::new().with_default(12).null(false));
//!     s.boolean("enabled", FieldOptions::new().with_default(true));
//!     Ok(())
//! })?;
//!
//! let mut user = Record::new(registry.record("User")?)?;
//! user.set("age", "24")?;
//! assert!(user.is_changed("age")?);
//! let columns = user.prepare_save()?;
//! user.mark_persisted(columns);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod observability;
pub mod record;
pub mod schema;
pub mod store;
pub mod tracking;
pub mod value;

pub use codec::{Codec, CodecKind, RawColumn, ToPlainMap};
pub use config::{AccessorAffix, AccessorPolicy, LogConfig, StoreOptions};
pub use error::{StoreError, StoreResult};
pub use record::{Columns, Record, StoreHooks};
pub use schema::{Field, FieldOptions, FieldType, Schema, SchemaBuilder};
pub use store::{RecordSchema, StoreDefinition, StoreRegistry, TypedMap};
pub use tracking::{DirtyState, Snapshot};
pub use value::{Map, Value};
