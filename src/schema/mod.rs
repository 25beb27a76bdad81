//! Store field schemas
//!
//! - Field definitions with default, null, blank, array and accessor options
//! - The coercion table applied on every write
//! - Schemas built through a declaration builder or a JSON document
//!
//! Casting is total: invalid input degrades to the type's neutral value and
//! never raises. Unknown type tags fail at declaration time.

pub mod cast;
mod dsl;
mod field;
mod loader;
mod types;

pub use dsl::{Schema, SchemaBuilder};
pub use field::{Field, FieldOptions};
pub use loader::{FieldDeclaration, StoreDeclaration};
pub use types::FieldType;
