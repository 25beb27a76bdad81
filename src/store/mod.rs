//! Typed stores
//!
//! - [`TypedMap`]: schema-bound map, casts on every write
//! - [`StoreRegistry`]: record type to store declarations

mod registry;
mod typed_map;

pub use registry::{RecordSchema, StoreDefinition, StoreRegistry};
pub use typed_map::TypedMap;
