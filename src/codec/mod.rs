//! Store codecs
//!
//! A codec converts between the plain map form of a store and the raw value
//! kept in the record's column. Codecs are pure in-memory transformations:
//!
//! - `load` of a null or blank column yields an empty map, never an error
//! - `dump` only accepts map-convertible payloads, anything else is
//!   `InvalidPayload`
//! - corrupt columns surface as `MalformedPayload`
//!
//! Codecs compose by decoration ([`StrippedCodec`] wraps another codec).

mod identity;
mod json;
mod stripped;
mod tagged;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use identity::IdentityCodec;
pub use json::JsonCodec;
pub use stripped::StrippedCodec;
pub use tagged::TaggedJsonCodec;

use crate::error::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event};
use crate::value::{Map, Value};

/// Raw content of a store column as handed over by the host
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawColumn {
    /// SQL NULL, or a column that was never written
    #[default]
    Null,
    /// Serialized text
    Text(String),
    /// Natively structured column (document databases, json columns)
    Document(Map),
}

impl RawColumn {
    /// Null, whitespace-only text or an empty document
    pub fn is_blank(&self) -> bool {
        match self {
            RawColumn::Null => true,
            RawColumn::Text(text) => text.trim().is_empty(),
            RawColumn::Document(map) => map.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawColumn::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for RawColumn {
    fn from(text: &str) -> Self {
        RawColumn::Text(text.to_string())
    }
}

impl From<String> for RawColumn {
    fn from(text: String) -> Self {
        RawColumn::Text(text)
    }
}

impl From<Map> for RawColumn {
    fn from(map: Map) -> Self {
        RawColumn::Document(map)
    }
}

/// Anything that can be turned into a plain store map for dumping
pub trait ToPlainMap {
    /// # Errors
    ///
    /// `InvalidPayload` when the value has no map form.
    fn to_plain_map(&self) -> StoreResult<Map>;
}

impl ToPlainMap for Map {
    fn to_plain_map(&self) -> StoreResult<Map> {
        Ok(self.clone())
    }
}

impl ToPlainMap for Value {
    fn to_plain_map(&self) -> StoreResult<Map> {
        match self {
            Value::Null => Ok(Map::new()),
            Value::Map(map) => Ok(map.clone()),
            other => Err(StoreError::InvalidPayload {
                found: other.type_name(),
            }),
        }
    }
}

/// Load/dump pair bound to a store
pub trait Codec: fmt::Debug + Send + Sync {
    /// Codec name used in errors and log lines
    fn name(&self) -> &'static str;

    /// Decode a raw column into a plain map
    fn load(&self, raw: &RawColumn) -> StoreResult<Map>;

    /// Encode a map-convertible payload into a raw column
    fn dump(&self, data: &dyn ToPlainMap) -> StoreResult<RawColumn>;
}

/// Built-in codecs selectable from store options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// Type-tagged JSON restricted to the value allow-list
    #[default]
    Tagged,
    /// Plain JSON
    Json,
    /// Plain JSON without blank entries
    Stripped,
    /// Pass-through to a structured column
    Identity,
}

impl CodecKind {
    pub fn build(self) -> Arc<dyn Codec> {
        match self {
            CodecKind::Tagged => Arc::new(TaggedJsonCodec),
            CodecKind::Json => Arc::new(JsonCodec),
            CodecKind::Stripped => Arc::new(StrippedCodec::new(JsonCodec)),
            CodecKind::Identity => Arc::new(IdentityCodec),
        }
    }
}

/// Resolves a dump payload, logging rejected payloads.
pub(crate) fn plain_payload(codec: &'static str, data: &dyn ToPlainMap) -> StoreResult<Map> {
    data.to_plain_map().map_err(|err| {
        if let StoreError::InvalidPayload { found } = &err {
            log_event_with_fields(Event::PayloadRejected, &[("codec", codec), ("found", *found)]);
        }
        err
    })
}

/// Builds a `MalformedPayload` error and logs it.
pub(crate) fn malformed(codec: &'static str, reason: impl Into<String>) -> StoreError {
    let reason = reason.into();
    log_event_with_fields(Event::PayloadMalformed, &[("codec", codec), ("reason", reason.as_str())]);
    StoreError::malformed(codec, reason)
}

/// Text columns decoded as JSON: blank text is an empty map, the document
/// must be a JSON object (or `null`).
pub(crate) fn parse_json_object(codec: &'static str, text: &str) -> StoreResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Map(Map::new()));
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| malformed(codec, format!("invalid JSON: {}", e)))?;
    match value {
        Value::Null => Ok(Value::Map(Map::new())),
        Value::Map(_) => Ok(value),
        other => Err(malformed(
            codec,
            format!("expected a JSON object, found {}", other.type_name()),
        )),
    }
}
