//! Plain JSON codec
//!
//! Decimal and temporal values are written as strings and come back as
//! strings; the typed map casts them back for declared fields.

use super::{malformed, parse_json_object, plain_payload, Codec, RawColumn, ToPlainMap};
use crate::error::StoreResult;
use crate::value::{Map, Value};

const NAME: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn load(&self, raw: &RawColumn) -> StoreResult<Map> {
        match raw {
            RawColumn::Null => Ok(Map::new()),
            RawColumn::Document(map) => Ok(map.clone()),
            RawColumn::Text(text) => match parse_json_object(NAME, text)? {
                Value::Map(map) => Ok(map),
                _ => Ok(Map::new()),
            },
        }
    }

    fn dump(&self, data: &dyn ToPlainMap) -> StoreResult<RawColumn> {
        let map = plain_payload(NAME, data)?;
        let text = serde_json::to_string(&map).map_err(|e| malformed(NAME, e.to_string()))?;
        Ok(RawColumn::Text(text))
    }
}
