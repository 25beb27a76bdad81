//! Identity codec for natively structured columns

use super::{malformed, plain_payload, Codec, RawColumn, ToPlainMap};
use crate::error::StoreResult;
use crate::value::Map;

const NAME: &str = "identity";

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn load(&self, raw: &RawColumn) -> StoreResult<Map> {
        match raw {
            RawColumn::Null => Ok(Map::new()),
            RawColumn::Document(map) => Ok(map.clone()),
            RawColumn::Text(text) if text.trim().is_empty() => Ok(Map::new()),
            RawColumn::Text(_) => Err(malformed(NAME, "identity codec cannot decode text")),
        }
    }

    fn dump(&self, data: &dyn ToPlainMap) -> StoreResult<RawColumn> {
        Ok(RawColumn::Document(plain_payload(NAME, data)?))
    }
}
