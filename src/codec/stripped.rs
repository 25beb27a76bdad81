//! Blank-stripping codec decorator
//!
//! Drops blank entries before delegating to the wrapped codec. `false` is
//! not blank and is kept. Stripped keys come back through the typed map's
//! defaults on the next read.

use super::{plain_payload, Codec, RawColumn, ToPlainMap};
use crate::error::StoreResult;
use crate::value::Map;

#[derive(Debug, Clone, Default)]
pub struct StrippedCodec<C> {
    inner: C,
}

impl<C: Codec> StrippedCodec<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Codec> Codec for StrippedCodec<C> {
    fn name(&self) -> &'static str {
        "stripped"
    }

    fn load(&self, raw: &RawColumn) -> StoreResult<Map> {
        self.inner.load(raw)
    }

    fn dump(&self, data: &dyn ToPlainMap) -> StoreResult<RawColumn> {
        let mut map = plain_payload(self.name(), data)?;
        map.retain(|_, value| value.is_present());
        self.inner.dump(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonCodec, TaggedJsonCodec};
    use crate::value::Value;

    fn sample() -> Map {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(""));
        map.insert("nickname".into(), Value::Null);
        map.insert("tags".into(), Value::Array(vec![]));
        map.insert("enabled".into(), Value::from(false));
        map.insert("age".into(), Value::from(0));
        map.insert("source".into(), Value::from("web"));
        map
    }

    #[test]
    fn test_blank_entries_are_dropped() {
        let codec = StrippedCodec::new(JsonCodec);
        let raw = codec.dump(&sample()).unwrap();
        assert_eq!(raw, RawColumn::from(r#"{"enabled":false,"age":0,"source":"web"}"#));
    }

    #[test]
    fn test_wraps_any_codec() {
        let codec = StrippedCodec::new(TaggedJsonCodec);
        let loaded = codec.load(&codec.dump(&sample()).unwrap()).unwrap();
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["enabled", "age", "source"]);
    }

    #[test]
    fn test_load_delegates() {
        let codec = StrippedCodec::new(JsonCodec);
        assert!(codec.load(&RawColumn::Null).unwrap().is_empty());
        assert_eq!(codec.inner().name(), "json");
    }
}
