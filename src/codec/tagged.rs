//! Type-tagged JSON codec
//!
//! The default codec. Values outside the plain JSON model are wrapped in a
//! single-key object whose key names the type:
//!
//! | value              | encoding                              |
//! |--------------------|---------------------------------------|
//! | decimal            | `{"$decimal": "12.50"}`               |
//! | date               | `{"$date": "1984-06-08"}`             |
//! | time               | `{"$time": "13:57:12"}`               |
//! | datetime (UTC)     | `{"$datetime": "1984-06-08T13:57:12Z"}` |
//! | NaN / infinities   | `{"$float": "NaN"}`                   |
//! | map `{"$x": ...}`  | `{"$map": {"$x": ...}}`               |
//!
//! The tag set is a closed allow-list. Any other `$` tag is rejected with
//! `DisallowedType`; decoding never instantiates anything beyond [`Value`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use super::{malformed, parse_json_object, plain_payload, Codec, RawColumn, ToPlainMap};
use crate::error::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event};
use crate::value::{Map, Value};

const NAME: &str = "tagged_json";

const TAG_DECIMAL: &str = "$decimal";
const TAG_DATE: &str = "$date";
const TAG_TIME: &str = "$time";
const TAG_DATETIME: &str = "$datetime";
const TAG_FLOAT: &str = "$float";
const TAG_MAP: &str = "$map";

const SCALAR_TAGS: [&str; 5] = [TAG_DECIMAL, TAG_DATE, TAG_TIME, TAG_DATETIME, TAG_FLOAT];

#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedJsonCodec;

impl Codec for TaggedJsonCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn load(&self, raw: &RawColumn) -> StoreResult<Map> {
        let document = match raw {
            RawColumn::Null => return Ok(Map::new()),
            RawColumn::Document(map) => Value::Map(map.clone()),
            RawColumn::Text(text) => parse_json_object(NAME, text)?,
        };
        match decode(document)? {
            Value::Map(map) => Ok(map),
            other => Err(malformed(
                NAME,
                format!("expected a map document, found tagged {}", other.type_name()),
            )),
        }
    }

    fn dump(&self, data: &dyn ToPlainMap) -> StoreResult<RawColumn> {
        let map = plain_payload(NAME, data)?;
        let encoded = encode(Value::Map(map));
        let text = serde_json::to_string(&encoded).map_err(|e| malformed(NAME, e.to_string()))?;
        Ok(RawColumn::Text(text))
    }
}

fn tagged(tag: &str, payload: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), payload);
    Value::Map(map)
}

fn looks_tagged(map: &Map) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.keys().next().map(String::as_str).filter(|key| key.starts_with('$'))
}

fn encode(value: Value) -> Value {
    match value {
        Value::Decimal(d) => tagged(TAG_DECIMAL, Value::String(d.to_string())),
        Value::Date(d) => tagged(TAG_DATE, Value::String(d.format("%Y-%m-%d").to_string())),
        Value::Time(t) => tagged(TAG_TIME, Value::String(t.format("%H:%M:%S%.f").to_string())),
        Value::DateTime(dt) => tagged(
            TAG_DATETIME,
            Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ),
        Value::Float(f) if !f.is_finite() => tagged(TAG_FLOAT, Value::String(float_tag(f).into())),
        Value::Array(items) => Value::Array(items.into_iter().map(encode).collect()),
        Value::Map(map) => {
            let escape = looks_tagged(&map).is_some();
            let encoded = Value::Map(map.into_iter().map(|(k, v)| (k, encode(v))).collect());
            if escape {
                tagged(TAG_MAP, encoded)
            } else {
                encoded
            }
        }
        other => other,
    }
}

fn float_tag(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn decode(value: Value) -> StoreResult<Value> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(decode)
            .collect::<StoreResult<Vec<_>>>()
            .map(Value::Array),
        Value::Map(map) => {
            let tag = looks_tagged(&map).map(str::to_string);
            match tag {
                Some(tag) => {
                    let payload = map.into_iter().next().map(|(_, v)| v).unwrap_or_default();
                    decode_tagged(&tag, payload)
                }
                None => decode_entries(map),
            }
        }
        other => Ok(other),
    }
}

fn decode_entries(map: Map) -> StoreResult<Value> {
    map.into_iter()
        .map(|(k, v)| decode(v).map(|v| (k, v)))
        .collect::<StoreResult<Map>>()
        .map(Value::Map)
}

fn decode_tagged(tag: &str, payload: Value) -> StoreResult<Value> {
    if tag == TAG_MAP {
        return match payload {
            Value::Map(inner) => decode_entries(inner),
            other => Err(bad_payload(tag, &other)),
        };
    }

    if !SCALAR_TAGS.contains(&tag) {
        log_event_with_fields(Event::PayloadMalformed, &[("codec", NAME), ("tag", tag)]);
        return Err(StoreError::DisallowedType(tag.to_string()));
    }

    let text = match &payload {
        Value::String(text) => text.as_str(),
        other => return Err(bad_payload(tag, other)),
    };

    let decoded = match tag {
        TAG_DECIMAL => Decimal::from_str(text).ok().map(Value::Decimal),
        TAG_DATE => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Value::Date),
        TAG_TIME => NaiveTime::parse_from_str(text, "%H:%M:%S%.f").ok().map(Value::Time),
        TAG_DATETIME => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
        TAG_FLOAT => match text {
            "NaN" => Some(Value::Float(f64::NAN)),
            "Infinity" => Some(Value::Float(f64::INFINITY)),
            "-Infinity" => Some(Value::Float(f64::NEG_INFINITY)),
            _ => None,
        },
        _ => None,
    };

    decoded.ok_or_else(|| malformed(NAME, format!("invalid {} payload '{}'", tag, text)))
}

fn bad_payload(tag: &str, payload: &Value) -> StoreError {
    malformed(
        NAME,
        format!("invalid {} payload of type {}", tag, payload.type_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn round_trip(map: &Map) -> Map {
        let raw = TaggedJsonCodec.dump(map).unwrap();
        TaggedJsonCodec.load(&raw).unwrap()
    }

    #[test]
    fn test_temporal_and_decimal_values_survive() {
        let mut map = Map::new();
        map.insert("price".into(), Value::Decimal(Decimal::new(1250, 2)));
        map.insert(
            "published_on".into(),
            Value::Date(NaiveDate::from_ymd_opt(1984, 6, 8).unwrap()),
        );
        map.insert(
            "remind_at".into(),
            Value::Time(NaiveTime::from_hms_opt(13, 57, 12).unwrap()),
        );
        map.insert(
            "published_at".into(),
            Value::DateTime(Utc.with_ymd_and_hms(1984, 6, 8, 13, 57, 12).unwrap()),
        );
        assert_eq!(round_trip(&map), map);
    }

    #[test]
    fn test_encoding_format() {
        let mut map = Map::new();
        map.insert(
            "published_on".into(),
            Value::Date(NaiveDate::from_ymd_opt(1984, 6, 8).unwrap()),
        );
        let raw = TaggedJsonCodec.dump(&map).unwrap();
        assert_eq!(raw, RawColumn::from(r#"{"published_on":{"$date":"1984-06-08"}}"#));
    }

    #[test]
    fn test_non_finite_floats() {
        let mut map = Map::new();
        map.insert("up".into(), Value::Float(f64::INFINITY));
        map.insert("down".into(), Value::Float(f64::NEG_INFINITY));
        map.insert("nan".into(), Value::Float(f64::NAN));
        let loaded = round_trip(&map);
        assert_eq!(loaded["up"], Value::Float(f64::INFINITY));
        assert_eq!(loaded["down"], Value::Float(f64::NEG_INFINITY));
        assert!(loaded["nan"].as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_user_maps_that_look_tagged_are_escaped() {
        let mut inner = Map::new();
        inner.insert("$date".into(), Value::from("not a date"));
        let mut map = Map::new();
        map.insert("meta".into(), Value::Map(inner));

        let raw = TaggedJsonCodec.dump(&map).unwrap();
        assert_eq!(raw, RawColumn::from(r#"{"meta":{"$map":{"$date":"not a date"}}}"#));
        assert_eq!(TaggedJsonCodec.load(&raw).unwrap(), map);
    }

    #[test]
    fn test_unknown_tags_are_disallowed() {
        let err = TaggedJsonCodec
            .load(&RawColumn::from(r#"{"user":{"$object":"Kernel"}}"#))
            .unwrap_err();
        assert_eq!(err, StoreError::DisallowedType("$object".into()));
    }

    #[test]
    fn test_invalid_tag_payload() {
        let err = TaggedJsonCodec
            .load(&RawColumn::from(r#"{"on":{"$date":"yesterday"}}"#))
            .unwrap_err();
        assert_eq!(err.code(), "TYPEDSTORE_MALFORMED_PAYLOAD");

        let err = TaggedJsonCodec
            .load(&RawColumn::from(r#"{"on":{"$date":12}}"#))
            .unwrap_err();
        assert_eq!(err.code(), "TYPEDSTORE_MALFORMED_PAYLOAD");
    }

    #[test]
    fn test_nested_arrays_and_maps() {
        let mut nested = Map::new();
        nested.insert("at".into(), Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()));
        let mut map = Map::new();
        map.insert(
            "grid".into(),
            Value::from(vec![Value::from(vec![1, 2]), Value::from(vec![3])]),
        );
        map.insert("log".into(), Value::Array(vec![Value::Map(nested)]));
        assert_eq!(round_trip(&map), map);
    }

    #[test]
    fn test_blank_text_loads_empty() {
        assert!(TaggedJsonCodec.load(&RawColumn::from("")).unwrap().is_empty());
        assert!(TaggedJsonCodec.load(&RawColumn::from("{}")).unwrap().is_empty());
    }
}
