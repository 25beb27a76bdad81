//! Type coercion table
//!
//! Every cast is total: malformed input degrades to the type's neutral value
//! (zero for numbers, `Null` for booleans and temporal types) and never
//! fails. Default substitution happens afterwards, in [`super::Field::cast`].
//!
//! | type            | `Null`            | unparsable string | other mismatches |
//! |-----------------|-------------------|-------------------|------------------|
//! | string / text   | `Null` if nullable, else `""` | n/a   | natural string form |
//! | integer         | `Null`            | `0`               | `Null`           |
//! | float           | `Null`            | `0.0`             | `Null`           |
//! | decimal         | `Null`            | `0`               | `Null`           |
//! | boolean         | `Null`            | `Null`            | `Null`           |
//! | date / time / datetime | `Null`     | `Null`            | `Null`           |
//! | any             | `Null`            | as given          | as given         |
//!
//! Blank strings cast to `Null` for every numeric type. Timestamps are UTC;
//! strings without an offset are read as UTC.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::types::FieldType;
use crate::value::Value;

/// Strings accepted as `true` by boolean fields
pub const TRUE_VALUES: [&str; 7] = ["1", "t", "T", "true", "TRUE", "on", "ON"];

/// Strings accepted as `false` by boolean fields
pub const FALSE_VALUES: [&str; 7] = ["0", "f", "F", "false", "FALSE", "off", "OFF"];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f %:z"];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

fn integer_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid integer pattern"))
}

fn number_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("valid number pattern")
    })
}

/// Casts a single (non-array) value to `field_type`.
///
/// `nullable` only matters for string-like types: a `Null` stays `Null` when
/// the slot may hold nil, and becomes `""` otherwise.
pub fn cast(field_type: FieldType, value: Value, nullable: bool) -> Value {
    match field_type {
        FieldType::String | FieldType::Text => cast_string(value, nullable),
        FieldType::Integer => cast_integer(value),
        FieldType::Float => cast_float(value),
        FieldType::Decimal => cast_decimal(value),
        FieldType::Boolean => cast_boolean(value),
        FieldType::Date => cast_date(value),
        FieldType::Time => cast_time(value),
        FieldType::DateTime => cast_datetime(value),
        FieldType::Any => value,
    }
}

fn cast_string(value: Value, nullable: bool) -> Value {
    match value {
        Value::Null if nullable => Value::Null,
        Value::Null => Value::String(String::new()),
        Value::String(s) => Value::String(s),
        other => Value::String(to_natural_string(&other)),
    }
}

/// Natural string representation of a value
pub fn to_natural_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Decimal(d) => d.normalize().to_string(),
        Value::String(s) => s.clone(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        Value::Array(_) | Value::Map(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        // Debug keeps the fractional part: 1.0 -> "1.0", 2.3 -> "2.3"
        format!("{:?}", f)
    }
}

fn cast_integer(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Integer(i64::from(b)),
        Value::Integer(i) => Value::Integer(i),
        Value::Float(f) if f.is_finite() => Value::Integer(f.trunc() as i64),
        Value::Decimal(d) => d.trunc().to_i64().map_or(Value::Null, Value::Integer),
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match integer_prefix().captures(&s) {
            Some(caps) => caps[1]
                .parse::<i64>()
                .map_or(Value::Null, Value::Integer),
            None => Value::Integer(0),
        },
        _ => Value::Null,
    }
}

fn cast_float(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Float(if b { 1.0 } else { 0.0 }),
        Value::Integer(i) => Value::Float(i as f64),
        Value::Float(f) => Value::Float(f),
        Value::Decimal(d) => d.to_f64().map_or(Value::Null, Value::Float),
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed {
                "" => Value::Null,
                "Infinity" => Value::Float(f64::INFINITY),
                "-Infinity" => Value::Float(f64::NEG_INFINITY),
                "NaN" => Value::Float(f64::NAN),
                _ => match number_prefix().captures(trimmed) {
                    Some(caps) => caps[1]
                        .parse::<f64>()
                        .map_or(Value::Float(0.0), Value::Float),
                    None => Value::Float(0.0),
                },
            }
        }
        _ => Value::Null,
    }
}

fn cast_decimal(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Decimal(Decimal::from(u8::from(b))),
        Value::Integer(i) => Value::Decimal(Decimal::from(i)),
        Value::Float(f) => Decimal::from_f64(f).map_or(Value::Null, Value::Decimal),
        Value::Decimal(d) => Value::Decimal(d),
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match number_prefix().captures(&s) {
            Some(caps) => parse_decimal(&caps[1]).map_or(Value::Null, Value::Decimal),
            None => Value::Decimal(Decimal::ZERO),
        },
        _ => Value::Null,
    }
}

fn parse_decimal(digits: &str) -> Option<Decimal> {
    if digits.contains(['e', 'E']) {
        Decimal::from_scientific(digits).ok()
    } else {
        Decimal::from_str(digits).ok()
    }
}

fn cast_boolean(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(b),
        Value::Integer(1) => Value::Bool(true),
        Value::Integer(0) => Value::Bool(false),
        Value::String(s) => {
            if TRUE_VALUES.contains(&s.as_str()) {
                Value::Bool(true)
            } else if FALSE_VALUES.contains(&s.as_str()) {
                Value::Bool(false)
            } else {
                Value::Null
            }
        }
        _ => Value::Null,
    }
}

fn cast_date(value: Value) -> Value {
    match value {
        Value::Date(d) => Value::Date(d),
        Value::DateTime(dt) => Value::Date(dt.date_naive()),
        Value::String(s) => parse_date(s.trim()).map_or(Value::Null, Value::Date),
        _ => Value::Null,
    }
}

fn cast_time(value: Value) -> Value {
    match value {
        Value::Time(t) => Value::Time(t),
        Value::DateTime(dt) => Value::Time(dt.time()),
        Value::String(s) => parse_time(s.trim()).map_or(Value::Null, Value::Time),
        _ => Value::Null,
    }
}

fn cast_datetime(value: Value) -> Value {
    match value {
        Value::DateTime(dt) => Value::DateTime(dt),
        Value::Date(d) => d
            .and_hms_opt(0, 0, 0)
            .map_or(Value::Null, |naive| Value::DateTime(naive.and_utc())),
        Value::String(s) => parse_datetime(s.trim()).map_or(Value::Null, Value::DateTime),
        _ => Value::Null,
    }
}

/// Parses an ISO-8601 date, or the date part of a timestamp
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

/// Parses a time of day, or the time part of a timestamp
pub(crate) fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.time()))
}

/// Parses a timestamp. Strings without an offset are UTC; a bare date is
/// midnight UTC.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
