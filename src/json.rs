//! Lenient field access over `serde_json` objects.

use crate::error::{LineResult, SkipReason};
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

pub fn parse_object(payload: &str) -> LineResult<Object> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Object(obj) => Ok(obj),
        _ => Err(SkipReason::NotAnObject),
    }
}

/// Text of `field`, or an empty string when absent or null. Numbers and booleans
/// are rendered as text, nested values as compact JSON.
pub fn opt_string(obj: &Object, field: &str) -> String {
    match obj.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn opt_object<'a>(obj: &'a Object, field: &str) -> Option<&'a Object> {
    obj.get(field).and_then(Value::as_object)
}

pub fn opt_array<'a>(obj: &'a Object, field: &str) -> Option<&'a Vec<Value>> {
    obj.get(field).and_then(Value::as_array)
}

/// A field that must hold a string.
pub fn required_str<'a>(obj: &'a Object, field: &'static str) -> LineResult<&'a str> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s),
        None | Some(Value::Null) => Err(SkipReason::MissingField(field)),
        Some(other) => Err(SkipReason::InvalidField {
            field,
            found: type_name(other),
        }),
    }
}

/// A field that must hold an object.
pub fn required_object<'a>(obj: &'a Object, field: &'static str) -> LineResult<&'a Object> {
    match obj.get(field) {
        Some(Value::Object(o)) => Ok(o),
        None | Some(Value::Null) => Err(SkipReason::MissingField(field)),
        Some(other) => Err(SkipReason::InvalidField {
            field,
            found: type_name(other),
        }),
    }
}

/// Strips `prefix` from the start of `key`; keys without the prefix are kept as-is.
/// Only a leading match is removed: `/x/authors/OL1A` is kept whole, where a
/// replace-all of `/authors` would give `/x/OL1A`.
pub fn strip_key_prefix(key: &str, prefix: &str) -> String {
    key.strip_prefix(prefix).unwrap_or(key).to_string()
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
