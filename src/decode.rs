//! Response shape normalization and typed decode.
//!
//! The upstream returns either the bare payload or an object wrapping it
//! under a `results` field. This is an explicit tagged decode: the caller
//! states which shape it expects, and anything else is a hard
//! `unknown_format` failure — never a silent empty default.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::classify::classify;
use crate::error::{Error, Result};
use crate::transport::TransportError;

/// Expected payload shape for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A JSON array, possibly wrapped as `{"results": [...]}`.
    Collection,
    /// A JSON object, possibly wrapped as `{"results": {...}}`.
    Object,
}

/// Reduce a raw response to its bare form, validating against `shape`.
///
/// Runs inside the fetcher, before anything reaches the cache, so a
/// malformed body is never stored.
pub fn normalize(value: Value, shape: Shape, context: &str) -> Result<Value> {
    let unwrapped = match value {
        Value::Object(mut map) if map.contains_key("results") => {
            map.remove("results").unwrap_or(Value::Null)
        }
        other => other,
    };

    let ok = match shape {
        Shape::Collection => unwrapped.is_array(),
        Shape::Object => unwrapped.is_object(),
    };
    if ok {
        Ok(unwrapped)
    } else {
        let err = TransportError::Shape(format!(
            "expected {} but got {}",
            match shape {
                Shape::Collection => "an array",
                Shape::Object => "an object",
            },
            type_name(&unwrapped)
        ));
        Err(Error::Api(classify(&err, context)))
    }
}

/// Deserialize a normalized value into its typed model.
pub fn decode<T: DeserializeOwned>(value: Value, context: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        let err = TransportError::Shape(e.to_string());
        Error::Api(classify(&err, context))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
