//! Conversion between validated values and stored payload text.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SyncConfig;
use crate::error::{KeystashError, Result};
use crate::schema::{Schema, SchemaKind, Typed, ValidationError};

/// Render a validated value for storage.
///
/// Strings are written verbatim, everything else as compact JSON.
pub(crate) fn serialize_value(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// Validate payload text against `schema`.
///
/// String schemas read the text verbatim, the way strings are written, so
/// `null`, `true` or `"hi"` come back exactly. Only when the raw text is
/// rejected is a JSON-quoted string accepted in its place. Other kinds
/// decode JSON, treating text that is not JSON as a raw string.
pub(crate) fn decode_payload(text: &str, schema: &Schema) -> std::result::Result<Value, ValidationError> {
    let raw = Value::String(text.to_string());
    if matches!(schema.kind(), SchemaKind::String) {
        return schema.parse(Some(&raw)).or_else(|err| {
            match serde_json::from_str::<Value>(text) {
                Ok(quoted @ Value::String(_)) => schema.parse(Some(&quoted)).map_err(|_| err),
                _ => Err(err),
            }
        });
    }

    match serde_json::from_str::<Value>(text) {
        Ok(decoded) => schema.parse(Some(&decoded)),
        Err(_) => schema.parse(Some(&raw)),
    }
}

/// Full read pipeline for stored or broadcast bytes.
pub(crate) fn decode_record<T: DeserializeOwned>(
    bytes: &[u8],
    schema: &Typed<T>,
    config: &SyncConfig,
) -> Result<T> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| KeystashError::Decode(format!("Payload is not valid UTF-8: {}", e)))?;
    let text = config.decode_value(text)?;
    let validated = decode_payload(&text, schema.schema())?;
    Ok(Typed::<T>::convert(validated)?)
}
