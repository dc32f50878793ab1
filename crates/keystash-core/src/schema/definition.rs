//! Schema definitions written as JSON documents.
//!
//! ```json
//! {
//!   "type": "object",
//!   "required": true,
//!   "fields": {
//!     "name": { "type": "string", "required": true, "min": 1 },
//!     "tags": { "type": "array", "items": { "type": "string" }, "max": 10 }
//!   }
//! }
//! ```

use serde_json::Value;

use super::node::{Schema, SchemaKind};
use crate::error::{KeystashError, Result};

const COMMON_ATTRIBUTES: &[&str] = &["type", "required", "min", "max"];

impl Schema {
    /// Build a schema from its JSON definition.
    ///
    /// # Errors
    ///
    /// Returns `KeystashError::Schema` if:
    /// - The definition is not an object or lacks a string `type`
    /// - The type is unknown
    /// - An attribute is unknown or has the wrong JSON type
    /// - `min`/`max` are given for a boolean or object, or `min > max`
    /// - An array lacks `items` or an object lacks `fields`
    pub fn from_definition(definition: &Value) -> Result<Schema> {
        Self::from_definition_at(definition, "$")
    }

    fn from_definition_at(definition: &Value, at: &str) -> Result<Schema> {
        let attrs = definition
            .as_object()
            .ok_or_else(|| schema_error(at, "definition must be a JSON object"))?;
        let type_name = attrs
            .get("type")
            .and_then(|value| value.as_str())
            .ok_or_else(|| schema_error(at, "missing or non-string \"type\""))?;

        let mut schema = match type_name {
            "string" => Schema::string(),
            "number" => Schema::number(),
            "boolean" => Schema::boolean(),
            "array" => {
                let items = attrs
                    .get("items")
                    .ok_or_else(|| schema_error(at, "array definition needs \"items\""))?;
                Schema::array(Self::from_definition_at(items, &format!("{}[]", at))?)
            }
            "object" => {
                let fields = attrs
                    .get("fields")
                    .and_then(|value| value.as_object())
                    .ok_or_else(|| schema_error(at, "object definition needs a \"fields\" map"))?;
                let mut parsed = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    let field_schema =
                        Self::from_definition_at(field, &format!("{}.{}", at, name))?;
                    parsed.push((name.clone(), field_schema));
                }
                Schema::object(parsed)
            }
            other => return Err(schema_error(at, &format!("unknown type \"{}\"", other))),
        };

        let nested = match schema.kind() {
            SchemaKind::Array(_) => Some("items"),
            SchemaKind::Object(_) => Some("fields"),
            _ => None,
        };

        for key in attrs.keys() {
            if !COMMON_ATTRIBUTES.contains(&key.as_str()) && nested != Some(key.as_str()) {
                return Err(schema_error(at, &format!("unknown attribute \"{}\"", key)));
            }
        }

        match attrs.get("required") {
            None => {}
            Some(Value::Bool(true)) => schema = schema.required(),
            Some(Value::Bool(false)) => {}
            Some(_) => return Err(schema_error(at, "\"required\" must be a boolean")),
        }

        let min = bound(attrs.get("min"), "min", at)?;
        let max = bound(attrs.get("max"), "max", at)?;
        if (min.is_some() || max.is_some())
            && matches!(schema.kind(), SchemaKind::Boolean | SchemaKind::Object(_))
        {
            return Err(schema_error(
                at,
                &format!("{} schemas do not take min/max", type_name),
            ));
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(schema_error(at, "min is greater than max"));
            }
        }
        let is_length = matches!(schema.kind(), SchemaKind::String | SchemaKind::Array(_));
        for (name, value) in [("min", min), ("max", max)] {
            if let Some(value) = value {
                if is_length && (value < 0.0 || value.fract() != 0.0) {
                    return Err(schema_error(
                        at,
                        &format!("{} must be a non-negative integer length", name),
                    ));
                }
            }
        }
        if let Some(min) = min {
            schema = schema.with_min(min);
        }
        if let Some(max) = max {
            schema = schema.with_max(max);
        }

        Ok(schema)
    }
}

fn bound(value: Option<&Value>, name: &str, at: &str) -> Result<Option<f64>> {
    match value {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| schema_error(at, &format!("\"{}\" must be a number", name))),
    }
}

fn schema_error(at: &str, message: &str) -> KeystashError {
    KeystashError::Schema(format!("{}: {}", at, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_definition() {
        let schema = Schema::from_definition(&json!({
            "type": "object",
            "fields": {
                "name": {"type": "string", "required": true, "min": 1},
                "age": {"type": "number", "min": 0, "max": 150},
                "tags": {"type": "array", "items": {"type": "string"}, "max": 3}
            }
        }))
        .unwrap();

        let expected = Schema::object([
            ("age", Schema::number().with_min(0.0).with_max(150.0)),
            ("name", Schema::string().required().with_min(1.0)),
            ("tags", Schema::array(Schema::string()).with_max(3.0)),
        ]);
        assert_eq!(schema, expected);

        let parsed = schema
            .parse(Some(&json!({"name": "Jane", "age": 25})))
            .unwrap();
        assert_eq!(parsed, json!({"name": "Jane", "age": 25, "tags": []}));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = Schema::from_definition(&json!({"type": "date"})).unwrap_err();
        assert!(err.to_string().contains("unknown type \"date\""));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let err = Schema::from_definition(&json!({"type": "string", "pattern": ".*"})).unwrap_err();
        assert!(err.to_string().contains("unknown attribute \"pattern\""));
    }

    #[test]
    fn test_bounds_on_boolean_rejected() {
        let err = Schema::from_definition(&json!({"type": "boolean", "min": 1})).unwrap_err();
        assert!(err.to_string().contains("do not take min/max"));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = Schema::from_definition(&json!({"type": "number", "min": 5, "max": 1})).unwrap_err();
        assert!(err.to_string().contains("min is greater than max"));
    }

    #[test]
    fn test_fractional_length_rejected() {
        let err = Schema::from_definition(&json!({"type": "string", "max": 2.5})).unwrap_err();
        assert!(err.to_string().contains("non-negative integer length"));
    }

    #[test]
    fn test_nested_error_location() {
        let err = Schema::from_definition(&json!({
            "type": "object",
            "fields": {"items": {"type": "array", "items": {"type": 3}}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("$.items[]"));
    }

    #[test]
    fn test_missing_items_rejected() {
        assert!(Schema::from_definition(&json!({"type": "array"})).is_err());
        assert!(Schema::from_definition(&json!({"type": "object"})).is_err());
        assert!(Schema::from_definition(&json!("string")).is_err());
    }
}
