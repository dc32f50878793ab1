//! Untyped schema nodes and the parse dispatcher.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::{Constraint, ValidationError};

/// The closed set of value shapes a schema can describe.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    /// Homogeneous array; every element is parsed by the item schema
    Array(Arc<Schema>),
    /// Keyed mapping; fields are validated in declaration order
    Object(Arc<Vec<(String, Schema)>>),
}

impl SchemaKind {
    /// Lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
        }
    }
}

/// An immutable validator for one value shape.
///
/// Modifiers return a new node; nested schemas sit behind `Arc`, so
/// reconfiguring a large object schema does not copy its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl Schema {
    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
            min: None,
            max: None,
        }
    }

    pub fn string() -> Self {
        Self::with_kind(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::with_kind(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::with_kind(SchemaKind::Boolean)
    }

    pub fn array(item: Schema) -> Self {
        Self::with_kind(SchemaKind::Array(Arc::new(item)))
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        Self::with_kind(SchemaKind::Object(Arc::new(fields)))
    }

    /// Reject absent input instead of substituting the default.
    pub fn required(&self) -> Self {
        Self {
            required: true,
            ..self.clone()
        }
    }

    /// Inclusive lower bound: length for strings and arrays, value for numbers.
    ///
    /// Ignored for booleans and objects.
    pub fn with_min(&self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self.clone()
        }
    }

    /// Inclusive upper bound: length for strings and arrays, value for numbers.
    ///
    /// Ignored for booleans and objects.
    pub fn with_max(&self, max: f64) -> Self {
        Self {
            max: Some(max),
            ..self.clone()
        }
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn min_bound(&self) -> Option<f64> {
        self.min
    }

    pub fn max_bound(&self) -> Option<f64> {
        self.max
    }

    /// Value substituted for absent, optional input.
    pub fn default_value(&self) -> Value {
        match &self.kind {
            SchemaKind::String => Value::String(String::new()),
            SchemaKind::Number => Value::from(0),
            SchemaKind::Boolean => Value::Bool(false),
            SchemaKind::Array(_) => Value::Array(Vec::new()),
            SchemaKind::Object(_) => Value::Object(Map::new()),
        }
    }

    /// Validate `input` and return the accepted value.
    ///
    /// `None` and `null` are both treated as absent. The input is never
    /// modified; the result is a fresh value in which objects carry only
    /// declared fields and absent optional values carry their defaults.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, with its path
    /// pointing at the offending field or element.
    pub fn parse(&self, input: Option<&Value>) -> Result<Value, ValidationError> {
        let value = match input {
            None | Some(Value::Null) => return self.absent(),
            Some(value) => value,
        };

        match &self.kind {
            SchemaKind::String => {
                let text = value.as_str().ok_or_else(|| self.type_error(value))?;
                self.check_length(text.chars().count(), value)?;
                Ok(value.clone())
            }
            SchemaKind::Number => {
                let number = value.as_f64().ok_or_else(|| self.type_error(value))?;
                self.check_range(number, value)?;
                Ok(value.clone())
            }
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    return Err(self.type_error(value));
                }
                Ok(value.clone())
            }
            SchemaKind::Array(item) => {
                let elements = value.as_array().ok_or_else(|| self.type_error(value))?;
                self.check_length(elements.len(), value)?;
                let mut parsed = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    parsed.push(item.parse(Some(element)).map_err(|e| e.at_index(index))?);
                }
                Ok(Value::Array(parsed))
            }
            SchemaKind::Object(fields) => {
                let entries = value.as_object().ok_or_else(|| self.type_error(value))?;
                let mut parsed = Map::new();
                for (name, field) in fields.iter() {
                    let field_value = field
                        .parse(entries.get(name))
                        .map_err(|e| e.in_field(name))?;
                    parsed.insert(name.clone(), field_value);
                }
                Ok(Value::Object(parsed))
            }
        }
    }

    fn absent(&self) -> Result<Value, ValidationError> {
        if self.required {
            return Err(ValidationError::new(Constraint::Required {
                kind: self.kind.name(),
            }));
        }
        Ok(self.default_value())
    }

    fn type_error(&self, value: &Value) -> ValidationError {
        ValidationError::new(Constraint::Type {
            expected: self.kind.name(),
        })
        .with_actual(value)
    }

    fn check_length(&self, len: usize, value: &Value) -> Result<(), ValidationError> {
        let kind = self.kind.name();
        if let Some(min) = self.min {
            if (len as f64) < min {
                return Err(ValidationError::new(Constraint::MinLength {
                    kind,
                    min: min as usize,
                })
                .with_actual(value));
            }
        }
        if let Some(max) = self.max {
            if (len as f64) > max {
                return Err(ValidationError::new(Constraint::MaxLength {
                    kind,
                    max: max as usize,
                })
                .with_actual(value));
            }
        }
        Ok(())
    }

    fn check_range(&self, number: f64, value: &Value) -> Result<(), ValidationError> {
        if let Some(min) = self.min {
            if number < min {
                return Err(ValidationError::new(Constraint::MinValue { min }).with_actual(value));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(ValidationError::new(Constraint::MaxValue { max }).with_actual(value));
            }
        }
        Ok(())
    }
}
