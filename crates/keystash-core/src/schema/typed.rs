//! Compile-time linkage between schemas and the Rust types they produce.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{Constraint, ValidationError};
use super::node::Schema;

/// A [`Schema`] whose successful parse yields a `T`.
///
/// Build these with [`string`], [`number`], [`boolean`], [`array`],
/// [`object`] and [`record`]. `min`/`max` are only offered where they
/// have a meaning: string and array length, number range.
pub struct Typed<T> {
    schema: Schema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("schema", &self.schema)
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> From<Typed<T>> for Schema {
    fn from(typed: Typed<T>) -> Self {
        typed.schema
    }
}

impl<T> Typed<T> {
    /// Link an arbitrary schema to `T`.
    ///
    /// Nothing checks that the schema can actually produce a `T`; a
    /// mismatch surfaces as a [`Constraint::Shape`] error from `parse`.
    pub fn from_schema(schema: Schema) -> Self {
        Self {
            schema,
            _marker: PhantomData,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn required(&self) -> Self {
        Self::from_schema(self.schema.required())
    }

    /// Validate without converting into `T`.
    pub fn parse_value(&self, input: Option<&Value>) -> Result<Value, ValidationError> {
        self.schema.parse(input)
    }
}

impl<T: DeserializeOwned> Typed<T> {
    /// Validate `input` and convert the accepted value into `T`.
    pub fn parse(&self, input: Option<&Value>) -> Result<T, ValidationError> {
        let validated = self.schema.parse(input)?;
        Self::convert(validated)
    }

    /// Convert an already validated value into `T`.
    pub fn convert(validated: Value) -> Result<T, ValidationError> {
        serde_json::from_value(validated).map_err(|e| {
            ValidationError::new(Constraint::Shape {
                reason: e.to_string(),
            })
        })
    }
}

impl Typed<String> {
    pub fn min(&self, len: usize) -> Self {
        Self::from_schema(self.schema.with_min(len as f64))
    }

    pub fn max(&self, len: usize) -> Self {
        Self::from_schema(self.schema.with_max(len as f64))
    }
}

impl Typed<f64> {
    pub fn min(&self, value: f64) -> Self {
        Self::from_schema(self.schema.with_min(value))
    }

    pub fn max(&self, value: f64) -> Self {
        Self::from_schema(self.schema.with_max(value))
    }
}

impl<T> Typed<Vec<T>> {
    pub fn min(&self, len: usize) -> Self {
        Self::from_schema(self.schema.with_min(len as f64))
    }

    pub fn max(&self, len: usize) -> Self {
        Self::from_schema(self.schema.with_max(len as f64))
    }
}

pub fn string() -> Typed<String> {
    Typed::from_schema(Schema::string())
}

pub fn number() -> Typed<f64> {
    Typed::from_schema(Schema::number())
}

pub fn boolean() -> Typed<bool> {
    Typed::from_schema(Schema::boolean())
}

pub fn array<T>(item: Typed<T>) -> Typed<Vec<T>> {
    Typed::from_schema(Schema::array(item.into()))
}

/// Object schema producing a caller-defined `Deserialize` type.
///
/// ```
/// use keystash_core::schema::{number, object, string};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// let user = object::<User, _, _>([
///     ("name", string().required().into()),
///     ("age", number().into()),
/// ]);
/// let parsed = user.parse(Some(&serde_json::json!({"name": "Jane", "age": 25}))).unwrap();
/// assert_eq!(parsed, User { name: "Jane".into(), age: 25 });
/// ```
pub fn object<T, I, K>(fields: I) -> Typed<T>
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Typed::from_schema(Schema::object(fields))
}

/// Object schema producing a plain JSON map.
pub fn record<I, K>(fields: I) -> Typed<Map<String, Value>>
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Typed::from_schema(Schema::object(fields))
}
