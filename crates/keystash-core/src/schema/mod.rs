//! Schema engine.
//!
//! Schemas are immutable validators over untyped JSON input. A schema
//! either accepts a value (returning the accepted shape, with defaults
//! filled in for absent optional values) or rejects it with a
//! [`ValidationError`] naming the violated [`Constraint`].
//!
//! - [`Schema`] / [`SchemaKind`]: untyped nodes and the parse dispatcher
//! - [`Typed`]: a schema linked to the Rust type its parse produces
//! - [`Schema::from_definition`]: schemas written as JSON documents

mod definition;
mod error;
mod node;
mod typed;

pub use error::{Constraint, PathSegment, ValidationError};
pub use node::{Schema, SchemaKind};
pub use typed::{array, boolean, number, object, record, string, Typed};
