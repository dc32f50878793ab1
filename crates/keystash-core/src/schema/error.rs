//! Validation failures reported by the schema engine.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Longest rendering of an offending value kept in an error.
const MAX_ACTUAL_CHARS: usize = 64;

/// The constraint a value violated.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Value was absent but the schema is required
    Required { kind: &'static str },

    /// Value has the wrong JSON type
    Type { expected: &'static str },

    /// String or array is shorter than allowed
    MinLength { kind: &'static str, min: usize },

    /// String or array is longer than allowed
    MaxLength { kind: &'static str, max: usize },

    /// Number is below the lower bound
    MinValue { min: f64 },

    /// Number is above the upper bound
    MaxValue { max: f64 },

    /// Validated value could not be converted into the caller's type
    Shape { reason: String },
}

impl Constraint {
    /// Short machine-readable name of the constraint.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Required { .. } => "required",
            Constraint::Type { .. } => "type",
            Constraint::MinLength { .. } => "min_length",
            Constraint::MaxLength { .. } => "max_length",
            Constraint::MinValue { .. } => "min_value",
            Constraint::MaxValue { .. } => "max_value",
            Constraint::Shape { .. } => "shape",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Required { kind } => write!(f, "Required {} missing", kind),
            Constraint::Type { expected } => {
                let article = if expected.starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                write!(f, "Not {} {}", article, expected)
            }
            Constraint::MinLength { kind, min } => {
                write!(f, "{} is shorter than min length {}", capitalize(kind), min)
            }
            Constraint::MaxLength { kind, max } => {
                write!(f, "{} is longer than max length {}", capitalize(kind), max)
            }
            Constraint::MinValue { min } => write!(f, "Number is less than min {}", min),
            Constraint::MaxValue { max } => write!(f, "Number is greater than max {}", max),
            Constraint::Shape { reason } => {
                write!(f, "Value does not fit the target type: {}", reason)
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A schema violation, located inside the input.
///
/// Displays as `path: message`, or the bare message at the root.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", self.render())]
pub struct ValidationError {
    /// Location of the failing value, outermost first
    pub path: Vec<PathSegment>,

    /// The violated constraint
    pub constraint: Constraint,

    /// Rendering of the offending value, if one was present
    pub actual: Option<String>,
}

impl ValidationError {
    /// Create an error at the root of the input.
    pub fn new(constraint: Constraint) -> Self {
        Self {
            path: Vec::new(),
            constraint,
            actual: None,
        }
    }

    /// Record the offending value (truncated for display).
    pub fn with_actual(mut self, value: &Value) -> Self {
        let rendered = value.to_string();
        let actual = if rendered.chars().count() > MAX_ACTUAL_CHARS {
            let mut cut: String = rendered.chars().take(MAX_ACTUAL_CHARS).collect();
            cut.push_str("...");
            cut
        } else {
            rendered
        };
        self.actual = Some(actual);
        self
    }

    /// Prefix the path with an object field.
    pub fn in_field(mut self, name: &str) -> Self {
        self.path.insert(0, PathSegment::Field(name.to_string()));
        self
    }

    /// Prefix the path with an array index.
    pub fn at_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }

    /// Render the path as `user.tags[1]`; empty at the root.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(index) => {
                    out.push_str(&format!("[{}]", index));
                }
            }
        }
        out
    }

    fn render(&self) -> String {
        if self.path.is_empty() {
            self.constraint.to_string()
        } else {
            format!("{}: {}", self.path_string(), self.constraint)
        }
    }
}
