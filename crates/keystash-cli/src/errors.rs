//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Nothing stored under the key
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput {
        message: String,
        hint: Option<String>,
    },

    /// Value rejected by its schema
    ValidationFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, .. } => write!(f, "{}", message),
            CliError::InvalidInput { message, .. } => write!(f, "{}", message),
            CliError::ValidationFailed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an InvalidInput error with a hint.
    pub fn invalid_input_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        CliError::ValidationFailed(message.into())
    }

    /// Hint to print under the error line, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            CliError::NotFound { hint, .. } => Some(hint),
            CliError::InvalidInput { hint, .. } => hint.as_deref(),
            CliError::ValidationFailed(_) => None,
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput { .. } => exit_codes::INVALID_INPUT,
            CliError::ValidationFailed(_) => exit_codes::VALIDATION_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::not_found("missing", "hint").exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            CliError::invalid_input("bad").exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            CliError::validation_failed("rejected").exit_code(),
            exit_codes::VALIDATION_FAILED
        );
    }

    #[test]
    fn test_hints() {
        assert_eq!(CliError::not_found("m", "try this").hint(), Some("try this"));
        assert_eq!(CliError::invalid_input("m").hint(), None);
        assert_eq!(
            CliError::invalid_input_with_hint("m", "h").hint(),
            Some("h")
        );
        assert_eq!(CliError::validation_failed("m").to_string(), "m");
    }
}
