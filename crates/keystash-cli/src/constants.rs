//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, also clap usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Nothing stored under the requested key.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments (bad JSON, bad schema definition).
    pub const INVALID_INPUT: i32 = 4;

    /// A value was rejected by its schema.
    pub const VALIDATION_FAILED: i32 = 5;
}

/// Default store file name inside the data directory.
pub const STORE_FILE_NAME: &str = "store.db";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
