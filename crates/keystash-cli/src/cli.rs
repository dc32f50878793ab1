use clap::{Args, Parser, Subcommand};

use keystash_core::VERSION;

/// Keystash - typed, validated key/value storage from the command line
#[derive(Parser)]
#[command(name = "keystash")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store database
    #[arg(short, long, global = true, env = "KEYSTASH_STORE")]
    pub store: Option<String>,

    /// Path to the config file
    #[arg(long, global = true, env = "KEYSTASH_CONFIG")]
    pub config: Option<String>,

    /// Log pipeline diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a value and print it as JSON
    Get(GetArgs),

    /// Validate and store a value
    Set(SetArgs),

    /// Remove a stored value
    Delete(DeleteArgs),

    /// Remove every stored value
    Clear(ClearArgs),

    /// Obfuscate text with the configured phrase
    Encode(CodecArgs),

    /// Recover text obfuscated with the configured phrase
    Decode(CodecArgs),

    /// Print the resolved config file path
    ConfigPath,
}

/// Arguments for the `get` command
#[derive(Args)]
pub struct GetArgs {
    /// Logical key to read
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Schema definition: a JSON document or a path to one
    #[arg(long, value_name = "FILE|JSON")]
    pub schema: String,

    /// Value to print when nothing is stored (JSON)
    #[arg(long, value_name = "JSON")]
    pub default: Option<String>,
}

/// Arguments for the `set` command
#[derive(Args)]
pub struct SetArgs {
    /// Logical key to write
    #[arg(value_name = "KEY")]
    pub key: String,

    /// New value (JSON; anything else is taken as a plain string)
    #[arg(value_name = "JSON")]
    pub value: String,

    /// Schema definition: a JSON document or a path to one
    #[arg(long, value_name = "FILE|JSON")]
    pub schema: String,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Logical key to remove
    #[arg(value_name = "KEY")]
    pub key: String,
}

/// Arguments for the `clear` command
#[derive(Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `encode` and `decode` commands
#[derive(Args)]
pub struct CodecArgs {
    #[arg(value_name = "TEXT")]
    pub text: String,
}
