//! Keystash CLI - typed, validated key/value storage from the command line
//!
//! This is the command-line interface for Keystash. It drives the core
//! sync controller against a SQLite-backed store.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod logging;
mod ui;

use clap::Parser;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{codec, maintenance, values};
use crate::errors::CliError;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging_with_config(LogConfig::for_verbosity(cli.verbose)) {
        print_error(&e.to_string(), None);
    }

    if let Err(e) = run(&cli) {
        match e.downcast_ref::<CliError>() {
            Some(cli_err) => {
                print_error(&cli_err.to_string(), cli_err.hint());
                std::process::exit(cli_err.exit_code());
            }
            None => {
                print_error(&format!("{:#}", e), None);
                std::process::exit(1);
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli)?;

    match &cli.command {
        Commands::Get(args) => values::handle_get(&ctx, args)?,
        Commands::Set(args) => values::handle_set(&ctx, args)?,
        Commands::Delete(args) => values::handle_delete(&ctx, args)?,
        Commands::Clear(args) => maintenance::handle_clear(&ctx, args)?,
        Commands::Encode(args) => codec::handle_encode(&ctx, args)?,
        Commands::Decode(args) => codec::handle_decode(&ctx, args)?,
        Commands::ConfigPath => commands::handle_config_path(&ctx)?,
    }

    Ok(())
}
