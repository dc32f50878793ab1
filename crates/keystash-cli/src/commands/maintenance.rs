use std::io::IsTerminal;

use keystash_core::ByteStore;

use crate::app::AppContext;
use crate::cli::ClearArgs;
use crate::errors::CliError;

pub fn handle_clear(ctx: &AppContext, args: &ClearArgs) -> anyhow::Result<()> {
    let path = ctx.store_path()?;

    if !args.yes {
        if !std::io::stdin().is_terminal() {
            return Err(CliError::invalid_input_with_hint(
                "Refusing to clear the store without confirmation",
                "Pass --yes to clear non-interactively.",
            )
            .into());
        }
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove every value in {}?", path.display()))
            .default(false)
            .interact()?;
        if !proceed {
            if !ctx.quiet() {
                println!("Cancelled");
            }
            return Ok(());
        }
    }

    let store = ctx.open_store()?;
    store.clear()?;
    tracing::debug!(path = %path.display(), "cleared store");
    if !ctx.quiet() {
        println!("Cleared {}", path.display());
    }
    Ok(())
}
