use keystash_core::{Typed, Update};
use serde_json::Value;

use crate::app::{load_schema, parse_value_arg, take_errors, AppContext};
use crate::cli::{DeleteArgs, GetArgs, SetArgs};
use crate::errors::CliError;
use crate::ui::print_warning;

pub fn handle_get(ctx: &AppContext, args: &GetArgs) -> anyhow::Result<()> {
    let schema: Typed<Value> = Typed::from_schema(load_schema(&args.schema)?);
    let controller = ctx.controller()?;
    let (config, errors) = ctx.sync_config();

    let stored = controller.store().get(&config.storage_key(&args.key))?;
    let initial = match (&stored, &args.default) {
        (_, Some(raw)) => serde_json::from_str::<Value>(raw).map_err(|e| {
            CliError::invalid_input(format!("--default is not valid JSON: {}", e))
        })?,
        (Some(_), None) => schema.schema().default_value(),
        (None, None) => {
            return Err(CliError::not_found(
                format!("Nothing stored under '{}'", args.key),
                "Store a value with `keystash set`, or pass --default.",
            )
            .into());
        }
    };

    let value = controller
        .load(&args.key, &schema, initial, &config)
        .map_err(|e| CliError::validation_failed(e.to_string()))?;
    for message in take_errors(&errors) {
        print_warning(&format!("stored value rejected, showing fallback: {}", message));
    }

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn handle_set(ctx: &AppContext, args: &SetArgs) -> anyhow::Result<()> {
    let schema: Typed<Value> = Typed::from_schema(load_schema(&args.schema)?);
    let controller = ctx.controller()?;
    let (config, errors) = ctx.sync_config();

    let current = controller.load(
        &args.key,
        &schema,
        schema.schema().default_value(),
        &config.clone().restore_on_error(true),
    )?;
    // A stale or foreign record is about to be replaced; its load error is not news.
    take_errors(&errors);

    let candidate = parse_value_arg(&args.value, schema.schema());
    match controller.update(&args.key, &schema, &config, &current, Update::Value(candidate)) {
        Some(value) => {
            if !ctx.quiet() {
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            Ok(())
        }
        None => {
            let message = take_errors(&errors)
                .into_iter()
                .next()
                .unwrap_or_else(|| "Value was rejected".to_string());
            Err(CliError::validation_failed(message).into())
        }
    }
}

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let controller = ctx.controller()?;
    let (config, _errors) = ctx.sync_config();
    controller.remove(&args.key, &config)?;
    if !ctx.quiet() {
        println!("Deleted '{}'", args.key);
    }
    Ok(())
}
