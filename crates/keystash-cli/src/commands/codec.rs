use keystash_core::obfuscation;

use crate::app::AppContext;
use crate::cli::CodecArgs;
use crate::errors::CliError;

pub fn handle_encode(ctx: &AppContext, args: &CodecArgs) -> anyhow::Result<()> {
    println!("{}", obfuscation::encode(&ctx.phrase(), &args.text));
    Ok(())
}

pub fn handle_decode(ctx: &AppContext, args: &CodecArgs) -> anyhow::Result<()> {
    let text = obfuscation::try_decode(&ctx.phrase(), &args.text).map_err(|e| {
        CliError::invalid_input_with_hint(
            format!("Cannot decode input: {}", e),
            "Check that KEYSTASH_PHRASE or [sync.encrypt] phrase matches the one used to encode.",
        )
    })?;
    println!("{}", text);
    Ok(())
}
