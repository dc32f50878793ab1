pub mod codec;
pub mod maintenance;
pub mod values;

use crate::app::AppContext;

pub fn handle_config_path(ctx: &AppContext) -> anyhow::Result<()> {
    println!("{}", ctx.config_path().display());
    Ok(())
}
