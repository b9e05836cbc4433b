use super::Context;
use crate::output;
use cloudform_core::resource::resource_key;
use colored::Colorize;

pub async fn handle(
    ctx: &Context,
    resource_type: &str,
    name: &str,
    id: &str,
) -> anyhow::Result<bool> {
    let manifest = ctx.load_manifest_or_default()?;
    let engine = ctx.engine(&manifest)?;
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    let diags = engine.import(resource_type, name, id, &mut state).await;
    if !diags.has_error() {
        manager.save(&state).await?;
        println!(
            "{} Imported {} ({})",
            "✓".green(),
            resource_key(resource_type, name).cyan(),
            id
        );
    }
    lock.release().await?;

    Ok(!output::print_diagnostics(&diags))
}
