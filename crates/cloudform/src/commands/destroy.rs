use super::Context;
use crate::output;
use cloudform_core::ResourceSet;
use colored::Colorize;

/// Delete every resource in state. Blocked deletions stay in state.
pub async fn handle(ctx: &Context) -> anyhow::Result<bool> {
    let manifest = ctx.load_manifest_or_default()?;
    let engine = ctx.engine(&manifest)?;
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    let plan = engine.destroy_plan(&state);
    output::print_plan(&plan);
    if !plan.has_changes() {
        lock.release().await?;
        return Ok(true);
    }

    println!();
    println!("{}", "Destroying...".red());
    let diags = engine.apply(&plan, &ResourceSet::new(), &mut state).await;
    manager.save(&state).await?;
    lock.release().await?;

    let failed = output::print_diagnostics(&diags);
    if state.resources.is_empty() {
        println!("{}", "✓ All resources destroyed".green().bold());
    } else {
        println!(
            "{} resources remain in state",
            state.resources.len().to_string().yellow()
        );
    }
    Ok(!failed)
}
