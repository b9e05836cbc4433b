use super::Context;
use crate::output;
use cloudform_core::Diagnostics;
use colored::Colorize;

/// Show what `apply` would do. State is refreshed in memory only.
pub async fn handle(ctx: &Context) -> anyhow::Result<bool> {
    let manifest = ctx.load_manifest()?;
    let engine = ctx.engine(&manifest)?;
    let mut state = ctx.state_manager().load().await?;

    println!("{}", "Refreshing state...".blue());
    let mut diags = engine.refresh(&mut state).await;
    let plan = engine.plan(&manifest.resources, &state, &mut diags);

    println!();
    output::print_plan(&plan);
    Ok(!report(&diags))
}

fn report(diags: &Diagnostics) -> bool {
    if diags.is_empty() {
        return false;
    }
    println!();
    output::print_diagnostics(diags)
}
