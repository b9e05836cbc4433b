use super::Context;
use crate::output;
use colored::Colorize;

pub async fn handle(ctx: &Context) -> anyhow::Result<bool> {
    let manifest = ctx.load_manifest()?;
    let engine = ctx.engine(&manifest)?;
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    println!("{}", "Refreshing state...".blue());
    let mut diags = engine.refresh(&mut state).await;
    let plan = engine.plan(&manifest.resources, &state, &mut diags);

    println!();
    output::print_plan(&plan);

    if plan.has_changes() {
        println!();
        println!("{}", "Applying...".blue());
        diags.append(engine.apply(&plan, &manifest.resources, &mut state).await);
    }

    manager.save(&state).await?;
    lock.release().await?;

    let failed = output::print_diagnostics(&diags);
    if failed {
        println!("{}", "✗ Apply finished with errors".red().bold());
    } else if plan.has_changes() {
        println!("{}", "✓ Apply complete".green().bold());
    }
    Ok(!failed)
}
