use super::Context;
use crate::output;
use colored::Colorize;

pub async fn handle(ctx: &Context) -> anyhow::Result<bool> {
    let manifest = ctx.load_manifest_or_default()?;
    let engine = ctx.engine(&manifest)?;
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    let before = state.resources.len();
    let diags = engine.refresh(&mut state).await;
    manager.save(&state).await?;
    lock.release().await?;

    let dropped = before - state.resources.len();
    println!(
        "{} {} resources refreshed",
        "✓".green(),
        state.resources.len()
    );
    if dropped > 0 {
        println!(
            "  {} removed outside of cloudform and dropped from state",
            dropped.to_string().yellow()
        );
    }
    Ok(!output::print_diagnostics(&diags))
}
