use super::Context;
use colored::Colorize;

pub async fn list(ctx: &Context) -> anyhow::Result<bool> {
    let state = ctx.state_manager().load().await?;
    if state.resources.is_empty() {
        println!("{}", "No resources in state".dimmed());
        return Ok(true);
    }
    for (key, record) in &state.resources {
        println!("{}  {}", key.cyan(), record.identity.dimmed());
    }
    Ok(true)
}

pub async fn show(ctx: &Context, key: &str) -> anyhow::Result<bool> {
    let state = ctx.state_manager().load().await?;
    let record = state
        .get_resource(key)
        .ok_or_else(|| anyhow::anyhow!("{} is not in state", key))?;

    println!("{} {}", key.cyan().bold(), format!("({})", record.identity).dimmed());
    println!("{}", serde_json::to_string_pretty(&record.attributes)?);
    Ok(true)
}

/// Forget a resource without touching the remote object
pub async fn rm(ctx: &Context, key: &str) -> anyhow::Result<bool> {
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    if state.remove_resource(key).is_none() {
        anyhow::bail!("{} is not in state", key);
    }
    manager.save(&state).await?;
    lock.release().await?;

    println!("{} Removed {} from state", "✓".green(), key.cyan());
    Ok(true)
}
