use super::Context;
use crate::output;
use cloudform_core::Diagnostics;
use colored::Colorize;

/// Print the attributes of a remote object that is not managed here
pub async fn handle(ctx: &Context, resource_type: &str, id: &str) -> anyhow::Result<bool> {
    let manifest = ctx.load_manifest_or_default()?;
    let engine = ctx.engine(&manifest)?;

    let mut diags = Diagnostics::new();
    if let Some(record) = engine.lookup(resource_type, id, &mut diags).await {
        println!(
            "{} {}",
            resource_type.cyan().bold(),
            format!("({})", record.identity).dimmed()
        );
        println!("{}", serde_json::to_string_pretty(&record.attributes)?);
    }

    Ok(!output::print_diagnostics(&diags))
}
