use colored::Colorize;
use cloudform_core::{ActionType, Diagnostics, Plan, Severity};

/// Print the actions of a plan, skipping resources that are up to date
pub fn print_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!("{}", "No changes. Infrastructure matches the manifest.".green());
        return;
    }

    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Replace => "-/+".magenta(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => continue,
        };
        println!("  {} {}", marker.bold(), action.describe());
    }
    println!();
    println!("{} {}", "Plan:".bold(), plan.summary());
}

/// Print diagnostics to stderr; returns whether any of them is an error
pub fn print_diagnostics(diags: &Diagnostics) -> bool {
    for diagnostic in diags.iter() {
        let label = match diagnostic.severity {
            Severity::Error => "Error:".red().bold(),
            Severity::Warning => "Warning:".yellow().bold(),
        };
        eprintln!("{} {}", label, diagnostic.summary);
        if let Some(attribute) = &diagnostic.attribute {
            eprintln!("  attribute: {}", attribute.cyan());
        }
        if !diagnostic.detail.is_empty() {
            eprintln!("  {}", diagnostic.detail);
        }
    }
    diags.has_error()
}
