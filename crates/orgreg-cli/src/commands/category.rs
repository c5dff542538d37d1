//! Category command handlers

use anyhow::{Context, Result};

use orgreg_core::{AuditLog, CategoryRegistry};

use crate::output::{Output, OutputFormat};

/// List categories
pub fn list(categories: &CategoryRegistry, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(categories.list()).unwrap()
            );
        }
        _ => {
            for category in categories.list() {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

/// Add a user category
pub fn add(
    categories: &mut CategoryRegistry,
    audit: &mut AuditLog,
    actor: &str,
    name: String,
    output: &Output,
) -> Result<()> {
    categories
        .add(&name)
        .with_context(|| format!("Failed to add category '{}'", name))?;
    audit.record(actor, "category_add", &name);

    output.success(&format!("Added category: {}", name));
    Ok(())
}

/// Remove a user category
pub fn remove(
    categories: &mut CategoryRegistry,
    audit: &mut AuditLog,
    actor: &str,
    name: String,
    output: &Output,
) -> Result<()> {
    categories
        .remove(&name)
        .with_context(|| format!("Failed to remove category '{}'", name))?;
    audit.record(actor, "category_remove", &name);

    output.success(&format!("Removed category: {}", name));
    Ok(())
}
