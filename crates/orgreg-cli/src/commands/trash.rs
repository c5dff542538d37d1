//! Trash command handlers

use anyhow::{Context, Result};

use orgreg_core::{AuditLog, Registry};

use crate::commands::record::parse_id;
use crate::output::Output;
use crate::prompt::confirm;

/// List trashed records
pub fn list(registry: &Registry, output: &Output) -> Result<()> {
    output.print_records(registry.trash());
    Ok(())
}

/// Restore a trashed record to the active collection
pub fn restore(
    registry: &mut Registry,
    audit: &mut AuditLog,
    actor: &str,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_id(&id, registry.trash())?;
    let record = registry
        .get_trashed(uuid)
        .ok_or_else(|| anyhow::anyhow!("Record not found in trash: {}", id))?;

    let summary = format!("{} '{}'", record.kind, record.name);
    registry.restore(uuid).context("Failed to restore record")?;
    audit.record(actor, "restore", &summary);

    output.success(&format!("Restored: {}", uuid));
    if let Some(record) = registry.get(uuid) {
        output.print_record(record);
    }
    Ok(())
}

/// Permanently remove a trashed record
pub fn purge(
    registry: &mut Registry,
    audit: &mut AuditLog,
    actor: &str,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_id(&id, registry.trash())?;
    let record = registry
        .get_trashed(uuid)
        .ok_or_else(|| anyhow::anyhow!("Record not found in trash: {}", id))?;

    if output.should_prompt() {
        println!(
            "Permanently delete: {} - {}",
            &record.id.to_string()[..8],
            record.name
        );
        println!("This cannot be undone.");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let purged = registry.purge(uuid).context("Failed to purge record")?;
    audit.record(
        actor,
        "purge",
        format!("{} '{}'", purged.kind, purged.name),
    );

    output.success(&format!("Permanently deleted: {}", uuid));
    Ok(())
}
