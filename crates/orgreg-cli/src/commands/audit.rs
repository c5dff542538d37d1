//! Audit command handler

use anyhow::Result;

use orgreg_core::AuditLog;

use crate::output::Output;

/// Show the most recent audit entries, newest first
pub fn show(audit: &AuditLog, limit: usize, output: &Output) -> Result<()> {
    let entries: Vec<_> = audit.entries().take(limit).collect();
    output.print_audit(&entries);
    Ok(())
}
