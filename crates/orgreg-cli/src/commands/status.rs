//! Status command handler

use anyhow::Result;

use orgreg_core::{AuditLog, Config, Registry};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(config: &Config, registry: &Registry, audit: &AuditLog, output: &Output) -> Result<()> {
    let backups = count_backups(config);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "sync_enabled": config.sync_enabled,
                    "mirror": config.mirror,
                    "counts": {
                        "records": registry.records().len(),
                        "trash": registry.trash().len(),
                        "audit": audit.len(),
                        "backups": backups
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", registry.records().len());
        }
        OutputFormat::Human => {
            println!("Orgreg Status");
            println!("=============");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Backups:  {}", backups);
            println!();
            println!("Sync:");
            println!(
                "  Status: {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref mirror) = config.mirror {
                println!("  Mirror: {}", mirror);
            }
            println!();
            println!("Contents:");
            println!("  Records: {}", registry.records().len());
            println!("  Trash:   {}", registry.trash().len());
            println!("  Audit:   {} entr(ies)", audit.len());
        }
    }

    Ok(())
}

fn count_backups(config: &Config) -> usize {
    std::fs::read_dir(config.backup_dir())
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0)
}
