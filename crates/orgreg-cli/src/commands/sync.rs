//! Sync command handlers

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::Mutex;

use orgreg_core::{
    AuditLog, Config, HttpMirror, Registry, SyncDirection, SyncEngine, SyncRequest,
};

use crate::output::Output;
use crate::prompt::confirm;

/// Run an interactive sync in the given direction
///
/// On success the resolved mirror key is persisted to the config, so
/// later silent syncs go to the same resource without resolution.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    registry: Arc<Mutex<Registry>>,
    config: &mut Config,
    audit: &mut AuditLog,
    actor: &str,
    direction: SyncDirection,
    target: Option<String>,
    output: &Output,
) -> Result<()> {
    check_configured(config, &target)?;

    if direction == SyncDirection::Download && output.should_prompt() {
        println!("Pull replaces the local collection with the mirror contents.");
        println!("Records never uploaded will be lost (the trash is untouched).");
        if !confirm("Continue?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mirror = HttpMirror::new(config);
    let engine = SyncEngine::new(registry, mirror, config);
    let report = engine
        .sync_once(SyncRequest::interactive(direction, target))
        .await?;

    if config.mirror.as_deref() != Some(report.resolved_key.as_str()) {
        config.mirror = Some(report.resolved_key.clone());
        config.save().context("Failed to save mirror key to config")?;
    }

    let action = match direction {
        SyncDirection::Upload => "sync_push",
        SyncDirection::Download => "sync_pull",
    };
    audit.record(
        actor,
        action,
        format!("{} rows, mirror {}", report.rows, report.resolved_key),
    );

    match direction {
        SyncDirection::Upload => {
            output.success(&format!(
                "Uploaded {} record(s) to mirror {}",
                report.rows, report.resolved_key
            ));
        }
        SyncDirection::Download => {
            output.success(&format!(
                "Downloaded {} record(s) from mirror {}",
                report.rows, report.resolved_key
            ));
        }
    }

    Ok(())
}

/// Validate that sync can run before building an engine
fn check_configured(config: &Config, target: &Option<String>) -> Result<()> {
    if target.is_none() && config.mirror.is_none() {
        bail!(
            "No mirror configured. Pass a link, key or name, or set one:\n  \
             orgreg config set mirror <key>"
        );
    }
    Ok(())
}
