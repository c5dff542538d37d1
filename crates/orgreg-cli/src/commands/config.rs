//! Config command handlers

use anyhow::{bail, Context, Result};

use orgreg_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "mirror": config.mirror,
                    "mirror_base_url": config.mirror_base_url,
                    "credential_file": config.credential_file,
                    "sync_enabled": config.sync_enabled,
                    "backup_keep": config.backup_keep,
                    "access_code_set": config.access_code.is_some()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:        {}", config.data_dir.display());
            println!(
                "  mirror:          {}",
                config.mirror.as_deref().unwrap_or("(not set)")
            );
            println!("  mirror_base_url: {}", config.mirror_base_url);
            println!("  credential_file: {}", config.credential_file.display());
            println!("  sync_enabled:    {}", config.sync_enabled);
            println!("  backup_keep:     {}", config.backup_keep);
            println!(
                "  access_code:     {}",
                if config.access_code.is_some() {
                    "(set)"
                } else {
                    "(not set)"
                }
            );
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "mirror" => {
            config.mirror = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone())
            };
        }
        "mirror_base_url" => {
            config.mirror_base_url = value.clone();
        }
        "credential_file" => {
            config.credential_file = value.clone().into();
        }
        "sync_enabled" => {
            config.sync_enabled = value
                .parse()
                .context("Invalid value for sync_enabled. Use 'true' or 'false'.")?;
        }
        "backup_keep" => {
            config.backup_keep = value
                .parse()
                .context("Invalid value for backup_keep. Use a number.")?;
        }
        "access_code" => {
            config.access_code = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, mirror, mirror_base_url, credential_file, \
                 sync_enabled, backup_keep, access_code",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    if key == "access_code" {
        output.success(&format!("Set {}", key));
    } else {
        output.success(&format!("Set {} = {}", key, value));
    }

    Ok(())
}
