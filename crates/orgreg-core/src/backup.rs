//! Rotating backups of the records file
//!
//! Each snapshot copies the current persisted records file into the
//! backup directory under a timestamped name, then prunes the directory
//! to the newest `keep` files by filename sort (the name sorts by
//! timestamp). Backup failure must never block shutdown or normal
//! operation, so every error here is logged and swallowed.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

use crate::config::Config;

/// File name prefix for backup snapshots
const BACKUP_PREFIX: &str = "records-";

/// Snapshots the records file into a capped backup directory
pub struct BackupRotator {
    source: PathBuf,
    dir: PathBuf,
    keep: usize,
}

impl BackupRotator {
    /// Create a rotator for the configured records file and backup dir
    pub fn new(config: &Config) -> Self {
        Self {
            source: config.records_path(),
            dir: config.backup_dir(),
            keep: config.backup_keep,
        }
    }

    /// Take a snapshot and prune old ones
    ///
    /// Failures are logged and swallowed.
    pub fn snapshot(&self) {
        if let Err(e) = self.try_snapshot() {
            warn!("Backup snapshot failed: {:#}", e);
        }
        if let Err(e) = self.prune() {
            warn!("Backup prune failed: {:#}", e);
        }
    }

    fn try_snapshot(&self) -> Result<()> {
        if !self.source.exists() {
            // Nothing persisted yet, nothing to back up
            return Ok(());
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create backup dir {:?}", self.dir))?;

        // Nanosecond-resolution, fixed-width timestamp so names sort by age
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.9f");
        let target = self.dir.join(format!("{}{}.json", BACKUP_PREFIX, stamp));

        fs::copy(&self.source, &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", self.source, target))?;
        debug!("Backup written to {:?}", target);
        Ok(())
    }

    fn prune(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }

        let mut names: Vec<String> = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list backup dir {:?}", self.dir))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(BACKUP_PREFIX))
            .collect();

        names.sort();

        while names.len() > self.keep {
            let oldest = names.remove(0);
            let path = self.dir.join(&oldest);
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete old backup {:?}", path))?;
            debug!("Pruned old backup {:?}", path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn backup_names(rotator: &BackupRotator) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&rotator.dir)
            .map(|iter| {
                iter.filter_map(|e| e.ok())
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_snapshot_copies_records_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::write(config.records_path(), "[]").unwrap();

        let rotator = BackupRotator::new(&config);
        rotator.snapshot();

        let names = backup_names(&rotator);
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("records-"));

        let content = fs::read_to_string(rotator.dir.join(&names[0])).unwrap();
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_rotation_keeps_ten_newest() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::write(config.records_path(), "[]").unwrap();

        let rotator = BackupRotator::new(&config);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..12 {
            rotator.snapshot();
            seen.extend(backup_names(&rotator));
            // Avoid same-instant timestamps
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let survivors = backup_names(&rotator);
        assert_eq!(survivors.len(), 10);

        // The survivors are the 10 most recently created
        let expected: Vec<String> = seen.iter().rev().take(10).rev().cloned().collect();
        assert_eq!(survivors, expected);
    }

    #[test]
    fn test_missing_source_is_quietly_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let rotator = BackupRotator::new(&config);
        rotator.snapshot();

        assert!(!rotator.dir.exists() || backup_names(&rotator).is_empty());
    }

    #[test]
    fn test_copy_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::write(config.records_path(), "[]").unwrap();
        // Make the backup "dir" a file so create_dir_all fails
        fs::write(config.backup_dir(), "not a dir").unwrap();

        let rotator = BackupRotator::new(&config);
        rotator.snapshot();
    }
}
