//! Append-only audit trail
//!
//! Bounded history of mutating operations, newest first, capped at 1000
//! entries. The log only guarantees durability of what callers hand it;
//! actor, action and details are supplied at each call site.
//!
//! Recording must never block the mutation it accompanies: persistence
//! failures are logged and swallowed.

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::warn;

use crate::config::Config;
use crate::models::AuditEntry;
use crate::storage::{load_collection, save_collection};

/// Maximum number of retained entries; oldest are evicted beyond this
pub const AUDIT_CAP: usize = 1000;

/// The persisted audit log
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    path: PathBuf,
}

impl AuditLog {
    /// Open the audit log, loading existing entries
    ///
    /// A missing or unreadable file starts the log empty.
    pub fn open(config: &Config) -> Self {
        let path = config.audit_path();
        let entries = match load_collection::<AuditEntry>(&path) {
            Ok(items) => items.into(),
            Err(e) => {
                warn!("Failed to load audit log: {}", e);
                VecDeque::new()
            }
        };
        Self { entries, path }
    }

    /// Record a mutating operation
    ///
    /// Inserts at the front, evicts the oldest entry beyond the cap, and
    /// persists the full sequence. Never raises: a failed write is logged
    /// and ignored.
    pub fn record(
        &mut self,
        actor: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
    ) {
        self.entries
            .push_front(AuditEntry::now(actor, action, details));
        while self.entries.len() > AUDIT_CAP {
            self.entries.pop_back();
        }

        let items: Vec<&AuditEntry> = self.entries.iter().collect();
        if let Err(e) = save_collection(&self.path, &items) {
            warn!("Failed to persist audit log: {}", e);
        }
    }

    /// All retained entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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

    #[test]
    fn test_record_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut log = AuditLog::open(&test_config(&temp_dir));

        log.record("admin", "add", "first");
        log.record("admin", "add", "second");

        let details: Vec<_> = log.entries().map(|e| e.details.as_str()).collect();
        assert_eq!(details, vec!["second", "first"]);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let temp_dir = TempDir::new().unwrap();
        let mut log = AuditLog::open(&test_config(&temp_dir));

        for i in 0..1005 {
            log.record("admin", "add", format!("entry-{}", i));
        }

        assert_eq!(log.len(), 1000);
        // The 1000 most recent, newest first
        assert_eq!(log.entries().next().unwrap().details, "entry-1004");
        assert_eq!(log.entries().last().unwrap().details, "entry-5");
    }

    #[test]
    fn test_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let mut log = AuditLog::open(&config);
            log.record("admin", "delete", "School 5");
        }

        let log = AuditLog::open(&config);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries().next().unwrap().action, "delete");
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        // Point the audit file at a directory so every save fails
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        std::fs::create_dir_all(config.audit_path()).unwrap();

        let mut log = AuditLog::open(&config);
        log.record("admin", "add", "still works");
        assert_eq!(log.len(), 1);
    }
}
