//! Orgreg Core Library
//!
//! This crate provides the core functionality for orgreg, a registry of
//! local organizations (neighborhoods, schools, preschools) with a
//! soft-delete trash, rotating backups, an append-only audit trail and
//! synchronization against a remote spreadsheet-style mirror.
//!
//! # Architecture
//!
//! - **JSON collections on disk**: the active collection and the trash
//!   are plain JSON files, written atomically on every mutation
//! - **Full-replace sync**: the remote mirror is a flat projection; both
//!   directions overwrite the destination wholesale
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut registry = Registry::open(&config)?;
//!
//! // Add a record
//! let mut record = Record::new("School", "School 5");
//! record.set_tax_id("301234567");
//! let id = registry.add(record)?;
//!
//! // Soft-delete it
//! registry.move_to_trash(id)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Record and trash collections (main entry point)
//! - `models`: Record and audit data structures
//! - `audit`: Append-only, capped audit log
//! - `backup`: Rotating snapshots of the record collection
//! - `categories`: Organization category registry
//! - `dedup`: Duplicate detection keyed by tax id
//! - `sync`: Remote mirror synchronization
//! - `storage`: Atomic JSON persistence
//! - `config`: Application configuration

pub mod audit;
pub mod backup;
pub mod categories;
pub mod config;
pub mod dedup;
pub mod models;
pub mod storage;
pub mod store;
pub mod sync;

pub use audit::AuditLog;
pub use backup::BackupRotator;
pub use categories::{CategoryError, CategoryRegistry};
pub use config::Config;
pub use dedup::{conflicting_tax_id, find_duplicates, DuplicateGroup};
pub use models::{AuditEntry, Record, ValidationError};
pub use storage::{StorageError, StorageResult};
pub use store::{Registry, StoreError};
pub use sync::{
    HttpMirror, Mirror, SyncDirection, SyncEngine, SyncError, SyncHandle, SyncMode, SyncPhase,
    SyncReport, SyncRequest,
};
