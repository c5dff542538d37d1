//! Record and trash stores
//!
//! The `Registry` owns the active record collection and the soft-deleted
//! trash collection, each persisted to its own backing file. A record is
//! always in exactly one of the two collections; `deleted_at` is set if
//! and only if it sits in the trash.
//!
//! All operations key by the record's stable `Uuid`. Every mutation
//! persists the affected file(s) synchronously before returning, as a
//! single atomic replace.

use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Record, ValidationError};
use crate::storage::{load_collection, save_collection, StorageError};

/// Errors surfaced by registry operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A field-level invariant was violated; nothing was persisted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The target record was not found in the collection the operation
    /// expects it in
    #[error("Record {id} not found")]
    NotFound { id: Uuid },

    /// A backing-file read or write failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for registry operations
pub type StoreResult<T> = Result<T, StoreError>;

/// The record store and trash store, coordinated
pub struct Registry {
    records: Vec<Record>,
    trash: Vec<Record>,
    records_path: PathBuf,
    trash_path: PathBuf,
}

impl Registry {
    /// Open the registry, loading both collections
    ///
    /// Missing or unparsable backing files load as empty collections.
    pub fn open(config: &Config) -> StoreResult<Self> {
        let records_path = config.records_path();
        let trash_path = config.trash_path();

        let records: Vec<Record> = load_collection(&records_path)?;
        let mut trash: Vec<Record> = load_collection(&trash_path)?;

        // A failure between the two writes of a move can leave a record
        // in both files; the active copy wins on reopen.
        trash.retain(|t| !records.iter().any(|r| r.id == t.id));

        debug!(
            records = records.len(),
            trash = trash.len(),
            "Opened registry"
        );

        Ok(Self {
            records,
            trash,
            records_path,
            trash_path,
        })
    }

    /// The active collection, in insertion order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The soft-deleted collection, in deletion order
    pub fn trash(&self) -> &[Record] {
        &self.trash
    }

    /// Look up an active record by id
    pub fn get(&self, id: Uuid) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Look up a trashed record by id
    pub fn get_trashed(&self, id: Uuid) -> Option<&Record> {
        self.trash.iter().find(|r| r.id == id)
    }

    /// Add a record to the active collection
    ///
    /// Validates field invariants, assigns an id if the caller left it
    /// nil, and persists. Duplicate tax ids are not rejected here; the
    /// caller is expected to consult the duplicate detector first.
    pub fn add(&mut self, mut record: Record) -> StoreResult<Uuid> {
        record.validate()?;
        if record.id.is_nil() {
            record.id = Uuid::new_v4();
        }
        record.deleted_at = None;

        let id = record.id;
        self.records.push(record);
        self.persist_records()?;
        Ok(id)
    }

    /// Replace an active record in place
    ///
    /// The stored id and creation time are kept; everything else comes
    /// from `record`. Returns `NotFound` when `id` is not active.
    pub fn update(&mut self, id: Uuid, mut record: Record) -> StoreResult<()> {
        record.validate()?;

        let existing = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;

        record.id = id;
        record.created_at = existing.created_at;
        record.deleted_at = None;
        record.updated_at = Utc::now();
        *existing = record;

        self.persist_records()
    }

    /// Move an active record to the trash
    ///
    /// Stamps `deleted_at` and persists both collections. The trash file
    /// is written first: if the records write then fails, the record sits
    /// in both persisted files, which reopen tolerates. A record in
    /// neither file would be unrecoverable, so a trash-write failure
    /// rolls the move back before returning.
    pub fn move_to_trash(&mut self, id: Uuid) -> StoreResult<()> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;

        let mut record = self.records.remove(pos);
        record.deleted_at = Some(Utc::now());
        self.trash.push(record);

        if let Err(e) = self.persist_trash() {
            if let Some(mut record) = self.trash.pop() {
                record.deleted_at = None;
                self.records.insert(pos, record);
            }
            return Err(e);
        }
        self.persist_records()
    }

    /// Restore a trashed record to the active collection
    ///
    /// Clears `deleted_at` and persists both collections, destination
    /// file first with the same rollback discipline as `move_to_trash`.
    pub fn restore(&mut self, id: Uuid) -> StoreResult<()> {
        let pos = self
            .trash
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;

        let mut record = self.trash.remove(pos);
        let deleted_at = record.deleted_at.take();
        self.records.push(record);

        if let Err(e) = self.persist_records() {
            if let Some(mut record) = self.records.pop() {
                record.deleted_at = deleted_at;
                self.trash.insert(pos, record);
            }
            return Err(e);
        }
        self.persist_trash()
    }

    /// Permanently remove a trashed record
    ///
    /// Returns the purged record so callers can describe it in the audit
    /// trail. A failed trash write rolls the removal back, so the record
    /// stays visible until it is durably gone.
    pub fn purge(&mut self, id: Uuid) -> StoreResult<Record> {
        let pos = self
            .trash
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;

        let record = self.trash.remove(pos);
        if let Err(e) = self.persist_trash() {
            self.trash.insert(pos, record);
            return Err(e);
        }
        Ok(record)
    }

    /// Find a trashed record by its `(name, director)` display projection
    ///
    /// Weaker than id lookup: callers holding only a table row can use
    /// this, but it returns the first match and is ambiguous when two
    /// trashed records share the pair. Known limitation, kept as-is.
    pub fn find_trashed(&self, name: &str, director: &str) -> Option<&Record> {
        self.trash
            .iter()
            .find(|r| r.name == name && r.director == director)
    }

    /// Replace the entire active collection (download reconciliation)
    ///
    /// Last-writer-wins: local-only records that were never uploaded are
    /// gone afterwards. The trash is untouched.
    pub fn replace_all(&mut self, mut records: Vec<Record>) -> StoreResult<()> {
        for record in &mut records {
            record.deleted_at = None;
        }
        self.records = records;
        self.persist_records()
    }

    fn persist_records(&self) -> StoreResult<()> {
        save_collection(&self.records_path, &self.records)?;
        Ok(())
    }

    fn persist_trash(&self) -> StoreResult<()> {
        save_collection(&self.trash_path, &self.trash)?;
        Ok(())
    }
}
