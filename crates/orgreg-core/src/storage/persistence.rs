//! JSON collection persistence
//!
//! Every backing file (records, trash, audit log, categories) is a single
//! UTF-8 JSON array, fully rewritten on every save. Writes are atomic
//! (write to temp file, fsync, then rename) so a concurrent reader never
//! observes a partial file.
//!
//! Loads are tolerant: a missing file is an empty collection, and a file
//! that fails to parse is treated as empty rather than fatal (the parse
//! failure is logged).

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::error::{StorageError, StorageResult};

/// Load a collection from a JSON file
///
/// Missing file or unparsable content both yield an empty collection;
/// only the latter is logged.
pub fn load_collection<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| StorageError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

    match serde_json::from_str(&content) {
        Ok(items) => Ok(items),
        Err(e) => {
            warn!("Failed to parse {:?}, treating as empty: {}", path, e);
            Ok(Vec::new())
        }
    }
}

/// Save a collection to a JSON file as a single atomic replace
pub fn save_collection<T: Serialize>(path: &Path, items: &[T]) -> StorageResult<()> {
    let json = serde_json::to_vec_pretty(items).map_err(|e| StorageError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    atomic_write(path, &json)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    // Temp file in the same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
        from: temp_path,
        to: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        let records: Vec<Record> = load_collection(&path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(&path, "{not valid json").unwrap();

        let records: Vec<Record> = load_collection(&path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        let mut record = Record::new("School", "School 5");
        record.set_tax_id("12345");
        save_collection(&path, std::slice::from_ref(&record)).unwrap();

        let loaded: Vec<Record> = load_collection(&path).unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[test]
    fn test_save_overwrites_fully() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        let a = Record::new("School", "A");
        let b = Record::new("School", "B");
        save_collection(&path, &[a, b]).unwrap();

        let only = Record::new("School", "C");
        save_collection(&path, std::slice::from_ref(&only)).unwrap();

        let loaded: Vec<Record> = load_collection(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "C");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("file.json");

        atomic_write(&nested_path, b"[]").unwrap();

        assert!(nested_path.exists());
        let content = fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");

        atomic_write(&path, b"[]").unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}
