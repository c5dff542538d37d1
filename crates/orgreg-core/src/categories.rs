//! Category registry
//!
//! Small mutable list of record-type labels used for classification.
//! Three entries are core and can never be removed through the normal
//! flow; user-added ones come and go. The list persists with the same
//! full-replace discipline as every other backing file.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::Config;
use crate::storage::{load_collection, save_collection, StorageError};

/// The three core categories, always present and never removable
pub const CORE_CATEGORIES: [&str; 3] = ["Neighborhood", "School", "Preschool"];

/// Legacy type labels still accepted on input, mapped to current values
const LEGACY_SYNONYMS: [(&str, &str); 3] = [
    ("Mahalla", "Neighborhood"),
    ("Kindergarten", "Preschool"),
    ("Gymnasium", "School"),
];

/// Errors surfaced by category operations
#[derive(Error, Debug)]
pub enum CategoryError {
    /// Core categories cannot be removed
    #[error("Category '{0}' is a core category and cannot be removed")]
    CoreCategory(String),

    /// The category was not found
    #[error("Category '{0}' not found")]
    NotFound(String),

    /// The category already exists
    #[error("Category '{0}' already exists")]
    AlreadyExists(String),

    /// A backing-file write failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The persisted category list
pub struct CategoryRegistry {
    categories: Vec<String>,
    path: PathBuf,
}

impl CategoryRegistry {
    /// Open the registry, seeding the core categories on first run
    pub fn open(config: &Config) -> Result<Self, CategoryError> {
        let path = config.categories_path();
        let mut categories: Vec<String> = load_collection(&path)?;

        // Core entries are always present, in front
        for (i, core) in CORE_CATEGORIES.iter().enumerate() {
            if !categories.iter().any(|c| c == core) {
                categories.insert(i.min(categories.len()), core.to_string());
            }
        }

        Ok(Self { categories, path })
    }

    /// The current category values, core entries first
    pub fn list(&self) -> &[String] {
        &self.categories
    }

    /// Add a user category
    pub fn add(&mut self, name: &str) -> Result<(), CategoryError> {
        let name = name.trim();
        if self.categories.iter().any(|c| c == name) {
            return Err(CategoryError::AlreadyExists(name.to_string()));
        }
        self.categories.push(name.to_string());
        self.persist()
    }

    /// Remove a user category; core entries refuse removal
    pub fn remove(&mut self, name: &str) -> Result<(), CategoryError> {
        if CORE_CATEGORIES.contains(&name) {
            return Err(CategoryError::CoreCategory(name.to_string()));
        }
        let pos = self
            .categories
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CategoryError::NotFound(name.to_string()))?;
        self.categories.remove(pos);
        self.persist()
    }

    /// Map a type label to its canonical category value
    ///
    /// Current values pass through; legacy synonyms are translated.
    /// Unknown labels are returned unchanged for the caller to reject.
    pub fn canonical<'a>(&self, kind: &'a str) -> &'a str {
        for (legacy, current) in LEGACY_SYNONYMS {
            if kind == legacy {
                return current;
            }
        }
        kind
    }

    /// Whether a type label is acceptable (current value or legacy synonym)
    pub fn is_known(&self, kind: &str) -> bool {
        let canonical = self.canonical(kind);
        self.categories.iter().any(|c| c == canonical)
    }

    fn persist(&self) -> Result<(), CategoryError> {
        save_collection(&self.path, &self.categories)?;
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

    #[test]
    fn test_core_categories_seeded() {
        let temp_dir = TempDir::new().unwrap();
        let registry = CategoryRegistry::open(&test_config(&temp_dir)).unwrap();

        assert_eq!(
            registry.list(),
            &["Neighborhood", "School", "Preschool"]
        );
    }

    #[test]
    fn test_add_and_remove_user_category() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let mut registry = CategoryRegistry::open(&config).unwrap();
            registry.add("Clinic").unwrap();
            assert!(registry.is_known("Clinic"));
        }

        // Persisted
        let mut registry = CategoryRegistry::open(&config).unwrap();
        assert!(registry.is_known("Clinic"));

        registry.remove("Clinic").unwrap();
        assert!(!registry.is_known("Clinic"));
    }

    #[test]
    fn test_core_category_not_removable() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = CategoryRegistry::open(&test_config(&temp_dir)).unwrap();

        let err = registry.remove("School").unwrap_err();
        assert!(matches!(err, CategoryError::CoreCategory(_)));
        assert!(registry.is_known("School"));
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = CategoryRegistry::open(&test_config(&temp_dir)).unwrap();

        registry.add("Clinic").unwrap();
        let err = registry.add("Clinic").unwrap_err();
        assert!(matches!(err, CategoryError::AlreadyExists(_)));
    }

    #[test]
    fn test_remove_missing() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = CategoryRegistry::open(&test_config(&temp_dir)).unwrap();

        let err = registry.remove("Nonexistent").unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(_)));
    }

    #[test]
    fn test_legacy_synonyms() {
        let temp_dir = TempDir::new().unwrap();
        let registry = CategoryRegistry::open(&test_config(&temp_dir)).unwrap();

        assert_eq!(registry.canonical("Kindergarten"), "Preschool");
        assert_eq!(registry.canonical("Mahalla"), "Neighborhood");
        assert_eq!(registry.canonical("School"), "School");
        assert!(registry.is_known("Kindergarten"));
        assert!(!registry.is_known("Warehouse"));
    }
}
