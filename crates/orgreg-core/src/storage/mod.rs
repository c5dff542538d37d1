//! Backing-file persistence
//!
//! All stores persist as full-file JSON replaces with atomic renames.

mod error;
mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{atomic_write, load_collection, save_collection};
