//! Synchronization against a remote spreadsheet-style mirror
//!
//! The mirror holds a flat projection of the active collection. Both
//! directions are full replacements: uploads overwrite every remote row,
//! downloads rebuild the local collection from the remote rows. Trash,
//! audit history and backups never cross the wire.

pub mod client;
pub mod engine;
pub mod error;
pub mod target;

pub use client::{HttpMirror, Mirror, MirrorHandle};
pub use engine::{
    SyncDirection, SyncEngine, SyncHandle, SyncMode, SyncPhase, SyncReport, SyncRequest,
    MIRROR_HEADER,
};
pub use error::SyncError;
pub use target::MirrorTarget;
