//! Command handlers

pub mod audit;
pub mod category;
pub mod config;
pub mod dupes;
pub mod record;
pub mod status;
pub mod sync;
pub mod trash;
