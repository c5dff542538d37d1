//! Protected-operation session window
//!
//! Destructive operations (delete, purge, restore, category edits) are
//! gated behind the configured access code. A correct entry opens a
//! 20-minute window persisted next to the data files, so a batch of
//! protected operations only asks once. No configured code means the
//! gate is disabled entirely.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use orgreg_core::Config;

/// How long one successful entry stays valid
const SESSION_MINUTES: i64 = 20;

#[derive(Debug, Serialize, Deserialize)]
struct Session {
    authorized_until: DateTime<Utc>,
}

/// Ensure the caller may run a protected operation
///
/// Passes immediately when no access code is configured or an unexpired
/// window exists; otherwise prompts once and opens a new window.
pub fn ensure_authorized(config: &Config) -> Result<()> {
    let Some(code) = config.access_code.as_deref() else {
        return Ok(());
    };

    let path = config.session_path();
    if window_open(&path) {
        return Ok(());
    }

    print!("Access code: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim() != code {
        bail!("Incorrect access code.");
    }

    open_window(&path)
}

/// Whether an unexpired session window exists at `path`
fn window_open(path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(path) else {
        return false;
    };
    match serde_json::from_str::<Session>(&content) {
        Ok(session) => session.authorized_until > Utc::now(),
        Err(_) => false,
    }
}

/// Persist a fresh session window at `path`
fn open_window(path: &Path) -> Result<()> {
    let session = Session {
        authorized_until: Utc::now() + Duration::minutes(SESSION_MINUTES),
    };
    let content = serde_json::to_string(&session).context("Failed to serialize session")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write session file: {:?}", path))?;
    Ok(())
}
