//! Atomic JSON file persistence for the session document.
//!
//! The whole session serializes as one pretty-printed JSON document at a
//! configurable path. Writes go through a sibling temp file plus rename
//! so a crash mid-write never leaves a truncated document behind.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::manager::SessionData;

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session. A missing file is not an error; it
    /// just means this is a fresh install. A present but unreadable file
    /// is an error the caller decides how to handle.
    pub fn load(&self) -> Result<Option<SessionData>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No session file, starting fresh");
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let session: SessionData = serde_json::from_str(&raw)
            .with_context(|| format!("Session file {} is corrupt", self.path.display()))?;

        info!(
            path = %self.path.display(),
            rounds = session.rounds.len(),
            "Loaded session"
        );
        Ok(Some(session))
    }

    /// Persist the session atomically.
    pub fn save(&self, session: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        let raw = serde_json::to_string_pretty(session)
            .context("Failed to serialize session")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .with_context(|| format!("Failed to write session temp file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("Failed to move session file into place at {}", self.path.display())
        })?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }
}
