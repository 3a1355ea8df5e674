// SPDX-License-Identifier: MIT

//! Durable state storage
//!
//! One fixed slot holding at most one serialized `WorkflowState`. Writes are
//! whole-record replace; reads fail softly: malformed stored data surfaces
//! a diagnostic and is discarded, so the next load starts from the idle menu
//! instead of failing the same way forever.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use super::state::WorkflowState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Key-value persistence surviving full page reloads.
pub trait StateStore: Send + Sync {
    /// Replace the record. No partial updates.
    fn write(&self, state: &WorkflowState) -> Result<(), StoreError>;

    /// Read the record. Malformed data is treated as absent after a
    /// diagnostic, and the slot is cleared.
    fn read(&self) -> Result<Option<WorkflowState>, StoreError>;

    /// Remove the record.
    fn clear(&self) -> Result<(), StoreError>;
}

fn decode(raw: &str) -> Option<WorkflowState> {
    match serde_json::from_str(raw) {
        Ok(state) => Some(state),
        Err(err) => {
            log::warn!("discarding malformed persisted state: {}", err);
            None
        }
    }
}

/// In-memory store for tests and the simulation harness.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject raw (possibly malformed) content, bypassing serialization.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock().unwrap() = Some(raw.into());
    }
}

impl StateStore for MemoryStore {
    fn write(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        *self.slot.lock().unwrap() = Some(raw);
        Ok(())
    }

    fn read(&self) -> Result<Option<WorkflowState>, StoreError> {
        let mut slot = self.slot.lock().unwrap();
        match slot.as_deref().map(decode) {
            Some(Some(state)) => Ok(Some(state)),
            Some(None) => {
                *slot = None;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

/// File-backed store. Writes go through a temp file and an atomic rename so
/// a crash mid-write never leaves a torn record.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StateStore for FileStore {
    fn write(&self, state: &WorkflowState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read(&self) -> Result<Option<WorkflowState>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match decode(&raw) {
            Some(state) => Ok(Some(state)),
            None => {
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
