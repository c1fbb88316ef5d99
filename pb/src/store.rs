//! JSON file store for the Paper/Milestone/Task tree
//!
//! Save protocol:
//!
//! ```text
//! papers.json      ──copy──▶  papers.json.bak
//! model ──write+fsync──▶  .tmpXXXX (same dir)  ──rename──▶  papers.json
//! ```
//!
//! The rename is the only step that touches the primary file, so a failure or
//! crash anywhere before it leaves the previous state readable.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Model, SCHEMA_VERSION};

/// Errors from loading or saving the state file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State file {} is corrupt: {reason}. Restore it from {} or fix it by hand", .path.display(), backup_path(.path).display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("State file {} has schema version {found}, this build supports up to {supported}", .path.display())]
    UnsupportedVersion { path: PathBuf, found: u64, supported: u32 },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to save {} (previous state left intact): {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Sibling backup location for a state file
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Single-file JSON store
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Create a store backed by the given file (created lazily on first save)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(?path, "Store::new");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.path)
    }

    /// Load the model, or an empty model if no state file exists yet
    pub fn load(&self) -> Result<Model, StoreError> {
        if !self.path.exists() {
            debug!(path = ?self.path, "load: no state file, starting empty");
            return Ok(Model::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| self.corrupt("missing schema version".to_string()))?;
        if version > u64::from(SCHEMA_VERSION) {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut model: Model = serde_json::from_value(value).map_err(|e| self.corrupt(e.to_string()))?;
        self.check_tree(&model)?;

        // Older files load as-is; the next save writes them at the current version
        if model.version < SCHEMA_VERSION {
            info!(path = ?self.path, from = model.version, to = SCHEMA_VERSION, "load: upgrading schema version");
            model.version = SCHEMA_VERSION;
        }

        debug!(
            papers = model.papers.len(),
            milestones = model.milestones.len(),
            tasks = model.tasks.len(),
            "load: done"
        );
        Ok(model)
    }

    /// Persist the model, backing up the previous file first
    pub fn save(&self, model: &Model) -> Result<(), StoreError> {
        self.backup()?;
        let staged = self.stage(model)?;
        self.commit(staged)?;
        info!(path = ?self.path, "save: committed");
        Ok(())
    }

    /// Copy the current state file to its backup location, if it exists
    pub(crate) fn backup(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|source| self.write_error(source))?;
        debug!(?backup, "backup: copied");
        Ok(Some(backup))
    }

    /// Write the serialized model to a synced temporary file beside the target
    pub(crate) fn stage(&self, model: &Model) -> Result<NamedTempFile, StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| self.write_error(source))?;

        let json = serde_json::to_vec_pretty(model).map_err(|e| self.write_error(io::Error::other(e)))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| self.write_error(source))?;
        tmp.write_all(&json).map_err(|source| self.write_error(source))?;
        tmp.write_all(b"\n").map_err(|source| self.write_error(source))?;
        tmp.as_file().sync_all().map_err(|source| self.write_error(source))?;
        debug!(tmp = ?tmp.path(), bytes = json.len(), "stage: written");
        Ok(tmp)
    }

    /// Atomically move a staged file over the primary state file
    pub(crate) fn commit(&self, staged: NamedTempFile) -> Result<(), StoreError> {
        staged.persist(&self.path).map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn check_tree(&self, model: &Model) -> Result<(), StoreError> {
        let mut names = HashSet::new();
        for paper in model.papers.values() {
            if !names.insert(paper.name.as_str()) {
                return Err(self.corrupt(format!("duplicate paper name {:?}", paper.name)));
            }
        }
        for milestone in model.milestones.values() {
            if !model.papers.contains_key(&milestone.paper_id) {
                return Err(self.corrupt(format!(
                    "milestone {} references missing paper {}",
                    milestone.id, milestone.paper_id
                )));
            }
        }
        for task in model.tasks.values() {
            if !model.milestones.contains_key(&task.milestone_id) {
                return Err(self.corrupt(format!(
                    "task {} references missing milestone {}",
                    task.id, task.milestone_id
                )));
            }
        }
        Ok(())
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
