// Cache store for the repository listing snapshot.
// Handles JSON serialization and atomic filesystem writes.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{GhselError, Result};
use crate::github::RepositoryRecord;

/// Single-snapshot store for the organization's repository listing.
///
/// The snapshot carries no timestamp: it is used whenever it exists, and
/// every write replaces it wholesale.
#[derive(Debug, Clone)]
pub struct RepositoryCache {
    path: PathBuf,
}

impl RepositoryCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a snapshot is present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the snapshot. Fails if it is missing or malformed.
    pub fn read(&self) -> Result<Vec<RepositoryRecord>> {
        if !self.exists() {
            return Err(GhselError::CacheMissing(self.path.clone()));
        }
        let repos = read_json(&self.path).map_err(|err| match err {
            GhselError::Json(source) => GhselError::CacheCorrupt {
                path: self.path.clone(),
                source,
            },
            other => other,
        })?;
        Ok(repos)
    }

    /// Replace the snapshot with `repos`.
    pub fn write(&self, repos: &[RepositoryRecord]) -> Result<()> {
        write_json(&self.path, &repos)?;
        debug!(path = %self.path.display(), count = repos.len(), "wrote repository cache");
        Ok(())
    }
}

/// Read JSON data from a file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write data as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(path, json.as_bytes())
}

/// Write bytes via a temp file and rename, creating parent directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    write_through_temp(path, bytes, fs::OpenOptions::new())
}

/// Like [`write_atomic`], but the file is owner-only (0600 on unix) from the
/// moment it is created.
pub fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    write_through_temp(path, bytes, options)
}

fn write_through_temp(path: &Path, bytes: &[u8], mut options: fs::OpenOptions) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // A leftover temp file would keep its old mode, so always start fresh.
    let temp_path = path.with_extension("tmp");
    match fs::remove_file(&temp_path) {
        Err(err) if err.kind() != ErrorKind::NotFound => return Err(err.into()),
        _ => {}
    }

    let mut file = options.write(true).create_new(true).open(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
