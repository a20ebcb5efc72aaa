// Filesystem locations for ghsel state.
// Resolves the home directory once and derives the config and cache file paths from it.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::{GhselError, Result};

const APP_DIR: &str = "ghsel";
const CONFIG_FILE: &str = "config.toml";
const CACHE_FILE: &str = "repos.json";

/// Per-user paths, computed at startup and handed to the stores that need them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// The user's home directory, used for `~` expansion.
    pub home: PathBuf,
    /// Directory holding both the config and the cache snapshot.
    pub state_dir: PathBuf,
}

impl AppPaths {
    /// Resolve paths from the current user's home directory
    /// (`~/.config/ghsel`), or from `state_dir` when one is given.
    pub fn discover(state_dir: Option<PathBuf>) -> Result<Self> {
        let base = BaseDirs::new().ok_or(GhselError::NoHomeDir)?;
        let home = base.home_dir().to_path_buf();
        Ok(match state_dir {
            Some(dir) => Self::new(home, dir),
            None => Self::under_home(home),
        })
    }

    /// Paths rooted at an explicit home directory.
    pub fn under_home(home: PathBuf) -> Self {
        let state_dir = home.join(".config").join(APP_DIR);
        Self { home, state_dir }
    }

    pub fn new(home: PathBuf, state_dir: PathBuf) -> Self {
        Self { home, state_dir }
    }

    /// Path to the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE)
    }

    /// Path to the repository cache snapshot.
    pub fn cache_path(&self) -> PathBuf {
        self.state_dir.join(CACHE_FILE)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}
