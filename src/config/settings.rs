// User configuration and its on-disk store.
// First run prompts for the settings; later runs load them from TOML.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{AppPaths, write_private};
use crate::error::{GhselError, Result};

use super::prompt::Prompter;

const TOKEN_QUESTION: &str = "What's your GitHub access token?";
const CLONE_DIR_QUESTION: &str = "What's your git clone directory?";
const ORG_QUESTION: &str = "What organization do you want to search?";

/// The three settings ghsel needs before it can talk to GitHub.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub github_token: String,
    #[serde(default)]
    pub clone_dir: PathBuf,
    #[serde(default)]
    pub org_name: String,
}

impl Configuration {
    /// Name of the first empty field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.github_token.trim().is_empty() {
            Some("github_token")
        } else if self.clone_dir.as_os_str().is_empty() {
            Some("clone_dir")
        } else if self.org_name.trim().is_empty() {
            Some("org_name")
        } else {
            None
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("github_token", &"<redacted>")
            .field("clone_dir", &self.clone_dir)
            .field("org_name", &self.org_name)
            .finish()
    }
}

/// Expand a leading `~` to `home`. `~user` forms are left alone.
pub fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

/// Reads and writes the [`Configuration`] file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    home: PathBuf,
}

impl ConfigStore {
    pub fn new(paths: &AppPaths) -> Self {
        Self {
            path: paths.config_path(),
            home: paths.home().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, prompting for it if the file does not exist yet.
    pub fn load_or_create(&self, prompter: &mut impl Prompter) -> Result<Configuration> {
        if self.path.exists() {
            return self.load();
        }
        info!(path = %self.path.display(), "no config found, starting first-run setup");
        self.configure(prompter)
    }

    /// Prompt for every setting and overwrite the config file.
    pub fn configure(&self, prompter: &mut impl Prompter) -> Result<Configuration> {
        let github_token = prompter.ask_secret(TOKEN_QUESTION)?;
        let clone_dir = prompter.ask(CLONE_DIR_QUESTION)?;
        let org_name = prompter.ask(ORG_QUESTION)?;

        let config = Configuration {
            github_token: github_token.trim().to_string(),
            clone_dir: expand_tilde(clone_dir.trim(), &self.home),
            org_name: org_name.trim().to_string(),
        };
        self.validate(&config)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Load and validate an existing config file.
    pub fn load(&self) -> Result<Configuration> {
        let contents = fs::read_to_string(&self.path)?;
        let mut config: Configuration =
            toml::from_str(&contents).map_err(|source| GhselError::ConfigParse {
                path: self.path.clone(),
                source,
            })?;

        if let Some(raw) = config.clone_dir.to_str() {
            config.clone_dir = expand_tilde(raw, &self.home);
        }
        self.validate(&config)?;
        debug!(path = %self.path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Write `config`, replacing the whole file.
    pub fn save(&self, config: &Configuration) -> Result<()> {
        let contents = toml::to_string_pretty(config)?;
        // The file holds an access token.
        write_private(&self.path, contents.as_bytes())?;
        info!(path = %self.path.display(), "saved config");
        Ok(())
    }

    fn validate(&self, config: &Configuration) -> Result<()> {
        match config.missing_field() {
            Some(field) => Err(GhselError::ConfigIncomplete {
                path: self.path.clone(),
                field,
            }),
            None => Ok(()),
        }
    }
}
