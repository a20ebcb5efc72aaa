// Error types for ghsel.
// Covers GitHub API failures, config and cache persistence, and subprocess errors.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhselError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("Malformed config at {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config at {} is incomplete: `{field}` is empty", .path.display())]
    ConfigIncomplete { path: PathBuf, field: &'static str },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Repository cache not found at {}", .0.display())]
    CacheMissing(PathBuf),

    #[error("Malformed repository cache at {}: {source}", .path.display())]
    CacheCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Repository listing is incomplete: {failed} page(s) failed")]
    PartialListing { failed: usize },

    #[error("Could not fetch any repositories: {failed} page(s) failed")]
    ListingUnavailable { failed: usize },

    #[error("Refusing to clone repository with unusable name {0:?}")]
    InvalidRepositoryName(String),

    #[error("git clone of {url} failed ({status})")]
    CloneFailed { url: String, status: ExitStatus },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl GhselError {
    /// Whether a failed page request may succeed on a later page.
    ///
    /// Only network failures, undecodable bodies, 5xx and 429 qualify. Auth,
    /// access, unknown organizations and exhausted quota fail every page the
    /// same way, so they abort a listing instead.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(_) | Self::Json(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GhselError>;
