// GitHub API response types.
// Defines the repository record and response metadata used by the listing fetcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GitHub repository, as listed for an organization.
///
/// Only the fields ghsel acts on are typed. Everything else the API returns
/// is kept in `extra` and written back to the cache untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub default_branch: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepositoryRecord {
    #[cfg(test)]
    pub fn new(full_name: &str, default_branch: &str) -> Self {
        let name = full_name
            .rsplit_once('/')
            .map_or(full_name, |(_, name)| name)
            .to_string();
        Self {
            name,
            full_name: full_name.to_string(),
            default_branch: default_branch.to_string(),
            extra: Map::new(),
        }
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

/// One page of a paginated list response.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page number advertised by the `rel="next"` link, if any.
    pub next_page: Option<u32>,
}
