// GitHub API endpoint functions.
// Typed methods for the REST endpoints ghsel calls.

use crate::error::Result;

use super::client::GitHubClient;
use super::types::{Page, RepositoryRecord};

/// GitHub's maximum page size for list endpoints.
pub const MAX_PER_PAGE: u32 = 100;

impl GitHubClient {
    /// Get one page of repositories for an organization.
    pub async fn get_org_repos(
        &mut self,
        org: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<RepositoryRecord>> {
        self.get_page(&format!("/orgs/{}/repos", org), page, per_page)
            .await
    }
}
