// Organization repository listing.
// Walks every page of the org repos endpoint and reports which pages failed.

use tracing::{debug, info, warn};

use crate::error::Result;

use super::client::GitHubClient;
use super::endpoints::MAX_PER_PAGE;
use super::types::{Page, RepositoryRecord};

/// A failed page has no Link header, so after this many failures in a row
/// there is no way left to tell whether more pages exist.
const MAX_CONSECUTIVE_FAILURES: usize = 3;

/// A page that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page: u32,
    pub reason: String,
}

/// Result of listing an organization's repositories.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Every repository from every page that succeeded, in API order.
    pub repositories: Vec<RepositoryRecord>,
    /// Pages that failed with a transient error.
    pub failed_pages: Vec<PageFailure>,
}

impl Listing {
    #[cfg(test)]
    pub fn complete(repositories: Vec<RepositoryRecord>) -> Self {
        Self {
            repositories,
            failed_pages: Vec::new(),
        }
    }

    /// True when some pages are missing from `repositories`.
    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

/// Anything that can produce the authoritative listing for an organization.
#[allow(async_fn_in_trait)]
pub trait ListingSource {
    async fn fetch(&mut self, organization: &str) -> Result<Listing>;
}

/// Fetches listings from the GitHub REST API.
pub struct ListingFetcher {
    client: GitHubClient,
    per_page: u32,
}

impl ListingFetcher {
    pub fn new(client: GitHubClient) -> Self {
        Self {
            client,
            per_page: MAX_PER_PAGE,
        }
    }

    /// Create a fetcher authenticated with `token` against api.github.com.
    pub fn from_token(token: &str) -> Result<Self> {
        Ok(Self::new(GitHubClient::new(token)?))
    }
}

impl ListingSource for ListingFetcher {
    async fn fetch(&mut self, organization: &str) -> Result<Listing> {
        info!(organization, "fetching repository listing");

        let mut listing = Listing::default();
        let mut page = 1;
        let mut consecutive_failures = 0;

        loop {
            match self
                .client
                .get_org_repos(organization, page, self.per_page)
                .await
            {
                Ok(Page { items, next_page }) => {
                    consecutive_failures = 0;
                    debug!(page, count = items.len(), "fetched repository page");
                    let empty = items.is_empty();
                    listing.repositories.extend(items);
                    match next_page {
                        Some(next) if !empty && next > page => page = next,
                        _ => break,
                    }
                }
                Err(err) if err.is_transient() => {
                    warn!(page, error = %err, "failed to fetch repository page");
                    listing.failed_pages.push(PageFailure {
                        page,
                        reason: err.to_string(),
                    });
                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        warn!(page, "giving up after repeated page failures");
                        break;
                    }
                    page += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let remaining = self.client.rate_limit().remaining;
        info!(
            count = listing.repositories.len(),
            failed_pages = listing.failed_pages.len(),
            rate_limit_remaining = remaining,
            "repository listing fetched"
        );
        Ok(listing)
    }
}
