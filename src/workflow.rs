// The select-and-clone pipeline.
// Loads the listing (cache or API), lets the user pick one repository, and clones it.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::cache::RepositoryCache;
use crate::cloner::Cloner;
use crate::config::Configuration;
use crate::error::{GhselError, Result};
use crate::github::{ListingSource, RepositoryRecord};
use crate::selector::{DEFAULT_FILTER, FALLBACK_SHELL, Selector};

/// Return the cached listing, or fetch a fresh one and cache it.
///
/// The cache is used whenever it exists unless `refresh` is set. A complete
/// listing always replaces the cache. A partial listing is an error under
/// `strict`, and also when every page failed. Otherwise it is used for this
/// run but only cached when no earlier snapshot exists, so a flaky refresh
/// never shrinks a good cache.
pub async fn resolve_listing<S: ListingSource>(
    cache: &RepositoryCache,
    source: &mut S,
    organization: &str,
    refresh: bool,
    strict: bool,
) -> Result<Vec<RepositoryRecord>> {
    if !refresh && cache.exists() {
        let repos = cache.read()?;
        info!(count = repos.len(), path = %cache.path().display(), "using cached listing");
        return Ok(repos);
    }

    let listing = source.fetch(organization).await?;
    if listing.is_partial() {
        let failed = listing.failed_pages.len();
        for failure in &listing.failed_pages {
            warn!(page = failure.page, reason = %failure.reason, "missing listing page");
        }
        if strict {
            return Err(GhselError::PartialListing { failed });
        }
        if listing.repositories.is_empty() {
            return Err(GhselError::ListingUnavailable { failed });
        }
        warn!(
            failed_pages = failed,
            "repository listing is incomplete, continuing with what was fetched"
        );
        if cache.exists() {
            warn!(path = %cache.path().display(), "keeping the existing cache");
            return Ok(listing.repositories);
        }
    }

    cache.write(&listing.repositories)?;
    Ok(listing.repositories)
}

/// Map the filter's first selected line back to its repository.
pub fn match_selection<'a>(
    repositories: &'a [RepositoryRecord],
    selection: &[String],
) -> Option<&'a RepositoryRecord> {
    let first = selection.first()?.trim();
    repositories.iter().find(|repo| repo.full_name == first)
}

/// One run of ghsel, from listing to clone.
pub struct Workflow<S> {
    organization: String,
    clone_dir: PathBuf,
    cache: RepositoryCache,
    source: S,
    selector: Selector,
    cloner: Cloner,
    refresh: bool,
    strict: bool,
}

impl<S: ListingSource> Workflow<S> {
    pub fn new(config: &Configuration, cache: RepositoryCache, source: S) -> Self {
        Self {
            organization: config.org_name.clone(),
            clone_dir: config.clone_dir.clone(),
            cache,
            source,
            selector: Selector::new(FALLBACK_SHELL, DEFAULT_FILTER),
            cloner: Cloner::new(),
            refresh: false,
            strict: false,
        }
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    #[cfg(test)]
    pub fn cloner(mut self, cloner: Cloner) -> Self {
        self.cloner = cloner;
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Run the pipeline. Returns the local path of the selected repository,
    /// or `None` when nothing was selected.
    pub async fn run(&mut self) -> Result<Option<PathBuf>> {
        let repos = resolve_listing(
            &self.cache,
            &mut self.source,
            &self.organization,
            self.refresh,
            self.strict,
        )
        .await?;

        if repos.is_empty() {
            warn!(organization = %self.organization, "no repositories to choose from");
            return Ok(None);
        }

        let candidates: Vec<String> = repos.iter().map(|r| r.full_name.clone()).collect();
        let selection = self.selector.select(&candidates).await;

        let Some(repo) = match_selection(&repos, &selection) else {
            if let Some(line) = selection.first() {
                warn!(%line, "selection does not match any repository");
            } else {
                info!("no repository selected");
            }
            return Ok(None);
        };

        let outcome = self.cloner.clone(repo, &self.clone_dir).await?;
        Ok(Some(outcome.path().to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::listing::{Listing, PageFailure};
    use tempfile::TempDir;

    struct FakeSource {
        listing: Listing,
        calls: usize,
    }

    impl FakeSource {
        fn new(listing: Listing) -> Self {
            Self { listing, calls: 0 }
        }
    }

    impl ListingSource for FakeSource {
        async fn fetch(&mut self, _organization: &str) -> Result<Listing> {
            self.calls += 1;
            Ok(self.listing.clone())
        }
    }

    fn repos(names: &[&str]) -> Vec<RepositoryRecord> {
        names
            .iter()
            .map(|name| RepositoryRecord::new(name, "main"))
            .collect()
    }

    fn partial(names: &[&str]) -> Listing {
        Listing {
            repositories: repos(names),
            failed_pages: vec![PageFailure {
                page: 2,
                reason: "HTTP 502 Bad Gateway".into(),
            }],
        }
    }

    /// What the fetcher returns when the network is down: nothing, three failures.
    fn unreachable() -> Listing {
        Listing {
            repositories: Vec::new(),
            failed_pages: (1..=3)
                .map(|page| PageFailure {
                    page,
                    reason: "error sending request".into(),
                })
                .collect(),
        }
    }

    fn config(clone_dir: PathBuf) -> Configuration {
        Configuration {
            github_token: "tok".into(),
            clone_dir,
            org_name: "a".into(),
        }
    }

    #[tokio::test]
    async fn test_cache_used_without_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/cached"])).unwrap();
        let mut source = FakeSource::new(Listing::complete(repos(&["a/fresh"])));

        let listing = resolve_listing(&cache, &mut source, "a", false, false)
            .await
            .unwrap();

        assert_eq!(listing, repos(&["a/cached"]));
        assert_eq!(source.calls, 0);
    }

    #[tokio::test]
    async fn test_refresh_fetches_and_overwrites_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/cached"])).unwrap();
        let mut source = FakeSource::new(Listing::complete(repos(&["a/one", "a/two"])));

        let listing = resolve_listing(&cache, &mut source, "a", true, false)
            .await
            .unwrap();

        assert_eq!(listing, repos(&["a/one", "a/two"]));
        assert_eq!(cache.read().unwrap(), listing);
        assert_eq!(source.calls, 1);
    }

    #[tokio::test]
    async fn test_missing_cache_fetches() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        let mut source = FakeSource::new(Listing::complete(repos(&["a/one"])));

        let listing = resolve_listing(&cache, &mut source, "a", false, false)
            .await
            .unwrap();

        assert_eq!(listing, repos(&["a/one"]));
        assert_eq!(cache.read().unwrap(), listing);
    }

    #[tokio::test]
    async fn test_partial_listing_is_cached_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        let mut source = FakeSource::new(partial(&["a/one", "a/three"]));

        let listing = resolve_listing(&cache, &mut source, "a", true, false)
            .await
            .unwrap();

        assert_eq!(listing, repos(&["a/one", "a/three"]));
        assert_eq!(cache.read().unwrap(), listing);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/x", "a/y"])).unwrap();
        let mut source = FakeSource::new(unreachable());

        let result = resolve_listing(&cache, &mut source, "a", true, false).await;

        assert!(matches!(
            result,
            Err(GhselError::ListingUnavailable { failed: 3 })
        ));
        assert_eq!(cache.read().unwrap(), repos(&["a/x", "a/y"]));
    }

    #[tokio::test]
    async fn test_failed_first_fetch_writes_no_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        let mut source = FakeSource::new(unreachable());

        let result = resolve_listing(&cache, &mut source, "a", false, false).await;

        assert!(matches!(result, Err(GhselError::ListingUnavailable { .. })));
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn test_partial_refresh_does_not_replace_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/one", "a/two", "a/three"])).unwrap();
        let mut source = FakeSource::new(partial(&["a/one", "a/three"]));

        let listing = resolve_listing(&cache, &mut source, "a", true, false)
            .await
            .unwrap();

        assert_eq!(listing, repos(&["a/one", "a/three"]));
        assert_eq!(cache.read().unwrap(), repos(&["a/one", "a/two", "a/three"]));
    }

    #[tokio::test]
    async fn test_strict_rejects_partial_listing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/cached"])).unwrap();
        let mut source = FakeSource::new(partial(&["a/one"]));

        let result = resolve_listing(&cache, &mut source, "a", true, true).await;

        assert!(matches!(
            result,
            Err(GhselError::PartialListing { failed: 1 })
        ));
        assert_eq!(cache.read().unwrap(), repos(&["a/cached"]));
    }

    #[test]
    fn test_match_selection() {
        let all = repos(&["a/x", "a/y", "a/z"]);

        let picked = match_selection(&all, &["a/y".to_string()]).unwrap();
        assert_eq!(picked.name, "y");

        let first_wins = match_selection(&all, &["a/z".to_string(), "a/x".to_string()]);
        assert_eq!(first_wins.unwrap().name, "z");

        assert!(match_selection(&all, &[]).is_none());
        assert!(match_selection(&all, &["b/y".to_string()]).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_clones_selected_repository() {
        let temp_dir = TempDir::new().unwrap();
        let clone_dir = temp_dir.path().join("src");
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/x", "a/y", "a/z"])).unwrap();

        let mut workflow = Workflow::new(
            &config(clone_dir.clone()),
            cache,
            FakeSource::new(Listing::default()),
        )
        .selector(Selector::new("sh", "grep a/y"))
        .cloner(Cloner::new().with_command("sh", ["-c", r#"mkdir -p "$3""#, "git"]));

        let path = workflow.run().await.unwrap();

        assert_eq!(path, Some(clone_dir.join("y")));
        assert!(clone_dir.join("y").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_selection_does_not_clone() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));
        cache.write(&repos(&["a/x", "a/y", "a/z"])).unwrap();

        // Any clone attempt would fail to spawn this program.
        let mut workflow = Workflow::new(
            &config(temp_dir.path().join("src")),
            cache,
            FakeSource::new(Listing::default()),
        )
        .selector(Selector::new("sh", "exit 130"))
        .cloner(Cloner::new().with_command("/nonexistent/ghsel-git", Vec::<String>::new()));

        assert_eq!(workflow.run().await.unwrap(), None);
        assert!(!temp_dir.path().join("src").exists());
    }

    #[tokio::test]
    async fn test_empty_organization_ends_cleanly() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RepositoryCache::new(temp_dir.path().join("repos.json"));

        let mut workflow = Workflow::new(
            &config(temp_dir.path().join("src")),
            cache,
            FakeSource::new(Listing::default()),
        )
        .refresh(true)
        .strict(true);

        assert_eq!(workflow.run().await.unwrap(), None);
    }
}
