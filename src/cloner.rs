// Repository cloning.
// Runs `git clone` over SSH into the clone directory and relays git's output to stderr.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use git2::{BranchType, Repository};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{GhselError, Result};
use crate::github::RepositoryRecord;

const DEFAULT_GIT: &str = "git";
const DEFAULT_HOST: &str = "github.com";

/// What a clone call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// The repository was freshly cloned here.
    Cloned(PathBuf),
    /// Something was already at the destination; nothing was done.
    AlreadyExists(PathBuf),
}

impl CloneOutcome {
    pub fn path(&self) -> &Path {
        match self {
            CloneOutcome::Cloned(path) | CloneOutcome::AlreadyExists(path) => path,
        }
    }
}

/// Clones repositories with the git command line.
#[derive(Debug, Clone)]
pub struct Cloner {
    program: String,
    base_args: Vec<String>,
    host: String,
}

impl Default for Cloner {
    fn default() -> Self {
        Self {
            program: DEFAULT_GIT.to_string(),
            base_args: Vec::new(),
            host: DEFAULT_HOST.to_string(),
        }
    }
}

impl Cloner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `program base_args.. clone <url> <dest>` instead of `git clone <url> <dest>`.
    #[cfg(test)]
    pub fn with_command<I, S>(mut self, program: impl Into<String>, base_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.base_args = base_args.into_iter().map(Into::into).collect();
        self
    }

    /// SSH remote for a repository, e.g. `git@github.com:acme/widgets.git`.
    pub fn remote_url(&self, repository: &RepositoryRecord) -> String {
        format!("git@{}:{}.git", self.host, repository.full_name)
    }

    /// Clone `repository` into `base_dir/<name>`.
    ///
    /// An existing destination counts as success. A name that is not a single
    /// plain path component, or any other git failure, is an error. After a fresh clone the default branch's upstream is recorded
    /// on a best-effort basis.
    pub async fn clone(
        &self,
        repository: &RepositoryRecord,
        base_dir: &Path,
    ) -> Result<CloneOutcome> {
        let dest = destination(base_dir, repository)?;
        if dest.exists() {
            info!(path = %dest.display(), "repository already present, skipping clone");
            return Ok(CloneOutcome::AlreadyExists(dest));
        }

        let url = self.remote_url(repository);
        info!(%url, path = %dest.display(), "cloning");

        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .arg("clone")
            .arg(&url)
            .arg(&dest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = tokio::spawn(relay_to_stderr(child.stdout.take()));
        let stderr = tokio::spawn(relay_to_stderr(child.stderr.take()));

        let status = child.wait().await?;
        let _ = stdout.await;
        let git_stderr = stderr.await.unwrap_or_default();

        if !status.success() {
            if git_stderr.contains("already exists") {
                info!(path = %dest.display(), "git reports destination already exists");
                return Ok(CloneOutcome::AlreadyExists(dest));
            }
            return Err(GhselError::CloneFailed { url, status });
        }

        if !repository.default_branch.is_empty() {
            if let Err(err) = track_default_branch(&dest, &repository.default_branch) {
                warn!(
                    branch = %repository.default_branch,
                    error = %err,
                    "could not record upstream for default branch"
                );
            }
        }

        Ok(CloneOutcome::Cloned(dest))
    }
}

/// Where `repository` lands inside `base_dir`.
///
/// The name comes from the editable cache, so it must stay one level below
/// `base_dir`: empty names, `.`, `..` and anything with a separator are rejected.
pub fn destination(base_dir: &Path, repository: &RepositoryRecord) -> Result<PathBuf> {
    let mut components = Path::new(&repository.name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(base_dir.join(name)),
        _ => Err(GhselError::InvalidRepositoryName(repository.name.clone())),
    }
}

/// Point `branch` at `origin/<branch>` in the repository at `path`.
pub fn track_default_branch(path: &Path, branch: &str) -> Result<()> {
    let repo = Repository::open(path)?;
    let mut local = repo.find_branch(branch, BranchType::Local)?;
    local.set_upstream(Some(&format!("origin/{}", branch)))?;
    debug!(branch, "recorded upstream for default branch");
    Ok(())
}

/// Copy a child stream to our stderr, returning what passed through.
async fn relay_to_stderr<R>(reader: Option<R>) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(mut reader) = reader else {
        return String::new();
    };

    let mut out = tokio::io::stderr();
    let mut captured = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let _ = out.write_all(&buf[..n]).await;
                captured.extend_from_slice(&buf[..n]);
            }
            Err(err) => {
                debug!(error = %err, "stopped relaying git output");
                break;
            }
        }
    }
    let _ = out.flush().await;
    String::from_utf8_lossy(&captured).into_owned()
}
