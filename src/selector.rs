// Interactive selection through an external filter.
// Pipes candidates into a fuzzy finder (fzf by default) and reads back the chosen lines.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_FILTER: &str = "fzf -m";
pub const FALLBACK_SHELL: &str = "sh";

/// Pick the shell from `$SHELL`, falling back to `sh` when unset or empty.
pub fn preferred_shell(shell_env: Option<String>) -> String {
    shell_env
        .filter(|shell| !shell.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

/// Runs a filter command through the user's shell.
#[derive(Debug, Clone)]
pub struct Selector {
    shell: String,
    command: String,
}

impl Selector {
    pub fn new(shell: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
        }
    }

    /// Feed `candidates` to the filter and return the lines it printed.
    ///
    /// A filter that cannot start, or that exits unsuccessfully (cancelled,
    /// no match), yields whatever it printed before exiting, usually nothing.
    /// An empty result means the user made no selection.
    pub async fn select(&self, candidates: &[String]) -> Vec<String> {
        debug!(shell = %self.shell, command = %self.command, count = candidates.len(), "starting filter");

        let mut child = match Command::new(&self.shell)
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                warn!(shell = %self.shell, error = %err, "could not start filter");
                return Vec::new();
            }
        };

        let mut payload = String::new();
        for candidate in candidates {
            payload.push_str(candidate);
            payload.push('\n');
        }

        // Dropping stdin at the end of the task closes the pipe.
        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                if let Err(err) = stdin.write_all(payload.as_bytes()).await {
                    debug!(error = %err, "filter stopped reading candidates");
                }
            }
        });

        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %err, "filter failed");
                return Vec::new();
            }
        };
        let _ = writer.await;

        if !output.status.success() {
            debug!(status = %output.status, "filter exited unsuccessfully");
        }
        parse_selection(&output.stdout)
    }
}

/// Split filter output into selected lines, ignoring blank ones.
pub fn parse_selection(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<String> {
        ["a/x", "a/y", "a/z"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_preferred_shell() {
        assert_eq!(preferred_shell(Some("/bin/zsh".into())), "/bin/zsh");
        assert_eq!(preferred_shell(Some(String::new())), "sh");
        assert_eq!(preferred_shell(None), "sh");
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection(b"a/y\n"), ["a/y"]);
        assert_eq!(parse_selection(b"a/x\r\na/z\n\n"), ["a/x", "a/z"]);
        assert!(parse_selection(b"").is_empty());
        assert!(parse_selection(b"\n").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_filter_picks_one() {
        let selector = Selector::new("sh", "grep a/y");
        assert_eq!(selector.select(&candidates()).await, ["a/y"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_filter_multi_select_keeps_order() {
        let selector = Selector::new("sh", "cat");
        assert_eq!(selector.select(&candidates()).await, candidates());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_filter_selects_nothing() {
        let selector = Selector::new("sh", "exit 130");
        assert!(selector.select(&candidates()).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_shell_selects_nothing() {
        let selector = Selector::new("/nonexistent/ghsel-shell", "cat");
        assert!(selector.select(&candidates()).await.is_empty());
    }
}
