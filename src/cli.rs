// Command-line interface for ghsel.
// Parses flags, then wires config, cache, fetcher, selector, and cloner into one run.

use std::path::PathBuf;

use clap::{
    ArgAction, Parser,
    builder::styling::{AnsiColor, Color, Style},
};
use tracing::debug;

use crate::cache::{AppPaths, RepositoryCache};
use crate::config::{ConfigStore, TerminalPrompter};
use crate::error::Result;
use crate::github::ListingFetcher;
use crate::selector::{DEFAULT_FILTER, Selector, preferred_shell};
use crate::workflow::Workflow;

const ABOUT: &str = "Fuzzy-pick a repository from a GitHub organization, clone it, and print its path.";

/// Shell function that changes into the repository ghsel prints.
pub const SHELL_FUNCTION: &str = r#"ghcd() {
  local dir
  dir="$(command ghsel "$@")" || return
  [ -n "$dir" ] && cd "$dir"
}
"#;

/// The CLI application for `ghsel`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Re-fetch the repository listing instead of using the cache
    #[arg(long)]
    pub refresh: bool,
    /// Print a shell function that cds into the selected repository, then exit
    #[arg(long)]
    pub function: bool,
    /// Re-run first-time setup, overwriting the saved config
    #[arg(long)]
    pub configure: bool,
    /// Fail instead of continuing when some listing pages could not be fetched
    #[arg(long)]
    pub strict: bool,
    /// Filter command; receives one `org/name` per line and prints the chosen ones
    #[arg(long, env = "GHSEL_FILTER", default_value = DEFAULT_FILTER)]
    pub filter: String,
    /// Directory for config.toml and repos.json (default ~/.config/ghsel)
    #[arg(long, env = "GHSEL_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
    /// Verbosity level (repeat for more)
    #[arg(short, action = ArgAction::Count)]
    pub v: u8,
}

impl Cli {
    /// Run the CLI application with the given arguments.
    pub async fn run(self) -> Result<()> {
        if self.function {
            print!("{}", SHELL_FUNCTION);
            return Ok(());
        }

        let paths = AppPaths::discover(self.config_dir.clone())?;
        debug!(?paths, "resolved paths");

        let store = ConfigStore::new(&paths);
        debug!(path = %store.path().display(), "config file");
        let mut prompter = TerminalPrompter;
        let config = if self.configure {
            store.configure(&mut prompter)?
        } else {
            store.load_or_create(&mut prompter)?
        };

        let shell = preferred_shell(std::env::var("SHELL").ok());
        let source = ListingFetcher::from_token(&config.github_token)?;
        let mut workflow = Workflow::new(&config, RepositoryCache::new(paths.cache_path()), source)
            .selector(Selector::new(shell, self.filter))
            .refresh(self.refresh)
            .strict(self.strict);

        if let Some(path) = workflow.run().await? {
            println!("{}", path.display());
        }
        Ok(())
    }
}

const HEADING: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
const ACCENT: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

/// Help colors: cyan headings, green flags and org/repo placeholders.
const fn cli_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(HEADING)
        .header(HEADING)
        .literal(ACCENT.bold())
        .placeholder(ACCENT)
        .error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from(["ghsel", "--refresh", "--strict", "-vv"]).unwrap();
        assert!(cli.refresh);
        assert!(cli.strict);
        assert!(!cli.function);
        assert!(!cli.configure);
        assert_eq!(cli.v, 2);

        let cli = Cli::try_parse_from(["ghsel", "--filter", "sk -m", "--config-dir", "/tmp/g"])
            .unwrap();
        assert_eq!(cli.filter, "sk -m");
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/g")));
    }

    #[test]
    fn test_help_lists_flags() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains(ABOUT));
        for flag in ["--refresh", "--function", "--configure", "--strict", "--filter"] {
            assert!(help.contains(flag), "{flag} missing from help");
        }
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["ghsel", "--refetch"]).is_err());
    }

    #[test]
    fn test_shell_function_guards_empty_output() {
        assert!(SHELL_FUNCTION.contains(r#"[ -n "$dir" ] && cd "$dir""#));
        assert!(SHELL_FUNCTION.contains("command ghsel"));
    }
}
