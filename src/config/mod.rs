// Configuration module.
// Persists the access token, clone directory, and organization between runs.

pub mod prompt;
pub mod settings;

pub use prompt::TerminalPrompter;
pub use settings::{ConfigStore, Configuration};
