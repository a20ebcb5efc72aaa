// Interactive prompts for first-run configuration.
// Terminal prompts go through dialoguer; tests feed scripted answers.

use dialoguer::{Input, Password, theme::SimpleTheme};

use crate::error::Result;

/// Source of answers for the configuration questions.
pub trait Prompter {
    /// Ask a question whose answer is shown as it is typed.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Ask for a secret. Defaults to a plain question.
    fn ask_secret(&mut self, question: &str) -> Result<String> {
        self.ask(question)
    }
}

/// Prompts on the terminal. Questions render on stderr so stdout stays clean.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        let answer: String = Input::with_theme(&SimpleTheme)
            .with_prompt(question)
            .interact_text()?;
        Ok(answer)
    }

    fn ask_secret(&mut self, question: &str) -> Result<String> {
        let answer = Password::with_theme(&SimpleTheme)
            .with_prompt(question)
            .interact()?;
        Ok(answer)
    }
}
