//! Output formatting module
//!
//! Console messages of a run: banner, prompt echo, the final result and
//! user-facing failures. Logs go elsewhere; this is what the user reads.

use console::Style;

use crate::error::AgentError;

/// Output formatter for CLI results
pub struct OutputFormatter {
    blue: Style,
    green: Style,
    yellow: Style,
    red: Style,
    bold: Style,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self {
            blue: Style::new().blue(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            bold: Style::new().bold(),
        }
    }
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print_banner(&self) {
        println!("{}", self.bold.apply_to("Hello! I'm your social agent, ready to help!"));
    }

    pub fn print_prompt(&self, prompt: &str) {
        println!("Input prompt: {}", self.blue.apply_to(prompt));
    }

    pub fn print_progress(&self, message: &str) {
        println!("{}", self.yellow.apply_to(message));
    }

    /// Print the tagged result of a successful run
    pub fn print_result(&self, result: &str) {
        println!();
        println!("{} {}", self.green.apply_to("Response:"), result);
        println!();
    }

    /// Print the consolidated list of unset variables, one per line
    pub fn print_missing_environment(&self, names: &[String]) {
        eprintln!("{}", self.red.apply_to("Missing required environment variables:"));
        for name in names {
            eprintln!("  {}", self.bold.apply_to(name));
        }
    }

    /// Print the short user-facing form of `error`
    pub fn print_error(&self, error: &AgentError) {
        match error {
            AgentError::MissingEnvironment { names } => self.print_missing_environment(names),
            other => eprintln!("{}", self.red.apply_to(other.user_message())),
        }
    }

    pub fn print_unexpected(&self, message: &str) {
        eprintln!("{} {}", self.red.apply_to("An unexpected error occurred:"), message);
    }
}
