//! CLI argument parsing using clap 4.x derive macros

use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Input};
use social_agent_core::config::{DestinationKind, SourceKind};
use social_agent_core::prompt::DEFAULT_PROMPT_FILE;
use social_agent_core::{AgentError, AppConfig, RunOptions};
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;

/// Turn a prompt into a short workplace story and publish it
///
/// The story comes from a locally served language model or a news search,
/// optionally goes through a rewriting pass, and is printed or posted.
#[derive(Parser, Debug)]
#[command(name = "social-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data source (news, llm); asked interactively when omitted
    #[arg(short, long)]
    pub source: Option<String>,

    /// Destination (dry_run, thread, twitter); defaults to the configured one
    #[arg(short, long)]
    pub destination: Option<String>,

    /// File holding the prompt
    #[arg(short, long, default_value = DEFAULT_PROMPT_FILE)]
    pub prompt_file: PathBuf,

    /// Skip the rewriting pass
    #[arg(long, conflicts_with = "process")]
    pub no_process: bool,

    /// Force the rewriting pass even if disabled in configuration
    #[arg(long)]
    pub process: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configured run options with the flags applied
    pub fn run_options(&self, config: &AppConfig) -> Result<RunOptions, AgentError> {
        let mut options = RunOptions::from_config(config);
        if let Some(raw) = &self.destination {
            options.destination = raw.parse::<DestinationKind>()?;
        }
        if self.no_process {
            options.process = false;
        } else if self.process {
            options.process = true;
        }
        Ok(options)
    }
}

/// Interpret a typed source choice; blank input picks `llm`
pub fn parse_source_choice(input: &str) -> Result<SourceKind, AgentError> {
    if input.trim().is_empty() {
        return Ok(SourceKind::Llm);
    }
    input.parse()
}

const INVALID_CHOICE: &str = "Invalid choice. Please enter 'news' or 'llm'";

/// Ask for the data source until a valid token is entered
///
/// Reads piped stdin line by line when it is not a terminal. `None` when
/// the user interrupts or input ends.
pub fn prompt_source_choice() -> Option<SourceKind> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return read_source_choice(stdin.lock());
    }

    let answer = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Select data source (news/llm)")
        .default(SourceKind::Llm.to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            parse_source_choice(input)
                .map(|_| ())
                .map_err(|_| INVALID_CHOICE.to_string())
        })
        .interact_text();

    match answer {
        Ok(answer) => parse_source_choice(&answer).ok(),
        Err(e) => {
            tracing::debug!("Source selection aborted: {}", e);
            None
        }
    }
}

/// First valid choice among the lines of `input`
pub fn read_source_choice(input: impl BufRead) -> Option<SourceKind> {
    for line in input.lines() {
        let Ok(line) = line else {
            return None;
        };
        match parse_source_choice(&line) {
            Ok(kind) => return Some(kind),
            Err(_) => eprintln!("{}", INVALID_CHOICE),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_choice_parsing() {
        assert_eq!(parse_source_choice("").unwrap(), SourceKind::Llm);
        assert_eq!(parse_source_choice("  ").unwrap(), SourceKind::Llm);
        assert_eq!(parse_source_choice("NEWS").unwrap(), SourceKind::News);
        assert_eq!(parse_source_choice(" llm\n").unwrap(), SourceKind::Llm);
        assert!(matches!(
            parse_source_choice("rss"),
            Err(AgentError::InvalidSourceType(ref token)) if token == "rss"
        ));
    }

    #[test]
    fn test_piped_choice_reprompts_until_valid() {
        use std::io::Cursor;

        assert_eq!(read_source_choice(Cursor::new("news\n")), Some(SourceKind::News));
        assert_eq!(read_source_choice(Cursor::new("rss\nfeed\nLLM\n")), Some(SourceKind::Llm));
        assert_eq!(read_source_choice(Cursor::new("\n")), Some(SourceKind::Llm));
        assert_eq!(read_source_choice(Cursor::new("rss\n")), None);
        assert_eq!(read_source_choice(Cursor::new("")), None);
    }

    #[test]
    fn test_flags_override_configuration() {
        let config = AppConfig::load().unwrap();

        let cli = Cli::parse_from(["social-agent"]);
        assert_eq!(cli.prompt_file, PathBuf::from("prompt.txt"));
        let options = cli.run_options(&config).unwrap();
        assert_eq!(options.destination, DestinationKind::DryRun);
        assert!(options.process);

        let cli = Cli::parse_from(["social-agent", "--no-process", "-d", "threads"]);
        let options = cli.run_options(&config).unwrap();
        assert_eq!(options.destination, DestinationKind::Thread);
        assert!(!options.process);

        let cli = Cli::parse_from(["social-agent", "-d", "fax"]);
        assert!(cli.run_options(&config).is_err());
    }

    #[test]
    fn test_process_flags_conflict() {
        assert!(Cli::try_parse_from(["social-agent", "--process", "--no-process"]).is_err());
    }
}
