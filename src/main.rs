//! `social-agent` - turn a prompt into a short workplace story and publish it
//!
//! Reads the prompt file, asks which data source to use, validates the
//! environment, then runs the story pipeline once.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::Cli;
use social_agent_core::config::SourceKind;
use social_agent_core::llm::HttpBackendLoader;
use social_agent_core::output::OutputFormatter;
use social_agent_core::preflight::ProcessEnv;
use social_agent_core::probe::CapabilityProbe;
use social_agent_core::prompt::load_prompt;
use social_agent_core::{Agent, AgentError, AppConfig};

mod cli;
mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let formatter = OutputFormatter::new();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            formatter.print_error(&e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging, cli.verbose);

    formatter.print_banner();

    match run(&cli, config, &formatter).await {
        Ok(Some(result)) => {
            formatter.print_result(&result);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("Aborted.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<AgentError>() {
                Some(agent_error) if agent_error.requires_user_action() => {
                    tracing::debug!("Run failed: {:?}", e);
                    formatter.print_error(agent_error);
                }
                Some(agent_error) => {
                    tracing::error!("Run failed: {:?}", e);
                    formatter.print_error(agent_error);
                }
                None => {
                    tracing::error!("Unexpected failure: {:?}", e);
                    formatter.print_unexpected(&e.to_string());
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// One end-to-end run; `None` when source selection was abandoned
async fn run(cli: &Cli, config: AppConfig, formatter: &OutputFormatter) -> Result<Option<String>> {
    let options = cli.run_options(&config)?;

    let source_kind = match &cli.source {
        Some(raw) => raw.parse::<SourceKind>()?,
        None => match cli::prompt_source_choice() {
            Some(kind) => kind,
            None => return Ok(None),
        },
    };

    let prompt = load_prompt(&cli.prompt_file)?;
    formatter.print_prompt(&prompt);

    let config = Arc::new(config);
    let loader = Arc::new(HttpBackendLoader::new(config.engine.clone()));
    let probe = CapabilityProbe::for_host(Arc::new(config.models.clone()));

    let agent = Agent::prepare(config, source_kind, loader, probe, Arc::new(ProcessEnv), options)
        .await
        .context("Failed to initialize agent")?;

    formatter.print_progress("Generating Response:");
    let result = agent.run(&prompt).await?;
    Ok(Some(result))
}
