//! The story pipeline: source, optional processor, destination
//!
//! An [`Agent`] owns one data source and at most one processor, both chosen
//! at construction. The destination is built fresh on every run.

use std::sync::Arc;

use crate::backend::BackendSelector;
use crate::config::{AppConfig, DestinationKind, SourceKind};
use crate::destination::Destination;
use crate::error::{AgentError, Result};
use crate::llm::BackendLoader;
use crate::preflight::{missing_environment, Environment};
use crate::probe::CapabilityProbe;
use crate::processor::ContentProcessor;
use crate::source::DataSource;

/// Per-run choices that may override the compiled-in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub destination: DestinationKind,
    /// Run the second rewriting pass
    pub process: bool,
}

impl RunOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            destination: config.destination.kind,
            process: config.processor.enabled,
        }
    }
}

pub struct Agent {
    config: Arc<AppConfig>,
    source: DataSource,
    processor: Option<ContentProcessor>,
    destination: DestinationKind,
    env: Arc<dyn Environment>,
}

impl Agent {
    /// Check the environment, then build the agent
    ///
    /// Fails with `MissingEnvironment` before any source, backend or
    /// destination is constructed.
    pub async fn prepare(
        config: Arc<AppConfig>,
        source_kind: SourceKind,
        loader: Arc<dyn BackendLoader>,
        probe: CapabilityProbe,
        env: Arc<dyn Environment>,
        options: RunOptions,
    ) -> Result<Self> {
        let missing = missing_environment(&config, source_kind, options.destination, env.as_ref());
        if !missing.is_empty() {
            return Err(AgentError::MissingEnvironment { names: missing });
        }
        Self::new(config, source_kind, loader, probe, env, options).await
    }

    /// Build the source (running backend selection when needed) and, if
    /// processing is on, the processor
    pub async fn new(
        config: Arc<AppConfig>,
        source_kind: SourceKind,
        loader: Arc<dyn BackendLoader>,
        probe: CapabilityProbe,
        env: Arc<dyn Environment>,
        options: RunOptions,
    ) -> Result<Self> {
        tracing::info!("Initializing agent with {} source", source_kind);

        let selector = BackendSelector::new(probe, loader.clone());
        let source = DataSource::build(source_kind, &config, &selector, env.as_ref()).await?;

        let processor = if options.process {
            Some(ContentProcessor::load(&config, loader.as_ref()).await)
        } else {
            tracing::info!("Content processing disabled for this run");
            None
        };

        Ok(Self::from_parts(config, source, processor, options.destination, env))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        source: DataSource,
        processor: Option<ContentProcessor>,
        destination: DestinationKind,
        env: Arc<dyn Environment>,
    ) -> Self {
        Self {
            config,
            source,
            processor,
            destination,
            env,
        }
    }

    /// Run one prompt end to end
    ///
    /// Returns `[Source: <tag>] <final text>` once the destination accepts
    /// the text.
    pub async fn run(&self, prompt: &str) -> Result<String> {
        let story = self
            .source
            .generate_story(prompt)
            .await
            .ok_or_else(|| AgentError::NoStory {
                source_tag: self.source.kind().to_string(),
            })?;
        tracing::info!("Story received from {} ({} chars)", story.source(), story.content().len());

        let final_text = match &self.processor {
            Some(processor) => processor.process_story(story.content()).await,
            None => story.content().to_string(),
        };

        let destination = Destination::build(
            self.destination,
            &self.config.destination_config(self.destination),
            self.env.as_ref(),
        )?;
        if !destination.post(&final_text).await {
            return Err(AgentError::PublishFailed {
                destination: self.destination.to_string(),
            });
        }

        Ok(format!("[Source: {}] {}", story.source(), final_text))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("source", &self.source)
            .field("processor", &self.processor)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}
