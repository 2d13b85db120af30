//! Structured error types for the story pipeline
//!
//! Only construction-time and run-level failures live here. External-call
//! failures inside sources, the processor and destinations are logged and
//! turned into `None` / `false` at the component boundary instead.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for pipeline operations
#[derive(Error, Debug)]
pub enum AgentError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// One or more required environment variables are unset
    #[error("missing required environment variables: {}", names.join(", "))]
    MissingEnvironment { names: Vec<String> },

    /// A component config table lacks required keys
    #[error("missing required configuration keys for {component}: {}", keys.join(", "))]
    MissingConfigKeys { component: String, keys: Vec<String> },

    /// Unknown data source token
    #[error("invalid source type '{0}' (expected 'news' or 'llm')")]
    InvalidSourceType(String),

    /// Unknown destination token
    #[error("invalid destination type '{0}' (expected 'dry_run', 'thread' or 'twitter')")]
    InvalidDestinationType(String),

    /// The selected source is switched off in configuration
    #[error("source '{0}' is disabled in configuration")]
    SourceDisabled(String),

    /// Static configuration is inconsistent
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Compiled-in TOML failed to parse
    #[error("configuration parse error: {0}")]
    Config(#[from] toml::de::Error),

    // =========================================================================
    // Backend Selection Errors
    // =========================================================================
    /// Every candidate in the fallback sequence was skipped or failed to load
    #[error("no eligible backend (tried: {})", tried.join(", "))]
    NoEligibleBackend { tried: Vec<String> },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Prompt file does not exist
    #[error("prompt file not found: {}", path.display())]
    PromptFileMissing { path: PathBuf },

    /// Prompt file exists but holds only whitespace
    #[error("prompt file is empty: {}", path.display())]
    PromptFileEmpty { path: PathBuf },

    // =========================================================================
    // Run Errors
    // =========================================================================
    /// The data source produced nothing for this prompt
    #[error("no response from source '{source_tag}'")]
    NoStory { source_tag: String },

    /// The destination rejected the final text
    #[error("failed to publish to {destination}")]
    PublishFailed { destination: String },

    // =========================================================================
    // External Error Wrappers (transparent)
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AgentError {
    /// Errors the user can fix by editing `.env`, the prompt file or flags
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Self::MissingEnvironment { .. }
                | Self::MissingConfigKeys { .. }
                | Self::InvalidSourceType(_)
                | Self::InvalidDestinationType(_)
                | Self::SourceDisabled(_)
                | Self::PromptFileMissing { .. }
                | Self::PromptFileEmpty { .. }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingEnvironment { names } => {
                format!("Missing required environment variables: {}", names.join(", "))
            }
            Self::PromptFileMissing { path } => {
                format!("Error: {} not found. Please create it first.", path.display())
            }
            Self::PromptFileEmpty { path } => {
                format!("Error: {} is empty", path.display())
            }
            Self::NoStory { .. } => {
                "Failed to generate a response. Please try again.".to_string()
            }
            Self::NoEligibleBackend { .. } => {
                "Failed to initialize any text generation model.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;
