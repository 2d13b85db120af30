//! Configuration management
//!
//! The whole configuration is compiled into the binary from
//! `config/default.toml` and loaded once at startup. Nothing is read from
//! disk and nothing is mutated afterwards; components receive the pieces
//! they need by reference or in an `Arc`.

pub mod types;

pub use types::{
    BackendDescriptor, DestinationKind, GenerationParams, LogFormat, MemorySize, SourceKind,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AgentError, Result};

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Free-form key/value table of a source or destination
///
/// Credential entries hold environment variable *names*, never the secrets.
pub type ComponentConfig = BTreeMap<String, String>;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    /// Backend descriptors keyed by backend identifier
    pub models: BTreeMap<String, BackendDescriptor>,
    /// Backend identifiers, highest preference first
    pub fallback_sequence: Vec<String>,
    /// Source settings keyed by source token
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSettings>,
    pub destination: DestinationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

/// Location of the text-generation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub enabled: bool,
    /// Backend identifier of the model used for rewriting
    pub model: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ordering hint; sources are picked explicitly, so this is informational
    #[serde(default)]
    pub priority: u32,
    /// Informational; the rewriting pass follows `[processor] enabled` and
    /// the per-run toggle
    #[serde(default)]
    pub needs_processing: bool,
    #[serde(default)]
    pub config: ComponentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationSettings {
    #[serde(rename = "type")]
    pub kind: DestinationKind,
    /// Per-type connection settings keyed by destination token
    #[serde(default)]
    pub config: BTreeMap<String, ComponentConfig>,
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load the compiled-in configuration
    pub fn load() -> Result<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parse and validate a configuration document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Every fallback identifier must resolve to a descriptor
    pub fn validate(&self) -> Result<()> {
        let unknown: Vec<&str> = self
            .fallback_sequence
            .iter()
            .filter(|id| !self.models.contains_key(id.as_str()))
            .map(String::as_str)
            .collect();

        if !unknown.is_empty() {
            return Err(AgentError::InvalidConfig {
                message: format!("fallback sequence names unknown backends: {}", unknown.join(", ")),
            });
        }
        if self.fallback_sequence.is_empty() {
            return Err(AgentError::InvalidConfig {
                message: "fallback sequence is empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn descriptor(&self, backend_id: &str) -> Option<&BackendDescriptor> {
        self.models.get(backend_id)
    }

    /// Settings of a source; an absent table means disabled with no config
    pub fn source(&self, kind: SourceKind) -> Option<&SourceSettings> {
        self.sources.get(kind.as_str())
    }

    pub fn source_enabled(&self, kind: SourceKind) -> bool {
        self.source(kind).map(|s| s.enabled).unwrap_or(false)
    }

    /// Connection settings for a destination type
    pub fn destination_config(&self, kind: DestinationKind) -> ComponentConfig {
        self.destination
            .config
            .get(kind.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

/// Fail with every missing key named when `config` lacks any of `required`
pub fn require_keys(component: &str, config: &ComponentConfig, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|key| !config.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::error!("Missing required configuration keys: {}", missing.join(", "));
        Err(AgentError::MissingConfigKeys {
            component: component.to_string(),
            keys: missing,
        })
    }
}
