use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

const KIB: f64 = 1024.0;

/// Memory quantity written as a human string (`"4GB"`, `"512MB"`) in config
///
/// Units are binary multiples: `1GB` is `1024^3` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemorySize(u64);

impl MemorySize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl FromStr for MemorySize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let (number, multiplier) = [("TB", KIB.powi(4)), ("GB", KIB.powi(3)), ("MB", KIB.powi(2)), ("KB", KIB), ("B", 1.0)]
            .iter()
            .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|n| (n.trim().to_string(), *mult)))
            .unwrap_or_else(|| (upper.clone(), 1.0));

        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid memory size: {}", trimmed))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("invalid memory size: {}", trimmed));
        }
        Ok(Self((value * multiplier).round() as u64))
    }
}

impl TryFrom<String> for MemorySize {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemorySize> for String {
    fn from(value: MemorySize) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gib = self.0 as f64 / KIB.powi(3);
        if gib >= 1.0 {
            write!(f, "{}GB", (gib * 100.0).round() / 100.0)
        } else {
            write!(f, "{}MB", (self.0 as f64 / KIB.powi(2) * 100.0).round() / 100.0)
        }
    }
}

/// Sampling parameters handed to the generation engine
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationParams {
    pub do_sample: bool,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    /// End-of-sequence token used for padding (GPT-2's EOS)
    pub pad_token_id: Option<u32>,
    pub num_return_sequences: u32,
}

impl GenerationParams {
    /// Parameters for the story generation call
    pub fn story() -> Self {
        Self {
            do_sample: true,
            max_new_tokens: 150,
            temperature: 0.8,
            top_p: 0.9,
            repetition_penalty: 1.2,
            pad_token_id: Some(50256),
            num_return_sequences: 1,
        }
    }

    /// Parameters for the second, rewriting pass
    pub fn processing() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
            ..Self::story()
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::story()
    }
}

/// Static description of one generation backend
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BackendDescriptor {
    /// Model identifier as served by the inference engine
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub min_ram: MemorySize,
    #[serde(default)]
    pub recommended_ram: Option<MemorySize>,
    #[serde(default)]
    pub generation: GenerationParams,
}

/// Data source type token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    News,
    Llm,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::Llm => "llm",
        }
    }
}

impl FromStr for SourceKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "news" => Ok(SourceKind::News),
            "llm" => Ok(SourceKind::Llm),
            other => Err(AgentError::InvalidSourceType(other.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination type token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DestinationKind {
    #[serde(rename = "dry_run")]
    DryRun,
    #[serde(rename = "thread")]
    Thread,
    #[serde(rename = "twitter", alias = "microblog")]
    Microblog,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::DryRun => "dry_run",
            DestinationKind::Thread => "thread",
            DestinationKind::Microblog => "twitter",
        }
    }
}

impl FromStr for DestinationKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dry_run" | "dry-run" | "console" => Ok(DestinationKind::DryRun),
            "thread" | "threads" => Ok(DestinationKind::Thread),
            "twitter" | "microblog" | "x" => Ok(DestinationKind::Microblog),
            other => Err(AgentError::InvalidDestinationType(other.to_string())),
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// timestamp - level - message
    #[default]
    Full,
    Compact,
}
