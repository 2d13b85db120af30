//! Text-generation engine seam
//!
//! The inference engine is an external collaborator: given a prompt and
//! sampling parameters it returns candidate texts or fails. Sources and the
//! processor only see the [`TextGenerator`] trait; the selector only sees
//! [`BackendLoader`].

pub mod client;

pub use client::{CompletionClient, HttpBackendLoader};

use async_trait::async_trait;

use crate::config::{BackendDescriptor, GenerationParams};

/// One candidate returned by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Full text: the prompt followed by the continuation
    pub generated_text: String,
}

/// A loaded generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier this backend serves
    fn model(&self) -> &str;

    /// Run one generation call
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<Generation>>;
}

/// Constructs backends from descriptors ("loading a model")
#[async_trait]
pub trait BackendLoader: Send + Sync {
    async fn load(
        &self,
        backend_id: &str,
        descriptor: &BackendDescriptor,
    ) -> anyhow::Result<Box<dyn TextGenerator>>;
}
