//! Second-pass rewriting of generated stories
//!
//! The processor never fails the pipeline. Without an engine, on engine
//! errors, or when no marker can be found in the output, it hands back the
//! content it was given.

use crate::config::{AppConfig, BackendDescriptor, GenerationParams, MemorySize};
use crate::llm::{BackendLoader, TextGenerator};

/// Markers after which the rewritten text starts, checked in order
const STORY_MARKERS: [&str; 2] = ["Personal Story:", "Enhanced Story:"];

fn rewrite_prompt(content: &str) -> String {
    format!(
        "Transform this text into a balanced and insightful workplace narrative. \
         Focus on professional growth, teamwork, and constructive lessons learned. \
         Keep it authentic but diplomatic:\n\n\
         {content}\n\n\
         Enhanced Story:"
    )
}

/// Text after the first marker found, trimmed
pub fn extract_story(generated: &str) -> Option<&str> {
    STORY_MARKERS
        .iter()
        .find_map(|marker| generated.split_once(marker).map(|(_, rest)| rest.trim()))
}

pub struct ContentProcessor {
    engine: Option<Box<dyn TextGenerator>>,
    params: GenerationParams,
}

impl ContentProcessor {
    pub fn new(engine: Option<Box<dyn TextGenerator>>) -> Self {
        Self {
            engine,
            params: GenerationParams::processing(),
        }
    }

    /// A processor that always passes content through
    pub fn passthrough() -> Self {
        Self::new(None)
    }

    /// Load the engine named by `processor.model`
    ///
    /// A load failure is logged and yields a pass-through processor.
    pub async fn load(config: &AppConfig, loader: &dyn BackendLoader) -> Self {
        let backend_id = config.processor.model.as_str();
        let descriptor = config.descriptor(backend_id).cloned().unwrap_or_else(|| BackendDescriptor {
            name: backend_id.to_string(),
            description: String::new(),
            min_ram: MemorySize::from_bytes(0),
            recommended_ram: None,
            generation: GenerationParams::processing(),
        });

        match loader.load(backend_id, &descriptor).await {
            Ok(engine) => {
                tracing::info!("Content processor ready with {}", descriptor.name);
                Self::new(Some(engine))
            }
            Err(e) => {
                tracing::error!("Failed to initialize content processor: {:#}", e);
                Self::passthrough()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// Rewrite `content`, or return it unchanged
    pub async fn process_story(&self, content: &str) -> String {
        let Some(engine) = &self.engine else {
            tracing::warn!("No processor available, returning original content");
            return content.to_string();
        };

        let generations = match engine.generate(&rewrite_prompt(content), &self.params).await {
            Ok(generations) => generations,
            Err(e) => {
                tracing::error!("Error processing content: {:#}", e);
                return content.to_string();
            }
        };

        match generations
            .first()
            .and_then(|g| extract_story(&g.generated_text))
            .filter(|story| !story.is_empty())
        {
            Some(story) => story.to_string(),
            None => {
                tracing::warn!("Failed to extract processed content");
                content.to_string()
            }
        }
    }
}

impl std::fmt::Debug for ContentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentProcessor")
            .field("engine", &self.engine.as_ref().map(|e| e.model()))
            .finish()
    }
}
