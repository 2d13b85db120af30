//! Story generation with a locally served language model

use std::str::FromStr;

use super::StoryResponse;
use crate::backend::SelectedBackend;
use crate::config::GenerationParams;
use crate::error::AgentError;
use crate::llm::TextGenerator;

/// Provenance tag of this source
pub const SOURCE_TAG: &str = "llm";

/// Instruction wrapped around the raw prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoryTemplate {
    /// Titled story with a closing lesson
    #[default]
    Structured,
    /// Just the story
    Plain,
}

impl StoryTemplate {
    pub fn render(&self, prompt: &str) -> String {
        match self {
            StoryTemplate::Structured => format!(
                "Write a short, professional workplace story that transforms this perspective \
                 into a constructive narrative about workplace dynamics and personal growth:\n\n\
                 {prompt}\n\n\
                 Reply in this format:\n\
                 Title: [A brief, engaging title]\n\
                 Story: [Your workplace story]\n\
                 Lesson: [A brief professional insight]\n\n"
            ),
            StoryTemplate::Plain => format!("Share a workplace story about:\n{prompt}\nStory:"),
        }
    }
}

impl FromStr for StoryTemplate {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Ok(StoryTemplate::Structured),
            "plain" => Ok(StoryTemplate::Plain),
            other => Err(AgentError::InvalidConfig {
                message: format!("unknown story template '{}'", other),
            }),
        }
    }
}

pub struct LocalModelSource {
    backend_id: String,
    engine: Box<dyn TextGenerator>,
    params: GenerationParams,
    template: StoryTemplate,
}

impl LocalModelSource {
    pub fn new(selected: SelectedBackend, template: StoryTemplate) -> Self {
        Self {
            backend_id: selected.backend_id,
            params: selected.descriptor.generation,
            engine: selected.engine,
            template,
        }
    }

    pub fn backend_id(&self) -> &str {
        &self.backend_id
    }

    pub async fn generate_story(&self, prompt: &str) -> Option<StoryResponse> {
        let story_prompt = self.template.render(prompt);

        let generations = match self.engine.generate(&story_prompt, &self.params).await {
            Ok(generations) => generations,
            Err(e) => {
                tracing::error!("Error generating story with {}: {:#}", self.backend_id, e);
                return None;
            }
        };

        let Some(first) = generations.into_iter().next() else {
            tracing::warn!("{} returned no candidates", self.engine.model());
            return None;
        };

        let continuation = strip_echo(&first.generated_text, &story_prompt).trim();
        let story = StoryResponse::new(continuation, SOURCE_TAG);
        if story.is_none() {
            tracing::warn!("{} produced an empty story", self.engine.model());
        }
        story
    }
}

/// Drop the echoed prompt from the engine's full output
fn strip_echo<'a>(generated: &'a str, prompt: &str) -> &'a str {
    generated.strip_prefix(prompt).unwrap_or(generated)
}
