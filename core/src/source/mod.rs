//! Data sources
//!
//! A source turns a free-text prompt into a [`StoryResponse`]. The set of
//! sources is closed, so they are variants of [`DataSource`] rather than
//! trait objects; [`DataSource::build`] is the token-to-constructor table.
//!
//! Sources never fail loudly at generation time: every external error is
//! logged and reported as `None`.

pub mod local_model;
pub mod news;

pub use local_model::{LocalModelSource, StoryTemplate};
pub use news::{Article, NewsApiClient, NewsQuery, NewsSearch, NewsSource};

use std::fmt;

use crate::backend::BackendSelector;
use crate::config::{AppConfig, SourceKind};
use crate::error::{AgentError, Result};
use crate::preflight::Environment;

/// Generated story plus the tag of the source that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryResponse {
    content: String,
    source: String,
}

impl StoryResponse {
    /// `None` when `content` is blank
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self {
            content,
            source: source.into(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Provenance tag (`llm`, `news`)
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for StoryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Source: {}] {}", self.source, self.content)
    }
}

/// The live data source of an agent
pub enum DataSource {
    LocalModel(LocalModelSource),
    News(NewsSource),
}

impl DataSource {
    /// Construct the source for `kind`
    ///
    /// The local-model source runs backend selection; the news source
    /// resolves its API key. Both fail here, at construction, when their
    /// configuration or credentials are missing.
    pub async fn build(
        kind: SourceKind,
        config: &AppConfig,
        selector: &BackendSelector,
        env: &dyn Environment,
    ) -> Result<Self> {
        let settings = config
            .source(kind)
            .filter(|s| s.enabled)
            .ok_or_else(|| AgentError::SourceDisabled(kind.to_string()))?;

        match kind {
            SourceKind::Llm => {
                let selected = selector.select(&config.fallback_sequence).await?;
                let template = match settings.config.get("template") {
                    Some(raw) => raw.parse()?,
                    None => StoryTemplate::default(),
                };
                Ok(DataSource::LocalModel(LocalModelSource::new(selected, template)))
            }
            SourceKind::News => Ok(DataSource::News(NewsSource::from_config(&settings.config, env)?)),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            DataSource::LocalModel(_) => SourceKind::Llm,
            DataSource::News(_) => SourceKind::News,
        }
    }

    /// Produce a story for `prompt`, or `None` on any failure
    pub async fn generate_story(&self, prompt: &str) -> Option<StoryResponse> {
        match self {
            DataSource::LocalModel(source) => source.generate_story(prompt).await,
            DataSource::News(source) => source.generate_story(prompt).await,
        }
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::LocalModel(source) => f
                .debug_tuple("LocalModel")
                .field(&source.backend_id())
                .finish(),
            DataSource::News(_) => f.write_str("News"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::BackendLoader;
    use crate::probe::CapabilityProbe;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct NeverLoads;

    #[async_trait::async_trait]
    impl BackendLoader for NeverLoads {
        async fn load(
            &self,
            backend_id: &str,
            _descriptor: &crate::config::BackendDescriptor,
        ) -> anyhow::Result<Box<dyn crate::llm::TextGenerator>> {
            anyhow::bail!("cannot load {}", backend_id)
        }
    }

    fn selector(config: &AppConfig) -> BackendSelector {
        let probe = CapabilityProbe::new(Arc::new(config.models.clone()), u64::MAX);
        BackendSelector::new(probe, Arc::new(NeverLoads))
    }

    #[test]
    fn test_blank_content_is_not_a_story() {
        assert!(StoryResponse::new("", "llm").is_none());
        assert!(StoryResponse::new(" \n\t", "llm").is_none());
        let story = StoryResponse::new("It happened.", "llm").unwrap();
        assert_eq!(story.content(), "It happened.");
        assert_eq!(story.source(), "llm");
        assert_eq!(story.to_string(), "[Source: llm] It happened.");
    }

    #[tokio::test]
    async fn test_disabled_source_is_rejected() {
        let mut config = AppConfig::load().unwrap();
        config.sources.get_mut("news").unwrap().enabled = false;
        let env: HashMap<String, String> = HashMap::new();

        let err = DataSource::build(SourceKind::News, &config, &selector(&config), &env)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::SourceDisabled(ref token) if token == "news"));
    }

    #[tokio::test]
    async fn test_news_source_requires_api_key() {
        let config = AppConfig::load().unwrap();
        let env: HashMap<String, String> = HashMap::new();

        let err = DataSource::build(SourceKind::News, &config, &selector(&config), &env)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MissingEnvironment { ref names } if names == &["NEWS_API_KEY"]));
    }

    #[tokio::test]
    async fn test_news_source_builds_with_key() {
        let config = AppConfig::load().unwrap();
        let env = HashMap::from([("NEWS_API_KEY".to_string(), "abc123".to_string())]);

        let source = DataSource::build(SourceKind::News, &config, &selector(&config), &env)
            .await
            .unwrap();
        assert_eq!(source.kind(), SourceKind::News);
    }

    #[tokio::test]
    async fn test_llm_source_without_loadable_backend_fails() {
        let config = AppConfig::load().unwrap();
        let env: HashMap<String, String> = HashMap::new();

        let err = DataSource::build(SourceKind::Llm, &config, &selector(&config), &env)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoEligibleBackend { .. }));
    }
}
