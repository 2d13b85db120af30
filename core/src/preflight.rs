//! Environment checks that run before any component is built

use std::collections::HashMap;

use crate::config::{AppConfig, DestinationKind, SourceKind};

/// Read access to environment variables
pub trait Environment: Send + Sync {
    /// Value of `name`; unset and empty values are both `None`
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment (after `.env` has been applied)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Names of the variables the chosen source and destination need
///
/// Variable names come from the component config tables, falling back to
/// the conventional names when a table omits them.
pub fn required_environment(config: &AppConfig, source: SourceKind, destination: DestinationKind) -> Vec<String> {
    let mut names = Vec::new();

    if source == SourceKind::News && config.source_enabled(SourceKind::News) {
        let news = config.source(SourceKind::News).map(|s| &s.config);
        names.push(
            news.and_then(|c| c.get("api_key_env"))
                .cloned()
                .unwrap_or_else(|| "NEWS_API_KEY".to_string()),
        );
    }

    let dest = config.destination_config(destination);
    let mut env_name = |key: &str, fallback: &str| {
        names.push(dest.get(key).cloned().unwrap_or_else(|| fallback.to_string()));
    };
    match destination {
        DestinationKind::DryRun => {}
        DestinationKind::Thread => {
            env_name("user_id_env", "THREADS_USER_ID");
            env_name("access_token_env", "THREADS_ACCESS_TOKEN");
        }
        DestinationKind::Microblog => {
            env_name("api_key_env", "TWITTER_API_KEY");
            env_name("api_secret_env", "TWITTER_API_SECRET");
        }
    }

    names
}

/// Every required variable that `env` does not provide, in check order
pub fn missing_environment(
    config: &AppConfig,
    source: SourceKind,
    destination: DestinationKind,
    env: &dyn Environment,
) -> Vec<String> {
    let missing: Vec<String> = required_environment(config, source, destination)
        .into_iter()
        .filter(|name| env.var(name).is_none())
        .collect();

    if !missing.is_empty() {
        tracing::warn!("Missing required environment variables: {}", missing.join(", "));
    }
    missing
}
