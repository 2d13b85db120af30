//! Publishing destinations
//!
//! Destinations are built fresh for every publish attempt from their config
//! table and the environment. Building fails on missing config keys or
//! credentials; posting never fails loudly and reports success as a bool.

pub mod dry_run;
pub mod microblog;
pub mod thread;

pub use dry_run::DryRunDestination;
pub use microblog::{MicroblogClient, MicroblogDestination, PostRecord, TwitterClient};
pub use thread::ThreadDestination;

use crate::config::{require_keys, ComponentConfig, DestinationKind};
use crate::error::{AgentError, Result};
use crate::preflight::Environment;

#[derive(Debug)]
pub enum Destination {
    DryRun(DryRunDestination),
    Thread(ThreadDestination),
    Microblog(MicroblogDestination),
}

impl Destination {
    pub fn build(kind: DestinationKind, config: &ComponentConfig, env: &dyn Environment) -> Result<Self> {
        let destination = match kind {
            DestinationKind::DryRun => Destination::DryRun(DryRunDestination),
            DestinationKind::Thread => Destination::Thread(ThreadDestination::from_config(config, env)?),
            DestinationKind::Microblog => {
                Destination::Microblog(MicroblogDestination::from_config(config, env)?)
            }
        };
        tracing::debug!("Built {} destination", kind);
        Ok(destination)
    }

    pub fn kind(&self) -> DestinationKind {
        match self {
            Destination::DryRun(_) => DestinationKind::DryRun,
            Destination::Thread(_) => DestinationKind::Thread,
            Destination::Microblog(_) => DestinationKind::Microblog,
        }
    }

    /// Publish `content`; `true` on success
    pub async fn post(&self, content: &str) -> bool {
        match self {
            Destination::DryRun(d) => d.post(content),
            Destination::Thread(d) => d.post(content).await,
            Destination::Microblog(d) => d.post(content).await,
        }
    }
}

/// Resolve the credentials named by `keys` in `config`
///
/// Each key holds the name of an environment variable. All unset variables
/// are reported together.
pub(crate) fn resolve_credentials(
    component: &str,
    config: &ComponentConfig,
    env: &dyn Environment,
    keys: &[&str],
) -> Result<Vec<String>> {
    require_keys(component, config, keys)?;

    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();
    for key in keys {
        let name = &config[*key];
        match env.var(name) {
            Some(value) => values.push(value.trim().to_string()),
            None => missing.push(name.clone()),
        }
    }

    if !missing.is_empty() {
        tracing::error!("Missing {} API credentials: {}", component, missing.join(", "));
        return Err(AgentError::MissingEnvironment { names: missing });
    }
    Ok(values)
}
