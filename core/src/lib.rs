pub mod agent;
pub mod backend;
pub mod config;
pub mod destination;
pub mod error;
pub mod llm;
pub mod output;
pub mod preflight;
pub mod probe;
pub mod processor;
pub mod prompt;
pub mod source;
pub mod util;

// Re-exports for convenience
pub use agent::{Agent, RunOptions};
pub use config::AppConfig;
pub use error::{AgentError, Result};
