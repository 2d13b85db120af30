//! Logging setup
//!
//! `RUST_LOG` wins over the configured level unless `--verbose` is given.

use social_agent_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Full => builder.init(),
        LogFormat::Compact => builder.compact().with_target(false).init(),
    }
}
