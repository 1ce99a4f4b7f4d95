//! Structured logging setup.
//!
//! The library only emits `tracing` events; the `tmerge` binary installs a
//! subscriber that writes them to stderr so that stdout stays reserved for
//! command output.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Environment variable holding a filter that takes precedence over config.
pub const ENV_LOG: &str = "TMERGE_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Install the global subscriber.
///
/// The filter comes from `TMERGE_LOG` when set, else from `[log] level`.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_env(ENV_LOG) {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        filter: level.to_string(),
        message: e.to_string(),
    })
}
