//! Logging setup for the `policydoc` binary.
//!
//! Events from the mapping and eval crates go to stderr so that stdout
//! carries only resolved values and JSON output.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

pub(crate) const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub(crate) enum TelemetryError {
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: ParseError,
    },

    #[error("could not install the log subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the stderr subscriber. `RUST_LOG` wins over `level`.
pub(crate) fn init(level: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}

/// Filter for a configured level such as `info` or `policydoc_eval=debug`.
fn level_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level).map_err(|source| TelemetryError::Filter {
        filter: level.to_string(),
        source,
    })
}
