//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise `observability.log_level` is used as
//! the filter directive. `log_format = "json"` selects machine-readable
//! output, anything else the human-readable formatter.

use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    EnvFilter,
};

use crate::config::ObservabilityConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("Logging already initialised: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if uses_json(config) {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}

fn uses_json(config: &ObservabilityConfig) -> bool {
    config.log_format.eq_ignore_ascii_case("json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        let mut config = ObservabilityConfig::default();
        assert!(!uses_json(&config));
        config.log_format = "JSON".into();
        assert!(uses_json(&config));
    }

    #[test]
    fn test_level_directive_parses() {
        assert!(EnvFilter::try_new("rewrite_proxy=debug,tower_http=info").is_ok());
        assert!(EnvFilter::try_new("info").is_ok());
    }
}
