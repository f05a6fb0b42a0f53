//! Structured logging set-up shared by every deckwright entry point.
//!
//! Diagnostics go to stderr so stdout stays reserved for result records.

use std::io::{self, IsTerminal};

use deckwright_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<LogFormat> = OnceCell::new();

/// Handle returned once logging is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the first successful initialisation.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter expression is invalid.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Rejected expression.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Parses a filter expression without installing anything.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for malformed directives.
pub fn parse_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter {
        filter: filter.to_owned(),
        message: error.to_string(),
    })
}

/// Installs the global subscriber on first call.
///
/// Later calls return the handle from the first installation and ignore
/// their configuration.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is malformed or a foreign
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install(config.log_filter(), config.log_format()))
        .map(|format| TelemetryHandle { format: *format })
}

fn install(filter: &str, format: LogFormat) -> Result<LogFormat, TelemetryError> {
    let filter = parse_filter(filter)?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(format)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("warn")]
    #[case("deckwright::lock=debug,info")]
    fn accepts_valid_filters(#[case] filter: &str) {
        assert!(parse_filter(filter).is_ok());
    }

    #[test]
    fn rejects_malformed_filter() {
        let error = parse_filter("deckwright=notalevel").expect_err("malformed");
        assert!(matches!(error, TelemetryError::Filter { .. }));
    }

    #[test]
    fn initialisation_is_idempotent() {
        let config = Config::default();
        let first = initialise(&config).expect("first initialisation");
        let second = initialise(&Config {
            log_format: LogFormat::Json,
            ..Config::default()
        })
        .expect("second initialisation");
        assert_eq!(first, second);
    }
}
