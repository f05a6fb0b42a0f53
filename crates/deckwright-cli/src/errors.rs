//! Failures that happen outside a document session.
//!
//! Session failures are reported as structured records on stdout; these are
//! reported as plain text on stderr because no record can be produced.

use std::io;
use std::sync::Arc;

use deckwright_core::telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to serialise the result record: {0}")]
    SerialiseRecord(serde_json::Error),
    #[error("failed to write the result record: {0}")]
    EmitRecord(io::Error),
}
