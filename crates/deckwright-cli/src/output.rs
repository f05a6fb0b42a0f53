//! Result records and exit codes.

use std::io::Write;
use std::process::ExitCode;

use deckwright_core::{Disposition, ErrorReport, SessionError, Status};
use serde::Serialize;

use crate::AppError;

/// Exit code for a completed operation.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for a hard error.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code for an operation that completed with warnings.
pub const EXIT_WARNINGS: u8 = 2;
/// Exit code for a governance denial.
pub const EXIT_DENIED: u8 = 3;
/// Exit code for a retryable failure (`EX_TEMPFAIL`).
pub const EXIT_TEMPFAIL: u8 = 75;

/// A successful read wrapped with its status and operation name.
#[derive(Debug, Serialize)]
pub(crate) struct ReadRecord<T> {
    pub(crate) status: Status,
    pub(crate) operation: &'static str,
    #[serde(flatten)]
    pub(crate) result: T,
}

impl<T> ReadRecord<T> {
    pub(crate) const fn success(operation: &'static str, result: T) -> Self {
        Self {
            status: Status::Success,
            operation,
            result,
        }
    }
}

/// Exit code for a record with `status`.
pub(crate) const fn status_code(status: Status) -> u8 {
    match status {
        Status::Success => EXIT_SUCCESS,
        Status::Warning => EXIT_WARNINGS,
        Status::Error => EXIT_FAILURE,
    }
}

/// Exit code for a session failure.
pub(crate) const fn error_code(error: &SessionError) -> u8 {
    match error.disposition() {
        Disposition::Retryable => EXIT_TEMPFAIL,
        Disposition::Denied => EXIT_DENIED,
        Disposition::Requery | Disposition::Informational | Disposition::Fatal => EXIT_FAILURE,
    }
}

/// Writes `record` as JSON, pretty-printed for terminals.
pub(crate) fn emit<W, T>(stdout: &mut W, record: &T, pretty: bool) -> Result<(), AppError>
where
    W: Write,
    T: Serialize,
{
    let rendered = if pretty {
        serde_json::to_string_pretty(record)
    } else {
        serde_json::to_string(record)
    }
    .map_err(AppError::SerialiseRecord)?;
    writeln!(stdout, "{rendered}").map_err(AppError::EmitRecord)
}

/// Writes the error record for `error` and returns its exit code.
pub(crate) fn emit_error<W: Write>(
    stdout: &mut W,
    error: &SessionError,
    pretty: bool,
) -> Result<ExitCode, AppError> {
    emit(stdout, &ErrorReport::from(error), pretty)?;
    Ok(ExitCode::from(error_code(error)))
}
