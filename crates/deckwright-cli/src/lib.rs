//! Command-line runtime for deckwright.
//!
//! One invocation performs one document operation and prints one JSON result
//! record on stdout. The exit code tells the caller how the operation ended
//! without parsing the record: see [`output`] for the mapping.
//!
//! The runtime is generic over its IO streams and configuration loader so
//! tests can drive it without a subprocess.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use deckwright_core::{SessionError, SessionOptions, telemetry};

mod cli;
mod command;
mod config;
mod errors;
pub mod output;

use cli::Cli;
use command::Outcome;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;
use output::{ReadRecord, emit, emit_error, status_code};

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    stdout: &'a mut W,
    stderr: &'a mut E,
    stdout_is_terminal: bool,
    loader: &'a L,
}

impl<W, E, L> CliRunner<'_, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn run(&mut self, args: &[OsString]) -> ExitCode {
        match self.try_run(args) {
            Ok(code) => code,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                // Help and version output.
                write!(self.stdout, "{error}").ok();
                ExitCode::SUCCESS
            }
            Err(error) => {
                writeln!(self.stderr, "deckwright: {error}").ok();
                ExitCode::from(output::EXIT_FAILURE)
            }
        }
    }

    fn try_run(&mut self, args: &[OsString]) -> Result<ExitCode, AppError> {
        let split = split_config_arguments(args);
        let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
        let config = self.loader.load(&split.config_arguments)?;
        telemetry::initialise(&config)?;

        let pretty = self.stdout_is_terminal;
        let operation = cli.command.name();
        let outcome = SessionOptions::from_config(&config).and_then(|options| {
            command::execute(cli.command, cli.expect_version.as_deref(), options)
        });
        match outcome {
            Ok(outcome) => {
                let status = outcome.status();
                self.emit_outcome(operation, outcome, pretty)?;
                Ok(ExitCode::from(status_code(status)))
            }
            Err(error) => self.report_failure(operation, &error, pretty),
        }
    }

    fn emit_outcome(
        &mut self,
        operation: &'static str,
        outcome: Outcome,
        pretty: bool,
    ) -> Result<(), AppError> {
        match outcome {
            Outcome::Mutation(report) => emit(&mut *self.stdout, &report, pretty),
            Outcome::Accessibility(report) => emit(&mut *self.stdout, &report, pretty),
            Outcome::Deck(summary) => {
                emit(&mut *self.stdout, &ReadRecord::success(operation, summary), pretty)
            }
            Outcome::Slide(summary) => {
                emit(&mut *self.stdout, &ReadRecord::success(operation, summary), pretty)
            }
            Outcome::Contrast(assessment) => emit(
                &mut *self.stdout,
                &ReadRecord::success(operation, assessment),
                pretty,
            ),
        }
    }

    fn report_failure(
        &mut self,
        operation: &'static str,
        error: &SessionError,
        pretty: bool,
    ) -> Result<ExitCode, AppError> {
        tracing::debug!(
            target: "deckwright::cli",
            operation,
            kind = %error.kind(),
            "operation failed"
        );
        emit_error(&mut *self.stdout, error, pretty)
    }
}

/// Runs the CLI with the given arguments and streams.
///
/// `stdout_is_terminal` selects pretty-printed records.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E, stdout_is_terminal: bool) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut runner = CliRunner {
        stdout,
        stderr,
        stdout_is_terminal,
        loader: &OrthoConfigLoader,
    };
    let args: Vec<OsString> = args.into_iter().collect();
    runner.run(&args)
}
