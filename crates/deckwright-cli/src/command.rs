//! Maps parsed subcommands onto document session operations.

use std::path::Path;

use deckwright_core::accessibility::AccessibilityReport;
use deckwright_core::color::{ContrastAssessment, Rgb};
use deckwright_core::geometry::{Canvas, PositionSpec, SizeSpec};
use deckwright_core::session::{DeckSummary, SlideSummary};
use deckwright_core::{
    Approval, DocumentSession, LockMode, OperationReport, SessionError, SessionOptions,
    ShapeRequest, Status, VersionHash,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cli::Command;

const CLI_TARGET: &str = "deckwright::cli";

/// What a subcommand produced.
#[derive(Debug)]
pub(crate) enum Outcome {
    Mutation(OperationReport),
    Deck(DeckSummary),
    Slide(SlideSummary),
    Accessibility(AccessibilityReport),
    Contrast(ContrastAssessment),
}

impl Outcome {
    pub(crate) const fn status(&self) -> Status {
        match self {
            Self::Mutation(report) => report.status,
            Self::Accessibility(report) => report.status,
            Self::Deck(_) | Self::Slide(_) | Self::Contrast(_) => Status::Success,
        }
    }
}

fn parse_json<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T, SessionError> {
    serde_json::from_str(raw)
        .map_err(|error| SessionError::InvalidArgument(format!("invalid {what} JSON: {error}")))
}

fn parse_version(raw: &str) -> Result<VersionHash, SessionError> {
    raw.parse().map_err(|error| {
        SessionError::InvalidArgument(format!("invalid --expect-version: {error}"))
    })
}

fn read<T, F>(path: &Path, options: SessionOptions, view: F) -> Result<T, SessionError>
where
    F: FnOnce(&mut DocumentSession) -> Result<T, SessionError>,
{
    let mut session = DocumentSession::open(path, LockMode::Shared, options)?;
    let result = view(&mut session)?;
    session.close()?;
    Ok(result)
}

fn mutate<F>(
    path: &Path,
    options: SessionOptions,
    expected: Option<&str>,
    edit: F,
) -> Result<Outcome, SessionError>
where
    F: FnOnce(&mut DocumentSession) -> Result<OperationReport, SessionError>,
{
    let expected = expected.map(parse_version).transpose()?;
    let mut session = DocumentSession::open(path, LockMode::Exclusive, options)?;
    if let Some(version) = expected {
        session.expect_version(version);
    }
    let report = edit(&mut session)?;
    session.close()?;
    Ok(Outcome::Mutation(report))
}

/// Runs `command` to completion.
pub(crate) fn execute(
    command: Command,
    expected: Option<&str>,
    options: SessionOptions,
) -> Result<Outcome, SessionError> {
    debug!(target: CLI_TARGET, operation = command.name(), "executing");
    match command {
        Command::New {
            document,
            width,
            height,
        } => {
            let canvas = Canvas::new(width, height)?;
            let mut session = DocumentSession::create(&document.path, canvas, options)?;
            let summary = session.inspect();
            session.close()?;
            Ok(Outcome::Deck(summary))
        }
        Command::Inspect { document } => {
            read(&document.path, options, |session| Ok(session.inspect())).map(Outcome::Deck)
        }
        Command::Slide { document, index } => {
            read(&document.path, options, |session| session.slide_summary(index))
                .map(Outcome::Slide)
        }
        Command::CheckAccessibility { document } => read(&document.path, options, |session| {
            Ok(session.check_accessibility())
        })
        .map(Outcome::Accessibility),
        Command::AddSlide {
            document,
            layout,
            at,
        } => mutate(&document.path, options, expected, |session| {
            session.add_slide(&layout, at)
        }),
        Command::DuplicateSlide { document, index } => {
            mutate(&document.path, options, expected, |session| {
                session.duplicate_slide(index)
            })
        }
        Command::MoveSlide { document, from, to } => {
            mutate(&document.path, options, expected, |session| {
                session.move_slide(from, to)
            })
        }
        Command::DeleteSlide {
            document,
            index,
            approval,
        } => mutate(&document.path, options, expected, |session| {
            session.delete_slide(index, Approval::from(approval.approval.as_deref()))
        }),
        Command::SetTitle {
            document,
            index,
            text,
        } => mutate(&document.path, options, expected, |session| {
            session.set_title(index, &text)
        }),
        Command::InsertShape {
            document,
            slide,
            request,
        } => {
            let request: ShapeRequest = parse_json("shape request", &request)?;
            mutate(&document.path, options, expected, |session| {
                session.insert_shape(slide, request)
            })
        }
        Command::MoveShape {
            document,
            slide,
            shape,
            position,
            size,
            allow_offcanvas,
        } => {
            let position: PositionSpec = parse_json("position", &position)?;
            let size: Option<SizeSpec> = size
                .as_deref()
                .map(|raw| parse_json("size", raw))
                .transpose()?;
            mutate(&document.path, options, expected, |session| {
                session.reposition_shape(slide, shape, &position, size.as_ref(), allow_offcanvas)
            })
        }
        Command::SetText {
            document,
            slide,
            shape,
            text,
        } => mutate(&document.path, options, expected, |session| {
            session.set_shape_text(slide, shape, &text)
        }),
        Command::SetNotes {
            document,
            index,
            text,
        } => mutate(&document.path, options, expected, |session| {
            session.set_notes(index, &text)
        }),
        Command::RemoveShape {
            document,
            slide,
            shape,
            approval,
        } => mutate(&document.path, options, expected, |session| {
            session.remove_shape(slide, shape, Approval::from(approval.approval.as_deref()))
        }),
        Command::ReplaceAll {
            document,
            find,
            replace,
            approval,
        } => mutate(&document.path, options, expected, |session| {
            session.replace_all_text(&find, &replace, Approval::from(approval.approval.as_deref()))
        }),
        Command::Contrast {
            foreground,
            background,
            large,
        } => {
            let foreground: Rgb = foreground.parse()?;
            let background: Rgb = background.parse()?;
            Ok(Outcome::Contrast(ContrastAssessment::assess(
                foreground, background, large,
            )))
        }
    }
}
