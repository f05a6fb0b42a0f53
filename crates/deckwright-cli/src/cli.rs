//! Command-line argument definitions.
//!
//! Each subcommand maps onto exactly one document session operation.
//! Structured payloads (positions, sizes, shape requests) are passed as JSON.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Slide deck editing with locking, versioning and approval gates.
#[derive(Parser, Debug)]
#[command(name = "deckwright", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Fails with `version_mismatch` unless the document is at this version.
    #[arg(long, global = true, value_name = "HASH")]
    pub(crate) expect_version: Option<String>,
    /// The operation to run.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Document addressed by every subcommand.
#[derive(Args, Debug, Clone)]
pub(crate) struct DocumentArg {
    /// Path to the deck.
    #[arg(value_name = "DECK")]
    pub(crate) path: PathBuf,
}

/// Approval token slot for destructive subcommands.
#[derive(Args, Debug, Clone)]
pub(crate) struct ApprovalArg {
    /// Token of the form `<prefix>:<scope>:<nonce>`.
    #[arg(long, value_name = "TOKEN")]
    pub(crate) approval: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Creates an empty deck.
    New {
        #[command(flatten)]
        document: DocumentArg,
        /// Canvas width in inches.
        #[arg(long, default_value_t = 10.0)]
        width: f64,
        /// Canvas height in inches.
        #[arg(long, default_value_t = 7.5)]
        height: f64,
    },
    /// Summarises the deck.
    Inspect {
        #[command(flatten)]
        document: DocumentArg,
    },
    /// Describes one slide and its shapes.
    Slide {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        index: usize,
    },
    /// Adds a slide built from a layout.
    AddSlide {
        #[command(flatten)]
        document: DocumentArg,
        /// Layout name.
        #[arg(long, default_value = "title-and-content")]
        layout: String,
        /// Insert position; appends when absent.
        #[arg(long)]
        at: Option<usize>,
    },
    /// Copies a slide to the position after it.
    DuplicateSlide {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        index: usize,
    },
    /// Moves a slide.
    MoveSlide {
        #[command(flatten)]
        document: DocumentArg,
        /// Current index.
        from: usize,
        /// Target index.
        to: usize,
    },
    /// Deletes a slide. Requires a `delete-slide` approval token.
    DeleteSlide {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        index: usize,
        #[command(flatten)]
        approval: ApprovalArg,
    },
    /// Sets a slide's title.
    SetTitle {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        index: usize,
        /// Title text.
        text: String,
    },
    /// Inserts a shape described by a JSON request.
    InsertShape {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        slide: usize,
        /// JSON object with `kind`, `position`, `size` and optional `text`,
        /// `style`, `name`, `alt_text` and `allow_offcanvas`.
        #[arg(value_name = "REQUEST")]
        request: String,
    },
    /// Moves and optionally resizes a shape.
    MoveShape {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        slide: usize,
        /// Shape index.
        shape: usize,
        /// JSON position, for example `{"type":"percentage","left":10,"top":20}`.
        #[arg(long, value_name = "JSON")]
        position: String,
        /// JSON size, for example `{"width":"50%","height":"auto"}`.
        #[arg(long, value_name = "JSON")]
        size: Option<String>,
        /// Suppresses off-canvas warnings.
        #[arg(long)]
        allow_offcanvas: bool,
    },
    /// Replaces a shape's text.
    SetText {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        slide: usize,
        /// Shape index.
        shape: usize,
        /// New text; newlines separate paragraphs.
        text: String,
    },
    /// Replaces a slide's speaker notes.
    SetNotes {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        index: usize,
        /// Notes text; empty clears them.
        text: String,
    },
    /// Removes a shape. Requires a `remove-shape` approval token.
    RemoveShape {
        #[command(flatten)]
        document: DocumentArg,
        /// Slide index.
        slide: usize,
        /// Shape index.
        shape: usize,
        #[command(flatten)]
        approval: ApprovalArg,
    },
    /// Replaces text across the deck. Requires a `replace-all` approval token.
    ReplaceAll {
        #[command(flatten)]
        document: DocumentArg,
        /// Text to find.
        find: String,
        /// Replacement text.
        replace: String,
        #[command(flatten)]
        approval: ApprovalArg,
    },
    /// Audits the deck for accessibility problems.
    CheckAccessibility {
        #[command(flatten)]
        document: DocumentArg,
    },
    /// Computes the WCAG contrast ratio of two colours.
    Contrast {
        /// Text colour, `#RRGGBB` or `#RGB`.
        foreground: String,
        /// Background colour.
        background: String,
        /// Applies the large-text threshold.
        #[arg(long)]
        large: bool,
    },
}

impl Command {
    /// Operation name used in result records.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::New { .. } => "new",
            Self::Inspect { .. } => "inspect",
            Self::Slide { .. } => "slide",
            Self::AddSlide { .. } => "add_slide",
            Self::DuplicateSlide { .. } => "duplicate_slide",
            Self::MoveSlide { .. } => "move_slide",
            Self::DeleteSlide { .. } => "delete_slide",
            Self::SetTitle { .. } => "set_title",
            Self::InsertShape { .. } => "insert_shape",
            Self::MoveShape { .. } => "reposition_shape",
            Self::SetText { .. } => "set_shape_text",
            Self::SetNotes { .. } => "set_notes",
            Self::RemoveShape { .. } => "remove_shape",
            Self::ReplaceAll { .. } => "replace_all_text",
            Self::CheckAccessibility { .. } => "check_accessibility",
            Self::Contrast { .. } => "contrast",
        }
    }
}
