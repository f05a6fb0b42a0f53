//! Whole-deck accessibility audit.
//!
//! Scoring starts at 100 and loses 10 points per error and 3 per warning,
//! never dropping below zero.

use std::collections::HashMap;

use deckwright_config::AuditThresholds;
use serde::Serialize;

use crate::advisory::{effective_font_size, text_contrast};
use crate::color;
use crate::model::{Document, ShapeKind};
use crate::report::{Finding, FindingCode, Severity, Status};

const ERROR_PENALTY: u32 = 10;
const WARNING_PENALTY: u32 = 3;
const PERFECT_SCORE: u32 = 100;

/// Findings for one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideFindings {
    /// Slide index.
    pub index: usize,
    /// Slide title, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Findings in discovery order.
    pub findings: Vec<Finding>,
}

/// Totals across the deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    /// Error-level findings.
    pub errors: usize,
    /// Warning-level findings.
    pub warnings: usize,
    /// Informational findings.
    pub info: usize,
}

/// Result of [`audit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessibilityReport {
    /// `success` when clean, otherwise `warning`.
    pub status: Status,
    /// Score in `[0, 100]`.
    pub score: u32,
    /// Slides audited.
    pub slide_count: usize,
    /// Per-slide findings; slides without findings are omitted.
    pub slides: Vec<SlideFindings>,
    /// Totals.
    pub summary: AuditSummary,
}

/// Computes the score for the given totals.
#[must_use]
pub fn score(summary: AuditSummary) -> u32 {
    let errors = u32::try_from(summary.errors).unwrap_or(u32::MAX);
    let warnings = u32::try_from(summary.warnings).unwrap_or(u32::MAX);
    PERFECT_SCORE
        .saturating_sub(errors.saturating_mul(ERROR_PENALTY))
        .saturating_sub(warnings.saturating_mul(WARNING_PENALTY))
}

/// Audits every slide of `document`.
#[must_use]
pub fn audit(document: &Document, thresholds: AuditThresholds) -> AccessibilityReport {
    let mut titles: HashMap<String, usize> = HashMap::new();
    let mut slides = Vec::with_capacity(document.slides.len());

    for (index, slide) in document.slides.iter().enumerate() {
        let mut findings = Vec::new();
        let title = slide.title();

        match &title {
            None => findings.push(
                Finding::error(FindingCode::MissingTitle, "slide has no title")
                    .on_slide(index),
            ),
            Some(text) => {
                let key = text.trim().to_lowercase();
                if let Some(first) = titles.get(&key) {
                    findings.push(
                        Finding::warning(
                            FindingCode::DuplicateTitle,
                            format!("title '{text}' repeats the title of slide {first}"),
                        )
                        .on_slide(index),
                    );
                } else {
                    titles.insert(key, index);
                }
            }
        }

        if let Some(title_index) = slide.title_index()
            && title_index != 0
        {
            findings.push(
                Finding::warning(
                    FindingCode::ReadingOrder,
                    format!("title is shape {title_index}; screen readers expect it first"),
                )
                .on_slide(index)
                .on_shape(title_index),
            );
        }

        for (shape_index, shape) in slide.shapes.iter().enumerate() {
            if matches!(shape.kind, ShapeKind::Picture { .. })
                && shape.alt_text.as_deref().is_none_or(|alt| alt.trim().is_empty())
            {
                findings.push(
                    Finding::error(
                        FindingCode::MissingAltText,
                        format!("picture '{}' has no alternative text", shape.name),
                    )
                    .on_slide(index)
                    .on_shape(shape_index),
                );
            }

            if let Some(contrast) = text_contrast(document, slide, shape)
                && !contrast.passes()
            {
                findings.push(
                    Finding::error(
                        FindingCode::LowContrast,
                        format!(
                            "{} on {} has contrast {:.2}:1; at least {:.1}:1 required",
                            contrast.foreground,
                            contrast.background,
                            contrast.ratio,
                            color::required_ratio(contrast.large_text)
                        ),
                    )
                    .on_slide(index)
                    .on_shape(shape_index),
                );
            }

            let size = effective_font_size(shape);
            if shape.has_text() && size < f64::from(thresholds.min_font_size_pt) {
                findings.push(
                    Finding::warning(
                        FindingCode::FontTooSmall,
                        format!(
                            "text is {size}pt; at least {}pt is readable",
                            thresholds.min_font_size_pt
                        ),
                    )
                    .on_slide(index)
                    .on_shape(shape_index),
                );
            }
        }

        if !findings.is_empty() {
            slides.push(SlideFindings {
                index,
                title,
                findings,
            });
        }
    }

    let mut summary = AuditSummary::default();
    for finding in slides.iter().flat_map(|slide| &slide.findings) {
        match finding.severity {
            Severity::Error => summary.errors += 1,
            Severity::Warning => summary.warnings += 1,
            Severity::Info => summary.info += 1,
        }
    }

    AccessibilityReport {
        status: if slides.is_empty() {
            Status::Success
        } else {
            Status::Warning
        },
        score: score(summary),
        slide_count: document.slide_count(),
        slides,
        summary,
    }
}
