//! Advisory checks run after a mutation.
//!
//! Findings here never block a write. They are returned beside a successful
//! result so the caller can decide whether to follow up.

use deckwright_config::AuditThresholds;

use crate::color::{self, ContrastAssessment};
use crate::model::{Document, PlaceholderRole, Shape, ShapeKind, Slide};
use crate::report::{Finding, FindingCode};

/// Font size assumed for text without an explicit size.
pub const DEFAULT_FONT_SIZE_PT: f64 = 18.0;

/// Warnings and recommendations gathered for one edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advice {
    /// Non-fatal findings.
    pub warnings: Vec<Finding>,
    /// Suggestions.
    pub recommendations: Vec<String>,
}

impl Advice {
    fn merge(&mut self, other: Self) {
        self.warnings.extend(other.warnings);
        self.recommendations.extend(other.recommendations);
    }
}

/// Assesses text contrast for a shape against its effective background.
///
/// Returns `None` for shapes without text.
#[must_use]
pub fn text_contrast(
    document: &Document,
    slide: &Slide,
    shape: &Shape,
) -> Option<ContrastAssessment> {
    if !shape.has_text() {
        return None;
    }
    let background = shape
        .style
        .fill
        .unwrap_or_else(|| document.slide_background(slide));
    let size = effective_font_size(shape);
    let large = color::is_large_text(size, shape.style.text.bold);
    Some(ContrastAssessment::assess(shape.text_color(), background, large))
}

/// Font size of a shape's text in points.
#[must_use]
pub fn effective_font_size(shape: &Shape) -> f64 {
    shape.style.text.size_pt.unwrap_or(DEFAULT_FONT_SIZE_PT)
}

fn is_body_text(shape: &Shape) -> bool {
    matches!(shape.kind, ShapeKind::TextBox) || shape.role() == Some(PlaceholderRole::Body)
}

/// Runs style guideline checks with the configured thresholds.
#[derive(Debug, Clone, Copy)]
pub struct Advisor {
    thresholds: AuditThresholds,
}

impl Advisor {
    /// Creates an advisor.
    #[must_use]
    pub const fn new(thresholds: AuditThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in force.
    #[must_use]
    pub const fn thresholds(&self) -> AuditThresholds {
        self.thresholds
    }

    /// Reviews every shape on a slide.
    #[must_use]
    pub fn review_slide(&self, document: &Document, slide_index: usize) -> Advice {
        let mut advice = Advice::default();
        let Some(slide) = document.slides.get(slide_index) else {
            return advice;
        };
        for shape_index in 0..slide.shapes.len() {
            advice.merge(self.review_shape(document, slide_index, shape_index));
        }
        advice
    }

    /// Reviews one shape.
    #[must_use]
    pub fn review_shape(
        &self,
        document: &Document,
        slide_index: usize,
        shape_index: usize,
    ) -> Advice {
        let mut advice = Advice::default();
        let Some(slide) = document.slides.get(slide_index) else {
            return advice;
        };
        let Some(shape) = slide.shapes.get(shape_index) else {
            return advice;
        };
        if let Some(contrast) = text_contrast(document, slide, shape)
            && !contrast.passes()
        {
            advice.warnings.push(
                Finding::warning(
                    FindingCode::LowContrast,
                    format!(
                        "text contrast {:.2}:1 is below the WCAG AA minimum of {:.1}:1",
                        contrast.ratio,
                        color::required_ratio(contrast.large_text)
                    ),
                )
                .on_slide(slide_index)
                .on_shape(shape_index),
            );
            let better = color::best_text_color(contrast.background);
            advice.recommendations.push(format!(
                "use {better} text on {} for a contrast of {:.2}:1",
                contrast.background,
                color::contrast_ratio(better, contrast.background)
            ));
        }

        let paragraphs = shape.paragraphs.iter().filter(|p| !p.trim().is_empty()).count();
        if is_body_text(shape) && paragraphs > self.thresholds.max_bullets_per_slide {
            advice.warnings.push(
                Finding::warning(
                    FindingCode::TooManyBullets,
                    format!(
                        "{paragraphs} bullets exceed the guideline of {}",
                        self.thresholds.max_bullets_per_slide
                    ),
                )
                .on_slide(slide_index)
                .on_shape(shape_index),
            );
            advice
                .recommendations
                .push(String::from("split the content across additional slides"));
        }

        if shape.role().is_some_and(PlaceholderRole::is_title) {
            let length = shape.plain_text().chars().count();
            if length > self.thresholds.max_title_length {
                advice.warnings.push(
                    Finding::warning(
                        FindingCode::TitleTooLong,
                        format!(
                            "title has {length} characters; the guideline is {}",
                            self.thresholds.max_title_length
                        ),
                    )
                    .on_slide(slide_index)
                    .on_shape(shape_index),
                );
            }
        }

        let size = effective_font_size(shape);
        if shape.has_text() && size < f64::from(self.thresholds.min_font_size_pt) {
            advice.warnings.push(
                Finding::warning(
                    FindingCode::FontTooSmall,
                    format!(
                        "font size {size}pt is below the readable minimum of {}pt",
                        self.thresholds.min_font_size_pt
                    ),
                )
                .on_slide(slide_index)
                .on_shape(shape_index),
            );
        }

        if matches!(shape.kind, ShapeKind::Picture { .. })
            && shape.alt_text.as_deref().is_none_or(|alt| alt.trim().is_empty())
        {
            advice.recommendations.push(format!(
                "add alternative text to picture '{}' on slide {slide_index}",
                shape.name
            ));
        }

        advice
    }
}
