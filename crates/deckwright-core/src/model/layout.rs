//! Slide layouts and the placeholders they stamp onto new slides.

use serde::{Deserialize, Serialize};

use super::{ModelError, PlaceholderRole, Shape, ShapeKind, ShapeStyle, TextStyle};
use crate::geometry::{Canvas, Rect};

/// A placeholder a layout contributes to every slide built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPlaceholder {
    /// Semantic role.
    pub role: PlaceholderRole,
    /// Frame in inches.
    pub frame: Rect,
    /// Default font size in points.
    pub font_size_pt: f64,
}

/// A named slide template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Layout name, such as `title-and-content`.
    pub name: String,
    /// Placeholders in paint order.
    pub placeholders: Vec<LayoutPlaceholder>,
}

impl Layout {
    /// Builds the placeholder shapes for a new slide, allocating shape ids
    /// from `allocate`.
    ///
    /// # Errors
    ///
    /// Propagates identifier exhaustion from `allocate`.
    pub fn instantiate<F>(&self, mut allocate: F) -> Result<Vec<Shape>, ModelError>
    where
        F: FnMut() -> Result<super::ShapeId, ModelError>,
    {
        let mut shapes = Vec::with_capacity(self.placeholders.len());
        for (idx, placeholder) in (0_u32..).zip(&self.placeholders) {
            shapes.push(Shape {
                id: allocate()?,
                name: format!("{} {}", display_name(placeholder.role), idx + 1),
                kind: ShapeKind::Placeholder {
                    ph_type: placeholder.role.ph_type().to_owned(),
                    idx,
                },
                frame: placeholder.frame,
                style: ShapeStyle {
                    text: TextStyle {
                        size_pt: Some(placeholder.font_size_pt),
                        ..TextStyle::default()
                    },
                    ..ShapeStyle::default()
                },
                paragraphs: Vec::new(),
                alt_text: None,
            });
        }
        Ok(shapes)
    }
}

const fn display_name(role: PlaceholderRole) -> &'static str {
    match role {
        PlaceholderRole::Title => "Title",
        PlaceholderRole::Subtitle => "Subtitle",
        PlaceholderRole::Body => "Content",
        PlaceholderRole::Footer => "Footer",
        PlaceholderRole::SlideNumber => "Slide Number",
        PlaceholderRole::Date => "Date",
        PlaceholderRole::Picture => "Picture",
        PlaceholderRole::Chart => "Chart",
        PlaceholderRole::Table => "Table",
        PlaceholderRole::Other => "Placeholder",
    }
}

fn fractional(canvas: Canvas, left: f64, top: f64, width: f64, height: f64) -> Rect {
    Rect::new(
        canvas.width() * left,
        canvas.height() * top,
        canvas.width() * width,
        canvas.height() * height,
    )
}

fn placeholder(
    role: PlaceholderRole,
    frame: Rect,
    font_size_pt: f64,
) -> LayoutPlaceholder {
    LayoutPlaceholder {
        role,
        frame,
        font_size_pt,
    }
}

/// Layouts every new document starts with, scaled to `canvas`.
#[must_use]
pub fn builtin_layouts(canvas: Canvas) -> Vec<Layout> {
    vec![
        Layout {
            name: String::from("title"),
            placeholders: vec![
                placeholder(
                    PlaceholderRole::Title,
                    fractional(canvas, 0.075, 0.31, 0.85, 0.21),
                    44.0,
                ),
                placeholder(
                    PlaceholderRole::Subtitle,
                    fractional(canvas, 0.15, 0.57, 0.7, 0.25),
                    32.0,
                ),
            ],
        },
        Layout {
            name: String::from("title-and-content"),
            placeholders: vec![
                placeholder(
                    PlaceholderRole::Title,
                    fractional(canvas, 0.05, 0.04, 0.9, 0.17),
                    44.0,
                ),
                placeholder(
                    PlaceholderRole::Body,
                    fractional(canvas, 0.05, 0.23, 0.9, 0.66),
                    28.0,
                ),
            ],
        },
        Layout {
            name: String::from("section-header"),
            placeholders: vec![
                placeholder(
                    PlaceholderRole::Title,
                    fractional(canvas, 0.079, 0.64, 0.85, 0.2),
                    40.0,
                ),
                placeholder(
                    PlaceholderRole::Body,
                    fractional(canvas, 0.079, 0.42, 0.85, 0.22),
                    20.0,
                ),
            ],
        },
        Layout {
            name: String::from("blank"),
            placeholders: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeId;

    #[test]
    fn builtin_layouts_fit_the_canvas() {
        let canvas = Canvas::STANDARD;
        for layout in builtin_layouts(canvas) {
            for placeholder in &layout.placeholders {
                assert!(placeholder.frame.right() <= canvas.width(), "{}", layout.name);
                assert!(placeholder.frame.bottom() <= canvas.height(), "{}", layout.name);
            }
        }
    }

    #[test]
    fn instantiate_numbers_placeholders_and_allocates_ids() {
        let layouts = builtin_layouts(Canvas::STANDARD);
        let layout = layouts
            .iter()
            .find(|layout| layout.name == "title-and-content")
            .expect("layout");
        let mut next = 10;
        let shapes = layout
            .instantiate(|| {
                next += 1;
                Ok(ShapeId::new(next))
            })
            .expect("instantiate");
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes.first().and_then(Shape::role), Some(PlaceholderRole::Title));
        assert_eq!(shapes.get(1).map(|s| s.id), Some(ShapeId::new(12)));
    }
}
