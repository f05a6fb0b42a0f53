//! Position idioms and their reference points.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::{Canvas, CoordinateError, Length, Point};

/// One of the nine named reference points on the canvas.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Anchor {
    /// Top-left corner.
    TopLeft,
    /// Midpoint of the top edge.
    TopCenter,
    /// Top-right corner.
    TopRight,
    /// Midpoint of the left edge.
    MiddleLeft,
    /// Centre of the canvas.
    Center,
    /// Midpoint of the right edge.
    MiddleRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Midpoint of the bottom edge.
    BottomCenter,
    /// Bottom-right corner.
    BottomRight,
}

impl Anchor {
    /// Horizontal and vertical fractions of the canvas this anchor sits at.
    #[must_use]
    pub const fn fractions(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::MiddleLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::MiddleRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }

    /// The anchor's point on `canvas`.
    #[must_use]
    pub fn point_on(self, canvas: Canvas) -> Point {
        let (fx, fy) = self.fractions();
        Point::new(canvas.width() * fx, canvas.height() * fy)
    }
}

/// How a caller expresses where a shape goes.
///
/// Serialised with a `type` tag, for example
/// `{"type": "anchor", "point": "bottom_right", "offset_x": "-1in"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSpec {
    /// Percentages of the canvas width and height.
    Percentage {
        /// Horizontal percentage.
        left: f64,
        /// Vertical percentage.
        top: f64,
    },
    /// Physical distances from the top-left corner.
    Absolute {
        /// Horizontal distance.
        left: Length,
        /// Vertical distance.
        top: Length,
    },
    /// A named canvas anchor plus physical offsets.
    Anchor {
        /// Anchor on the canvas.
        point: Anchor,
        /// Horizontal offset from the anchor.
        #[serde(default)]
        offset_x: Length,
        /// Vertical offset from the anchor.
        #[serde(default)]
        offset_y: Length,
    },
    /// The top-left corner of a cell in a square grid.
    Grid {
        /// Zero-based row.
        row: u32,
        /// Zero-based column.
        col: u32,
        /// Cells per side.
        grid_size: u32,
    },
}

pub(super) fn reference_point(
    spec: &PositionSpec,
    canvas: Canvas,
) -> Result<Point, CoordinateError> {
    match *spec {
        PositionSpec::Percentage { left, top } => {
            let left = finite(left, "left")?;
            let top = finite(top, "top")?;
            Ok(Point::new(
                canvas.width() * left / 100.0,
                canvas.height() * top / 100.0,
            ))
        }
        PositionSpec::Absolute { left, top } => Ok(Point::new(
            left.finite_inches("left")?,
            top.finite_inches("top")?,
        )),
        PositionSpec::Anchor {
            point,
            offset_x,
            offset_y,
        } => {
            let origin = point.point_on(canvas);
            Ok(Point::new(
                origin.x + offset_x.finite_inches("offset_x")?,
                origin.y + offset_y.finite_inches("offset_y")?,
            ))
        }
        PositionSpec::Grid {
            row,
            col,
            grid_size,
        } => {
            check_cell(row, col, grid_size)?;
            let (cell_width, cell_height) = cell_extent(canvas, grid_size);
            Ok(Point::new(
                f64::from(col) * cell_width,
                f64::from(row) * cell_height,
            ))
        }
    }
}

pub(super) fn reexpress(
    template: &PositionSpec,
    point: Point,
    canvas: Canvas,
) -> Result<PositionSpec, CoordinateError> {
    let x = finite(point.x, "x")?;
    let y = finite(point.y, "y")?;
    match *template {
        PositionSpec::Percentage { .. } => Ok(PositionSpec::Percentage {
            left: x / canvas.width() * 100.0,
            top: y / canvas.height() * 100.0,
        }),
        PositionSpec::Absolute { left, top } => Ok(PositionSpec::Absolute {
            left: Length::from_inches(x, left.unit),
            top: Length::from_inches(y, top.unit),
        }),
        PositionSpec::Anchor {
            point: anchor,
            offset_x,
            offset_y,
        } => {
            let origin = anchor.point_on(canvas);
            Ok(PositionSpec::Anchor {
                point: anchor,
                offset_x: Length::from_inches(x - origin.x, offset_x.unit),
                offset_y: Length::from_inches(y - origin.y, offset_y.unit),
            })
        }
        PositionSpec::Grid { grid_size, .. } => {
            if grid_size == 0 {
                return Err(CoordinateError::EmptyGrid);
            }
            let (cell_width, cell_height) = cell_extent(canvas, grid_size);
            let col = cell_index((x / cell_width).round(), grid_size)?;
            let row = cell_index((y / cell_height).round(), grid_size)?;
            Ok(PositionSpec::Grid {
                row,
                col,
                grid_size,
            })
        }
    }
}

fn finite(value: f64, field: &'static str) -> Result<f64, CoordinateError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoordinateError::NonFinite { field })
    }
}

fn check_cell(row: u32, col: u32, grid_size: u32) -> Result<(), CoordinateError> {
    if grid_size == 0 {
        return Err(CoordinateError::EmptyGrid);
    }
    if row >= grid_size || col >= grid_size {
        return Err(CoordinateError::CellOutOfRange {
            row,
            col,
            grid_size,
        });
    }
    Ok(())
}

fn cell_extent(canvas: Canvas, grid_size: u32) -> (f64, f64) {
    let cells = f64::from(grid_size);
    (canvas.width() / cells, canvas.height() / cells)
}

fn cell_index(raw: f64, grid_size: u32) -> Result<u32, CoordinateError> {
    if raw < 0.0 || raw >= f64::from(grid_size) {
        return Err(CoordinateError::CellOutOfRange {
            row: 0,
            col: 0,
            grid_size,
        });
    }
    // In range [0, grid_size) after the check above.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is a non-negative integer below grid_size"
    )]
    let index = raw as u32;
    Ok(index)
}
