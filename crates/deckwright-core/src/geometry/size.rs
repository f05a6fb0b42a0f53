//! Size specifications and aspect-preserving `auto` resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Canvas, CoordinateError, Extent, Length};

/// One dimension of a [`SizeSpec`].
///
/// Parses from `"50%"`, `"auto"` or any [`Length`] literal; bare JSON
/// numbers are inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "String")]
pub enum Dimension {
    /// Percentage of the canvas along the same axis.
    Percent(f64),
    /// A physical length.
    Length(Length),
    /// Derived from the other dimension and the asset's aspect ratio.
    Auto,
}

impl FromStr for Dimension {
    type Err = CoordinateError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if let Some(number) = trimmed.strip_suffix('%') {
            return number
                .trim()
                .parse::<f64>()
                .map(Self::Percent)
                .map_err(|_| CoordinateError::InvalidDimension {
                    input: input.to_owned(),
                });
        }
        trimmed
            .parse::<Length>()
            .map(Self::Length)
            .map_err(|_| CoordinateError::InvalidDimension {
                input: input.to_owned(),
            })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(value) => write!(f, "{value}%"),
            Self::Length(length) => write!(f, "{length}"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = CoordinateError;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Number(value) => Ok(Self::Length(Length::inches(value))),
            DimensionRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Dimension> for String {
    fn from(dimension: Dimension) -> Self {
        dimension.to_string()
    }
}

/// Width and height requested for a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeSpec {
    /// Requested width.
    pub width: Dimension,
    /// Requested height.
    pub height: Dimension,
}

impl SizeSpec {
    /// A size given in inches.
    #[must_use]
    pub const fn inches(width: f64, height: f64) -> Self {
        Self {
            width: Dimension::Length(Length::inches(width)),
            height: Dimension::Length(Length::inches(height)),
        }
    }
}

enum Known {
    Value(f64),
    Auto,
}

fn known(dimension: Dimension, axis: f64, name: &'static str) -> Result<Known, CoordinateError> {
    let value = match dimension {
        Dimension::Auto => return Ok(Known::Auto),
        Dimension::Percent(pct) => axis * pct / 100.0,
        Dimension::Length(length) => length.to_inches(),
    };
    positive(value, name).map(Known::Value)
}

fn positive(value: f64, dimension: &'static str) -> Result<f64, CoordinateError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CoordinateError::DegenerateSize { dimension, value })
    }
}

pub(super) fn resolve(
    spec: &SizeSpec,
    canvas: Canvas,
    intrinsic: Option<Extent>,
) -> Result<Extent, CoordinateError> {
    let width = known(spec.width, canvas.width(), "width")?;
    let height = known(spec.height, canvas.height(), "height")?;
    match (width, height) {
        (Known::Value(width), Known::Value(height)) => Ok(Extent::new(width, height)),
        (Known::Auto, Known::Auto) => Err(CoordinateError::BothAuto),
        (Known::Auto, Known::Value(height)) => {
            let source = intrinsic_or_err(intrinsic, "width")?;
            let width = positive(height * (source.width / source.height), "width")?;
            Ok(Extent::new(width, height))
        }
        (Known::Value(width), Known::Auto) => {
            let source = intrinsic_or_err(intrinsic, "height")?;
            let height = positive(width * (source.height / source.width), "height")?;
            Ok(Extent::new(width, height))
        }
    }
}

fn intrinsic_or_err(
    intrinsic: Option<Extent>,
    dimension: &'static str,
) -> Result<Extent, CoordinateError> {
    match intrinsic {
        Some(extent) if extent.is_positive_finite() => Ok(extent),
        Some(extent) => Err(CoordinateError::DegenerateSize {
            dimension: "intrinsic size",
            value: extent.width.min(extent.height),
        }),
        None => Err(CoordinateError::MissingIntrinsic { dimension }),
    }
}
