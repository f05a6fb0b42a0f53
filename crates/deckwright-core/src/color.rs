//! WCAG colour contrast.
//!
//! Implements relative luminance and contrast ratio as defined by WCAG 2.x:
//! each sRGB channel is linearised, weighted into a luminance, and the ratio
//! is `(L1 + 0.05) / (L2 + 0.05)` with `L1` the lighter of the two. All
//! functions here are pure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum AA ratio for normal text.
pub const WCAG_AA_NORMAL: f64 = 4.5;
/// Minimum AA ratio for large text.
pub const WCAG_AA_LARGE: f64 = 3.0;
/// Minimum AAA ratio for normal text.
pub const WCAG_AAA_NORMAL: f64 = 7.0;
/// Minimum AAA ratio for large text.
pub const WCAG_AAA_LARGE: f64 = 4.5;

/// Point size from which regular-weight text counts as large.
pub const LARGE_TEXT_PT: f64 = 18.0;
/// Point size from which bold text counts as large.
pub const LARGE_BOLD_TEXT_PT: f64 = 14.0;

/// Errors raised while parsing colour input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// No colour was supplied.
    #[error("colour value is empty")]
    Empty,
    /// The hex string has the wrong number of digits.
    #[error("colour '{input}' must have 3 or 6 hex digits")]
    InvalidLength {
        /// Rejected input.
        input: String,
    },
    /// The hex string contains a non-hex character.
    #[error("colour '{input}' contains a non-hex digit")]
    InvalidDigit {
        /// Rejected input.
        input: String,
    },
}

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a colour from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// WCAG relative luminance in `[0, 1]`.
    #[must_use]
    pub fn relative_luminance(self) -> f64 {
        let r = linearise(self.r);
        let g = linearise(self.g);
        let b = linearise(self.b);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }
}

fn linearise(channel: u8) -> f64 {
    let srgb = f64::from(channel) / 255.0;
    if srgb <= 0.039_28 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.is_empty() {
            return Err(ColorError::Empty);
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit {
                input: input.to_owned(),
            });
        }
        let digits: Vec<u8> = hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .filter_map(|d| u8::try_from(d).ok())
            .collect();
        match digits.as_slice() {
            [r, g, b] => Ok(Self::new(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => Ok(Self::new(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            _ => Err(ColorError::InvalidLength {
                input: input.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Contrast ratio between two colours, in `[1, 21]`. Symmetric.
#[must_use]
pub fn contrast_ratio(fg: Rgb, bg: Rgb) -> f64 {
    let first = fg.relative_luminance();
    let second = bg.relative_luminance();
    let lighter = first.max(second);
    let darker = first.min(second);
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast ratio for hex colour strings.
///
/// # Errors
///
/// Returns a [`ColorError`] when either colour is malformed.
pub fn contrast_ratio_hex(fg: &str, bg: &str) -> Result<f64, ColorError> {
    Ok(contrast_ratio(fg.parse()?, bg.parse()?))
}

/// Minimum AA ratio for the text size class.
#[must_use]
pub const fn required_ratio(large_text: bool) -> f64 {
    if large_text {
        WCAG_AA_LARGE
    } else {
        WCAG_AA_NORMAL
    }
}

/// True when the pair satisfies WCAG AA for the text size class.
#[must_use]
pub fn meets_wcag(fg: Rgb, bg: Rgb, large_text: bool) -> bool {
    contrast_ratio(fg, bg) >= required_ratio(large_text)
}

/// True when text of this size and weight counts as large under WCAG.
#[must_use]
pub fn is_large_text(size_pt: f64, bold: bool) -> bool {
    size_pt >= LARGE_TEXT_PT || (bold && size_pt >= LARGE_BOLD_TEXT_PT)
}

/// Picks black or white, whichever contrasts more with `bg`.
#[must_use]
pub fn best_text_color(bg: Rgb) -> Rgb {
    if contrast_ratio(Rgb::BLACK, bg) >= contrast_ratio(Rgb::WHITE, bg) {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

/// WCAG conformance level reached by a colour pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContrastGrade {
    /// Below AA.
    Fail,
    /// AA but not AAA.
    Aa,
    /// AAA.
    Aaa,
}

/// Full contrast assessment for one foreground/background pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContrastAssessment {
    /// Foreground colour.
    pub foreground: Rgb,
    /// Background colour.
    pub background: Rgb,
    /// Contrast ratio.
    pub ratio: f64,
    /// Whether the large-text thresholds applied.
    pub large_text: bool,
    /// Conformance level reached.
    pub grade: ContrastGrade,
}

impl ContrastAssessment {
    /// Assesses a colour pair.
    #[must_use]
    pub fn assess(foreground: Rgb, background: Rgb, large_text: bool) -> Self {
        let ratio = contrast_ratio(foreground, background);
        let (aa, aaa) = if large_text {
            (WCAG_AA_LARGE, WCAG_AAA_LARGE)
        } else {
            (WCAG_AA_NORMAL, WCAG_AAA_NORMAL)
        };
        let grade = if ratio >= aaa {
            ContrastGrade::Aaa
        } else if ratio >= aa {
            ContrastGrade::Aa
        } else {
            ContrastGrade::Fail
        };
        Self {
            foreground,
            background,
            ratio,
            large_text,
            grade,
        }
    }

    /// True when AA is met.
    #[must_use]
    pub fn passes(&self) -> bool {
        self.grade >= ContrastGrade::Aa
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn rgb() -> impl Strategy<Value = Rgb> {
        (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgb::new(r, g, b))
    }

    #[rstest]
    #[case("#FFFFFF", Rgb::WHITE)]
    #[case("000000", Rgb::BLACK)]
    #[case("#f80", Rgb::new(0xFF, 0x88, 0x00))]
    #[case("  #1a2B3c ", Rgb::new(0x1A, 0x2B, 0x3C))]
    fn parses_hex_forms(#[case] input: &str, #[case] expected: Rgb) {
        assert_eq!(input.parse::<Rgb>(), Ok(expected));
    }

    #[rstest]
    #[case("", ColorError::Empty)]
    #[case("#", ColorError::Empty)]
    #[case("#12345", ColorError::InvalidLength { input: String::from("#12345") })]
    #[case("#GG0000", ColorError::InvalidDigit { input: String::from("#GG0000") })]
    #[case("red", ColorError::InvalidDigit { input: String::from("red") })]
    fn rejects_malformed_hex(#[case] input: &str, #[case] expected: ColorError) {
        assert_eq!(input.parse::<Rgb>(), Err(expected));
    }

    #[test]
    fn white_on_black_is_maximum_contrast() {
        let ratio = contrast_ratio(Rgb::WHITE, Rgb::BLACK);
        assert!((ratio - 21.0).abs() < 1e-9, "got {ratio}");
    }

    #[test]
    fn known_grey_pair_matches_reference_ratio() {
        // #767676 on white is the classic 4.54:1 AA boundary colour.
        let ratio = contrast_ratio_hex("#767676", "#FFFFFF").expect("valid colours");
        assert!((ratio - 4.54).abs() < 0.01, "got {ratio}");
        assert!(meets_wcag(Rgb::new(0x76, 0x76, 0x76), Rgb::WHITE, false));
    }

    #[test]
    fn malformed_hex_surfaces_an_error() {
        assert!(contrast_ratio_hex("#zzz", "#fff").is_err());
    }

    #[rstest]
    #[case(18.0, false, true)]
    #[case(17.5, false, false)]
    #[case(14.0, true, true)]
    #[case(13.0, true, false)]
    fn large_text_classification(#[case] size: f64, #[case] bold: bool, #[case] large: bool) {
        assert_eq!(is_large_text(size, bold), large);
    }

    #[test]
    fn assessment_grades_by_threshold() {
        let aaa = ContrastAssessment::assess(Rgb::BLACK, Rgb::WHITE, false);
        assert_eq!(aaa.grade, ContrastGrade::Aaa);
        let fail = ContrastAssessment::assess(Rgb::new(0xCC, 0xCC, 0xCC), Rgb::WHITE, false);
        assert_eq!(fail.grade, ContrastGrade::Fail);
        assert!(!fail.passes());
    }

    #[test]
    fn best_text_colour_prefers_white_on_dark() {
        assert_eq!(best_text_color(Rgb::new(0x10, 0x20, 0x40)), Rgb::WHITE);
        assert_eq!(best_text_color(Rgb::new(0xF0, 0xF0, 0xE0)), Rgb::BLACK);
    }

    #[test]
    fn serialises_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(0x12, 0xAB, 0x00)).expect("serialise");
        assert_eq!(json, "\"#12AB00\"");
        let back: Rgb = serde_json::from_str("\"#12ab00\"").expect("deserialise");
        assert_eq!(back, Rgb::new(0x12, 0xAB, 0x00));
    }

    proptest! {
        #[test]
        fn identical_colours_have_unit_ratio(c in rgb()) {
            prop_assert_eq!(contrast_ratio(c, c), 1.0);
        }

        #[test]
        fn ratio_is_symmetric_and_bounded(a in rgb(), b in rgb()) {
            let forward = contrast_ratio(a, b);
            prop_assert_eq!(forward.to_bits(), contrast_ratio(b, a).to_bits());
            prop_assert!((1.0..=21.000_000_1).contains(&forward));
        }

        #[test]
        fn ratio_is_deterministic(a in rgb(), b in rgb()) {
            prop_assert_eq!(contrast_ratio(a, b).to_bits(), contrast_ratio(a, b).to_bits());
        }

        #[test]
        fn large_text_is_never_stricter(a in rgb(), b in rgb()) {
            prop_assert!(!meets_wcag(a, b, false) || meets_wcag(a, b, true));
        }
    }
}
