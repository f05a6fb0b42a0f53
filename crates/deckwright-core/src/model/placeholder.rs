//! Placeholder roles.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Closed set of semantic roles a placeholder can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaceholderRole {
    /// Slide title, including centred titles.
    Title,
    /// Subtitle.
    Subtitle,
    /// Body text or generic content.
    Body,
    /// Footer text.
    Footer,
    /// Slide number field.
    SlideNumber,
    /// Date field.
    Date,
    /// Picture slot.
    Picture,
    /// Chart slot.
    Chart,
    /// Table slot.
    Table,
    /// Anything else.
    Other,
}

impl PlaceholderRole {
    /// Maps an object-model placeholder type token onto a role.
    ///
    /// This is the only place placeholder tokens are interpreted. A missing
    /// type attribute means body, matching the presentation format.
    #[must_use]
    pub fn from_ph_type(ph_type: &str) -> Self {
        match ph_type {
            "title" | "ctrTitle" => Self::Title,
            "subTitle" => Self::Subtitle,
            "" | "body" | "obj" => Self::Body,
            "ftr" => Self::Footer,
            "sldNum" => Self::SlideNumber,
            "dt" => Self::Date,
            "pic" | "clipArt" | "media" => Self::Picture,
            "chart" => Self::Chart,
            "tbl" => Self::Table,
            _ => Self::Other,
        }
    }

    /// The canonical token written for this role.
    #[must_use]
    pub const fn ph_type(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subTitle",
            Self::Body => "body",
            Self::Footer => "ftr",
            Self::SlideNumber => "sldNum",
            Self::Date => "dt",
            Self::Picture => "pic",
            Self::Chart => "chart",
            Self::Table => "tbl",
            Self::Other => "other",
        }
    }

    /// True for roles that hold a slide title.
    #[must_use]
    pub const fn is_title(self) -> bool {
        matches!(self, Self::Title)
    }
}
