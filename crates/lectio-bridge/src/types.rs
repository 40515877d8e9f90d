//! Wire-level tokens shared by commands, events and the preference store.
//!
//! Every token here is constrained to a known alphabet, so it rides the wire
//! as a bare literal and never needs base64 framing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Sepia,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Sepia => "sepia",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "sepia" => Some(Self::Sepia),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Font {
    Andada,
    Lato,
    PtSerif,
    PtSans,
}

impl Font {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Andada => "andada",
            Self::Lato => "lato",
            Self::PtSerif => "pt-serif",
            Self::PtSans => "pt-sans",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "andada" => Some(Self::Andada),
            "lato" => Some(Self::Lato),
            "pt-serif" => Some(Self::PtSerif),
            "pt-sans" => Some(Self::PtSans),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl FontSize {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Huge => "huge",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tiny" => Some(Self::Tiny),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "huge" => Some(Self::Huge),
            _ => None,
        }
    }
}

/// Renderer highlight palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Orange,
    Yellow,
    Green,
    Blue,
}

impl HighlightColor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "orange" => Some(Self::Orange),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            _ => None,
        }
    }
}

/// User display preferences, global to the session.
///
/// Passed into every pane at construction and re-broadcast on change; never
/// read from ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub theme: Theme,
    pub font: Font,
    pub size: FontSize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font: Font::Andada,
            size: FontSize::Medium,
        }
    }
}
