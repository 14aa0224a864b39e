//! Encoding strategy identity

use std::fmt;

/// Identifies one encoding strategy variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// External general-purpose encoder (ffmpeg)
    External,
    Mp4,
    Avi,
    Gif,
    ImageSequence,
    HtmlSequence,
}

impl StrategyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Gif => "gif",
            Self::ImageSequence => "images",
            Self::HtmlSequence => "html",
        }
    }

    /// File extension of the artifact this variant produces
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::External | Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Gif => "gif",
            Self::ImageSequence => "json",
            Self::HtmlSequence => "html",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
