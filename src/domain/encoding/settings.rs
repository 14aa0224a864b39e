//! Encoding settings value objects

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::capture::{CaptureMode, Region};
use crate::domain::error::SettingsError;
use crate::domain::recording::Duration;

/// Lowest accepted frame rate
pub const MIN_FRAME_RATE: u32 = 1;

/// Highest accepted frame rate
pub const MAX_FRAME_RATE: u32 = 120;

/// Frame rate used when none is configured
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Clamp a frame rate into the accepted range
pub const fn clamp_frame_rate(fps: u32) -> u32 {
    if fps < MIN_FRAME_RATE {
        MIN_FRAME_RATE
    } else if fps > MAX_FRAME_RATE {
        MAX_FRAME_RATE
    } else {
        fps
    }
}

/// Discrete quality setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityTier {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Low, Self::Medium, Self::High, Self::Ultra];

    /// Still-image (JPEG) quality, 1-100
    pub const fn image_quality(&self) -> u8 {
        match self {
            Self::Low => 60,
            Self::Medium => 75,
            Self::High => 85,
            Self::Ultra => 95,
        }
    }

    /// Constant-rate-factor for the external encoder
    pub const fn crf(&self) -> u8 {
        match self {
            Self::Low => 28,
            Self::Medium => 23,
            Self::High => 18,
            Self::Ultra => 15,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Ultra => "Ultra",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for QualityTier {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| SettingsError::InvalidQuality(s.to_string()))
    }
}

/// Target container family of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerFamily {
    #[default]
    Mp4,
    Avi,
    Gif,
    ImageSequence,
    HtmlSequence,
}

impl ContainerFamily {
    pub const ALL: [ContainerFamily; 5] = [
        Self::Mp4,
        Self::Avi,
        Self::Gif,
        Self::ImageSequence,
        Self::HtmlSequence,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Gif => "gif",
            Self::ImageSequence => "images",
            Self::HtmlSequence => "html",
        }
    }

    /// Extension of the requested output file
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Gif => "gif",
            Self::ImageSequence => "json",
            Self::HtmlSequence => "html",
        }
    }
}

impl fmt::Display for ContainerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContainerFamily {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "avi" | "mjpeg" => Ok(Self::Avi),
            "gif" => Ok(Self::Gif),
            "images" | "image-sequence" | "sequence" => Ok(Self::ImageSequence),
            "html" | "html-sequence" => Ok(Self::HtmlSequence),
            _ => Err(SettingsError::InvalidContainer(s.to_string())),
        }
    }
}

/// Settings for one recording. Immutable for the duration of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingSettings {
    pub output_dir: PathBuf,
    /// Base file name without extension; empty means timestamp-derived
    pub file_name: String,
    pub container: ContainerFamily,
    frame_rate: u32,
    pub quality: QualityTier,
    pub capture_mode: CaptureMode,
    pub monitor_index: usize,
    pub custom_region: Option<Region>,
    /// Optional recording time limit
    pub time_limit: Option<Duration>,
    /// Try the external encoder before the built-in MP4 writer
    pub external_encoder: bool,
}

impl EncodingSettings {
    /// Create settings with defaults for everything but the output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_name: String::new(),
            container: ContainerFamily::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            quality: QualityTier::default(),
            capture_mode: CaptureMode::default(),
            monitor_index: 0,
            custom_region: None,
            time_limit: None,
            external_encoder: false,
        }
    }

    /// Frame rate, always within 1..=120
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Set the frame rate, clamped into 1..=120
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = clamp_frame_rate(fps);
        self
    }

    pub fn with_container(mut self, container: ContainerFamily) -> Self {
        self.container = container;
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_capture_mode(mut self, mode: CaptureMode) -> Self {
        self.capture_mode = mode;
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.capture_mode = CaptureMode::CustomRegion;
        self.custom_region = Some(region);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Nominal interval between captures
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / self.frame_rate as u64)
    }

    /// Per-frame duration in milliseconds, as stored in container timing fields
    pub fn frame_duration_ms(&self) -> u32 {
        1000 / self.frame_rate
    }
}
