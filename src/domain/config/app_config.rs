//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::capture::{CaptureMode, Region};
use crate::domain::encoding::{
    ContainerFamily, EncodingSettings, QualityTier, DEFAULT_FRAME_RATE,
};
use crate::domain::recording::Duration;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_dir: Option<String>,
    pub file_name: Option<String>,
    pub container: Option<String>,
    pub frame_rate: Option<u32>,
    pub quality: Option<String>,
    pub capture_mode: Option<String>,
    pub monitor: Option<usize>,
    pub region: Option<String>,
    pub duration: Option<String>,
    pub notify: Option<bool>,
    pub external_encoder: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            output_dir: None,
            file_name: None,
            container: Some(ContainerFamily::default().to_string()),
            frame_rate: Some(DEFAULT_FRAME_RATE),
            quality: Some(QualityTier::default().as_str().to_string()),
            capture_mode: Some(CaptureMode::default().to_string()),
            monitor: Some(0),
            region: None,
            duration: None,
            notify: Some(false),
            external_encoder: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_dir: other.output_dir.or(self.output_dir),
            file_name: other.file_name.or(self.file_name),
            container: other.container.or(self.container),
            frame_rate: other.frame_rate.or(self.frame_rate),
            quality: other.quality.or(self.quality),
            capture_mode: other.capture_mode.or(self.capture_mode),
            monitor: other.monitor.or(self.monitor),
            region: other.region.or(self.region),
            duration: other.duration.or(self.duration),
            notify: other.notify.or(self.notify),
            external_encoder: other.external_encoder.or(self.external_encoder),
        }
    }

    /// Get output directory, or the current directory if not set
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get container family, or MP4 if not set/invalid
    pub fn container_or_default(&self) -> ContainerFamily {
        self.container
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get frame rate, or 30 if not set
    pub fn frame_rate_or_default(&self) -> u32 {
        self.frame_rate.unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Get quality tier, or Medium if not set/invalid
    pub fn quality_or_default(&self) -> QualityTier {
        self.quality
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get capture mode, or full screen if not set/invalid
    pub fn capture_mode_or_default(&self) -> CaptureMode {
        self.capture_mode
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get custom region if set and well-formed
    pub fn region_parsed(&self) -> Option<Region> {
        self.region.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get recording time limit if set and valid
    pub fn duration_parsed(&self) -> Option<Duration> {
        self.duration.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Get external encoder setting, or false if not set
    pub fn external_encoder_or_default(&self) -> bool {
        self.external_encoder.unwrap_or(false)
    }

    /// Build the immutable settings for one recording
    pub fn to_settings(&self) -> EncodingSettings {
        let mut settings = EncodingSettings::new(self.output_dir_or_default())
            .with_container(self.container_or_default())
            .with_frame_rate(self.frame_rate_or_default())
            .with_quality(self.quality_or_default())
            .with_capture_mode(self.capture_mode_or_default())
            .with_file_name(self.file_name.clone().unwrap_or_default());

        settings.monitor_index = self.monitor.unwrap_or(0);
        settings.custom_region = self.region_parsed();
        settings.time_limit = self.duration_parsed();
        settings.external_encoder = self.external_encoder_or_default();
        settings
    }
}
