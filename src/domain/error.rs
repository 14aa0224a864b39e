//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a recording setting cannot be parsed or is out of range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid quality tier: \"{0}\". Valid tiers are: low, medium, high, ultra")]
    InvalidQuality(String),

    #[error("Invalid container format: \"{0}\". Valid formats are: mp4, avi, gif, images, html")]
    InvalidContainer(String),

    #[error("Invalid capture mode: \"{0}\". Valid modes are: full, window, region")]
    InvalidCaptureMode(String),

    #[error("Invalid region: \"{0}\". Expected x,y,width,height (e.g., 0,0,1280,720)")]
    InvalidRegion(String),

    #[error("Invalid frame rate: \"{0}\". Expected a whole number between 1 and 120")]
    InvalidFrameRate(String),
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Structural failure while laying out a container file.
///
/// These are hard failures: a container that cannot represent its
/// offsets or sizes is never truncated silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("Sample offset {offset} does not fit a 32-bit chunk offset field")]
    OffsetOverflow { offset: u64 },

    #[error("'{fourcc}' node of {size} bytes does not fit a 32-bit length field")]
    SizeOverflow { fourcc: String, size: u64 },

    #[error("Node tree is unbalanced: {0}")]
    Unbalanced(String),

    #[error("Field '{field}' value {value} is out of range")]
    FieldOverflow { field: &'static str, value: u64 },
}
